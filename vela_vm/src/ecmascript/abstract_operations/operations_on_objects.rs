// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::ecmascript::{
    execution::{agent::ExceptionType, Agent, JsResult},
    types::{String, Value},
};

/// ### [7.3.2 Get ( O, P )](https://tc39.es/ecma262/#sec-get-o-p)
///
/// Property read over the narrow value model: ordinary objects, module
/// namespace objects and error objects are readable. Reading a missing
/// property yields `undefined`; reading through `undefined` or `null`
/// throws.
pub(crate) fn get_property(agent: &mut Agent, object: Value, key: String) -> JsResult<Value> {
    match object {
        Value::Object(object) => Ok(object.get(agent, key).unwrap_or(Value::Undefined)),
        Value::Module(namespace) => namespace.get(agent, key),
        Value::Error(error) => match key.as_str(agent) {
            "message" => Ok(error
                .message(agent)
                .map_or(Value::Undefined, Value::String)),
            "name" => {
                let kind = error.kind(agent);
                Ok(Value::String(String::from_str(agent, kind.as_str())))
            }
            _ => Ok(Value::Undefined),
        },
        Value::Undefined | Value::Null => {
            let error_message = format!(
                "Cannot read properties of {} (reading '{}').",
                object.type_name(),
                key.as_str(agent)
            );
            Err(agent.throw_exception(ExceptionType::TypeError, error_message))
        }
        _ => Ok(Value::Undefined),
    }
}

/// ### [7.3.4 Set ( O, P, V, Throw )](https://tc39.es/ecma262/#sec-set-o-p-v-throw)
///
/// Module code is strict: failed assignments throw.
pub(crate) fn set_property(
    agent: &mut Agent,
    object: Value,
    key: String,
    value: Value,
) -> JsResult<()> {
    match object {
        Value::Object(object) => {
            object.set(agent, key, value);
            Ok(())
        }
        Value::Module(_) => {
            let error_message = format!(
                "Cannot assign to read only property '{}' of a module namespace object.",
                key.as_str(agent)
            );
            Err(agent.throw_exception(ExceptionType::TypeError, error_message))
        }
        Value::Undefined | Value::Null => {
            let error_message = format!(
                "Cannot set properties of {} (setting '{}').",
                object.type_name(),
                key.as_str(agent)
            );
            Err(agent.throw_exception(ExceptionType::TypeError, error_message))
        }
        _ => {
            let error_message = format!(
                "Cannot create property '{}' on {}.",
                key.as_str(agent),
                object.type_name()
            );
            Err(agent.throw_exception(ExceptionType::TypeError, error_message))
        }
    }
}
