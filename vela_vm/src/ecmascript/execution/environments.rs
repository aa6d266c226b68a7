// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ### [9.1 Environment Records](https://tc39.es/ecma262/#sec-environment-records)
//!
//! Environment Records define the association of identifiers to specific
//! variables and functions, based upon the lexical nesting structure of the
//! executed code. The module and evaluation core only needs declarative
//! environments (function and block scopes, the realm's global scope) and
//! module environments on top of them.

mod declarative_environment;
mod module_environment;

pub(crate) use declarative_environment::{
    new_declarative_environment, DeclarativeEnvironment, DeclarativeEnvironmentRecord,
};
pub(crate) use module_environment::{new_module_environment, ModuleEnvironment};

use crate::ecmascript::{
    execution::{agent::ExceptionType, Agent, JsResult},
    types::{String, Value},
};

/// ### [\[\[OuterEnv\]\]](https://tc39.es/ecma262/#sec-environment-records)
///
/// Every Environment Record has an \[\[OuterEnv]] field, which is either null
/// or a reference to an outer Environment Record, modelling the logical
/// nesting of scopes.
pub(crate) type OuterEnv = Option<DeclarativeEnvironment>;

/// ### [9.4.2 ResolveBinding ( name \[ , env \] )](https://tc39.es/ecma262/#sec-resolvebinding)
///
/// Determine the value bound to `name`, searching `env` and its outer
/// environments. Throws a `ReferenceError` for unresolvable names; module
/// code is always strict.
pub(crate) fn resolve_binding(
    agent: &mut Agent,
    name: String,
    env: DeclarativeEnvironment,
) -> JsResult<Value> {
    let mut current = Some(env);
    // 1. Repeat, while env is not null,
    while let Some(env) = current {
        // a. If env has a binding for name, return its value.
        if env.has_binding(agent, name) {
            return env.get_binding_value(agent, name, true);
        }
        // b. Set env to env.[[OuterEnv]].
        current = env.get_outer_env(agent);
    }
    let error_message = format!("{} is not defined", name.as_str(agent));
    Err(agent.throw_exception(ExceptionType::ReferenceError, error_message))
}

/// Assign `value` to the nearest binding for `name`, searching `env` and its
/// outer environments. Module code is always strict: assignment to an
/// unresolvable name or an immutable binding throws.
pub(crate) fn set_binding(
    agent: &mut Agent,
    name: String,
    value: Value,
    env: DeclarativeEnvironment,
) -> JsResult<()> {
    let mut current = Some(env);
    while let Some(env) = current {
        if env.has_binding(agent, name) {
            return env.set_mutable_binding(agent, name, value, true);
        }
        current = env.get_outer_env(agent);
    }
    let error_message = format!(
        "Cannot assign to nonexisting binding '{}'.",
        name.as_str(agent)
    );
    Err(agent.throw_exception(ExceptionType::ReferenceError, error_message))
}
