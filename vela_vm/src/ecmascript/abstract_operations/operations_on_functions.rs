// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::{
    ecmascript::{
        builtins::control_abstraction_objects::{
            async_function_objects::async_block_continuation,
            promise_objects::promise_abstract_operations::promise_capability_records::PromiseCapability,
        },
        execution::{
            agent::ExceptionType, environments::new_declarative_environment, Agent,
            ExecutionContext, JsResult,
        },
        syntax_directed_operations::function_declaration_instantiation,
        types::{ArgumentsList, ECMAScriptFunction, Value},
    },
    engine::{ExecutionResult, Vm},
};

/// ### [7.3.14 Call ( F, V \[ , argumentsList \] )](https://tc39.es/ecma262/#sec-call)
pub(crate) fn call_function(
    agent: &mut Agent,
    function: Value,
    this_value: Value,
    args: &[Value],
) -> JsResult<Value> {
    match function {
        Value::BuiltinFunction(function) => {
            let behaviour = agent[function].behaviour;
            behaviour(agent, this_value, ArgumentsList(args))
        }
        Value::Function(function) => ordinary_call(agent, function, args),
        _ => {
            let error_message = format!("{} is not a function.", function.type_name());
            Err(agent.throw_exception(ExceptionType::TypeError, error_message))
        }
    }
}

/// ### [10.2.1 \[\[Call]] ( thisArgument, argumentsList )](https://tc39.es/ecma262/#sec-ecmascript-function-objects-call-thisargument-argumentslist)
///
/// Calls into a function body: a fresh declarative environment over the
/// function's closure environment, arguments bound to the parameter names,
/// var and lexical declarations hoisted, and the body executed. Async
/// functions return a promise settled by the body's eventual completion.
fn ordinary_call(
    agent: &mut Agent,
    function: ECMAScriptFunction,
    args: &[Value],
) -> JsResult<Value> {
    let data = &agent[function];
    let environment = data.environment;
    let executable = data.executable;
    let realm = data.realm;
    let module = data.module;
    let is_async = data.is_async;
    let params = data.params.to_vec();

    // [10.2.1.1 PrepareForOrdinaryCall]: a new function scope over the
    // closure environment.
    let local_env = new_declarative_environment(agent, Some(environment));
    for (i, param) in params.iter().enumerate() {
        local_env.create_mutable_binding(agent, *param);
        local_env.initialize_binding(
            agent,
            *param,
            args.get(i).copied().unwrap_or(Value::Undefined),
        );
    }
    // [10.2.11 FunctionDeclarationInstantiation]
    let statements = agent[executable].statements.clone();
    function_declaration_instantiation(agent, &statements, local_env, module);

    let context = ExecutionContext {
        lexical_environment: local_env,
        realm,
        module,
    };
    if !is_async {
        agent.push_execution_context(context);
        let result = Vm::execute(agent, executable);
        agent.pop_execution_context();
        match result {
            // An explicit return completion provides the call's value; a
            // body that runs off its end evaluates to undefined.
            ExecutionResult::Return(value) => Ok(value),
            ExecutionResult::Normal(_) => Ok(Value::Undefined),
            ExecutionResult::Throw(error) => Err(error),
            ExecutionResult::Await { .. } => Err(agent.throw_exception(
                ExceptionType::SyntaxError,
                "`await` is only valid in async functions and at the module top level.",
            )),
        }
    } else {
        // [27.7.5.1 AsyncFunctionStart ( promiseCapability, asyncFunctionBody )](https://tc39.es/ecma262/#sec-async-functions-abstract-operations-async-function-start)
        let promise_capability = PromiseCapability::new(agent);
        agent.push_execution_context(context);
        let result = Vm::execute(agent, executable);
        async_block_continuation(agent, result, executable, promise_capability);
        Ok(Value::Promise(promise_capability.promise()))
    }
}
