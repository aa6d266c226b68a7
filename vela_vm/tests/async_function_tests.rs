// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod common;

use common::*;
use vela_ast as ast;
use vela_vm::ecmascript::{
    builtins::promise::PromiseStateKind,
    execution::{Agent, ExceptionType, JsResult},
    scripts_and_modules::module::module_semantics::{ModuleAbstractMethods, SourceTextModule},
    types::{ArgumentsList, BuiltinFunction, String as JsString, Value},
};

/// A builtin `f()` returning whatever the global binding `p` holds.
fn f_behaviour(agent: &mut Agent, _this: Value, _args: ArgumentsList) -> JsResult<Value> {
    agent
        .get_global("p")
        .ok_or_else(|| agent.throw_exception(ExceptionType::ReferenceError, "p is not defined"))
}

fn install_f(agent: &mut Agent) {
    let f = BuiltinFunction::create(agent, "f", f_behaviour);
    agent.set_global("f", f.into());
}

fn async_function_declaration(name: &str, body: Vec<ast::Statement>) -> ast::Statement {
    ast::Statement::FunctionDeclaration {
        name: name.to_string(),
        params: vec![],
        body,
        is_async: true,
        span: span(),
    }
}

#[test]
fn await_suspends_and_resumes_with_the_settled_value() {
    let (_, mut agent) = test_agent();
    let result = install_result_object(&mut agent, "result");
    install_f(&mut agent);
    let capability = agent.register_promise();
    agent.set_global("p", Value::Promise(capability.promise()));

    // async function test() { const x = await f(); result.v = x; } test();
    let module = SourceTextModule::create(
        &mut agent,
        plain_source(vec![
            member_assignment("result", "v", number(0.0)),
            async_function_declaration(
                "test",
                vec![
                    const_declaration("x", await_expression(call(ident("f"), vec![]))),
                    member_assignment("result", "v", ident("x")),
                ],
            ),
            expression_statement(call(ident("test"), vec![])),
        ]),
    );
    module.link(&mut agent).unwrap();
    let promise = module.evaluate(&mut agent);
    // The module itself has no top-level await and completes synchronously;
    // the async function is parked at the pending promise.
    assert_eq!(promise.state(&agent), PromiseStateKind::Fulfilled);
    let v = JsString::from_str(&mut agent, "v");
    assert_eq!(result.get(&agent, v), Some(Value::Number(0.0)));

    // Settling the promise re-enters the suspended activation.
    capability.resolve(&mut agent, Value::Number(1.0));
    agent.run_jobs();
    assert_eq!(result.get(&agent, v), Some(Value::Number(1.0)));
}

#[test]
fn awaiting_a_plain_value_does_not_suspend() {
    let (_, mut agent) = test_agent();
    let result = install_result_object(&mut agent, "result");

    // async function test() { const x = await 5; result.v = x; } test();
    let module = SourceTextModule::create(
        &mut agent,
        plain_source(vec![
            async_function_declaration(
                "test",
                vec![
                    const_declaration("x", await_expression(number(5.0))),
                    member_assignment("result", "v", ident("x")),
                ],
            ),
            expression_statement(call(ident("test"), vec![])),
        ]),
    );
    module.link(&mut agent).unwrap();
    module.evaluate(&mut agent);

    // The awaited value was not a promise: the body ran to completion
    // without parking.
    let v = JsString::from_str(&mut agent, "v");
    assert_eq!(result.get(&agent, v), Some(Value::Number(5.0)));
}

#[test]
fn async_function_returns_a_promise_of_its_return_value() {
    let (_, mut agent) = test_agent();
    let result = install_result_object(&mut agent, "result");

    // async function seven() { return 7; } result.p = seven();
    let module = SourceTextModule::create(
        &mut agent,
        plain_source(vec![
            async_function_declaration(
                "seven",
                vec![ast::Statement::Return {
                    argument: Some(number(7.0)),
                    span: span(),
                }],
            ),
            member_assignment("result", "p", call(ident("seven"), vec![])),
        ]),
    );
    module.link(&mut agent).unwrap();
    module.evaluate(&mut agent);

    let p = JsString::from_str(&mut agent, "p");
    let Some(Value::Promise(promise)) = result.get(&agent, p) else {
        panic!("expected a promise");
    };
    assert_eq!(promise.state(&agent), PromiseStateKind::Fulfilled);
    assert_eq!(promise.result(&agent), Some(Value::Number(7.0)));
}

#[test]
fn awaiting_a_rejected_promise_rejects_the_function_promise() {
    let (_, mut agent) = test_agent();
    let result = install_result_object(&mut agent, "result");
    install_f(&mut agent);
    let capability = agent.register_promise();
    agent.set_global("p", Value::Promise(capability.promise()));

    // async function test() { await f(); result.v = 1; } result.p = test();
    let module = SourceTextModule::create(
        &mut agent,
        plain_source(vec![
            member_assignment("result", "v", number(0.0)),
            async_function_declaration(
                "test",
                vec![
                    expression_statement(await_expression(call(ident("f"), vec![]))),
                    member_assignment("result", "v", number(1.0)),
                ],
            ),
            member_assignment("result", "p", call(ident("test"), vec![])),
        ]),
    );
    module.link(&mut agent).unwrap();
    module.evaluate(&mut agent);

    let reason = JsString::from_str(&mut agent, "nope");
    capability.reject(&mut agent, Value::String(reason));
    agent.run_jobs();

    // The rejection re-entered the body as a throw: the statement after the
    // await never ran and the function's promise rejected.
    let v = JsString::from_str(&mut agent, "v");
    assert_eq!(result.get(&agent, v), Some(Value::Number(0.0)));
    let p = JsString::from_str(&mut agent, "p");
    let Some(Value::Promise(promise)) = result.get(&agent, p) else {
        panic!("expected a promise");
    };
    assert_eq!(promise.state(&agent), PromiseStateKind::Rejected);
    assert_eq!(promise.result(&agent), Some(Value::String(reason)));
}

#[test]
fn consecutive_awaits_resume_in_settlement_order() {
    let (host_hooks, mut agent) = test_agent();
    install_trace(&mut agent);
    let first = agent.register_promise();
    let second = agent.register_promise();
    agent.set_global("first", Value::Promise(first.promise()));
    agent.set_global("second", Value::Promise(second.promise()));

    // async function test() { await first; trace("one"); await second; trace("two"); } test();
    let module = SourceTextModule::create(
        &mut agent,
        plain_source(vec![
            async_function_declaration(
                "test",
                vec![
                    expression_statement(await_expression(ident("first"))),
                    trace_statement("one"),
                    expression_statement(await_expression(ident("second"))),
                    trace_statement("two"),
                ],
            ),
            expression_statement(call(ident("test"), vec![])),
        ]),
    );
    module.link(&mut agent).unwrap();
    module.evaluate(&mut agent);
    assert!(host_hooks.take_trace().is_empty());

    first.resolve(&mut agent, Value::Undefined);
    agent.run_jobs();
    assert_eq!(host_hooks.take_trace(), ["one"]);

    second.resolve(&mut agent, Value::Undefined);
    agent.run_jobs();
    assert_eq!(host_hooks.take_trace(), ["two"]);
}
