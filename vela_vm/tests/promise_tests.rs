// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod common;

use common::*;
use vela_vm::ecmascript::{
    builtins::promise::PromiseStateKind,
    execution::ExceptionType,
    scripts_and_modules::module::module_semantics::{ModuleAbstractMethods, SourceTextModule},
    types::{String as JsString, Value},
};

#[test]
fn promise_settlement_is_one_shot() {
    let (_, mut agent) = test_agent();
    let capability = agent.register_promise();
    let promise = capability.promise();
    assert_eq!(promise.state(&agent), PromiseStateKind::Pending);
    assert_eq!(promise.result(&agent), None);

    capability.resolve(&mut agent, Value::Number(1.0));
    assert_eq!(promise.state(&agent), PromiseStateKind::Fulfilled);
    assert_eq!(promise.result(&agent), Some(Value::Number(1.0)));

    // Later settlements are discarded, not an error.
    capability.resolve(&mut agent, Value::Number(2.0));
    capability.reject(&mut agent, Value::Number(3.0));
    assert_eq!(promise.state(&agent), PromiseStateKind::Fulfilled);
    assert_eq!(promise.result(&agent), Some(Value::Number(1.0)));
}

#[test]
fn rejection_is_equally_one_shot() {
    let (_, mut agent) = test_agent();
    let capability = agent.register_promise();
    let promise = capability.promise();

    capability.reject(&mut agent, Value::Number(1.0));
    capability.resolve(&mut agent, Value::Number(2.0));
    assert_eq!(promise.state(&agent), PromiseStateKind::Rejected);
    assert_eq!(promise.result(&agent), Some(Value::Number(1.0)));
}

#[test]
fn resolving_a_promise_with_itself_rejects_with_a_type_error() {
    let (_, mut agent) = test_agent();
    let capability = agent.register_promise();
    let promise = capability.promise();

    capability.resolve(&mut agent, Value::Promise(promise));
    assert_eq!(promise.state(&agent), PromiseStateKind::Rejected);
    let Some(Value::Error(error)) = promise.result(&agent) else {
        panic!("expected an error value");
    };
    assert_eq!(error.kind(&agent), ExceptionType::TypeError);
}

#[test]
fn resolving_with_a_thenable_adopts_its_state() {
    let (_, mut agent) = test_agent();
    let outer = agent.register_promise();
    let inner = agent.register_promise();

    // Resolving to a pending promise locks the outer promise without
    // settling it.
    outer.resolve(&mut agent, Value::Promise(inner.promise()));
    agent.run_jobs();
    assert_eq!(outer.promise().state(&agent), PromiseStateKind::Pending);

    // A second resolution attempt is discarded even though the promise is
    // still pending.
    outer.resolve(&mut agent, Value::Number(9.0));
    agent.run_jobs();
    assert_eq!(outer.promise().state(&agent), PromiseStateKind::Pending);

    // Settling the inner promise settles the outer one through the queued
    // reaction.
    inner.resolve(&mut agent, Value::Number(5.0));
    agent.run_jobs();
    assert_eq!(outer.promise().state(&agent), PromiseStateKind::Fulfilled);
    assert_eq!(outer.promise().result(&agent), Some(Value::Number(5.0)));
}

#[test]
fn settlement_only_enqueues_reactions_until_the_queue_drains() {
    let (_, mut agent) = test_agent();
    let result = install_result_object(&mut agent, "result");
    let capability = agent.register_promise();
    agent.set_global("p", Value::Promise(capability.promise()));

    // A waiting module observes the settlement only after the continuation
    // queue runs.
    let module = SourceTextModule::create(
        &mut agent,
        vela_ast::ModuleSource {
            body: vec![
                const_declaration("x", await_expression(ident("p"))),
                member_assignment("result", "x", ident("x")),
            ],
            has_top_level_await: true,
            ..Default::default()
        },
    );
    module.link(&mut agent).unwrap();
    module.evaluate(&mut agent);

    capability.resolve(&mut agent, Value::Number(4.0));
    let x = JsString::from_str(&mut agent, "x");
    // The reaction has not run yet.
    assert_eq!(result.get(&agent, x), None);
    assert!(agent.has_pending_jobs());

    agent.run_jobs();
    assert_eq!(result.get(&agent, x), Some(Value::Number(4.0)));
}

#[test]
fn reactions_run_in_settlement_order_across_promises() {
    let (host_hooks, mut agent) = test_agent();
    install_trace(&mut agent);
    let pa = agent.register_promise();
    let pb = agent.register_promise();
    agent.set_global("pa", Value::Promise(pa.promise()));
    agent.set_global("pb", Value::Promise(pb.promise()));

    // Two independent waiters; settling b first runs b's continuation
    // first, regardless of registration order.
    let module = SourceTextModule::create(
        &mut agent,
        plain_source(vec![
            vela_ast::Statement::FunctionDeclaration {
                name: "wait_a".to_string(),
                params: vec![],
                body: vec![
                    expression_statement(await_expression(ident("pa"))),
                    trace_statement("a"),
                ],
                is_async: true,
                span: span(),
            },
            vela_ast::Statement::FunctionDeclaration {
                name: "wait_b".to_string(),
                params: vec![],
                body: vec![
                    expression_statement(await_expression(ident("pb"))),
                    trace_statement("b"),
                ],
                is_async: true,
                span: span(),
            },
            expression_statement(call(ident("wait_a"), vec![])),
            expression_statement(call(ident("wait_b"), vec![])),
        ]),
    );
    module.link(&mut agent).unwrap();
    module.evaluate(&mut agent);

    pb.resolve(&mut agent, Value::Undefined);
    pa.resolve(&mut agent, Value::Undefined);
    agent.run_jobs();
    assert_eq!(host_hooks.take_trace(), ["b", "a"]);
}
