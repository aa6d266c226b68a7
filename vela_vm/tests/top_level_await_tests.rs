// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod common;

use common::*;
use vela_ast as ast;
use vela_vm::ecmascript::{
    builtins::promise::PromiseStateKind,
    scripts_and_modules::module::module_semantics::{
        CyclicModuleRecordStatus, ModuleAbstractMethods, SourceTextModule,
    },
    types::{String as JsString, Value},
};

fn tla_source(body: Vec<ast::Statement>) -> ast::ModuleSource {
    ast::ModuleSource {
        body,
        has_top_level_await: true,
        ..Default::default()
    }
}

#[test]
fn tla_fulfillment_propagates_to_the_importer() {
    let (host_hooks, mut agent) = test_agent();
    let capability = agent.register_promise();
    agent.set_global("p", Value::Promise(capability.promise()));

    // L has `await p;` at its top level; M imports L.
    let l = SourceTextModule::create(
        &mut agent,
        tla_source(vec![expression_statement(await_expression(ident("p")))]),
    );
    let m = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            requested_modules: vec!["l".to_string()],
            ..Default::default()
        },
    );
    host_hooks.register("l", l);
    m.link(&mut agent).unwrap();

    let promise = m.evaluate(&mut agent);
    // Evaluation parked at the pending promise.
    assert_eq!(promise.state(&agent), PromiseStateKind::Pending);
    assert_eq!(l.status(&agent), CyclicModuleRecordStatus::EvaluatingAsync);
    assert_eq!(m.status(&agent), CyclicModuleRecordStatus::EvaluatingAsync);

    // Settling p drains through L and then M.
    capability.resolve(&mut agent, Value::Number(1.0));
    agent.run_jobs();
    assert_eq!(l.status(&agent), CyclicModuleRecordStatus::Evaluated);
    assert_eq!(m.status(&agent), CyclicModuleRecordStatus::Evaluated);
    assert_eq!(promise.state(&agent), PromiseStateKind::Fulfilled);
    assert_eq!(promise.result(&agent), Some(Value::Undefined));
}

#[test]
fn tla_rejection_rejects_every_waiting_ancestor() {
    let (host_hooks, mut agent) = test_agent();
    let capability = agent.register_promise();
    agent.set_global("p", Value::Promise(capability.promise()));

    let l = SourceTextModule::create(
        &mut agent,
        tla_source(vec![expression_statement(await_expression(ident("p")))]),
    );
    let m = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            requested_modules: vec!["l".to_string()],
            ..Default::default()
        },
    );
    host_hooks.register("l", l);
    m.link(&mut agent).unwrap();

    let promise = m.evaluate(&mut agent);
    assert_eq!(promise.state(&agent), PromiseStateKind::Pending);

    let reason = JsString::from_str(&mut agent, "nope");
    capability.reject(&mut agent, Value::String(reason));
    agent.run_jobs();

    assert_eq!(l.status(&agent), CyclicModuleRecordStatus::Evaluated);
    assert_eq!(l.evaluation_error(&agent), Some(Value::String(reason)));
    assert_eq!(m.status(&agent), CyclicModuleRecordStatus::Evaluated);
    assert_eq!(m.evaluation_error(&agent), Some(Value::String(reason)));
    assert_eq!(promise.state(&agent), PromiseStateKind::Rejected);
    assert_eq!(promise.result(&agent), Some(Value::String(reason)));

    // A later Evaluate lands on the same rejected promise via the cycle
    // root.
    assert_eq!(m.evaluate(&mut agent), promise);
}

#[test]
fn awaited_value_is_visible_after_resumption() {
    let (_, mut agent) = test_agent();
    let result = install_result_object(&mut agent, "result");
    let capability = agent.register_promise();
    agent.set_global("p", Value::Promise(capability.promise()));

    // const x = await p; result.x = x;
    let module = SourceTextModule::create(
        &mut agent,
        tla_source(vec![
            const_declaration("x", await_expression(ident("p"))),
            member_assignment("result", "x", ident("x")),
        ]),
    );
    module.link(&mut agent).unwrap();
    let promise = module.evaluate(&mut agent);
    assert_eq!(promise.state(&agent), PromiseStateKind::Pending);

    capability.resolve(&mut agent, Value::Number(7.0));
    agent.run_jobs();
    assert_eq!(promise.state(&agent), PromiseStateKind::Fulfilled);
    let x = JsString::from_str(&mut agent, "x");
    assert_eq!(result.get(&agent, x), Some(Value::Number(7.0)));
}

#[test]
fn awaiting_a_settled_promise_needs_no_external_resolution() {
    let (_, mut agent) = test_agent();
    let capability = agent.register_promise();
    capability.resolve(&mut agent, Value::Number(5.0));
    agent.set_global("p", Value::Promise(capability.promise()));

    let module = SourceTextModule::create(
        &mut agent,
        tla_source(vec![expression_statement(await_expression(ident("p")))]),
    );
    module.link(&mut agent).unwrap();
    let promise = module.evaluate(&mut agent);
    // The body never suspends: the await reads the settled value directly
    // and the module's internal capability is resolved before Evaluate
    // returns. Only the driver's queued reaction remains.
    assert!(agent.has_pending_jobs());
    agent.run_jobs();
    assert_eq!(promise.state(&agent), PromiseStateKind::Fulfilled);
    assert_eq!(module.status(&agent), CyclicModuleRecordStatus::Evaluated);
}

#[test]
fn gathered_ancestors_run_in_async_evaluation_order() {
    let (host_hooks, mut agent) = test_agent();
    install_trace(&mut agent);
    let capability = agent.register_promise();
    agent.set_global("p", Value::Promise(capability.promise()));

    // L awaits; A and B import L; M imports A and B. Once L settles, A and
    // B and then M become executable, in the order their async evaluation
    // was scheduled.
    let l = SourceTextModule::create(
        &mut agent,
        tla_source(vec![expression_statement(await_expression(ident("p")))]),
    );
    let a = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            body: vec![trace_statement("a")],
            requested_modules: vec!["l".to_string()],
            ..Default::default()
        },
    );
    let b = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            body: vec![trace_statement("b")],
            requested_modules: vec!["l".to_string()],
            ..Default::default()
        },
    );
    let m = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            body: vec![trace_statement("m")],
            requested_modules: vec!["a".to_string(), "b".to_string()],
            ..Default::default()
        },
    );
    host_hooks.register("l", l);
    host_hooks.register("a", a);
    host_hooks.register("b", b);
    m.link(&mut agent).unwrap();

    let promise = m.evaluate(&mut agent);
    assert_eq!(promise.state(&agent), PromiseStateKind::Pending);
    assert!(host_hooks.take_trace().is_empty());
    for module in [a, b, m] {
        assert_eq!(
            module.status(&agent),
            CyclicModuleRecordStatus::EvaluatingAsync
        );
    }

    capability.resolve(&mut agent, Value::Undefined);
    agent.run_jobs();
    assert_eq!(host_hooks.take_trace(), ["a", "b", "m"]);
    assert_eq!(promise.state(&agent), PromiseStateKind::Fulfilled);
    for module in [l, a, b, m] {
        assert_eq!(module.status(&agent), CyclicModuleRecordStatus::Evaluated);
    }
}

#[test]
fn sync_dependency_failure_of_gathered_ancestor_rejects_downstream() {
    let (host_hooks, mut agent) = test_agent();
    let capability = agent.register_promise();
    agent.set_global("p", Value::Promise(capability.promise()));

    // L awaits; A imports L but throws when it finally runs; M imports A.
    let l = SourceTextModule::create(
        &mut agent,
        tla_source(vec![expression_statement(await_expression(ident("p")))]),
    );
    let a = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            body: vec![throw_statement(string("late boom"))],
            requested_modules: vec!["l".to_string()],
            ..Default::default()
        },
    );
    let m = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            requested_modules: vec!["a".to_string()],
            ..Default::default()
        },
    );
    host_hooks.register("l", l);
    host_hooks.register("a", a);
    m.link(&mut agent).unwrap();

    let promise = m.evaluate(&mut agent);
    assert_eq!(promise.state(&agent), PromiseStateKind::Pending);

    capability.resolve(&mut agent, Value::Undefined);
    agent.run_jobs();

    let reason = JsString::from_str(&mut agent, "late boom");
    assert_eq!(l.evaluation_error(&agent), None);
    assert_eq!(a.evaluation_error(&agent), Some(Value::String(reason)));
    assert_eq!(m.evaluation_error(&agent), Some(Value::String(reason)));
    assert_eq!(promise.state(&agent), PromiseStateKind::Rejected);
    assert_eq!(promise.result(&agent), Some(Value::String(reason)));
}
