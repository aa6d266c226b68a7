// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod common;

use common::*;
use vela_ast as ast;
use vela_vm::ecmascript::{
    builtins::{
        module::get_module_namespace,
        promise::PromiseStateKind,
    },
    scripts_and_modules::module::module_semantics::{
        CyclicModuleRecordStatus, ModuleAbstractMethods, SourceTextModule,
    },
    types::{String as JsString, Value},
};

#[test]
fn evaluate_without_tla_fulfills_before_returning() {
    let (_, mut agent) = test_agent();
    let module = SourceTextModule::create(
        &mut agent,
        plain_source(vec![expression_statement(number(42.0))]),
    );
    module.link(&mut agent).unwrap();

    let promise = module.evaluate(&mut agent);
    // The promise is settled synchronously, before any job runs.
    assert_eq!(promise.state(&agent), PromiseStateKind::Fulfilled);
    assert_eq!(promise.result(&agent), Some(Value::Undefined));
    assert_eq!(module.status(&agent), CyclicModuleRecordStatus::Evaluated);

    // Evaluating again returns the same promise.
    let again = module.evaluate(&mut agent);
    assert_eq!(again, promise);
}

#[test]
fn diamond_evaluates_in_topological_order() {
    let (host_hooks, mut agent) = test_agent();
    install_trace(&mut agent);
    let d = SourceTextModule::create(&mut agent, plain_source(vec![trace_statement("d")]));
    let b = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            body: vec![trace_statement("b")],
            requested_modules: vec!["d".to_string()],
            ..Default::default()
        },
    );
    let c = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            body: vec![trace_statement("c")],
            requested_modules: vec!["d".to_string()],
            ..Default::default()
        },
    );
    let a = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            body: vec![trace_statement("a")],
            requested_modules: vec!["b".to_string(), "c".to_string()],
            ..Default::default()
        },
    );
    host_hooks.register("b", b);
    host_hooks.register("c", c);
    host_hooks.register("d", d);
    a.link(&mut agent).unwrap();

    let promise = a.evaluate(&mut agent);
    assert_eq!(promise.state(&agent), PromiseStateKind::Fulfilled);
    // Dependencies first, each exactly once.
    assert_eq!(host_hooks.take_trace(), ["d", "b", "c", "a"]);
    for module in [a, b, c, d] {
        assert_eq!(module.status(&agent), CyclicModuleRecordStatus::Evaluated);
    }
}

#[test]
fn local_export_is_readable_through_the_namespace() {
    let (_, mut agent) = test_agent();
    let module = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            body: vec![
                let_declaration("answer", number(42.0)),
                let_declaration("greeting", string("hi")),
            ],
            local_export_entries: vec![
                ast::ExportEntry::local("answer", "answer"),
                ast::ExportEntry::local("greeting", "greeting"),
            ],
            ..Default::default()
        },
    );
    module.link(&mut agent).unwrap();
    module.evaluate(&mut agent);

    let namespace = get_module_namespace(&mut agent, module);
    // Exports are sorted by code unit order.
    let names: Vec<&str> = namespace
        .exports(&agent)
        .iter()
        .map(|name| name.as_str(&agent))
        .collect();
    assert_eq!(names, ["answer", "greeting"]);

    let answer = JsString::from_str(&mut agent, "answer");
    assert_eq!(namespace.get(&mut agent, answer), Ok(Value::Number(42.0)));
    let missing = JsString::from_str(&mut agent, "missing");
    assert_eq!(namespace.get(&mut agent, missing), Ok(Value::Undefined));
}

#[test]
fn import_binding_reads_the_exporting_modules_binding() {
    let (host_hooks, mut agent) = test_agent();
    let result = install_result_object(&mut agent, "result");
    let provider = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            body: vec![let_declaration("value", number(7.0))],
            local_export_entries: vec![ast::ExportEntry::local("value", "value")],
            ..Default::default()
        },
    );
    let consumer = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            body: vec![member_assignment("result", "seen", ident("value"))],
            requested_modules: vec!["provider".to_string()],
            import_entries: vec![import_entry("provider", "value", "value")],
            ..Default::default()
        },
    );
    host_hooks.register("provider", provider);
    consumer.link(&mut agent).unwrap();
    let promise = consumer.evaluate(&mut agent);
    assert_eq!(promise.state(&agent), PromiseStateKind::Fulfilled);

    let seen = JsString::from_str(&mut agent, "seen");
    assert_eq!(result.get(&agent, seen), Some(Value::Number(7.0)));
}

#[test]
fn namespace_import_binds_the_namespace_object() {
    let (host_hooks, mut agent) = test_agent();
    let result = install_result_object(&mut agent, "result");
    let provider = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            body: vec![let_declaration("value", number(3.0))],
            local_export_entries: vec![ast::ExportEntry::local("value", "value")],
            ..Default::default()
        },
    );
    // import * as ns from "provider"; result.seen = ns.value;
    let consumer = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            body: vec![member_assignment(
                "result",
                "seen",
                ast::Expression::Member {
                    object: Box::new(ident("ns")),
                    property: "value".to_string(),
                    span: span(),
                },
            )],
            requested_modules: vec!["provider".to_string()],
            import_entries: vec![namespace_import_entry("provider", "ns")],
            ..Default::default()
        },
    );
    host_hooks.register("provider", provider);
    consumer.link(&mut agent).unwrap();
    let promise = consumer.evaluate(&mut agent);
    assert_eq!(promise.state(&agent), PromiseStateKind::Fulfilled);

    let seen = JsString::from_str(&mut agent, "seen");
    assert_eq!(result.get(&agent, seen), Some(Value::Number(3.0)));
}

#[test]
fn throwing_module_rejects_and_remembers_the_error() {
    let (_, mut agent) = test_agent();
    let module = SourceTextModule::create(
        &mut agent,
        plain_source(vec![throw_statement(string("boom"))]),
    );
    module.link(&mut agent).unwrap();

    let promise = module.evaluate(&mut agent);
    assert_eq!(promise.state(&agent), PromiseStateKind::Rejected);
    let boom = JsString::from_str(&mut agent, "boom");
    assert_eq!(promise.result(&agent), Some(Value::String(boom)));
    assert_eq!(module.status(&agent), CyclicModuleRecordStatus::Evaluated);
    assert_eq!(module.evaluation_error(&agent), Some(Value::String(boom)));

    // The evaluation error is remembered: evaluating again returns the same
    // rejected promise.
    let again = module.evaluate(&mut agent);
    assert_eq!(again, promise);
}

#[test]
fn dependency_error_rejects_the_importer() {
    let (host_hooks, mut agent) = test_agent();
    install_trace(&mut agent);
    let failing = SourceTextModule::create(
        &mut agent,
        plain_source(vec![throw_statement(string("boom"))]),
    );
    let importer = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            body: vec![trace_statement("importer")],
            requested_modules: vec!["failing".to_string()],
            ..Default::default()
        },
    );
    host_hooks.register("failing", failing);
    importer.link(&mut agent).unwrap();

    let promise = importer.evaluate(&mut agent);
    assert_eq!(promise.state(&agent), PromiseStateKind::Rejected);
    let boom = JsString::from_str(&mut agent, "boom");
    assert_eq!(promise.result(&agent), Some(Value::String(boom)));
    // The importer's body never ran.
    assert!(host_hooks.take_trace().is_empty());
    assert_eq!(failing.evaluation_error(&agent), Some(Value::String(boom)));
    assert_eq!(importer.evaluation_error(&agent), Some(Value::String(boom)));
}

#[test]
fn module_functions_execute_with_module_scope() {
    let (_, mut agent) = test_agent();
    let result = install_result_object(&mut agent, "result");
    // let base = 40; function add() { return base + 2; } result.sum = add();
    let module = SourceTextModule::create(
        &mut agent,
        plain_source(vec![
            let_declaration("base", number(40.0)),
            ast::Statement::FunctionDeclaration {
                name: "add".to_string(),
                params: vec![],
                body: vec![ast::Statement::Return {
                    argument: Some(ast::Expression::Binary {
                        operator: ast::BinaryOperator::Add,
                        left: Box::new(ident("base")),
                        right: Box::new(number(2.0)),
                        span: span(),
                    }),
                    span: span(),
                }],
                is_async: false,
                span: span(),
            },
            member_assignment("result", "sum", call(ident("add"), vec![])),
        ]),
    );
    module.link(&mut agent).unwrap();
    let promise = module.evaluate(&mut agent);
    assert_eq!(promise.state(&agent), PromiseStateKind::Fulfilled);

    let sum = JsString::from_str(&mut agent, "sum");
    assert_eq!(result.get(&agent, sum), Some(Value::Number(42.0)));
}

#[test]
fn import_cycle_evaluates_each_module_once() {
    let (host_hooks, mut agent) = test_agent();
    install_trace(&mut agent);
    // A and B import each other; evaluation starts at A, which runs B first.
    let a = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            body: vec![trace_statement("a")],
            requested_modules: vec!["b".to_string()],
            ..Default::default()
        },
    );
    let b = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            body: vec![trace_statement("b")],
            requested_modules: vec!["a".to_string()],
            ..Default::default()
        },
    );
    host_hooks.register("a", a);
    host_hooks.register("b", b);
    a.link(&mut agent).unwrap();

    let promise = a.evaluate(&mut agent);
    assert_eq!(promise.state(&agent), PromiseStateKind::Fulfilled);
    assert_eq!(host_hooks.take_trace(), ["b", "a"]);

    // Both modules belong to the same strongly connected component and share
    // its top-level promise.
    assert_eq!(b.evaluate(&mut agent), promise);
}
