// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod common;

use common::*;
use vela_ast as ast;
use vela_vm::ecmascript::{
    execution::ExceptionType,
    scripts_and_modules::module::module_semantics::{
        CyclicModuleRecordStatus, ModuleAbstractMethods, ResolveExportResult, SourceTextModule,
    },
    types::{String as JsString, Value},
};

#[test]
fn link_diamond_marks_all_linked() {
    let (host_hooks, mut agent) = test_agent();
    // A imports B and C; B and C import D.
    let d = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            body: vec![let_declaration("leaf", number(1.0))],
            local_export_entries: vec![ast::ExportEntry::local("leaf", "leaf")],
            ..Default::default()
        },
    );
    let b = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            requested_modules: vec!["d".to_string()],
            import_entries: vec![import_entry("d", "leaf", "leaf")],
            ..Default::default()
        },
    );
    let c = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            requested_modules: vec!["d".to_string()],
            import_entries: vec![import_entry("d", "leaf", "leaf")],
            ..Default::default()
        },
    );
    let a = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            requested_modules: vec!["b".to_string(), "c".to_string()],
            ..Default::default()
        },
    );
    host_hooks.register("b", b);
    host_hooks.register("c", c);
    host_hooks.register("d", d);

    a.link(&mut agent).unwrap();
    for module in [a, b, c, d] {
        assert_eq!(module.status(&agent), CyclicModuleRecordStatus::Linked);
        assert!(module.has_environment(&agent));
    }

    // Linking an already linked graph is a no-op.
    a.link(&mut agent).unwrap();
    assert_eq!(a.status(&agent), CyclicModuleRecordStatus::Linked);
}

#[test]
fn link_failure_rolls_the_stack_back_to_unlinked() {
    let (host_hooks, mut agent) = test_agent();
    // B imports a module the host cannot resolve.
    let b = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            requested_modules: vec!["missing".to_string()],
            ..Default::default()
        },
    );
    let a = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            requested_modules: vec!["b".to_string()],
            ..Default::default()
        },
    );
    host_hooks.register("b", b);

    let error = a.link(&mut agent).unwrap_err();
    let Value::Error(error) = error.value() else {
        panic!("expected an error value");
    };
    assert_eq!(error.kind(&agent), ExceptionType::TypeError);

    // Both modules were being linked; both roll back with their environments
    // cleared.
    for module in [a, b] {
        assert_eq!(module.status(&agent), CyclicModuleRecordStatus::Unlinked);
        assert!(!module.has_environment(&agent));
    }

    // A fixed graph can be relinked after the rollback.
    let missing = SourceTextModule::create(&mut agent, plain_source(vec![]));
    host_hooks.register("missing", missing);
    a.link(&mut agent).unwrap();
    assert_eq!(a.status(&agent), CyclicModuleRecordStatus::Linked);
    assert_eq!(b.status(&agent), CyclicModuleRecordStatus::Linked);
}

#[test]
fn unresolved_import_is_a_syntax_error_at_link_time() {
    let (host_hooks, mut agent) = test_agent();
    let b = SourceTextModule::create(&mut agent, plain_source(vec![]));
    let a = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            requested_modules: vec!["b".to_string()],
            import_entries: vec![import_entry("b", "nope", "nope")],
            ..Default::default()
        },
    );
    host_hooks.register("b", b);

    let error = a.link(&mut agent).unwrap_err();
    let Value::Error(error) = error.value() else {
        panic!("expected an error value");
    };
    assert_eq!(error.kind(&agent), ExceptionType::SyntaxError);
    assert_eq!(a.status(&agent), CyclicModuleRecordStatus::Unlinked);
}

#[test]
fn export_star_cycle_terminates_and_deduplicates() {
    let (host_hooks, mut agent) = test_agent();
    // A and B re-export each other; each also has a local export and a local
    // default.
    let a = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            body: vec![let_declaration("a", number(1.0))],
            requested_modules: vec!["b".to_string()],
            local_export_entries: vec![ast::ExportEntry::local("a", "a")],
            star_export_entries: vec![ast::ExportEntry::star("b")],
            ..Default::default()
        },
    );
    let b = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            body: vec![
                let_declaration("b", number(2.0)),
                let_declaration("fallback", number(3.0)),
            ],
            requested_modules: vec!["a".to_string()],
            local_export_entries: vec![
                ast::ExportEntry::local("b", "b"),
                ast::ExportEntry::local("default", "fallback"),
            ],
            star_export_entries: vec![ast::ExportEntry::star("a")],
            ..Default::default()
        },
    );
    host_hooks.register("a", a);
    host_hooks.register("b", b);
    a.link(&mut agent).unwrap();

    let names = a.get_exported_names(&mut agent, &mut Vec::new());
    let names: Vec<&str> = names.iter().map(|name| name.as_str(&agent)).collect();
    // A's own exports first, then B's, minus "default", with no duplicates.
    assert_eq!(names, ["a", "b"]);
}

#[test]
fn ambiguous_star_reexport_resolves_to_ambiguous() {
    let (host_hooks, mut agent) = test_agent();
    // X and Y both export a local `foo`; Z star-exports both.
    let x = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            body: vec![let_declaration("foo", number(1.0))],
            local_export_entries: vec![ast::ExportEntry::local("foo", "foo")],
            ..Default::default()
        },
    );
    let y = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            body: vec![let_declaration("foo", number(2.0))],
            local_export_entries: vec![ast::ExportEntry::local("foo", "foo")],
            ..Default::default()
        },
    );
    let z = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            requested_modules: vec!["x".to_string(), "y".to_string()],
            star_export_entries: vec![ast::ExportEntry::star("x"), ast::ExportEntry::star("y")],
            ..Default::default()
        },
    );
    host_hooks.register("x", x);
    host_hooks.register("y", y);
    host_hooks.register("z", z);
    z.link(&mut agent).unwrap();

    let foo = JsString::from_str(&mut agent, "foo");
    assert_eq!(
        z.resolve_export(&mut agent, foo, &mut Vec::new()),
        Some(ResolveExportResult::Ambiguous)
    );
    // ResolveExport is referentially transparent.
    assert_eq!(
        z.resolve_export(&mut agent, foo, &mut Vec::new()),
        Some(ResolveExportResult::Ambiguous)
    );

    // Importing the ambiguous name is a SyntaxError at link time; the
    // importer rolls back while the already-linked Z is untouched.
    let w = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            requested_modules: vec!["z".to_string()],
            import_entries: vec![import_entry("z", "foo", "foo")],
            ..Default::default()
        },
    );
    let error = w.link(&mut agent).unwrap_err();
    let Value::Error(error) = error.value() else {
        panic!("expected an error value");
    };
    assert_eq!(error.kind(&agent), ExceptionType::SyntaxError);
    assert_eq!(w.status(&agent), CyclicModuleRecordStatus::Unlinked);
    assert_eq!(z.status(&agent), CyclicModuleRecordStatus::Linked);
}

#[test]
fn unambiguous_star_reexport_resolves_through_both_paths() {
    let (host_hooks, mut agent) = test_agent();
    // X exports foo; both Y and Z star-export X; W star-exports Y and Z. The
    // two candidate resolutions agree, so the name stays unambiguous.
    let x = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            body: vec![let_declaration("foo", number(1.0))],
            local_export_entries: vec![ast::ExportEntry::local("foo", "foo")],
            ..Default::default()
        },
    );
    let y = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            requested_modules: vec!["x".to_string()],
            star_export_entries: vec![ast::ExportEntry::star("x")],
            ..Default::default()
        },
    );
    let z = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            requested_modules: vec!["x".to_string()],
            star_export_entries: vec![ast::ExportEntry::star("x")],
            ..Default::default()
        },
    );
    let w = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            requested_modules: vec!["y".to_string(), "z".to_string()],
            star_export_entries: vec![ast::ExportEntry::star("y"), ast::ExportEntry::star("z")],
            ..Default::default()
        },
    );
    host_hooks.register("x", x);
    host_hooks.register("y", y);
    host_hooks.register("z", z);
    w.link(&mut agent).unwrap();

    let foo = JsString::from_str(&mut agent, "foo");
    let resolution = w.resolve_export(&mut agent, foo, &mut Vec::new());
    let Some(ResolveExportResult::Resolved(binding)) = resolution else {
        panic!("expected a resolved binding, got {:?}", resolution);
    };
    assert_eq!(binding.module, x);
}

#[test]
fn default_is_not_reachable_through_export_star() {
    let (host_hooks, mut agent) = test_agent();
    let inner = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            body: vec![let_declaration("value", number(1.0))],
            local_export_entries: vec![ast::ExportEntry::local("default", "value")],
            ..Default::default()
        },
    );
    let outer = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            requested_modules: vec!["inner".to_string()],
            star_export_entries: vec![ast::ExportEntry::star("inner")],
            ..Default::default()
        },
    );
    host_hooks.register("inner", inner);
    outer.link(&mut agent).unwrap();

    let default = JsString::from_str(&mut agent, "default");
    assert_eq!(outer.resolve_export(&mut agent, default, &mut Vec::new()), None);
    let names = outer.get_exported_names(&mut agent, &mut Vec::new());
    assert!(names.is_empty());
}

#[test]
fn indirect_export_resolves_to_the_providing_module() {
    let (host_hooks, mut agent) = test_agent();
    let provider = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            body: vec![let_declaration("inner", number(7.0))],
            local_export_entries: vec![ast::ExportEntry::local("inner", "inner")],
            ..Default::default()
        },
    );
    let reexporter = SourceTextModule::create(
        &mut agent,
        ast::ModuleSource {
            requested_modules: vec!["provider".to_string()],
            indirect_export_entries: vec![ast::ExportEntry::indirect(
                "outer", "provider", "inner",
            )],
            ..Default::default()
        },
    );
    host_hooks.register("provider", provider);
    reexporter.link(&mut agent).unwrap();

    let outer = JsString::from_str(&mut agent, "outer");
    let resolution = reexporter.resolve_export(&mut agent, outer, &mut Vec::new());
    let Some(ResolveExportResult::Resolved(binding)) = resolution else {
        panic!("expected a resolved binding, got {:?}", resolution);
    };
    assert_eq!(binding.module, provider);
}
