// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared scaffolding for the integration tests: an in-memory module map
//! host and small builders for the module-goal AST.

// Each integration test binary compiles its own copy of this module and
// uses a different subset of the helpers.
#![allow(dead_code)]

use std::{any::Any, cell::RefCell, collections::HashMap};

use vela_ast as ast;
use vela_vm::ecmascript::{
    execution::{Agent, ExceptionType, HostHooks, JsResult, Options},
    scripts_and_modules::module::module_semantics::SourceTextModule,
    types::{ArgumentsList, BuiltinFunction, OrdinaryObject, Value},
};

/// Host hooks backed by an in-memory specifier → module map, plus a trace
/// log builtin functions can append to.
#[derive(Debug, Default)]
pub struct TestHostHooks {
    modules: RefCell<HashMap<String, SourceTextModule>>,
    pub trace: RefCell<Vec<String>>,
}

impl TestHostHooks {
    pub fn register(&self, specifier: &str, module: SourceTextModule) {
        self.modules
            .borrow_mut()
            .insert(specifier.to_string(), module);
    }

    pub fn take_trace(&self) -> Vec<String> {
        std::mem::take(&mut *self.trace.borrow_mut())
    }
}

impl HostHooks for TestHostHooks {
    fn resolve_imported_module(
        &self,
        agent: &mut Agent,
        _referrer: SourceTextModule,
        specifier: &str,
    ) -> JsResult<SourceTextModule> {
        match self.modules.borrow().get(specifier) {
            Some(module) => Ok(*module),
            None => {
                let error_message = format!("Failed to resolve module '{}'.", specifier);
                Err(agent.throw_exception(ExceptionType::TypeError, error_message))
            }
        }
    }

    fn get_host_data(&self) -> &dyn Any {
        self
    }
}

/// A fresh agent over leaked test host hooks. The hooks are returned as well
/// so tests can register modules and read the trace log.
pub fn test_agent() -> (&'static TestHostHooks, Agent) {
    test_agent_with_options(Options::default())
}

pub fn test_agent_with_options(options: Options) -> (&'static TestHostHooks, Agent) {
    let host_hooks: &'static TestHostHooks = Box::leak(Box::default());
    let agent = Agent::new(options, host_hooks);
    (host_hooks, agent)
}

fn trace_behaviour(agent: &mut Agent, _this: Value, args: ArgumentsList) -> JsResult<Value> {
    let Value::String(text) = args.get(0) else {
        return Err(agent.throw_exception(ExceptionType::TypeError, "trace expects a string."));
    };
    let text = text.as_str(agent).to_string();
    let host_hooks = agent
        .get_host_data()
        .downcast_ref::<TestHostHooks>()
        .unwrap();
    host_hooks.trace.borrow_mut().push(text);
    Ok(Value::Undefined)
}

/// Expose `trace(text)` to script code, appending to the host's trace log.
pub fn install_trace(agent: &mut Agent) {
    let trace = BuiltinFunction::create(agent, "trace", trace_behaviour);
    agent.set_global("trace", trace.into());
}

/// Expose a plain data object under a global binding, for scripts to write
/// observable results into.
pub fn install_result_object(agent: &mut Agent, name: &str) -> OrdinaryObject {
    let object = OrdinaryObject::create(agent);
    agent.set_global(name, Value::Object(object));
    object
}

pub fn span() -> ast::Span {
    ast::Span::default()
}

pub fn number(value: f64) -> ast::Expression {
    ast::Expression::Literal {
        value: ast::Literal::Number(value),
        span: span(),
    }
}

pub fn string(value: &str) -> ast::Expression {
    ast::Expression::Literal {
        value: ast::Literal::String(value.to_string()),
        span: span(),
    }
}

pub fn ident(name: &str) -> ast::Expression {
    ast::Expression::Identifier {
        name: name.to_string(),
        span: span(),
    }
}

pub fn call(callee: ast::Expression, arguments: Vec<ast::Expression>) -> ast::Expression {
    ast::Expression::Call {
        callee: Box::new(callee),
        arguments,
        span: span(),
    }
}

pub fn await_expression(argument: ast::Expression) -> ast::Expression {
    ast::Expression::Await {
        argument: Box::new(argument),
        span: span(),
    }
}

pub fn expression_statement(expression: ast::Expression) -> ast::Statement {
    ast::Statement::Expression {
        expression,
        span: span(),
    }
}

/// `trace("text");`
pub fn trace_statement(text: &str) -> ast::Statement {
    expression_statement(call(ident("trace"), vec![string(text)]))
}

/// `object.property = value;`
pub fn member_assignment(object: &str, property: &str, value: ast::Expression) -> ast::Statement {
    expression_statement(ast::Expression::Assignment {
        target: ast::AssignmentTarget::Member {
            object: Box::new(ident(object)),
            property: property.to_string(),
            span: span(),
        },
        value: Box::new(value),
        span: span(),
    })
}

pub fn let_declaration(name: &str, init: ast::Expression) -> ast::Statement {
    ast::Statement::VariableDeclaration {
        kind: ast::DeclarationKind::Let,
        name: name.to_string(),
        init: Some(init),
        span: span(),
    }
}

pub fn const_declaration(name: &str, init: ast::Expression) -> ast::Statement {
    ast::Statement::VariableDeclaration {
        kind: ast::DeclarationKind::Const,
        name: name.to_string(),
        init: Some(init),
        span: span(),
    }
}

pub fn throw_statement(argument: ast::Expression) -> ast::Statement {
    ast::Statement::Throw {
        argument,
        span: span(),
    }
}

pub fn import_entry(module_request: &str, import_name: &str, local_name: &str) -> ast::ImportEntry {
    ast::ImportEntry {
        module_request: module_request.to_string(),
        import_name: ast::ImportName::Name(import_name.to_string()),
        local_name: local_name.to_string(),
    }
}

pub fn namespace_import_entry(module_request: &str, local_name: &str) -> ast::ImportEntry {
    ast::ImportEntry {
        module_request: module_request.to_string(),
        import_name: ast::ImportName::Namespace,
        local_name: local_name.to_string(),
    }
}

/// A module source with no imports or exports.
pub fn plain_source(body: Vec<ast::Statement>) -> ast::ModuleSource {
    ast::ModuleSource {
        body,
        ..Default::default()
    }
}
