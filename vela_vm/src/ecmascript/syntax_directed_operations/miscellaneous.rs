// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use vela_ast as ast;

use crate::{
    ecmascript::{
        execution::{environments::DeclarativeEnvironment, Agent},
        scripts_and_modules::module::module_semantics::source_text_module_records::SourceTextModule,
        types::{ECMAScriptFunction, ECMAScriptFunctionHeapData, String, Value},
    },
    engine::Executable,
    heap::CreateHeapData,
};

use super::{
    lexically_scoped_declarations, var_scoped_declarations, LexicallyScopedDeclaration,
};

/// ### [15.2.4 InstantiateFunctionObject](https://tc39.es/ecma262/#sec-runtime-semantics-instantiatefunctionobject)
///
/// Create the function object for a function declaration, closed over `env`.
/// The body is built once here; every call reuses the built statement list.
pub(crate) fn instantiate_function_object(
    agent: &mut Agent,
    declaration: &ast::Statement,
    env: DeclarativeEnvironment,
    module: Option<SourceTextModule>,
) -> ECMAScriptFunction {
    let ast::Statement::FunctionDeclaration {
        name,
        params,
        body,
        is_async,
        ..
    } = declaration
    else {
        unreachable!("InstantiateFunctionObject on a non-function declaration");
    };
    let executable = Executable::compile(agent, Rc::from(body.clone()));
    let name = String::from_str(agent, name);
    let params = params
        .iter()
        .map(|param| String::from_str(agent, param))
        .collect();
    let realm = agent.current_realm();
    agent.heap.create(ECMAScriptFunctionHeapData {
        name,
        params,
        executable,
        environment: env,
        realm,
        module,
        is_async: *is_async,
    })
}

/// ### [10.2.11 FunctionDeclarationInstantiation ( func, argumentsList )](https://tc39.es/ecma262/#sec-functiondeclarationinstantiation)
///
/// Hoist the declarations of a function body into its freshly created scope.
/// Parameters were already bound by the caller: a `var` redeclaring a
/// parameter name keeps the parameter's value.
pub(crate) fn function_declaration_instantiation(
    agent: &mut Agent,
    body: &[ast::Statement],
    env: DeclarativeEnvironment,
    module: Option<SourceTextModule>,
) {
    // 27. For each element n of varNames: create and initialize to undefined
    //     unless a binding (a parameter) already exists.
    for name in var_scoped_declarations(body) {
        let name = String::from_str(agent, name);
        if !env.has_binding(agent, name) {
            env.create_mutable_binding(agent, name);
            env.initialize_binding(agent, name, Value::Undefined);
        }
    }
    // 33-36. Lexical declarations are created uninitialized; function
    //        declarations are instantiated immediately.
    instantiate_lexical_declarations(agent, body, env, module);
}

/// ### [14.2.3 BlockDeclarationInstantiation ( code, env )](https://tc39.es/ecma262/#sec-blockdeclarationinstantiation)
pub(crate) fn block_declaration_instantiation(
    agent: &mut Agent,
    body: &[ast::Statement],
    env: DeclarativeEnvironment,
) {
    // `var` declarations inside the block were hoisted to the enclosing
    // function or module scope already.
    let module = agent.running_execution_context().module;
    instantiate_lexical_declarations(agent, body, env, module);
}

fn instantiate_lexical_declarations(
    agent: &mut Agent,
    body: &[ast::Statement],
    env: DeclarativeEnvironment,
    module: Option<SourceTextModule>,
) {
    for declaration in lexically_scoped_declarations(body) {
        match declaration {
            LexicallyScopedDeclaration::Variable { name, is_constant } => {
                let name = String::from_str(agent, name);
                if is_constant {
                    // i. Perform ! env.CreateImmutableBinding(dn, true).
                    env.create_immutable_binding(agent, name, true);
                } else {
                    // ii. Perform ! env.CreateMutableBinding(dn, false).
                    env.create_mutable_binding(agent, name);
                }
            }
            LexicallyScopedDeclaration::Function(declaration) => {
                let ast::Statement::FunctionDeclaration { name, .. } = declaration else {
                    unreachable!()
                };
                let name = String::from_str(agent, name);
                env.create_mutable_binding(agent, name);
                // Let fo be InstantiateFunctionObject of d with arguments
                // env and privateEnv.
                let function = instantiate_function_object(agent, declaration, env, module);
                env.initialize_binding(agent, name, function.into());
            }
        }
    }
}
