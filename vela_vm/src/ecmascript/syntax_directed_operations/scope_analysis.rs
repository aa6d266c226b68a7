// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ### [8.2 Scope Analysis](https://tc39.es/ecma262/#sec-syntax-directed-operations-scope-analysis)

use vela_ast as ast;

/// A lexically scoped declaration of a statement list.
#[derive(Debug, Clone, Copy)]
pub(crate) enum LexicallyScopedDeclaration<'a> {
    Variable {
        name: &'a str,
        is_constant: bool,
    },
    /// Always a [`ast::Statement::FunctionDeclaration`].
    Function(&'a ast::Statement),
}

/// ### [LexicallyScopedDeclarations](https://tc39.es/ecma262/#sec-static-semantics-lexicallyscopeddeclarations)
///
/// The `let`, `const` and function declarations directly contained in the
/// statement list. Nested blocks declare their own lexical scopes.
pub(crate) fn lexically_scoped_declarations(
    statements: &[ast::Statement],
) -> Vec<LexicallyScopedDeclaration<'_>> {
    statements
        .iter()
        .filter_map(|statement| match statement {
            ast::Statement::VariableDeclaration { kind, name, .. } if kind.is_lexical() => {
                Some(LexicallyScopedDeclaration::Variable {
                    name,
                    is_constant: *kind == ast::DeclarationKind::Const,
                })
            }
            ast::Statement::FunctionDeclaration { .. } => {
                Some(LexicallyScopedDeclaration::Function(statement))
            }
            _ => None,
        })
        .collect()
}

/// ### [VarScopedDeclarations](https://tc39.es/ecma262/#sec-static-semantics-varscopeddeclarations)
///
/// The names of `var` declarations contained in the statement list,
/// descending into blocks, if and while bodies but not into function
/// bodies. Order of first occurrence.
pub(crate) fn var_scoped_declarations(statements: &[ast::Statement]) -> Vec<&str> {
    let mut names = Vec::new();
    collect_var_scoped_declarations(statements, &mut names);
    names
}

fn collect_var_scoped_declarations<'a>(statements: &'a [ast::Statement], names: &mut Vec<&'a str>) {
    for statement in statements {
        collect_var_scoped_declarations_from_statement(statement, names);
    }
}

fn collect_var_scoped_declarations_from_statement<'a>(
    statement: &'a ast::Statement,
    names: &mut Vec<&'a str>,
) {
    match statement {
        ast::Statement::VariableDeclaration {
            kind: ast::DeclarationKind::Var,
            name,
            ..
        } => names.push(name),
        ast::Statement::Block { body, .. } => collect_var_scoped_declarations(body, names),
        ast::Statement::If {
            consequent,
            alternate,
            ..
        } => {
            collect_var_scoped_declarations_from_statement(consequent, names);
            if let Some(alternate) = alternate {
                collect_var_scoped_declarations_from_statement(alternate, names);
            }
        }
        ast::Statement::While { body, .. } => {
            collect_var_scoped_declarations_from_statement(body, names);
        }
        _ => {}
    }
}
