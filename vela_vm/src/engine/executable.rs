// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::{
    ops::{Index, IndexMut},
    rc::Rc,
};

use vela_ast as ast;

use crate::{
    ecmascript::{execution::Agent, types::Value},
    heap::{indexes::BaseIndex, CreateHeapData, Heap},
};

/// A statement list built for execution.
///
/// Building happens once per body; each execution starts a fresh cursor over
/// the same built list. The `Rc` body keeps the executable independent of the
/// heap borrow while a cursor is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub(crate) struct Executable(BaseIndex<ExecutableHeapData>);

#[derive(Debug)]
pub(crate) struct ExecutableHeapData {
    pub(crate) statements: Rc<[ast::Statement]>,
    /// Build-time resolved completions, per statement. A `Some` entry is
    /// reused on every execution without entering the evaluator.
    pub(crate) fast_completions: Box<[Option<FastCompletion>]>,
}

/// A statement completion that was resolved at build time: a literal at
/// statement position, or a trivial `return` of a literal.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FastCompletion {
    pub(crate) value: Value,
    pub(crate) is_return: bool,
}

impl Executable {
    /// Build a statement list for execution.
    ///
    /// Statements whose value is statically determinable are resolved here
    /// and their completion reused on every execution. In debug mode nothing
    /// is pre-resolved: every statement must be observably executed.
    pub(crate) fn compile(agent: &mut Agent, statements: Rc<[ast::Statement]>) -> Executable {
        let fast_completions = if agent.options.debug_mode {
            vec![None; statements.len()].into_boxed_slice()
        } else {
            statements
                .iter()
                .map(|statement| fast_resolve(agent, statement))
                .collect()
        };
        agent.heap.create(ExecutableHeapData {
            statements,
            fast_completions,
        })
    }

    pub(crate) fn get_index(self) -> usize {
        self.0.into_index()
    }
}

fn fast_resolve(agent: &mut Agent, statement: &ast::Statement) -> Option<FastCompletion> {
    match statement {
        ast::Statement::Expression {
            expression: ast::Expression::Literal { value, .. },
            ..
        } => Some(FastCompletion {
            value: Value::from_literal(agent, value),
            is_return: false,
        }),
        ast::Statement::Return {
            argument: Some(ast::Expression::Literal { value, .. }),
            ..
        } => Some(FastCompletion {
            value: Value::from_literal(agent, value),
            is_return: true,
        }),
        _ => None,
    }
}

impl Index<Executable> for Agent {
    type Output = ExecutableHeapData;

    fn index(&self, index: Executable) -> &Self::Output {
        &self.heap.executables[index.get_index()]
    }
}

impl IndexMut<Executable> for Agent {
    fn index_mut(&mut self, index: Executable) -> &mut Self::Output {
        &mut self.heap.executables[index.get_index()]
    }
}

impl CreateHeapData<ExecutableHeapData, Executable> for Heap {
    fn create(&mut self, data: ExecutableHeapData) -> Executable {
        self.executables.push(data);
        Executable(BaseIndex::last(&self.executables))
    }
}
