// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub(crate) mod data;

use std::ops::{Index, IndexMut};

use self::data::{PromiseHeapData, PromiseState};

use crate::{
    ecmascript::{
        execution::{Agent, JsResult},
        types::Value,
    },
    heap::{indexes::BaseIndex, CreateHeapData, Heap},
};

/// The observable state of a promise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseStateKind {
    Pending,
    Fulfilled,
    Rejected,
}

/// ### [27.2 Promise Objects](https://tc39.es/ecma262/#sec-promise-objects)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Promise(BaseIndex<PromiseHeapData>);

impl Promise {
    /// Create a new pending Promise.
    pub(crate) fn new_pending(agent: &mut Agent) -> Self {
        agent.heap.create(PromiseHeapData::default())
    }

    /// ### \[\[PromiseState]]
    pub fn state(self, agent: &Agent) -> PromiseStateKind {
        match agent[self].promise_state {
            PromiseState::Pending { .. } => PromiseStateKind::Pending,
            PromiseState::Fulfilled { .. } => PromiseStateKind::Fulfilled,
            PromiseState::Rejected { .. } => PromiseStateKind::Rejected,
        }
    }

    /// ### \[\[PromiseResult]]
    ///
    /// The settled value of the promise, or None while it is pending.
    pub fn result(self, agent: &Agent) -> Option<Value> {
        match agent[self].promise_state {
            PromiseState::Pending { .. } => None,
            PromiseState::Fulfilled { promise_result }
            | PromiseState::Rejected { promise_result, .. } => Some(promise_result),
        }
    }

    /// Get the settled result of the promise as a completion, or None if the
    /// promise is still pending.
    pub(crate) fn try_get_result(self, agent: &Agent) -> Option<JsResult<Value>> {
        match &agent[self].promise_state {
            PromiseState::Pending { .. } => None,
            PromiseState::Fulfilled { promise_result } => Some(Ok(*promise_result)),
            PromiseState::Rejected { promise_result, .. } => {
                Some(Err(crate::ecmascript::execution::JsError::new(
                    *promise_result,
                )))
            }
        }
    }

    pub(crate) fn set_is_handled(self, agent: &mut Agent) {
        if let PromiseState::Rejected { is_handled, .. } = &mut agent[self].promise_state {
            *is_handled = true;
        }
    }

    pub(crate) fn get_index(self) -> usize {
        self.0.into_index()
    }
}

impl Index<Promise> for Agent {
    type Output = PromiseHeapData;

    fn index(&self, index: Promise) -> &Self::Output {
        &self.heap.promises[index.get_index()]
    }
}

impl IndexMut<Promise> for Agent {
    fn index_mut(&mut self, index: Promise) -> &mut Self::Output {
        &mut self.heap.promises[index.get_index()]
    }
}

impl CreateHeapData<PromiseHeapData, Promise> for Heap {
    fn create(&mut self, data: PromiseHeapData) -> Promise {
        self.promises.push(data);
        Promise(BaseIndex::last(&self.promises))
    }
}
