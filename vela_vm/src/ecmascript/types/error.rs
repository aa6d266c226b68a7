// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::ops::{Index, IndexMut};

use crate::{
    ecmascript::{
        execution::{agent::ExceptionType, Agent},
        types::String,
    },
    heap::{indexes::BaseIndex, CreateHeapData, Heap},
};

/// ### [20.5 Error Objects](https://tc39.es/ecma262/#sec-error-objects)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Error(BaseIndex<ErrorHeapData>);

#[derive(Debug, Clone)]
pub struct ErrorHeapData {
    pub(crate) kind: ExceptionType,
    pub(crate) message: Option<String>,
}

impl Error {
    pub fn kind(self, agent: &Agent) -> ExceptionType {
        agent[self].kind
    }

    pub fn message(self, agent: &Agent) -> Option<String> {
        agent[self].message
    }

    pub(crate) fn get_index(self) -> usize {
        self.0.into_index()
    }
}

impl Index<Error> for Agent {
    type Output = ErrorHeapData;

    fn index(&self, index: Error) -> &Self::Output {
        &self.heap.errors[index.get_index()]
    }
}

impl IndexMut<Error> for Agent {
    fn index_mut(&mut self, index: Error) -> &mut Self::Output {
        &mut self.heap.errors[index.get_index()]
    }
}

impl CreateHeapData<ErrorHeapData, Error> for Heap {
    fn create(&mut self, data: ErrorHeapData) -> Error {
        self.errors.push(data);
        Error(BaseIndex::last(&self.errors))
    }
}
