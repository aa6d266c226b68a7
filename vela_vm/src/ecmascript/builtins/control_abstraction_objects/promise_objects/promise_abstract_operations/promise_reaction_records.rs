// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::ops::{Index, IndexMut};

use crate::{
    ecmascript::{
        builtins::control_abstraction_objects::async_function_objects::await_reaction::AwaitReactionIdentifier,
        execution::Agent,
        scripts_and_modules::module::module_semantics::source_text_module_records::SourceTextModule,
    },
    heap::{indexes::BaseIndex, CreateHeapData, Heap},
};

use super::promise_capability_records::PromiseCapability;

/// ### [\[\[Type]]](https://tc39.es/ecma262/#table-promisereaction-records)
///
/// fulfill or reject. Used when \[\[Handler]] is empty to allow for
/// behaviour specific to the settlement type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PromiseReactionType {
    Fulfill,
    Reject,
}

/// ### [\[\[Handler]]](https://tc39.es/ecma262/#table-promisereaction-records)
///
/// The continuation that should be applied to the incoming value. In this
/// engine the handlers are never JavaScript functions: they are either empty
/// (pass-through to the reaction's capability), an await continuation, or
/// the async module driver.
#[derive(Debug, Clone, Copy)]
pub(crate) enum PromiseReactionHandler {
    Empty,
    /// Resume a suspended async function activation or async module body.
    Await(AwaitReactionIdentifier),
    /// Drive a module waiting on its asynchronous execution: fan into
    /// AsyncModuleExecutionFulfilled or AsyncModuleExecutionRejected.
    AsyncModule(SourceTextModule),
}

/// ### [27.2.1.2 PromiseReaction Records](https://tc39.es/ecma262/#sec-promisereaction-records)
#[derive(Debug, Clone, Copy)]
pub(crate) struct PromiseReactionRecord {
    /// \[\[Capability]]
    ///
    /// The capabilities of the promise for which this record provides a
    /// reaction handler, or undefined.
    pub(crate) capability: Option<PromiseCapability>,
    /// \[\[Type]]
    pub(crate) reaction_type: PromiseReactionType,
    /// \[\[Handler]]
    pub(crate) handler: PromiseReactionHandler,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub(crate) struct PromiseReaction(BaseIndex<PromiseReactionRecord>);

impl PromiseReaction {
    pub(crate) const fn get_index(self) -> usize {
        self.0.into_index()
    }
}

impl Index<PromiseReaction> for Agent {
    type Output = PromiseReactionRecord;

    fn index(&self, index: PromiseReaction) -> &Self::Output {
        &self.heap.promise_reaction_records[index.get_index()]
    }
}

impl IndexMut<PromiseReaction> for Agent {
    fn index_mut(&mut self, index: PromiseReaction) -> &mut Self::Output {
        &mut self.heap.promise_reaction_records[index.get_index()]
    }
}

impl CreateHeapData<PromiseReactionRecord, PromiseReaction> for Heap {
    fn create(&mut self, data: PromiseReactionRecord) -> PromiseReaction {
        self.promise_reaction_records.push(data);
        PromiseReaction(BaseIndex::last(&self.promise_reaction_records))
    }
}
