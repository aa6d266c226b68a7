// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::ecmascript::{
    builtins::control_abstraction_objects::promise_objects::promise_abstract_operations::promise_reaction_records::PromiseReaction,
    types::Value,
};

#[derive(Debug, Default)]
pub struct PromiseHeapData {
    pub(crate) promise_state: PromiseState,
}

/// ### [\[\[PromiseState]]](https://tc39.es/ecma262/#table-internal-slots-of-promise-instances)
///
/// Once a promise leaves the pending state its result is immutable; the
/// transition is one-shot.
#[derive(Debug)]
pub(crate) enum PromiseState {
    Pending {
        /// \[\[PromiseFulfillReactions]]
        fulfill_reactions: Vec<PromiseReaction>,
        /// \[\[PromiseRejectReactions]]
        reject_reactions: Vec<PromiseReaction>,
        /// Maps the `[[AlreadyResolved]]` state of the promise's resolving
        /// functions: true when the promise has been resolved to a thenable
        /// whose settlement it is now waiting on.
        is_resolved: bool,
    },
    Fulfilled {
        /// \[\[PromiseResult]]
        promise_result: Value,
    },
    Rejected {
        /// \[\[PromiseResult]]
        promise_result: Value,
        /// \[\[PromiseIsHandled]]
        is_handled: bool,
    },
}

impl Default for PromiseState {
    fn default() -> Self {
        PromiseState::Pending {
            fulfill_reactions: Vec::new(),
            reject_reactions: Vec::new(),
            is_resolved: false,
        }
    }
}
