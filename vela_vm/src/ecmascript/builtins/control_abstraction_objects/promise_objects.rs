// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod promise_abstract_operations;

use crate::ecmascript::{
    builtins::promise::{data::PromiseState, Promise},
    execution::{
        agent::PromiseRejectionTrackerOperation,
        Agent,
    },
    types::Value,
};

use self::promise_abstract_operations::{
    promise_capability_records::PromiseCapability,
    promise_jobs::new_promise_reaction_job,
    promise_reaction_records::{
        PromiseReaction, PromiseReactionHandler, PromiseReactionRecord, PromiseReactionType,
    },
};
use crate::heap::CreateHeapData;

/// ### [27.2.5.4.1 PerformPromiseThen ( promise, onFulfilled, onRejected \[ , resultCapability \] )](https://tc39.es/ecma262/#sec-performpromisethen)
///
/// Enqueues reactions on `promise`. If the promise is already settled, the
/// matching reaction job is scheduled immediately onto the continuation
/// queue; it runs only when the queue is drained.
pub(crate) fn inner_promise_then(
    agent: &mut Agent,
    promise: Promise,
    on_fulfilled: PromiseReactionHandler,
    on_rejected: PromiseReactionHandler,
    result_capability: Option<PromiseCapability>,
) {
    // 3. Let fulfillReaction be the PromiseReaction Record { [[Capability]]:
    //    resultCapability, [[Type]]: fulfill, [[Handler]]: onFulfilledJobCallback }.
    let fulfill_reaction = agent.heap.create(PromiseReactionRecord {
        capability: result_capability,
        reaction_type: PromiseReactionType::Fulfill,
        handler: on_fulfilled,
    });
    // 4. Let rejectReaction be the PromiseReaction Record { [[Capability]]:
    //    resultCapability, [[Type]]: reject, [[Handler]]: onRejectedJobCallback }.
    let reject_reaction = agent.heap.create(PromiseReactionRecord {
        capability: result_capability,
        reaction_type: PromiseReactionType::Reject,
        handler: on_rejected,
    });

    match &mut agent[promise].promise_state {
        // 5. If promise.[[PromiseState]] is pending, then
        PromiseState::Pending {
            fulfill_reactions,
            reject_reactions,
            ..
        } => {
            // a. Append fulfillReaction to promise.[[PromiseFulfillReactions]].
            fulfill_reactions.push(fulfill_reaction);
            // b. Append rejectReaction to promise.[[PromiseRejectReactions]].
            reject_reactions.push(reject_reaction);
        }
        // 6. Else if promise.[[PromiseState]] is fulfilled, then
        PromiseState::Fulfilled { promise_result } => {
            // a. Let value be promise.[[PromiseResult]].
            let value = *promise_result;
            // b. Let fulfillJob be NewPromiseReactionJob(fulfillReaction, value).
            // c. Perform HostEnqueuePromiseJob(fulfillJob.[[Job]], fulfillJob.[[Realm]]).
            let fulfill_job = new_promise_reaction_job(fulfill_reaction, value);
            agent.enqueue_promise_job(fulfill_job);
        }
        // 7. Else,
        PromiseState::Rejected {
            promise_result,
            is_handled,
        } => {
            // a. Assert: The value of promise.[[PromiseState]] is rejected.
            // b. Let reason be promise.[[PromiseResult]].
            let reason = *promise_result;
            // c. If promise.[[PromiseIsHandled]] is false, perform
            //    HostPromiseRejectionTracker(promise, "handle").
            let was_handled = *is_handled;
            // 8. Set promise.[[PromiseIsHandled]] to true.
            *is_handled = true;
            if !was_handled {
                agent
                    .host_hooks
                    .promise_rejection_tracker(promise, PromiseRejectionTrackerOperation::Handle);
            }
            // d. Let rejectJob be NewPromiseReactionJob(rejectReaction, reason).
            // e. Perform HostEnqueuePromiseJob(rejectJob.[[Job]], rejectJob.[[Realm]]).
            let reject_job = new_promise_reaction_job(reject_reaction, reason);
            agent.enqueue_promise_job(reject_job);
        }
    }
}

/// ### [27.2.1.4 FulfillPromise ( promise, value )](https://tc39.es/ecma262/#sec-fulfillpromise)
pub(crate) fn fulfill_promise(agent: &mut Agent, promise: Promise, value: Value) {
    // 1. Assert: The value of promise.[[PromiseState]] is pending.
    // 2. Let reactions be promise.[[PromiseFulfillReactions]].
    let promise_state = &mut agent[promise].promise_state;
    let reactions = match promise_state {
        PromiseState::Pending {
            fulfill_reactions, ..
        } => core::mem::take(fulfill_reactions),
        _ => unreachable!(),
    };
    // 3. Set promise.[[PromiseResult]] to value.
    // 4. Set promise.[[PromiseFulfillReactions]] to undefined.
    // 5. Set promise.[[PromiseRejectReactions]] to undefined.
    // 6. Set promise.[[PromiseState]] to fulfilled.
    *promise_state = PromiseState::Fulfilled {
        promise_result: value,
    };
    // 7. Perform TriggerPromiseReactions(reactions, value).
    trigger_promise_reactions(agent, reactions, value);
}

/// ### [27.2.1.7 RejectPromise ( promise, reason )](https://tc39.es/ecma262/#sec-rejectpromise)
pub(crate) fn reject_promise(agent: &mut Agent, promise: Promise, reason: Value) {
    // 1. Assert: The value of promise.[[PromiseState]] is pending.
    // 2. Let reactions be promise.[[PromiseRejectReactions]].
    let promise_state = &mut agent[promise].promise_state;
    let reactions = match promise_state {
        PromiseState::Pending {
            reject_reactions, ..
        } => core::mem::take(reject_reactions),
        _ => unreachable!(),
    };
    // 3. Set promise.[[PromiseResult]] to reason.
    // 4. Set promise.[[PromiseFulfillReactions]] to undefined.
    // 5. Set promise.[[PromiseRejectReactions]] to undefined.
    // 6. Set promise.[[PromiseState]] to rejected.
    // NOTE: [[PromiseIsHandled]] for pending promises corresponds to whether
    // [[PromiseRejectReactions]] is not empty.
    let is_handled = !reactions.is_empty();
    *promise_state = PromiseState::Rejected {
        promise_result: reason,
        is_handled,
    };
    // 7. If promise.[[PromiseIsHandled]] is false, perform
    //    HostPromiseRejectionTracker(promise, "reject").
    if !is_handled {
        agent
            .host_hooks
            .promise_rejection_tracker(promise, PromiseRejectionTrackerOperation::Reject);
    }
    // 8. Perform TriggerPromiseReactions(reactions, reason).
    trigger_promise_reactions(agent, reactions, reason);
}

/// ### [27.2.1.8 TriggerPromiseReactions ( reactions, argument )](https://tc39.es/ecma262/#sec-triggerpromisereactions)
fn trigger_promise_reactions(agent: &mut Agent, reactions: Vec<PromiseReaction>, argument: Value) {
    // 1. For each element reaction of reactions, do
    for reaction in reactions {
        // a. Let job be NewPromiseReactionJob(reaction, argument).
        let job = new_promise_reaction_job(reaction, argument);
        // b. Perform HostEnqueuePromiseJob(job.[[Job]], job.[[Realm]]).
        agent.enqueue_promise_job(job);
    }
    // 2. Return unused.
}
