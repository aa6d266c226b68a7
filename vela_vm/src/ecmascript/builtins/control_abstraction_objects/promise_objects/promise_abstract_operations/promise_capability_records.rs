// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ### [27.2.1.1 PromiseCapability Records](https://tc39.es/ecma262/#sec-promisecapability-records)

use crate::ecmascript::{
    builtins::{
        control_abstraction_objects::promise_objects::{
            fulfill_promise,
            promise_abstract_operations::promise_jobs::new_promise_resolve_thenable_job,
            reject_promise,
        },
        promise::{data::PromiseState, Promise},
    },
    execution::{agent::ExceptionType, Agent},
    types::Value,
};

/// A promise capability encapsulates a promise, adding methods that are
/// capable of resolving or rejecting that promise.
///
/// NOTE: In the spec, promise capability records contain an object that is
/// usable as a promise, together with its resolve and reject functions. This
/// engine only ever supports built-in promises, so the resolve and reject
/// functions need no materialized function objects; the capability itself is
/// the pair of them, settling its promise at most once.
///
/// The `must_be_unresolved` boolean maps the `AlreadyResolved` state of a
/// pair of resolve/reject functions onto the promise state. If it is false,
/// the promise counts as already resolved if its state is Fulfilled or
/// Rejected. If true, it also counts as already resolved if it is Pending
/// with `is_resolved` set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromiseCapability {
    pub(crate) promise: Promise,
    pub(crate) must_be_unresolved: bool,
}

impl PromiseCapability {
    /// ### [27.2.1.5 NewPromiseCapability ( C )](https://tc39.es/ecma262/#sec-newpromisecapability)
    ///
    /// NOTE: This implementation doesn't take C as a parameter, since promise
    /// subclassing is not supported.
    pub fn new(agent: &mut Agent) -> Self {
        Self::from_promise(Promise::new_pending(agent), true)
    }

    pub(crate) fn from_promise(promise: Promise, must_be_unresolved: bool) -> Self {
        Self {
            promise,
            must_be_unresolved,
        }
    }

    /// ### \[\[Promise]]
    pub fn promise(&self) -> Promise {
        self.promise
    }

    fn is_already_resolved(&self, agent: &Agent) -> bool {
        // If `must_be_unresolved` is true, then `alreadyResolved` corresponds
        // with the `is_resolved` flag in PromiseState::Pending. Otherwise, it
        // corresponds to `promise_state` not being Pending.
        match agent[self.promise].promise_state {
            PromiseState::Pending { is_resolved, .. } => {
                if self.must_be_unresolved {
                    is_resolved
                } else {
                    false
                }
            }
            _ => true,
        }
    }

    fn set_already_resolved(&self, agent: &mut Agent) {
        match &mut agent[self.promise].promise_state {
            PromiseState::Pending { is_resolved, .. } => *is_resolved = true,
            _ => unreachable!(),
        }
    }

    /// ### [27.2.1.3.2 Promise Resolve Functions](https://tc39.es/ecma262/#sec-promise-resolve-functions)
    ///
    /// Settles the promise with `resolution`. A thenable resolution does not
    /// settle the promise synchronously: the promise is locked against
    /// further resolution and a job is enqueued to adopt the thenable's
    /// state. Idempotent after the first settlement.
    pub fn resolve(self, agent: &mut Agent, resolution: Value) {
        // 5. If alreadyResolved.[[Value]] is true, return undefined.
        if self.is_already_resolved(agent) {
            return;
        }
        // 6. Set alreadyResolved.[[Value]] to true.
        self.set_already_resolved(agent);

        // 7. If SameValue(resolution, promise) is true, then
        if resolution == Value::Promise(self.promise) {
            // a. Let selfResolutionError be a newly created TypeError object.
            let exception = agent.throw_exception(
                ExceptionType::TypeError,
                "Tried to resolve a promise with itself.",
            );
            // b. Perform RejectPromise(promise, selfResolutionError).
            reject_promise(agent, self.promise, exception.value());
            // c. Return undefined.
            return;
        }

        // 8. If resolution is not an Object, then
        // 12. If IsCallable(thenAction) is false, then
        // The only thenables in this engine are built-in promises.
        let Value::Promise(thenable) = resolution else {
            // a. Perform FulfillPromise(promise, resolution).
            fulfill_promise(agent, self.promise, resolution);
            // b. Return undefined.
            return;
        };

        // 14. Let job be NewPromiseResolveThenableJob(promise, resolution, thenJobCallback).
        let job = new_promise_resolve_thenable_job(self.promise, thenable);
        // 15. Perform HostEnqueuePromiseJob(job.[[Job]], job.[[Realm]]).
        agent.enqueue_promise_job(job);
        // 16. Return undefined.
    }

    /// ### [27.2.1.3.1 Promise Reject Functions](https://tc39.es/ecma262/#sec-promise-reject-functions)
    ///
    /// Rejects the promise with `reason`. Idempotent after the first
    /// settlement.
    pub fn reject(self, agent: &mut Agent, reason: Value) {
        // 5. If alreadyResolved.[[Value]] is true, return undefined.
        if self.is_already_resolved(agent) {
            return;
        }
        // 6. Set alreadyResolved.[[Value]] to true.
        // Note: rejection transitions the promise state directly; there is no
        // separate flag left to set.
        // 7. Perform RejectPromise(promise, reason).
        reject_promise(agent, self.promise, reason);
        debug_assert!(matches!(
            agent[self.promise].promise_state,
            PromiseState::Rejected { .. }
        ));
    }
}
