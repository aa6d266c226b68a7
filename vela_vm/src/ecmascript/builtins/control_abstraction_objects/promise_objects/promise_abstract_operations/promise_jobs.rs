// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ## [27.2.2 Promise Jobs](https://tc39.es/ecma262/#sec-promise-jobs)

use crate::ecmascript::{
    builtins::{
        control_abstraction_objects::promise_objects::inner_promise_then,
        promise::Promise,
    },
    execution::{
        agent::{InnerJob, Job, JsError},
        Agent,
    },
    scripts_and_modules::module::module_semantics::cyclic_module_records::{
        async_module_execution_fulfilled, async_module_execution_rejected,
    },
    types::Value,
};

use super::{
    promise_capability_records::PromiseCapability,
    promise_reaction_records::{PromiseReaction, PromiseReactionHandler, PromiseReactionType},
};

/// ### [27.2.2.1 NewPromiseReactionJob ( reaction, argument )](https://tc39.es/ecma262/#sec-newpromisereactionjob)
#[derive(Debug)]
pub(crate) struct PromiseReactionJob {
    reaction: PromiseReaction,
    argument: Value,
}

impl PromiseReactionJob {
    pub(crate) fn run(self, agent: &mut Agent) {
        let Self { reaction, argument } = self;
        let record = agent[reaction];
        // The following are substeps of point 1 in NewPromiseReactionJob.
        let handler_result = match record.handler {
            PromiseReactionHandler::Empty => match record.reaction_type {
                // d. i. 1. Let handlerResult be NormalCompletion(argument).
                PromiseReactionType::Fulfill => Ok(argument),
                // d. ii. 1. Let handlerResult be ThrowCompletion(argument).
                PromiseReactionType::Reject => Err(JsError::new(argument)),
            },
            PromiseReactionHandler::Await(await_reaction) => {
                // Await continuations resume the suspended activation; they
                // have no result capability of their own.
                debug_assert!(record.capability.is_none());
                await_reaction.resume(agent, record.reaction_type, argument);
                return;
            }
            PromiseReactionHandler::AsyncModule(module) => {
                debug_assert!(record.capability.is_none());
                match record.reaction_type {
                    PromiseReactionType::Fulfill => {
                        async_module_execution_fulfilled(agent, module)
                    }
                    PromiseReactionType::Reject => {
                        async_module_execution_rejected(agent, module, argument)
                    }
                }
                return;
            }
        };

        // f. If promiseCapability is undefined, then
        let Some(promise_capability) = record.capability else {
            // i. Assert: handlerResult is not an abrupt completion.
            handler_result.unwrap();
            // ii. Return empty.
            return;
        };
        match handler_result {
            // h. If handlerResult is an abrupt completion, then
            // i. Return ? Call(promiseCapability.[[Reject]], undefined, « handlerResult.[[Value]] »).
            Err(err) => promise_capability.reject(agent, err.value()),
            // i. Else,
            // i. Return ? Call(promiseCapability.[[Resolve]], undefined, « handlerResult.[[Value]] »).
            Ok(value) => promise_capability.resolve(agent, value),
        }
    }
}

/// ### [27.2.2.1 NewPromiseReactionJob ( reaction, argument )](https://tc39.es/ecma262/#sec-newpromisereactionjob)
pub(crate) fn new_promise_reaction_job(reaction: PromiseReaction, argument: Value) -> Job {
    Job {
        inner: InnerJob::PromiseReaction(PromiseReactionJob { reaction, argument }),
    }
}

/// ### [27.2.2.2 NewPromiseResolveThenableJob ( promiseToResolve, thenable, then )](https://tc39.es/ecma262/#sec-newpromiseresolvethenablejob)
///
/// The only thenables in this engine are built-in promises, so adopting the
/// thenable's state reduces to a then-call with pass-through reactions that
/// settle `promise_to_resolve`.
#[derive(Debug)]
pub(crate) struct PromiseResolveThenableJob {
    promise_to_resolve: Promise,
    thenable: Promise,
}

impl PromiseResolveThenableJob {
    pub(crate) fn run(self, agent: &mut Agent) {
        let Self {
            promise_to_resolve,
            thenable,
        } = self;
        // a. Let resolvingFunctions be CreateResolvingFunctions(promiseToResolve).
        let promise_capability = PromiseCapability::from_promise(promise_to_resolve, false);
        // b. Let thenCallResult be Completion(HostCallJobCallback(then,
        //    thenable, « resolvingFunctions.[[Resolve]], resolvingFunctions.[[Reject]] »)).
        inner_promise_then(
            agent,
            thenable,
            PromiseReactionHandler::Empty,
            PromiseReactionHandler::Empty,
            Some(promise_capability),
        );
    }
}

pub(crate) fn new_promise_resolve_thenable_job(
    promise_to_resolve: Promise,
    thenable: Promise,
) -> Job {
    Job {
        inner: InnerJob::PromiseResolveThenable(PromiseResolveThenableJob {
            promise_to_resolve,
            thenable,
        }),
    }
}
