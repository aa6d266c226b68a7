// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub(crate) mod await_reaction;

use crate::{
    ecmascript::{
        builtins::control_abstraction_objects::promise_objects::{
            inner_promise_then,
            promise_abstract_operations::{
                promise_capability_records::PromiseCapability,
                promise_reaction_records::PromiseReactionHandler,
            },
        },
        execution::Agent,
        types::Value,
    },
    engine::{Executable, ExecutionResult},
};

use self::await_reaction::AwaitReaction;
use crate::heap::CreateHeapData;

/// The shared tail of [27.7.5.2 AsyncBlockStart](https://tc39.es/ecma262/#sec-asyncblockstart):
/// settle the return capability when the body completed, or park the
/// suspended activation in an await reaction when the body awaited a pending
/// promise. The running execution context is removed from the stack on every
/// path; a parked context travels with its reaction until resumption.
pub(crate) fn async_block_continuation(
    agent: &mut Agent,
    execution_result: ExecutionResult,
    executable: Executable,
    return_promise_capability: PromiseCapability,
) {
    match execution_result {
        // 2. e. If result is a normal completion, resolve with undefined.
        ExecutionResult::Normal(_) => {
            agent.pop_execution_context();
            return_promise_capability.resolve(agent, Value::Undefined);
        }
        // 2. f. Else if result is a return completion, resolve with its value.
        ExecutionResult::Return(value) => {
            agent.pop_execution_context();
            return_promise_capability.resolve(agent, value);
        }
        // 2. g. Else, result is a throw completion: reject with its value.
        ExecutionResult::Throw(error) => {
            agent.pop_execution_context();
            return_promise_capability.reject(agent, error.value());
        }
        // [27.7.5.3 Await]: park the computation keyed by the promise.
        ExecutionResult::Await {
            vm,
            awaited_promise,
        } => {
            // 8. Remove asyncContext from the execution context stack.
            let execution_context = agent.pop_execution_context();
            let reaction = agent.heap.create(AwaitReaction {
                vm: Some(vm),
                executable,
                execution_context: Some(execution_context),
                return_promise_capability,
            });
            // `handler` corresponds to the fulfilledClosure and
            // rejectedClosure functions, which resume execution at the await.
            let handler = PromiseReactionHandler::Await(reaction);
            // 7. Perform PerformPromiseThen(promise, onFulfilled, onRejected).
            inner_promise_then(agent, awaited_promise, handler, handler, None);
        }
    }
}
