// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::ops::{Index, IndexMut};

use crate::{
    ecmascript::{
        builtins::control_abstraction_objects::promise_objects::{
            inner_promise_then,
            promise_abstract_operations::{
                promise_capability_records::PromiseCapability,
                promise_reaction_records::{PromiseReactionHandler, PromiseReactionType},
            },
        },
        execution::{Agent, ExecutionContext},
        types::Value,
    },
    engine::{Executable, ExecutionResult, SuspendedVm},
    heap::{indexes::BaseIndex, CreateHeapData, Heap},
};

/// A suspended async activation: an async function body or an async module
/// body parked at an `await`, together with the capability its eventual
/// completion settles.
#[derive(Debug)]
pub(crate) struct AwaitReaction {
    pub(crate) vm: Option<SuspendedVm>,
    pub(crate) executable: Executable,
    pub(crate) execution_context: Option<ExecutionContext>,
    pub(crate) return_promise_capability: PromiseCapability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub(crate) struct AwaitReactionIdentifier(BaseIndex<AwaitReaction>);

impl AwaitReactionIdentifier {
    pub(crate) fn resume(
        self,
        agent: &mut Agent,
        reaction_type: PromiseReactionType,
        value: Value,
    ) {
        // [27.7.5.3 Await ( value )](https://tc39.es/ecma262/#await)
        // 3. c. Push asyncContext onto the execution context stack;
        //    asyncContext is now the running execution context.
        let execution_context = agent[self].execution_context.take().unwrap();
        agent.push_execution_context(execution_context);

        // 3. d. Resume the suspended evaluation of asyncContext using
        //    NormalCompletion(v) as the result of the operation that
        //    suspended it.
        // 5. d. Resume the suspended evaluation of asyncContext using
        //    ThrowCompletion(reason) as the result of the operation that
        //    suspended it.
        let vm = agent[self].vm.take().unwrap();
        let executable = agent[self].executable;
        let execution_result = match reaction_type {
            PromiseReactionType::Fulfill => vm.resume(agent, executable, value),
            PromiseReactionType::Reject => vm.resume_throw(agent, executable, value),
        };

        let return_promise_capability = agent[self].return_promise_capability;
        match execution_result {
            ExecutionResult::Normal(_) => {
                // [27.7.5.2 AsyncBlockStart]
                // 2. d. Remove acAsyncContext from the execution context stack.
                agent.pop_execution_context();
                // 2. e. If result is a normal completion, then
                //    i. Perform ! Call(promiseCapability.[[Resolve]], undefined, « undefined »).
                return_promise_capability.resolve(agent, Value::Undefined);
            }
            ExecutionResult::Return(value) => {
                agent.pop_execution_context();
                // 2. f. Else if result is a return completion, then
                //    i. Perform ! Call(promiseCapability.[[Resolve]], undefined, « result.[[Value]] »).
                return_promise_capability.resolve(agent, value);
            }
            ExecutionResult::Throw(error) => {
                agent.pop_execution_context();
                // 2. g. i. Assert: result is a throw completion.
                //    ii. Perform ! Call(promiseCapability.[[Reject]], undefined, « result.[[Value]] »).
                return_promise_capability.reject(agent, error.value());
            }
            ExecutionResult::Await {
                vm,
                awaited_promise,
            } => {
                // The body awaited again: park the same reaction on the new
                // promise.
                agent[self].vm = Some(vm);
                let execution_context = agent.pop_execution_context();
                agent[self].execution_context = Some(execution_context);
                let handler = PromiseReactionHandler::Await(self);
                inner_promise_then(agent, awaited_promise, handler, handler, None);
            }
        }
    }

    pub(crate) fn get_index(self) -> usize {
        self.0.into_index()
    }
}

impl Index<AwaitReactionIdentifier> for Agent {
    type Output = AwaitReaction;

    fn index(&self, index: AwaitReactionIdentifier) -> &Self::Output {
        &self.heap.await_reactions[index.get_index()]
    }
}

impl IndexMut<AwaitReactionIdentifier> for Agent {
    fn index_mut(&mut self, index: AwaitReactionIdentifier) -> &mut Self::Output {
        &mut self.heap.await_reactions[index.get_index()]
    }
}

impl CreateHeapData<AwaitReaction, AwaitReactionIdentifier> for Heap {
    fn create(&mut self, data: AwaitReaction) -> AwaitReactionIdentifier {
        self.await_reactions.push(data);
        AwaitReactionIdentifier(BaseIndex::last(&self.await_reactions))
    }
}
