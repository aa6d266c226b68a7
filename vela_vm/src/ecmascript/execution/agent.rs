// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ### [9.7 Agents](https://tc39.es/ecma262/#sec-agents)

use std::{any::Any, collections::VecDeque};

use crate::{
    ecmascript::{
        builtins::{
            control_abstraction_objects::promise_objects::promise_abstract_operations::{
                promise_capability_records::PromiseCapability,
                promise_jobs::{PromiseReactionJob, PromiseResolveThenableJob},
            },
            promise::Promise,
        },
        execution::{
            environments::{DeclarativeEnvironment, DeclarativeEnvironmentRecord},
            execution_context::ExecutionContext,
            realm::{Realm, RealmRecord},
        },
        scripts_and_modules::module::module_semantics::source_text_module_records::SourceTextModule,
        types::{ErrorHeapData, String, Value},
    },
    heap::{CreateHeapData, Heap},
};

#[derive(Debug, Default, Clone, Copy)]
pub struct Options {
    /// Disables build-time statement resolution so that every statement is
    /// observably executed.
    pub debug_mode: bool,
    /// Prints module graph state transitions to stderr.
    pub print_internals: bool,
}

pub type JsResult<T> = std::result::Result<T, JsError>;

/// A throw completion's value: the JavaScript value that was thrown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JsError(Value);

impl JsError {
    pub(crate) fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(self) -> Value {
        self.0
    }

    pub fn message(self, agent: &Agent) -> std::string::String {
        match self.0 {
            Value::Error(error) => {
                let kind = error.kind(agent).as_str();
                match error.message(agent) {
                    Some(message) => format!("{}: {}", kind, message.as_str(agent)),
                    None => kind.to_owned(),
                }
            }
            Value::String(string) => string.as_str(agent).to_owned(),
            other => format!("{:?}", other),
        }
    }
}

/// ### [The TypeError, RangeError, ... constructors](https://tc39.es/ecma262/#sec-error-objects)
///
/// The realm error constructors this core distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionType {
    Error,
    RangeError,
    ReferenceError,
    SyntaxError,
    TypeError,
}

impl ExceptionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ExceptionType::Error => "Error",
            ExceptionType::RangeError => "RangeError",
            ExceptionType::ReferenceError => "ReferenceError",
            ExceptionType::SyntaxError => "SyntaxError",
            ExceptionType::TypeError => "TypeError",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseRejectionTrackerOperation {
    Reject,
    Handle,
}

/// The host-provided capabilities the module and evaluation core consumes.
pub trait HostHooks: std::fmt::Debug {
    /// ### [HostLoadImportedModule-like resolution](https://tc39.es/ecma262/#sec-HostLoadImportedModule)
    ///
    /// Resolve `specifier` relative to `referrer` and return the module
    /// record it denotes. The host must return the same module instance for
    /// the same (referrer, specifier) pair each time; the engine additionally
    /// memoizes successful resolutions in the referrer's `[[LoadedModules]]`.
    /// A resolution failure must be reported as a throw whose value the
    /// engine can surface, typically a `TypeError`.
    fn resolve_imported_module(
        &self,
        agent: &mut Agent,
        referrer: SourceTextModule,
        specifier: &str,
    ) -> JsResult<SourceTextModule>;

    /// ### [27.2.1.9 HostPromiseRejectionTracker ( promise, operation )](https://tc39.es/ecma262/#sec-host-promise-rejection-tracker)
    ///
    /// Called with `Reject` when a promise is rejected without any handlers,
    /// and with `Handle` when a handler is first added to an already rejected
    /// promise. The default implementation does nothing.
    fn promise_rejection_tracker(
        &self,
        _promise: Promise,
        _operation: PromiseRejectionTrackerOperation,
    ) {
    }

    fn get_host_data(&self) -> &dyn Any;
}

/// A job enqueued onto the agent's continuation queue.
#[derive(Debug)]
pub(crate) struct Job {
    pub(crate) inner: InnerJob,
}

#[derive(Debug)]
pub(crate) enum InnerJob {
    PromiseReaction(PromiseReactionJob),
    PromiseResolveThenable(PromiseResolveThenableJob),
}

impl Job {
    pub(crate) fn run(self, agent: &mut Agent) {
        match self.inner {
            InnerJob::PromiseReaction(job) => job.run(agent),
            InnerJob::PromiseResolveThenable(job) => job.run(agent),
        }
    }
}

/// ### [9.7 Agents](https://tc39.es/ecma262/#sec-agents)
///
/// The engine instance: owns the heap, the execution context stack and the
/// continuation queue. All promise reactions and module continuations run on
/// the thread the agent was created on; hosts bridging in from other threads
/// must marshal onto the agent's thread first. Touching the continuation
/// queue from any other thread fails the affinity check.
#[derive(Debug)]
pub struct Agent {
    pub(crate) heap: Heap,
    pub(crate) options: Options,
    pub(crate) host_hooks: &'static dyn HostHooks,
    pub(crate) execution_context_stack: Vec<ExecutionContext>,
    /// The single FIFO continuation queue promise reactions are enqueued
    /// onto. Reactions never run synchronously inside resolve/reject; they
    /// run when the queue is drained.
    pub(crate) job_queue: VecDeque<Job>,
    /// ### IncrementModuleAsyncEvaluationCount ( )
    ///
    /// The running count backing `[[AsyncEvaluationOrder]]` assignment.
    pub(crate) module_async_evaluation_count: u32,
    current_realm: Realm,
    /// The thread the agent was created on. The continuation queue may only
    /// be touched from this thread.
    thread_id: std::thread::ThreadId,
}

impl Agent {
    pub fn new(options: Options, host_hooks: &'static dyn HostHooks) -> Self {
        let mut heap = Heap::new();
        let global_env = heap.create(DeclarativeEnvironmentRecord::new(None));
        let current_realm = heap.create(RealmRecord { global_env });
        Self {
            heap,
            options,
            host_hooks,
            execution_context_stack: Vec::new(),
            job_queue: VecDeque::new(),
            module_async_evaluation_count: 0,
            current_realm,
            thread_id: std::thread::current().id(),
        }
    }

    /// The Realm of the running execution context, or the agent's default
    /// realm when no code is running.
    pub fn current_realm(&self) -> Realm {
        self.execution_context_stack
            .last()
            .map_or(self.current_realm, |context| context.realm)
    }

    /// The host data exposed by the agent's [`HostHooks`], for builtin
    /// functions that need to reach back into host state.
    pub fn get_host_data(&self) -> &dyn Any {
        self.host_hooks.get_host_data()
    }

    pub(crate) fn global_env(&self) -> DeclarativeEnvironment {
        self[self.current_realm].global_env
    }

    /// Seed or overwrite a binding in the realm's global environment. This is
    /// the embedder's hook for exposing host values to script code.
    pub fn set_global(&mut self, name: &str, value: Value) {
        let name = String::from_str(self, name);
        let env = self.global_env();
        if env.has_binding(self, name) {
            env.set_mutable_binding(self, name, value, true)
                .expect("Global binding is immutable");
        } else {
            env.create_mutable_binding(self, name);
            env.initialize_binding(self, name, value);
        }
    }

    pub fn get_global(&mut self, name: &str) -> Option<Value> {
        let name = String::from_str(self, name);
        let env = self.global_env();
        if env.has_binding(self, name) {
            Some(
                env.get_binding_value(self, name, true)
                    .expect("Global binding is uninitialized"),
            )
        } else {
            None
        }
    }

    /// ### [5.2.3.2 Throw an Exception](https://tc39.es/ecma262/#sec-throw-an-exception)
    pub fn throw_exception(
        &mut self,
        kind: ExceptionType,
        message: impl Into<std::string::String>,
    ) -> JsError {
        let message = String::from_string(self, message.into());
        let error = self.heap.create(ErrorHeapData {
            kind,
            message: Some(message),
        });
        JsError(Value::Error(error))
    }

    pub(crate) fn running_execution_context(&self) -> &ExecutionContext {
        self.execution_context_stack
            .last()
            .expect("Execution context stack is empty")
    }

    pub(crate) fn push_execution_context(&mut self, context: ExecutionContext) {
        self.execution_context_stack.push(context);
    }

    pub(crate) fn pop_execution_context(&mut self) -> ExecutionContext {
        self.execution_context_stack
            .pop()
            .expect("Execution context stack is empty")
    }

    /// ### [HostEnqueuePromiseJob ( job, realm )](https://tc39.es/ecma262/#sec-hostenqueuepromisejob)
    ///
    /// Jobs are appended to the agent's FIFO continuation queue: ordering
    /// within one promise's reactions follows registration order, and across
    /// promises follows settlement order.
    pub(crate) fn enqueue_promise_job(&mut self, job: Job) {
        assert_eq!(std::thread::current().id(), self.thread_id);
        self.job_queue.push_back(job);
    }

    pub fn has_pending_jobs(&self) -> bool {
        assert_eq!(std::thread::current().id(), self.thread_id);
        !self.job_queue.is_empty()
    }

    /// Drain the continuation queue, running each pending reaction in FIFO
    /// order. Jobs enqueued while draining are run as well.
    pub fn run_jobs(&mut self) {
        assert_eq!(std::thread::current().id(), self.thread_id);
        while let Some(job) = self.job_queue.pop_front() {
            job.run(self);
        }
    }

    /// Create a promise together with its resolving functions, for bridging
    /// external asynchronous completion into the engine. Settling the
    /// capability only enqueues reactions; call [`Agent::run_jobs`] to run
    /// them.
    pub fn register_promise(&mut self) -> PromiseCapability {
        PromiseCapability::new(self)
    }

    /// ### IncrementModuleAsyncEvaluationCount ( )
    ///
    /// Returns the value of the async evaluation counter and increments it.
    pub(crate) fn increment_module_async_evaluation_count(&mut self) -> u32 {
        let count = self.module_async_evaluation_count;
        self.module_async_evaluation_count += 1;
        count
    }
}
