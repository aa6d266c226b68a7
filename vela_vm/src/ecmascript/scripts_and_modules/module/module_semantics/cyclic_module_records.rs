// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ## [16.2.1.6 Cyclic Module Records](https://tc39.es/ecma262/#sec-cyclic-module-records)

use ahash::AHashMap;

use crate::ecmascript::{
    builtins::control_abstraction_objects::promise_objects::{
        inner_promise_then,
        promise_abstract_operations::{
            promise_capability_records::PromiseCapability,
            promise_reaction_records::PromiseReactionHandler,
        },
    },
    execution::{Agent, JsError, JsResult},
    types::{String, Value},
};

use super::source_text_module_records::{
    get_imported_module, get_imported_module_cached, SourceTextModule,
};

/// ### \[\[Status]]
///
/// Transitions to linking, linked, evaluating, possibly evaluating-async,
/// evaluated (in that order) as the module progresses throughout its
/// lifecycle, with a single backwards transition: linking rolls back to
/// unlinked when linking of the graph fails. evaluating-async indicates this
/// module is queued to execute on completion of its asynchronous
/// dependencies or it is a module whose \[\[HasTLA]] field is true that has
/// been executed and is pending top-level completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclicModuleRecordStatus {
    Unlinked,
    Linking,
    Linked,
    Evaluating,
    EvaluatingAsync,
    Evaluated,
}

#[derive(Debug)]
pub(crate) struct CyclicModuleRecord {
    /// ### [\[\[Status]]](CyclicModuleRecordStatus)
    pub(super) status: CyclicModuleRecordStatus,
    /// ### \[\[EvaluationError]]
    ///
    /// A throw completion representing the exception that occurred during
    /// evaluation. Once present, it is remembered forever and re-surfaced by
    /// every later evaluation request.
    pub(super) evaluation_error: Option<JsError>,
    /// ### \[\[DFSIndex]]
    ///
    /// Auxiliary field used during Link and Evaluate only: the point at
    /// which the module was first visited during the depth-first traversal
    /// of the dependency graph.
    pub(super) dfs_index: Option<u32>,
    /// ### \[\[DFSAncestorIndex]]
    ///
    /// Auxiliary field used during Link and Evaluate only: either the
    /// module's own \[\[DFSIndex]] or that of an "earlier" module in the
    /// same strongly connected component.
    pub(super) dfs_ancestor_index: Option<u32>,
    /// ### \[\[RequestedModules]]
    ///
    /// The unique module specifier strings used by this module to request
    /// the importation of a module, in source text occurrence order.
    pub(super) requested_modules: Box<[String]>,
    /// ### \[\[LoadedModules]]
    ///
    /// A map from the specifier strings used by this module to the resolved
    /// Module Record, memoizing the host's resolver.
    pub(super) loaded_modules: AHashMap<String, SourceTextModule>,
    /// ### \[\[CycleRoot]]
    ///
    /// The first visited module of the cycle, the root DFS ancestor of the
    /// strongly connected component. For a module not in a cycle, this is
    /// the module itself.
    pub(super) cycle_root: Option<SourceTextModule>,
    /// ### \[\[HasTLA]]
    ///
    /// Whether this module is individually asynchronous, because its body
    /// contains a top-level await. Having an asynchronous dependency does
    /// not mean this field is true. This field must not change after the
    /// module is parsed.
    pub(super) has_tla: bool,
    /// ### \[\[AsyncEvaluation]]
    ///
    /// Whether this module is either itself asynchronous or has an
    /// asynchronous dependency.
    pub(super) async_evaluation: bool,
    /// ### \[\[AsyncEvaluationOrder]]
    ///
    /// Set when \[\[AsyncEvaluation]] transitions to true; determines the
    /// order in which execution of pending modules is queued by
    /// AsyncModuleExecutionFulfilled.
    pub(super) async_eval_order: Option<u32>,
    /// ### \[\[TopLevelCapability]]
    ///
    /// If this module is the \[\[CycleRoot]] of some cycle, and Evaluate()
    /// was called on some module in that cycle, this field contains the
    /// PromiseCapability Record for that entire evaluation. It is used to
    /// settle the Promise object that is returned from Evaluate().
    pub(super) top_level_capability: Option<PromiseCapability>,
    /// ### \[\[AsyncParentModules]]
    ///
    /// If this module or a dependency has \[\[HasTLA]] true, and execution
    /// is in progress, this tracks the parent importers of this module for
    /// the top-level execution job. These parent modules will not start
    /// executing before this module has successfully completed execution.
    pub(super) async_parent_modules: Vec<SourceTextModule>,
    /// ### \[\[PendingAsyncDependencies]]
    ///
    /// The number of asynchronous dependency modules remaining to execute
    /// for this module. A module with asynchronous dependencies is executed
    /// when this field reaches 0 and there are no execution errors.
    pub(super) pending_async_dependencies: Option<u32>,
}

impl CyclicModuleRecord {
    pub(super) fn new(has_tla: bool, requested_modules: Box<[String]>) -> Self {
        Self {
            status: CyclicModuleRecordStatus::Unlinked,
            evaluation_error: None,
            dfs_index: None,
            dfs_ancestor_index: None,
            requested_modules,
            loaded_modules: AHashMap::default(),
            cycle_root: None,
            has_tla,
            async_evaluation: false,
            async_eval_order: None,
            top_level_capability: None,
            async_parent_modules: Vec::new(),
            pending_async_dependencies: None,
        }
    }
}

/// ### [Additional Abstract Methods of Cyclic Module Records](https://tc39.es/ecma262/#table-cyclic-module-methods)
pub(crate) trait CyclicModuleAbstractMethods {
    /// ### InitializeEnvironment()
    ///
    /// Initialize the Environment Record of the module, including resolving
    /// all imported bindings.
    fn initialize_environment(self, agent: &mut Agent) -> JsResult<()>;

    /// ### ExecuteModule(\[promiseCapability])
    ///
    /// Evaluate the module's code within its execution context. If this
    /// module has true in \[\[HasTLA]], then a PromiseCapability Record is
    /// passed as an argument, and the method is expected to resolve or
    /// reject the given capability instead of throwing.
    fn execute_module(
        self,
        agent: &mut Agent,
        promise_capability: Option<PromiseCapability>,
    ) -> JsResult<()>;
}

/// ### [16.2.1.6.1.2.1 InnerModuleLinking ( module, stack, index )](https://tc39.es/ecma262/#sec-InnerModuleLinking)
///
/// Used by Link to perform the actual linking process for module, as well as
/// recursively on all other modules in the dependency graph. The stack and
/// index parameters, as well as a module's \[\[DFSIndex]] and
/// \[\[DFSAncestorIndex]] fields, keep track of the depth-first search (DFS)
/// traversal. In particular, \[\[DFSAncestorIndex]] is used to discover
/// strongly connected components (SCCs), such that all modules in an SCC
/// transition to linked together.
pub(super) fn inner_module_linking(
    agent: &mut Agent,
    module: SourceTextModule,
    stack: &mut Vec<SourceTextModule>,
    index: u32,
) -> JsResult<u32> {
    // 2. If module.[[Status]] is one of linking, linked, evaluating-async,
    //    or evaluated, return index. A module already being evaluated by an
    //    earlier graph is equally already linked.
    match module.status(agent) {
        CyclicModuleRecordStatus::Linking
        | CyclicModuleRecordStatus::Linked
        | CyclicModuleRecordStatus::Evaluating
        | CyclicModuleRecordStatus::EvaluatingAsync
        | CyclicModuleRecordStatus::Evaluated => return Ok(index),
        // 3. Assert: module.[[Status]] is unlinked.
        CyclicModuleRecordStatus::Unlinked => {}
    }
    // 4. Set module.[[Status]] to linking.
    module.set_linking(agent);
    // 5. Set module.[[DFSIndex]] to index.
    // 6. Set module.[[DFSAncestorIndex]] to index.
    module.set_dfs_index(agent, index);
    // 7. Set index to index + 1.
    let mut index = index + 1;
    // 8. Append module to stack.
    stack.push(module);
    // 9. For each ModuleRequest Record request of module.[[RequestedModules]], do
    let requested_modules = agent[module].cyclic.requested_modules.to_vec();
    for request in requested_modules {
        // a. Let requiredModule be GetImportedModule(module, request).
        let required_module = get_imported_module(agent, module, request)?;
        // b. Set index to ? InnerModuleLinking(requiredModule, stack, index).
        index = inner_module_linking(agent, required_module, stack, index)?;
        // c. i. Assert: requiredModule.[[Status]] is one of linking, linked,
        //       evaluating-async, or evaluated.
        debug_assert!(!matches!(
            required_module.status(agent),
            CyclicModuleRecordStatus::Unlinked
        ));
        // c. ii. Assert: requiredModule.[[Status]] is linking if and only if
        //        stack contains requiredModule.
        debug_assert_eq!(
            matches!(
                required_module.status(agent),
                CyclicModuleRecordStatus::Linking
            ),
            stack.contains(&required_module)
        );
        // c. iii. If requiredModule.[[Status]] is linking, then
        if matches!(
            required_module.status(agent),
            CyclicModuleRecordStatus::Linking
        ) {
            // 1. Set module.[[DFSAncestorIndex]] to
            //    min(module.[[DFSAncestorIndex]], requiredModule.[[DFSAncestorIndex]]).
            let required_ancestor = agent[required_module].cyclic.dfs_ancestor_index.unwrap();
            let record = &mut agent[module].cyclic;
            let ancestor = record.dfs_ancestor_index.unwrap();
            record.dfs_ancestor_index = Some(ancestor.min(required_ancestor));
        }
    }
    // 10. Perform ? module.InitializeEnvironment().
    module.initialize_environment(agent)?;
    // 11. Assert: module occurs exactly once in stack.
    debug_assert_eq!(stack.iter().filter(|entry| **entry == module).count(), 1);
    // 12. Assert: module.[[DFSAncestorIndex]] ≤ module.[[DFSIndex]].
    let record = &agent[module].cyclic;
    let dfs_index = record.dfs_index.unwrap();
    let ancestor_index = record.dfs_ancestor_index.unwrap();
    debug_assert!(ancestor_index <= dfs_index);
    // 13. If module.[[DFSAncestorIndex]] = module.[[DFSIndex]], then the
    //     strongly connected component is complete: seal it.
    if ancestor_index == dfs_index {
        // a-b. Pop modules off the stack until module is popped, setting
        //      each to linked.
        loop {
            let required_module = stack.pop().unwrap();
            required_module.set_linked(agent);
            if required_module == module {
                break;
            }
        }
    }
    // 14. Return index.
    Ok(index)
}

/// ### [16.2.1.6.1.3.1 InnerModuleEvaluation ( module, stack, index )](https://tc39.es/ecma262/#sec-innermoduleevaluation)
///
/// Used by Evaluate to perform the actual evaluation process for module, as
/// well as recursively on all other modules in the dependency graph. The
/// stack and index parameters, as well as module's \[\[DFSIndex]] and
/// \[\[DFSAncestorIndex]] fields, are used the same way as in
/// InnerModuleLinking.
///
/// > NOTE 1: A module is evaluating while it is being traversed by
/// > InnerModuleEvaluation. A module is evaluated on execution completion or
/// > evaluating-async during execution if its \[\[HasTLA]] field is true or
/// > if it has asynchronous dependencies.
///
/// > NOTE 2: Any modules depending on a module of an asynchronous cycle when
/// > that cycle is not evaluating will instead depend on the execution of
/// > the root of the cycle via \[\[CycleRoot]]. This ensures that the cycle
/// > state can be treated as a single strongly connected component through
/// > its root module state.
pub(super) fn inner_module_evaluation(
    agent: &mut Agent,
    module: SourceTextModule,
    stack: &mut Vec<SourceTextModule>,
    index: u32,
) -> JsResult<u32> {
    match module.status(agent) {
        // 2. If module.[[Status]] is either evaluating-async or evaluated, then
        CyclicModuleRecordStatus::EvaluatingAsync | CyclicModuleRecordStatus::Evaluated => {
            // a. If module.[[EvaluationError]] is empty, return index.
            // b. Otherwise, return ? module.[[EvaluationError]].
            return match agent[module].cyclic.evaluation_error {
                None => Ok(index),
                Some(error) => Err(error),
            };
        }
        // 3. If module.[[Status]] is evaluating, return index.
        CyclicModuleRecordStatus::Evaluating => return Ok(index),
        // 4. Assert: module.[[Status]] is linked.
        CyclicModuleRecordStatus::Linked => {}
        _ => unreachable!("InnerModuleEvaluation on a module that was never linked"),
    }
    // 5. Set module.[[Status]] to evaluating.
    module.set_evaluating(agent);
    // 6. Set module.[[DFSIndex]] to index.
    // 7. Set module.[[DFSAncestorIndex]] to index.
    module.set_dfs_index(agent, index);
    // 8. Set module.[[PendingAsyncDependencies]] to 0.
    agent[module].cyclic.pending_async_dependencies = Some(0);
    // 9. Set index to index + 1.
    let mut index = index + 1;
    // 10. Append module to stack.
    stack.push(module);
    // 11. For each ModuleRequest Record request of module.[[RequestedModules]], do
    let requested_modules = agent[module].cyclic.requested_modules.to_vec();
    for request in requested_modules {
        // a. Let requiredModule be GetImportedModule(module, request).
        let mut required_module = get_imported_module_cached(agent, module, request);
        // b. Set index to ? InnerModuleEvaluation(requiredModule, stack, index).
        index = inner_module_evaluation(agent, required_module, stack, index)?;
        // c. i. Assert: requiredModule.[[Status]] is one of evaluating,
        //       evaluating-async, or evaluated.
        // c. ii. Assert: requiredModule.[[Status]] is evaluating if and only
        //        if stack contains requiredModule.
        // c. iii. If requiredModule.[[Status]] is evaluating, then
        if matches!(
            required_module.status(agent),
            CyclicModuleRecordStatus::Evaluating
        ) {
            debug_assert!(stack.contains(&required_module));
            // 1. Set module.[[DFSAncestorIndex]] to
            //    min(module.[[DFSAncestorIndex]], requiredModule.[[DFSAncestorIndex]]).
            let required_ancestor = agent[required_module].cyclic.dfs_ancestor_index.unwrap();
            let record = &mut agent[module].cyclic;
            let ancestor = record.dfs_ancestor_index.unwrap();
            record.dfs_ancestor_index = Some(ancestor.min(required_ancestor));
        } else {
            // c. iv. Else,
            debug_assert!(!stack.contains(&required_module));
            // 1. Set requiredModule to requiredModule.[[CycleRoot]].
            required_module = agent[required_module]
                .cyclic
                .cycle_root
                .expect("Evaluated module has no cycle root");
            // 2. Assert: requiredModule.[[Status]] is either evaluating-async
            //    or evaluated.
            debug_assert!(matches!(
                required_module.status(agent),
                CyclicModuleRecordStatus::EvaluatingAsync | CyclicModuleRecordStatus::Evaluated
            ));
            // 3. If requiredModule.[[EvaluationError]] is not empty, return
            //    ? requiredModule.[[EvaluationError]].
            if let Some(error) = agent[required_module].cyclic.evaluation_error {
                return Err(error);
            }
            // v. If requiredModule is still executing asynchronously, then
            if matches!(
                required_module.status(agent),
                CyclicModuleRecordStatus::EvaluatingAsync
            ) {
                // 1. Set module.[[PendingAsyncDependencies]] to
                //    module.[[PendingAsyncDependencies]] + 1.
                *agent[module]
                    .cyclic
                    .pending_async_dependencies
                    .as_mut()
                    .unwrap() += 1;
                // 2. Append module to requiredModule.[[AsyncParentModules]].
                agent[required_module]
                    .cyclic
                    .async_parent_modules
                    .push(module);
            }
        }
    }
    // 12. If module.[[PendingAsyncDependencies]] > 0 or module.[[HasTLA]] is
    //     true, then
    let pending_async_dependencies =
        agent[module].cyclic.pending_async_dependencies.unwrap();
    if pending_async_dependencies > 0 || agent[module].cyclic.has_tla {
        // a. Assert: module.[[AsyncEvaluation]] is false and was never
        //    previously set to true.
        debug_assert!(!agent[module].cyclic.async_evaluation);
        // b. Set module.[[AsyncEvaluation]] to true and assign its order.
        // c. NOTE: The order in which modules transition to async evaluation
        //    governs the order in which their pending executions are queued
        //    by AsyncModuleExecutionFulfilled.
        agent[module].cyclic.async_evaluation = true;
        let order = agent.increment_module_async_evaluation_count();
        agent[module].cyclic.async_eval_order = Some(order);
        // d. If module.[[PendingAsyncDependencies]] = 0, perform
        //    ExecuteAsyncModule(module). Otherwise the module's body runs
        //    once its asynchronous dependencies have settled, driven by
        //    AsyncModuleExecutionFulfilled.
        if pending_async_dependencies == 0 {
            execute_async_module(agent, module);
        }
    } else {
        // 13. Else, perform ? module.ExecuteModule().
        module.execute_module(agent, None)?;
    }
    // 14. Assert: module occurs exactly once in stack.
    debug_assert_eq!(stack.iter().filter(|entry| **entry == module).count(), 1);
    // 15. Assert: module.[[DFSAncestorIndex]] ≤ module.[[DFSIndex]].
    let record = &agent[module].cyclic;
    let dfs_index = record.dfs_index.unwrap();
    let ancestor_index = record.dfs_ancestor_index.unwrap();
    debug_assert!(ancestor_index <= dfs_index);
    // 16. If module.[[DFSAncestorIndex]] = module.[[DFSIndex]], then the
    //     strongly connected component is complete: seal it.
    if ancestor_index == dfs_index {
        loop {
            // i-iii. Let requiredModule be the last element of stack; remove it.
            let required_module = stack.pop().unwrap();
            // iv. If requiredModule.[[AsyncEvaluation]] is false, set
            //     requiredModule.[[Status]] to evaluated.
            // v. Otherwise, set requiredModule.[[Status]] to evaluating-async.
            if !agent[required_module].cyclic.async_evaluation {
                required_module.set_status(agent, CyclicModuleRecordStatus::Evaluated);
            } else {
                required_module.set_status(agent, CyclicModuleRecordStatus::EvaluatingAsync);
            }
            // viii. Set requiredModule.[[CycleRoot]] to module.
            agent[required_module].cyclic.cycle_root = Some(module);
            // vii. If requiredModule and module are the same Module Record,
            //      set done to true.
            if required_module == module {
                break;
            }
        }
    }
    // 17. Return index.
    Ok(index)
}

/// ### [16.2.1.6.1.3.2 ExecuteAsyncModule ( module )](https://tc39.es/ecma262/#sec-execute-async-module)
pub(super) fn execute_async_module(agent: &mut Agent, module: SourceTextModule) {
    // 1. Assert: module.[[Status]] is either evaluating or evaluating-async.
    debug_assert!(matches!(
        module.status(agent),
        CyclicModuleRecordStatus::Evaluating | CyclicModuleRecordStatus::EvaluatingAsync
    ));
    // 2. Assert: module.[[HasTLA]] is true.
    debug_assert!(agent[module].cyclic.has_tla);
    // 3. Let capability be ! NewPromiseCapability(%Promise%).
    let capability = PromiseCapability::new(agent);
    // 4-7. The fulfilled and rejected closures capturing module are the
    //      async module driver's entry points.
    let handler = PromiseReactionHandler::AsyncModule(module);
    // 8. Perform PerformPromiseThen(capability.[[Promise]], onFulfilled, onRejected).
    inner_promise_then(agent, capability.promise(), handler, handler, None);
    // 9. Perform ! module.ExecuteModule(capability).
    module
        .execute_module(agent, Some(capability))
        .expect("ExecuteModule with a capability must not throw");
    // 10. Return unused.
}

/// ### [16.2.1.6.1.3.3 GatherAvailableAncestors ( module, execList )](https://tc39.es/ecma262/#sec-gather-available-ancestors)
///
/// When an asynchronous execution for a root module is fulfilled, this
/// function determines the list of modules which are able to synchronously
/// execute together on this completion, populating them in `exec_list`.
pub(super) fn gather_available_ancestors(
    agent: &mut Agent,
    module: SourceTextModule,
    exec_list: &mut Vec<SourceTextModule>,
) {
    // 1. For each Cyclic Module Record m of module.[[AsyncParentModules]], do
    let async_parent_modules = agent[module].cyclic.async_parent_modules.clone();
    for m in async_parent_modules {
        // a. If execList does not contain m and
        //    m.[[CycleRoot]].[[EvaluationError]] is empty, then
        let cycle_root = agent[m].cyclic.cycle_root.unwrap();
        if exec_list.contains(&m) || agent[cycle_root].cyclic.evaluation_error.is_some() {
            continue;
        }
        // i. Assert: m.[[Status]] is evaluating-async.
        debug_assert!(matches!(
            m.status(agent),
            CyclicModuleRecordStatus::EvaluatingAsync
        ));
        // ii. Assert: m.[[EvaluationError]] is empty.
        debug_assert!(agent[m].cyclic.evaluation_error.is_none());
        // iii. Assert: m.[[AsyncEvaluation]] is true.
        debug_assert!(agent[m].cyclic.async_evaluation);
        // iv. Assert: m.[[PendingAsyncDependencies]] > 0.
        debug_assert!(agent[m].cyclic.pending_async_dependencies.unwrap() > 0);
        // v. Set m.[[PendingAsyncDependencies]] to
        //    m.[[PendingAsyncDependencies]] - 1.
        let pending = agent[m].cyclic.pending_async_dependencies.as_mut().unwrap();
        *pending -= 1;
        let pending = *pending;
        // vi. If m.[[PendingAsyncDependencies]] = 0, then
        if pending == 0 {
            // 1. Append m to execList.
            exec_list.push(m);
            // 2. If m.[[HasTLA]] is false, perform
            //    GatherAvailableAncestors(m, execList).
            if !agent[m].cyclic.has_tla {
                gather_available_ancestors(agent, m, exec_list);
            }
        }
    }
    // 2. Return unused.
}

/// ### [16.2.1.6.1.3.4 AsyncModuleExecutionFulfilled ( module )](https://tc39.es/ecma262/#sec-async-module-execution-fulfilled)
pub(crate) fn async_module_execution_fulfilled(agent: &mut Agent, module: SourceTextModule) {
    // 1. If module.[[Status]] is evaluated, then
    if matches!(module.status(agent), CyclicModuleRecordStatus::Evaluated) {
        // a. Assert: module.[[EvaluationError]] is not empty.
        debug_assert!(agent[module].cyclic.evaluation_error.is_some());
        // b. Return unused.
        return;
    }
    // 2. Assert: module.[[Status]] is evaluating-async.
    debug_assert!(matches!(
        module.status(agent),
        CyclicModuleRecordStatus::EvaluatingAsync
    ));
    // 3. Assert: module.[[AsyncEvaluation]] is true.
    debug_assert!(agent[module].cyclic.async_evaluation);
    // 4. Assert: module.[[EvaluationError]] is empty.
    debug_assert!(agent[module].cyclic.evaluation_error.is_none());
    // 5-6. Set module.[[Status]] to evaluated; its async evaluation is done.
    module.set_status(agent, CyclicModuleRecordStatus::Evaluated);
    if agent.options.print_internals {
        eprintln!("[module] async execution fulfilled: {:?}", module);
    }
    // 7. If module.[[TopLevelCapability]] is not empty, then
    if let Some(capability) = agent[module].cyclic.top_level_capability {
        // a. Assert: module.[[CycleRoot]] and module are the same Module Record.
        debug_assert_eq!(agent[module].cyclic.cycle_root, Some(module));
        // b. Perform ! Call(module.[[TopLevelCapability]].[[Resolve]],
        //    undefined, « undefined »).
        capability.resolve(agent, Value::Undefined);
    }
    // 8. Let execList be a new empty List.
    let mut exec_list = Vec::new();
    // 9. Perform GatherAvailableAncestors(module, execList).
    gather_available_ancestors(agent, module, &mut exec_list);
    // 10. Let sortedExecList be a List whose elements are the elements of
    //     execList, in the order in which they had their [[AsyncEvaluation]]
    //     fields set to true in InnerModuleEvaluation.
    exec_list.sort_by_key(|m| agent[*m].cyclic.async_eval_order.unwrap());
    // 11. Assert: All elements of sortedExecList have their
    //     [[AsyncEvaluation]] field set to true,
    //     [[PendingAsyncDependencies]] field set to 0, and
    //     [[EvaluationError]] field set to empty.
    debug_assert!(exec_list.iter().all(|m| {
        agent[*m].cyclic.async_evaluation
            && agent[*m].cyclic.pending_async_dependencies == Some(0)
            && agent[*m].cyclic.evaluation_error.is_none()
    }));
    // 12. For each Cyclic Module Record m of sortedExecList, do
    for m in exec_list {
        // a. If m.[[Status]] is evaluated, then
        if matches!(m.status(agent), CyclicModuleRecordStatus::Evaluated) {
            // i. Assert: m.[[EvaluationError]] is not empty.
            debug_assert!(agent[m].cyclic.evaluation_error.is_some());
        } else if agent[m].cyclic.has_tla {
            // b. Else if m.[[HasTLA]] is true, then
            // i. Perform ExecuteAsyncModule(m).
            execute_async_module(agent, m);
        } else {
            // c. Else,
            // i. Let result be m.ExecuteModule().
            let result = m.execute_module(agent, None);
            match result {
                // ii. If result is an abrupt completion, then
                Err(error) => {
                    // 1. Perform AsyncModuleExecutionRejected(m, result.[[Value]]).
                    async_module_execution_rejected(agent, m, error.value());
                }
                // iii. Else,
                Ok(()) => {
                    // 1. Set m.[[Status]] to evaluated.
                    m.set_status(agent, CyclicModuleRecordStatus::Evaluated);
                    // 2. If m.[[TopLevelCapability]] is not empty, then
                    if let Some(capability) = agent[m].cyclic.top_level_capability {
                        // a. Assert: m.[[CycleRoot]] and m are the same
                        //    Module Record.
                        debug_assert_eq!(agent[m].cyclic.cycle_root, Some(m));
                        // b. Perform ! Call(m.[[TopLevelCapability]].[[Resolve]],
                        //    undefined, « undefined »).
                        capability.resolve(agent, Value::Undefined);
                    }
                }
            }
        }
    }
    // 13. Return unused.
}

/// ### [16.2.1.6.1.3.5 AsyncModuleExecutionRejected ( module, error )](https://tc39.es/ecma262/#sec-async-module-execution-rejected)
pub(crate) fn async_module_execution_rejected(
    agent: &mut Agent,
    module: SourceTextModule,
    error: Value,
) {
    // 1. If module.[[Status]] is evaluated, then
    if matches!(module.status(agent), CyclicModuleRecordStatus::Evaluated) {
        // a. Assert: module.[[EvaluationError]] is not empty.
        debug_assert!(agent[module].cyclic.evaluation_error.is_some());
        // b. Return unused: a module only errors once.
        return;
    }
    // 2. Assert: module.[[Status]] is evaluating-async.
    debug_assert!(matches!(
        module.status(agent),
        CyclicModuleRecordStatus::EvaluatingAsync
    ));
    // 3. Assert: module.[[AsyncEvaluation]] is true.
    debug_assert!(agent[module].cyclic.async_evaluation);
    // 4. Assert: module.[[EvaluationError]] is empty.
    debug_assert!(agent[module].cyclic.evaluation_error.is_none());
    // 5. Set module.[[EvaluationError]] to ThrowCompletion(error).
    // 6. Set module.[[Status]] to evaluated.
    agent[module].cyclic.evaluation_error = Some(JsError::new(error));
    module.set_status(agent, CyclicModuleRecordStatus::Evaluated);
    if agent.options.print_internals {
        eprintln!("[module] async execution rejected: {:?}", module);
    }
    // 7. For each Cyclic Module Record m of module.[[AsyncParentModules]], do
    let async_parent_modules = agent[module].cyclic.async_parent_modules.clone();
    for m in async_parent_modules {
        // a. Perform AsyncModuleExecutionRejected(m, error).
        async_module_execution_rejected(agent, m, error);
    }
    // 8. If module.[[TopLevelCapability]] is not empty, then
    if let Some(capability) = agent[module].cyclic.top_level_capability {
        // a. Assert: module.[[CycleRoot]] and module are the same Module Record.
        debug_assert_eq!(agent[module].cyclic.cycle_root, Some(module));
        // b. Perform ! Call(module.[[TopLevelCapability]].[[Reject]],
        //    undefined, « error »).
        capability.reject(agent, error);
    }
    // 9. Return unused.
}
