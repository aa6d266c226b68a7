// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ## [16.2.1.7 Source Text Module Records](https://tc39.es/ecma262/#sec-source-text-module-records)

use std::{
    ops::{Index, IndexMut},
    rc::Rc,
};

use ahash::AHashSet;
use vela_ast as ast;

use crate::{
    ecmascript::{
        builtins::{
            control_abstraction_objects::{
                async_function_objects::async_block_continuation,
                promise_objects::promise_abstract_operations::promise_capability_records::PromiseCapability,
            },
            module::{get_module_namespace, Module},
            promise::Promise,
        },
        execution::{
            agent::ExceptionType,
            environments::{new_module_environment, ModuleEnvironment},
            Agent, ExecutionContext, JsResult,
        },
        syntax_directed_operations::{
            instantiate_function_object, lexically_scoped_declarations, var_scoped_declarations,
            LexicallyScopedDeclaration,
        },
        types::{String, Value},
    },
    engine::{Executable, ExecutionResult, Vm},
    heap::{indexes::BaseIndex, CreateHeapData, Heap},
};

use super::{
    abstract_module_records::{
        AbstractModuleRecord, ModuleAbstractMethods, ResolveExportResult, ResolvedBinding,
        ResolvedBindingName,
    },
    cyclic_module_records::{
        inner_module_evaluation, inner_module_linking, CyclicModuleAbstractMethods,
        CyclicModuleRecord, CyclicModuleRecordStatus,
    },
};

/// ### [ImportEntry Record](https://tc39.es/ecma262/#table-importentry-record-fields)
#[derive(Debug, Clone, Copy)]
pub(crate) struct ImportEntryRecord {
    /// \[\[ModuleRequest]]
    pub(super) module_request: String,
    /// \[\[ImportName]]
    pub(super) import_name: ImportEntryName,
    /// \[\[LocalName]]
    pub(super) local_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ImportEntryName {
    Name(String),
    /// `import * as ns from "mod"`
    Namespace,
}

/// ### [ExportEntry Record](https://tc39.es/ecma262/#table-exportentry-records)
#[derive(Debug, Clone, Copy)]
pub(crate) struct ExportEntryRecord {
    /// \[\[ExportName]]
    pub(super) export_name: Option<String>,
    /// \[\[ModuleRequest]]
    pub(super) module_request: Option<String>,
    /// \[\[ImportName]]
    pub(super) import_name: Option<ExportEntryImportName>,
    /// \[\[LocalName]]
    pub(super) local_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExportEntryImportName {
    Name(String),
    /// `export * as ns from "mod"`
    Namespace,
    /// `export * from "mod"`
    All,
}

/// ### [16.2.1.7 Source Text Module Records](https://tc39.es/ecma262/#sec-source-text-module-records)
#[derive(Debug)]
pub struct SourceTextModuleRecord {
    pub(super) abstract_fields: AbstractModuleRecord,
    pub(super) cyclic: CyclicModuleRecord,
    /// ### \[\[ECMAScriptCode]]
    ///
    /// The parsed body of this module.
    pub(super) ecmascript_code: Rc<[ast::Statement]>,
    /// The built form of \[\[ECMAScriptCode]], created on first execution
    /// and reused afterwards.
    pub(super) executable: Option<Executable>,
    /// ### \[\[ImportEntries]]
    pub(super) import_entries: Box<[ImportEntryRecord]>,
    /// ### \[\[LocalExportEntries]]
    ///
    /// Export entries corresponding to declarations that occur within the
    /// module.
    pub(super) local_export_entries: Box<[ExportEntryRecord]>,
    /// ### \[\[IndirectExportEntries]]
    ///
    /// Export entries corresponding to re-exported imports, including
    /// `export * as ns` declarations.
    pub(super) indirect_export_entries: Box<[ExportEntryRecord]>,
    /// ### \[\[StarExportEntries]]
    ///
    /// Export entries corresponding to `export *` declarations, not
    /// including `export * as ns` declarations.
    pub(super) star_export_entries: Box<[ExportEntryRecord]>,
}

/// A handle to a Source Text Module Record in the agent's heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct SourceTextModule(BaseIndex<SourceTextModuleRecord>);

impl SourceTextModule {
    /// Create a Source Text Module Record from a parsed module source, in
    /// the unlinked state.
    ///
    /// This is the tail of [16.2.1.7.1 ParseModule](https://tc39.es/ecma262/#sec-parsemodule):
    /// parsing and entry classification already happened in the host's
    /// parser, so only interning and requested-module deduplication remain.
    pub fn create(agent: &mut Agent, source: ast::ModuleSource) -> SourceTextModule {
        let realm = agent.current_realm();
        // 3. Let requestedModules be the ModuleRequests of body.
        let mut seen = AHashSet::with_capacity(source.requested_modules.len());
        let mut requested_modules = Vec::with_capacity(source.requested_modules.len());
        for request in &source.requested_modules {
            let request = String::from_str(agent, request);
            if seen.insert(request) {
                requested_modules.push(request);
            }
        }
        // 4. Let importEntries be the ImportEntries of body.
        let import_entries = source
            .import_entries
            .iter()
            .map(|entry| ImportEntryRecord {
                module_request: String::from_str(agent, &entry.module_request),
                import_name: match &entry.import_name {
                    ast::ImportName::Name(name) => {
                        ImportEntryName::Name(String::from_str(agent, name))
                    }
                    ast::ImportName::Namespace => ImportEntryName::Namespace,
                },
                local_name: String::from_str(agent, &entry.local_name),
            })
            .collect();
        // 6-10. The parser classified the export entries already.
        let local_export_entries =
            intern_export_entries(agent, &source.local_export_entries);
        let indirect_export_entries =
            intern_export_entries(agent, &source.indirect_export_entries);
        let star_export_entries = intern_export_entries(agent, &source.star_export_entries);
        // 11. Let async be body Contains await.
        let has_tla = source.has_top_level_await;
        // 12. Return Source Text Module Record { ... }.
        agent.heap.create(SourceTextModuleRecord {
            abstract_fields: AbstractModuleRecord::new(realm),
            cyclic: CyclicModuleRecord::new(has_tla, requested_modules.into_boxed_slice()),
            ecmascript_code: Rc::from(source.body),
            executable: None,
            import_entries,
            local_export_entries,
            indirect_export_entries,
            star_export_entries,
        })
    }

    /// ### \[\[Status]]
    pub fn status(self, agent: &Agent) -> CyclicModuleRecordStatus {
        agent[self].cyclic.status
    }

    /// ### \[\[HasTLA]]
    pub fn has_top_level_await(self, agent: &Agent) -> bool {
        agent[self].cyclic.has_tla
    }

    /// Whether the module has a linked environment.
    pub fn has_environment(self, agent: &Agent) -> bool {
        agent[self].abstract_fields.environment.is_some()
    }

    /// ### \[\[EvaluationError]]
    pub fn evaluation_error(self, agent: &Agent) -> Option<Value> {
        agent[self].cyclic.evaluation_error.map(|error| error.value())
    }

    /// ### \[\[Environment]]
    pub(crate) fn environment(self, agent: &Agent) -> Option<ModuleEnvironment> {
        agent[self].abstract_fields.environment
    }

    /// ### \[\[Namespace]]
    pub(crate) fn namespace(self, agent: &Agent) -> Option<Module> {
        agent[self].abstract_fields.namespace
    }

    pub(crate) fn set_namespace(self, agent: &mut Agent, namespace: Module) {
        assert!(
            agent[self]
                .abstract_fields
                .namespace
                .replace(namespace)
                .is_none(),
            "Attempted to create a module's namespace object twice"
        );
    }

    /// Set \[\[DFSIndex]] and \[\[DFSAncestorIndex]] to index.
    pub(super) fn set_dfs_index(self, agent: &mut Agent, index: u32) {
        let cyclic = &mut agent[self].cyclic;
        cyclic.dfs_index = Some(index);
        cyclic.dfs_ancestor_index = Some(index);
    }

    /// Roll the module back to unlinked after a linking failure: the
    /// environment is dropped and the DFS bookkeeping reset.
    pub(super) fn set_unlinked(self, agent: &mut Agent) {
        let record = &mut agent[self];
        debug_assert!(matches!(
            record.cyclic.status,
            CyclicModuleRecordStatus::Linking
        ));
        record.cyclic.status = CyclicModuleRecordStatus::Unlinked;
        record.cyclic.dfs_index = None;
        record.cyclic.dfs_ancestor_index = None;
        record.abstract_fields.environment = None;
    }

    /// Set module.\[\[Status]] to linking.
    pub(super) fn set_linking(self, agent: &mut Agent) {
        let cyclic = &mut agent[self].cyclic;
        debug_assert!(matches!(cyclic.status, CyclicModuleRecordStatus::Unlinked));
        cyclic.status = CyclicModuleRecordStatus::Linking;
    }

    /// Set module.\[\[Status]] to linked.
    pub(super) fn set_linked(self, agent: &mut Agent) {
        let cyclic = &mut agent[self].cyclic;
        debug_assert!(matches!(cyclic.status, CyclicModuleRecordStatus::Linking));
        cyclic.status = CyclicModuleRecordStatus::Linked;
    }

    /// Set module.\[\[Status]] to evaluating.
    pub(super) fn set_evaluating(self, agent: &mut Agent) {
        let cyclic = &mut agent[self].cyclic;
        debug_assert!(matches!(cyclic.status, CyclicModuleRecordStatus::Linked));
        cyclic.status = CyclicModuleRecordStatus::Evaluating;
    }

    pub(super) fn set_status(self, agent: &mut Agent, status: CyclicModuleRecordStatus) {
        agent[self].cyclic.status = status;
    }

    /// Set \[\[EvaluationError]] to error and \[\[Status]] to evaluated.
    pub(super) fn set_evaluation_error(self, agent: &mut Agent, error: crate::ecmascript::execution::JsError) {
        let cyclic = &mut agent[self].cyclic;
        debug_assert!(
            cyclic.evaluation_error.is_none(),
            "Attempted to set module [[EvaluationError]] twice"
        );
        debug_assert!(matches!(
            cyclic.status,
            CyclicModuleRecordStatus::Evaluating
        ));
        cyclic.evaluation_error = Some(error);
        cyclic.status = CyclicModuleRecordStatus::Evaluated;
    }

    fn get_or_compile_executable(self, agent: &mut Agent) -> Executable {
        if let Some(executable) = agent[self].executable {
            return executable;
        }
        let code = agent[self].ecmascript_code.clone();
        let executable = Executable::compile(agent, code);
        agent[self].executable = Some(executable);
        executable
    }

    pub(crate) fn get_index(self) -> usize {
        self.0.into_index()
    }
}

fn intern_export_entries(
    agent: &mut Agent,
    entries: &[ast::ExportEntry],
) -> Box<[ExportEntryRecord]> {
    entries
        .iter()
        .map(|entry| ExportEntryRecord {
            export_name: entry
                .export_name
                .as_ref()
                .map(|name| String::from_str(agent, name)),
            module_request: entry
                .module_request
                .as_ref()
                .map(|request| String::from_str(agent, request)),
            import_name: entry.import_name.as_ref().map(|name| match name {
                ast::ExportImportName::Name(name) => {
                    ExportEntryImportName::Name(String::from_str(agent, name))
                }
                ast::ExportImportName::Namespace => ExportEntryImportName::Namespace,
                ast::ExportImportName::All => ExportEntryImportName::All,
            }),
            local_name: entry
                .local_name
                .as_ref()
                .map(|name| String::from_str(agent, name)),
        })
        .collect()
}

/// ### [16.2.1.9 GetImportedModule ( referrer, specifier )](https://tc39.es/ecma262/#sec-GetImportedModule)
///
/// Resolve `specifier` relative to `referrer` through the host, memoizing
/// the result in the referrer's \[\[LoadedModules]] so the same (referrer,
/// specifier) pair always denotes the same module instance.
pub(super) fn get_imported_module(
    agent: &mut Agent,
    referrer: SourceTextModule,
    specifier: String,
) -> JsResult<SourceTextModule> {
    if let Some(module) = agent[referrer].cyclic.loaded_modules.get(&specifier) {
        return Ok(*module);
    }
    let host_hooks = agent.host_hooks;
    let specifier_string = specifier.as_str(agent).to_owned();
    let module = host_hooks.resolve_imported_module(agent, referrer, &specifier_string)?;
    agent[referrer]
        .cyclic
        .loaded_modules
        .insert(specifier, module);
    Ok(module)
}

/// [`get_imported_module`] for callers past the linking phase, where every
/// requested module has already been resolved and memoized.
pub(super) fn get_imported_module_cached(
    agent: &Agent,
    referrer: SourceTextModule,
    specifier: String,
) -> SourceTextModule {
    *agent[referrer]
        .cyclic
        .loaded_modules
        .get(&specifier)
        .expect("Requested module was not resolved during linking")
}

impl ModuleAbstractMethods for SourceTextModule {
    /// ### [16.2.1.7.2.1 GetExportedNames ( \[ exportStarSet \] )](https://tc39.es/ecma262/#sec-getexportednames)
    ///
    /// > NOTE: GetExportedNames does not filter out or throw an exception
    /// > for names that have ambiguous star export bindings.
    fn get_exported_names(
        self,
        agent: &mut Agent,
        export_star_set: &mut Vec<SourceTextModule>,
    ) -> Vec<String> {
        // 2. If exportStarSet contains module, then
        if export_star_set.contains(&self) {
            // a. We've reached the starting point of an export * circularity.
            // b. Return a new empty List.
            return Vec::new();
        }
        // 3. Append module to exportStarSet.
        export_star_set.push(self);
        // 4. Let exportedNames be a new empty List.
        let mut exported_names = Vec::new();
        // 5. For each ExportEntry Record e of module.[[LocalExportEntries]], do
        for entry in agent[self].local_export_entries.iter() {
            // a. Assert: module provides the direct binding for this export.
            // b. Append e.[[ExportName]] to exportedNames.
            exported_names.push(entry.export_name.unwrap());
        }
        // 6. For each ExportEntry Record e of module.[[IndirectExportEntries]], do
        for entry in agent[self].indirect_export_entries.iter() {
            // a. Assert: module imports a specific binding for this export.
            // b. Append e.[[ExportName]] to exportedNames.
            exported_names.push(entry.export_name.unwrap());
        }
        // 7. For each ExportEntry Record e of module.[[StarExportEntries]], do
        let star_export_entries = agent[self].star_export_entries.to_vec();
        for entry in star_export_entries {
            // a. Let requestedModule be GetImportedModule(module, e.[[ModuleRequest]]).
            let requested_module =
                get_imported_module_cached(agent, self, entry.module_request.unwrap());
            // b. Let starNames be requestedModule.GetExportedNames(exportStarSet).
            let star_names = requested_module.get_exported_names(agent, export_star_set);
            // c. For each element n of starNames, do
            for name in star_names {
                // i. If n is not "default", then
                if name.as_str(agent) == "default" {
                    continue;
                }
                // 1. If exportedNames does not contain n, append n.
                if !exported_names.contains(&name) {
                    exported_names.push(name);
                }
            }
        }
        // 8. Return exportedNames.
        exported_names
    }

    /// ### [16.2.1.7.2.2 ResolveExport ( exportName \[ , resolveSet \] )](https://tc39.es/ecma262/#sec-resolveexport)
    ///
    /// Resolves an export name to the module and binding that provide it.
    /// `None` means the export could not be resolved; the ambiguous sentinel
    /// means multiple distinct star-export bindings provide the name. Each
    /// call with the same (exportName, resolveSet) pair returns the same
    /// result.
    fn resolve_export(
        self,
        agent: &mut Agent,
        export_name: String,
        resolve_set: &mut Vec<(SourceTextModule, String)>,
    ) -> Option<ResolveExportResult> {
        // 2. For each Record { [[Module]], [[ExportName]] } r of resolveSet, do
        //    a. If module and r.[[Module]] are the same Module Record and
        //       exportName equals r.[[ExportName]], then
        if resolve_set
            .iter()
            .any(|(module, name)| *module == self && *name == export_name)
        {
            // i. Assert: This is a circular import request.
            // ii. Return null.
            return None;
        }
        // 3. Append the Record { [[Module]]: module, [[ExportName]]:
        //    exportName } to resolveSet.
        resolve_set.push((self, export_name));
        // 4. For each ExportEntry Record e of module.[[LocalExportEntries]], do
        for entry in agent[self].local_export_entries.iter() {
            // a. If e.[[ExportName]] equals exportName, then
            if entry.export_name == Some(export_name) {
                // i. Assert: module provides the direct binding for this export.
                // ii. Return ResolvedBinding Record { [[Module]]: module,
                //     [[BindingName]]: e.[[LocalName]] }.
                let binding_name = entry.local_name.unwrap_or(export_name);
                return Some(ResolveExportResult::Resolved(ResolvedBinding {
                    module: self,
                    binding_name: ResolvedBindingName::Name(binding_name),
                }));
            }
        }
        // 5. For each ExportEntry Record e of module.[[IndirectExportEntries]], do
        let indirect_export_entries = agent[self].indirect_export_entries.to_vec();
        for entry in indirect_export_entries {
            // a. If e.[[ExportName]] equals exportName, then
            if entry.export_name == Some(export_name) {
                // i. Let importedModule be GetImportedModule(module, e.[[ModuleRequest]]).
                let imported_module =
                    get_imported_module_cached(agent, self, entry.module_request.unwrap());
                return match entry.import_name.unwrap() {
                    // ii. If e.[[ImportName]] is all, then this is a re-export
                    //     of an imported module namespace object:
                    //     Return ResolvedBinding Record { [[Module]]:
                    //     importedModule, [[BindingName]]: namespace }.
                    ExportEntryImportName::Namespace => {
                        Some(ResolveExportResult::Resolved(ResolvedBinding {
                            module: imported_module,
                            binding_name: ResolvedBindingName::Namespace,
                        }))
                    }
                    // iii. Else this is a re-export of a single name:
                    //      Return importedModule.ResolveExport(e.[[ImportName]], resolveSet).
                    ExportEntryImportName::Name(import_name) => {
                        imported_module.resolve_export(agent, import_name, resolve_set)
                    }
                    ExportEntryImportName::All => {
                        unreachable!("`export *` entry among indirect exports")
                    }
                };
            }
        }
        // 6. If exportName is "default", then
        if export_name.as_str(agent) == "default" {
            // a. Assert: A default export was not explicitly defined by this
            //    module.
            // b. Return null.
            // c. NOTE: A default export cannot be provided by an
            //    `export * from "mod"` declaration.
            return None;
        }
        // 7. Let starResolution be null.
        let mut star_resolution: Option<ResolvedBinding> = None;
        // 8. For each ExportEntry Record e of module.[[StarExportEntries]], do
        let star_export_entries = agent[self].star_export_entries.to_vec();
        for entry in star_export_entries {
            // a. Let importedModule be GetImportedModule(module, e.[[ModuleRequest]]).
            let imported_module =
                get_imported_module_cached(agent, self, entry.module_request.unwrap());
            // b. Let resolution be importedModule.ResolveExport(exportName, resolveSet).
            let resolution = imported_module.resolve_export(agent, export_name, resolve_set);
            match resolution {
                // c. If resolution is ambiguous, return ambiguous.
                Some(ResolveExportResult::Ambiguous) => {
                    return Some(ResolveExportResult::Ambiguous);
                }
                // d. If resolution is not null, then
                Some(ResolveExportResult::Resolved(resolution)) => match &star_resolution {
                    // ii. If starResolution is null, set starResolution to
                    //     resolution.
                    None => star_resolution = Some(resolution),
                    // iii. Else: Assert there is more than one * import that
                    //      includes the requested name.
                    Some(star_resolution) => {
                        // 1-2. If resolution.[[Module]] and
                        //      starResolution.[[Module]] are not the same, or
                        //      their [[BindingName]]s differ, return ambiguous.
                        if star_resolution.module != resolution.module
                            || star_resolution.binding_name != resolution.binding_name
                        {
                            return Some(ResolveExportResult::Ambiguous);
                        }
                    }
                },
                None => {}
            }
        }
        // 9. Return starResolution.
        star_resolution.map(ResolveExportResult::Resolved)
    }

    /// ### [16.2.1.6.1.2 Link ( )](https://tc39.es/ecma262/#sec-moduledeclarationlinking)
    ///
    /// On success, Link transitions this module's \[\[Status]] from unlinked
    /// to linked. On failure, every module still being linked is rolled back
    /// to unlinked and the error is returned. (Most of the work is done by
    /// the auxiliary function InnerModuleLinking.)
    fn link(self, agent: &mut Agent) -> JsResult<()> {
        // 1. Assert: module.[[Status]] is one of unlinked, linked,
        //    evaluating-async, or evaluated. Linking during linking or
        //    evaluation is a reentrancy violation.
        assert!(
            matches!(
                self.status(agent),
                CyclicModuleRecordStatus::Unlinked
                    | CyclicModuleRecordStatus::Linked
                    | CyclicModuleRecordStatus::EvaluatingAsync
                    | CyclicModuleRecordStatus::Evaluated
            ),
            "Link called reentrantly on a module that is linking or evaluating"
        );
        if agent.options.print_internals {
            eprintln!("[module] linking {:?}", self);
        }
        // 2. Let stack be a new empty List.
        let mut stack = Vec::new();
        // 3. Let result be Completion(InnerModuleLinking(module, stack, 0)).
        let result = inner_module_linking(agent, self, &mut stack, 0);
        // 4. If result is an abrupt completion, then
        if let Err(error) = result {
            // a. For each Cyclic Module Record m of stack, do
            for m in stack {
                // i. Assert: m.[[Status]] is linking.
                // ii. Set m.[[Status]] to unlinked.
                m.set_unlinked(agent);
            }
            // b. Assert: module.[[Status]] is unlinked.
            debug_assert!(matches!(
                self.status(agent),
                CyclicModuleRecordStatus::Unlinked
            ));
            // c. Return ? result.
            return Err(error);
        }
        // 5. Assert: module.[[Status]] is one of linked, evaluating-async,
        //    or evaluated.
        debug_assert!(matches!(
            self.status(agent),
            CyclicModuleRecordStatus::Linked
                | CyclicModuleRecordStatus::EvaluatingAsync
                | CyclicModuleRecordStatus::Evaluated
        ));
        // 6. Assert: stack is empty.
        debug_assert!(stack.is_empty());
        // 7. Return unused.
        Ok(())
    }

    /// ### [16.2.1.6.1.3 Evaluate ( )](https://tc39.es/ecma262/#sec-moduleevaluation)
    ///
    /// Evaluate transitions this module's \[\[Status]] from linked to either
    /// evaluating-async or evaluated. The first time it is called on a
    /// module in a given strongly connected component, Evaluate creates and
    /// returns a Promise which resolves when the module has finished
    /// evaluating. This Promise is stored in the \[\[TopLevelCapability]]
    /// field of the \[\[CycleRoot]] for the component. Future invocations of
    /// Evaluate on any module in the component return the same Promise.
    fn evaluate(self, agent: &mut Agent) -> Promise {
        // 1. Assert: This call to Evaluate is not happening at the same time
        //    as another call to Evaluate within the surrounding agent.
        // 2. Assert: module.[[Status]] is one of linked, evaluating-async,
        //    or evaluated.
        assert!(
            matches!(
                self.status(agent),
                CyclicModuleRecordStatus::Linked
                    | CyclicModuleRecordStatus::EvaluatingAsync
                    | CyclicModuleRecordStatus::Evaluated
            ),
            "Evaluate called on a module that is not linked"
        );
        if agent.options.print_internals {
            eprintln!("[module] evaluating {:?}", self);
        }
        // 3. If module.[[Status]] is either evaluating-async or evaluated,
        //    set module to module.[[CycleRoot]].
        let module = if matches!(
            self.status(agent),
            CyclicModuleRecordStatus::EvaluatingAsync | CyclicModuleRecordStatus::Evaluated
        ) {
            agent[self]
                .cyclic
                .cycle_root
                .expect("Evaluated module has no cycle root")
        } else {
            self
        };
        // 4. If module.[[TopLevelCapability]] is not empty, then
        if let Some(capability) = agent[module].cyclic.top_level_capability {
            // a. Return module.[[TopLevelCapability]].[[Promise]].
            return capability.promise();
        }
        // 5. Let stack be a new empty List.
        let mut stack = Vec::new();
        // 6. Let capability be ! NewPromiseCapability(%Promise%).
        let capability = PromiseCapability::new(agent);
        // 7. Set module.[[TopLevelCapability]] to capability.
        agent[module].cyclic.top_level_capability = Some(capability);
        // 8. Let result be Completion(InnerModuleEvaluation(module, stack, 0)).
        let result = inner_module_evaluation(agent, module, &mut stack, 0);
        match result {
            // 9. If result is an abrupt completion, then
            Err(error) => {
                // a. For each Cyclic Module Record m of stack, do
                for m in stack {
                    // i. Assert: m.[[Status]] is evaluating.
                    // ii. Set m.[[Status]] to evaluated.
                    // iii. Set m.[[EvaluationError]] to result.
                    m.set_evaluation_error(agent, error);
                    // The strongly connected component was never sealed;
                    // pointing each member at the entry module keeps later
                    // Evaluate calls landing on the recorded error.
                    if agent[m].cyclic.cycle_root.is_none() {
                        agent[m].cyclic.cycle_root = Some(module);
                    }
                }
                // b. Assert: module.[[Status]] is evaluated.
                // c. Assert: module.[[EvaluationError]] and result are the
                //    same Completion Record.
                debug_assert!(matches!(
                    module.status(agent),
                    CyclicModuleRecordStatus::Evaluated
                ));
                debug_assert_eq!(agent[module].cyclic.evaluation_error, Some(error));
                // d. Perform ! Call(capability.[[Reject]], undefined,
                //    « result.[[Value]] »).
                capability.reject(agent, error.value());
            }
            // 10. Else,
            Ok(_) => {
                // a. Assert: module.[[Status]] is either evaluating-async or
                //    evaluated.
                debug_assert!(matches!(
                    module.status(agent),
                    CyclicModuleRecordStatus::EvaluatingAsync
                        | CyclicModuleRecordStatus::Evaluated
                ));
                // b. Assert: module.[[EvaluationError]] is empty.
                debug_assert!(agent[module].cyclic.evaluation_error.is_none());
                // c. If module.[[AsyncEvaluation]] is false, then
                if !agent[module].cyclic.async_evaluation {
                    // i. NOTE: This implies that evaluation of module
                    //    completed synchronously.
                    // ii. Assert: module.[[Status]] is evaluated.
                    debug_assert!(matches!(
                        module.status(agent),
                        CyclicModuleRecordStatus::Evaluated
                    ));
                    // iii. Perform ! Call(capability.[[Resolve]], undefined,
                    //      « undefined »).
                    capability.resolve(agent, Value::Undefined);
                }
                // d. Assert: stack is empty.
                debug_assert!(stack.is_empty());
            }
        }
        // 11. Return capability.[[Promise]].
        capability.promise()
    }
}

impl CyclicModuleAbstractMethods for SourceTextModule {
    /// ### [16.2.1.7.3.1 InitializeEnvironment ( )](https://tc39.es/ecma262/#sec-source-text-module-record-initialize-environment)
    fn initialize_environment(self, agent: &mut Agent) -> JsResult<()> {
        // 1. For each ExportEntry Record e of module.[[IndirectExportEntries]], do
        let indirect_export_entries = agent[self].indirect_export_entries.to_vec();
        for entry in indirect_export_entries {
            // a. Assert: e.[[ExportName]] is not null.
            let export_name = entry.export_name.unwrap();
            // b. Let resolution be module.ResolveExport(e.[[ExportName]]).
            let resolution = self.resolve_export(agent, export_name, &mut Vec::new());
            // c. If resolution is either null or ambiguous, throw a
            //    SyntaxError exception.
            resolution_to_binding(agent, self, export_name, resolution)?;
            // d. Assert: resolution is a ResolvedBinding Record.
        }
        // 2. Assert: All named exports from module are resolvable.
        // 3. Let realm be module.[[Realm]].
        // 4. Assert: realm is not undefined.
        let realm = agent[self].abstract_fields.realm;
        // 5. Let env be NewModuleEnvironment(realm.[[GlobalEnv]]).
        let global_env = realm.global_env(agent);
        let env = new_module_environment(agent, Some(global_env));
        // 6. Set module.[[Environment]] to env.
        assert!(
            agent[self].abstract_fields.environment.replace(env).is_none(),
            "Attempted to set module environment twice"
        );
        // 7. For each ImportEntry Record in of module.[[ImportEntries]], do
        let import_entries = agent[self].import_entries.to_vec();
        for entry in import_entries {
            // a. Let importedModule be GetImportedModule(module, in.[[ModuleRequest]]).
            let imported_module = get_imported_module(agent, self, entry.module_request)?;
            match entry.import_name {
                // b. If in.[[ImportName]] is namespace-object, then
                ImportEntryName::Namespace => {
                    // i. Let namespace be GetModuleNamespace(importedModule).
                    let namespace = get_module_namespace(agent, imported_module);
                    // ii. Perform ! env.CreateImmutableBinding(in.[[LocalName]], true).
                    env.create_immutable_binding(agent, entry.local_name);
                    // iii. Perform ! env.InitializeBinding(in.[[LocalName]], namespace).
                    env.initialize_binding(agent, entry.local_name, Value::Module(namespace));
                }
                // c. Else,
                ImportEntryName::Name(import_name) => {
                    // i. Let resolution be importedModule.ResolveExport(in.[[ImportName]]).
                    let resolution =
                        imported_module.resolve_export(agent, import_name, &mut Vec::new());
                    // ii. If resolution is either null or ambiguous, throw a
                    //     SyntaxError exception.
                    let resolution =
                        resolution_to_binding(agent, imported_module, import_name, resolution)?;
                    match resolution.binding_name {
                        // iii. If resolution.[[BindingName]] is namespace, then
                        ResolvedBindingName::Namespace => {
                            // 1. Let namespace be GetModuleNamespace(resolution.[[Module]]).
                            let namespace = get_module_namespace(agent, resolution.module);
                            // 2-3. Create and initialize an immutable binding.
                            env.create_immutable_binding(agent, entry.local_name);
                            env.initialize_binding(
                                agent,
                                entry.local_name,
                                Value::Module(namespace),
                            );
                        }
                        // iv. Else, perform CreateImportBinding(env,
                        //     in.[[LocalName]], resolution.[[Module]],
                        //     resolution.[[BindingName]]).
                        ResolvedBindingName::Name(binding_name) => {
                            env.create_import_binding(
                                agent,
                                entry.local_name,
                                resolution.module,
                                binding_name,
                            );
                        }
                    }
                }
            }
        }
        // 18. Let code be module.[[ECMAScriptCode]].
        let code = agent[self].ecmascript_code.clone();
        // 19. Let varDeclarations be the VarScopedDeclarations of code.
        // 20. Let declaredVarNames be a new empty List.
        let mut declared_var_names = AHashSet::new();
        // 21. For each element d of varDeclarations, for each bound name dn:
        for name in var_scoped_declarations(&code) {
            let name = String::from_str(agent, name);
            // i. If declaredVarNames does not contain dn, then
            if declared_var_names.insert(name) {
                // 1. Perform ! env.CreateMutableBinding(dn, false).
                env.create_mutable_binding(agent, name);
                // 2. Perform ! env.InitializeBinding(dn, undefined).
                env.initialize_binding(agent, name, Value::Undefined);
            }
        }
        // 22. Let lexDeclarations be the LexicallyScopedDeclarations of code.
        // 24. For each element d of lexDeclarations, for each bound name dn:
        for declaration in lexically_scoped_declarations(&code) {
            match declaration {
                LexicallyScopedDeclaration::Variable { name, is_constant } => {
                    let name = String::from_str(agent, name);
                    // i. If IsConstantDeclaration of d is true, then
                    if is_constant {
                        // 1. Perform ! env.CreateImmutableBinding(dn, true).
                        env.create_immutable_binding(agent, name);
                    } else {
                        // ii. 1. Perform ! env.CreateMutableBinding(dn, false).
                        env.create_mutable_binding(agent, name);
                    }
                }
                LexicallyScopedDeclaration::Function(declaration) => {
                    let ast::Statement::FunctionDeclaration { name, .. } = declaration else {
                        unreachable!()
                    };
                    let name = String::from_str(agent, name);
                    env.create_mutable_binding(agent, name);
                    // iii. 1. Let fo be InstantiateFunctionObject of d with
                    //      arguments env and privateEnv.
                    let function =
                        instantiate_function_object(agent, declaration, env.into(), Some(self));
                    // 2. Perform ! env.InitializeBinding(dn, fo).
                    env.initialize_binding(agent, name, function.into());
                }
            }
        }
        // 26. Return unused.
        Ok(())
    }

    /// ### [16.2.1.7.3.2 ExecuteModule ( \[ capability \] )](https://tc39.es/ecma262/#sec-source-text-module-record-execute-module)
    fn execute_module(
        self,
        agent: &mut Agent,
        capability: Option<PromiseCapability>,
    ) -> JsResult<()> {
        // 1-7. Let moduleContext be a new ECMAScript code execution context
        //      over the module's environment.
        // 5. Assert: module has been linked and declarations in its module
        //    environment have been instantiated.
        let environment = agent[self]
            .abstract_fields
            .environment
            .expect("ExecuteModule on a module without an environment");
        let realm = agent[self].abstract_fields.realm;
        let executable = self.get_or_compile_executable(agent);
        let module_context = ExecutionContext {
            lexical_environment: environment.into(),
            realm,
            module: Some(self),
        };
        // 8. Suspend the running execution context.
        // 9. If module.[[HasTLA]] is false, then
        if !agent[self].cyclic.has_tla {
            // a. Assert: capability is not present.
            debug_assert!(capability.is_none());
            // b. Push moduleContext onto the execution context stack.
            agent.push_execution_context(module_context);
            // c. Let result be Completion(Evaluation of module.[[ECMAScriptCode]]).
            let result = Vm::execute(agent, executable);
            // d. Suspend moduleContext and remove it from the execution
            //    context stack.
            agent.pop_execution_context();
            // e-f. If result is an abrupt completion, return ? result.
            match result {
                ExecutionResult::Normal(_) => Ok(()),
                ExecutionResult::Throw(error) => Err(error),
                ExecutionResult::Return(_) => Err(agent.throw_exception(
                    ExceptionType::SyntaxError,
                    "Illegal return statement at module top level.",
                )),
                ExecutionResult::Await { .. } => Err(agent.throw_exception(
                    ExceptionType::SyntaxError,
                    "`await` at the top level of a module without top-level await.",
                )),
            }
        } else {
            // 10. Else,
            // a. Assert: capability is a PromiseCapability Record.
            let capability = capability.expect("Async module executed without a capability");
            // b. Perform AsyncBlockStart(capability, module.[[ECMAScriptCode]],
            //    moduleContext).
            agent.push_execution_context(module_context);
            let result = Vm::execute(agent, executable);
            async_block_continuation(agent, result, executable, capability);
            Ok(())
        }
    }
}

impl Index<SourceTextModule> for Agent {
    type Output = SourceTextModuleRecord;

    fn index(&self, index: SourceTextModule) -> &Self::Output {
        &self.heap.source_text_module_records[index.get_index()]
    }
}

impl IndexMut<SourceTextModule> for Agent {
    fn index_mut(&mut self, index: SourceTextModule) -> &mut Self::Output {
        &mut self.heap.source_text_module_records[index.get_index()]
    }
}

impl CreateHeapData<SourceTextModuleRecord, SourceTextModule> for Heap {
    fn create(&mut self, data: SourceTextModuleRecord) -> SourceTextModule {
        self.source_text_module_records.push(data);
        SourceTextModule(BaseIndex::last(&self.source_text_module_records))
    }
}

/// Surface an unresolvable or ambiguous export resolution as the
/// `SyntaxError` the linking phase reports.
fn resolution_to_binding(
    agent: &mut Agent,
    module: SourceTextModule,
    name: String,
    resolution: Option<ResolveExportResult>,
) -> JsResult<ResolvedBinding> {
    match resolution {
        Some(ResolveExportResult::Resolved(binding)) => Ok(binding),
        Some(ResolveExportResult::Ambiguous) => {
            let error_message = format!(
                "The requested export '{}' of {:?} is ambiguous.",
                name.as_str(agent),
                module
            );
            Err(agent.throw_exception(ExceptionType::SyntaxError, error_message))
        }
        None => {
            let error_message = format!(
                "The requested module does not provide an export named '{}'.",
                name.as_str(agent)
            );
            Err(agent.throw_exception(ExceptionType::SyntaxError, error_message))
        }
    }
}
