// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ### [16.2.1.5 Abstract Module Records](https://tc39.es/ecma262/#sec-abstract-module-records)

use crate::ecmascript::{
    builtins::{module::Module, promise::Promise},
    execution::{environments::ModuleEnvironment, realm::Realm, Agent, JsResult},
    types::String,
};

use super::source_text_module_records::SourceTextModule;

#[derive(Debug)]
pub(crate) struct AbstractModuleRecord {
    /// ### \[\[Realm]]
    ///
    /// The Realm within which this module was created.
    pub(super) realm: Realm,
    /// ### \[\[Environment]]
    ///
    /// The Environment Record containing the top level bindings for this
    /// module. This field is set when the module is linked, and cleared
    /// again if linking of its graph fails.
    pub(super) environment: Option<ModuleEnvironment>,
    /// ### \[\[Namespace]]
    ///
    /// The Module Namespace Object (28.3) if one has been created for this
    /// module.
    pub(super) namespace: Option<Module>,
}

impl AbstractModuleRecord {
    pub(super) fn new(realm: Realm) -> Self {
        Self {
            realm,
            environment: None,
            namespace: None,
        }
    }
}

/// ### [ResolvedBinding Records](https://tc39.es/ecma262/#resolvedbinding-record)
///
/// \[\[BindingName]] of a resolved export: either a binding name in the
/// resolved module's environment, or the namespace sentinel for a
/// `export * as ns` re-export without a direct binding in any module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedBindingName {
    Name(String),
    Namespace,
}

/// ### [ResolvedBinding Records](https://tc39.es/ecma262/#resolvedbinding-record)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedBinding {
    /// \[\[Module]]
    pub module: SourceTextModule,
    /// \[\[BindingName]]
    pub binding_name: ResolvedBindingName,
}

/// The result of ResolveExport when a matching export exists: a resolved
/// binding, or the ambiguous sentinel when multiple distinct star-export
/// bindings were found. An unresolvable name is `None` at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveExportResult {
    Resolved(ResolvedBinding),
    Ambiguous,
}

/// ### [Abstract Methods of Module Records](https://tc39.es/ecma262/#table-abstract-methods-of-module-records)
pub trait ModuleAbstractMethods: Sized + Copy {
    /// ### GetExportedNames(\[exportStarSet])
    ///
    /// Return a list of all names that are either directly or indirectly
    /// exported from this module, in first-seen order. `"default"` is never
    /// contributed by a star export.
    fn get_exported_names(
        self,
        agent: &mut Agent,
        export_star_set: &mut Vec<SourceTextModule>,
    ) -> Vec<String>;

    /// ### ResolveExport(exportName \[, resolveSet])
    ///
    /// Return the binding of a name exported by this module, the ambiguous
    /// sentinel if multiple star-export bindings were found, or None if the
    /// name cannot be resolved. Each call with the same arguments returns
    /// the same result.
    fn resolve_export(
        self,
        agent: &mut Agent,
        export_name: String,
        resolve_set: &mut Vec<(SourceTextModule, String)>,
    ) -> Option<ResolveExportResult>;

    /// ### Link()
    ///
    /// Prepare the module for evaluation by transitively resolving all
    /// module dependencies and creating a Module Environment Record. On
    /// success every module in the graph is linked; on failure every module
    /// that was being linked is rolled back to unlinked and the error is
    /// returned.
    fn link(self, agent: &mut Agent) -> JsResult<()>;

    /// ### Evaluate()
    ///
    /// Returns a promise for the evaluation of this module and its
    /// dependencies, resolving on successful evaluation and rejecting on an
    /// evaluation error. Repeated calls on the same strongly connected
    /// component return the same promise. Link must have completed
    /// successfully prior to invoking this method.
    fn evaluate(self, agent: &mut Agent) -> Promise;
}
