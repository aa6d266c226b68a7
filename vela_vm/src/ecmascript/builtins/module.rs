// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ### [28.3 Module Namespace Objects](https://tc39.es/ecma262/#sec-module-namespace-objects)

pub(crate) mod data;

use std::ops::{Index, IndexMut};

use self::data::ModuleHeapData;

use crate::{
    ecmascript::{
        execution::{environments::DeclarativeEnvironment, Agent, JsResult},
        scripts_and_modules::module::module_semantics::{
            abstract_module_records::{
                ModuleAbstractMethods, ResolveExportResult, ResolvedBinding, ResolvedBindingName,
            },
            source_text_module_records::SourceTextModule,
        },
        types::{String, Value},
    },
    heap::{indexes::BaseIndex, CreateHeapData, Heap},
};

/// A module namespace exotic object: the exports-view of a module, keyed by
/// export name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Module(BaseIndex<ModuleHeapData>);

impl Module {
    /// ### [10.4.6.8 \[\[Get]] ( P, Receiver )](https://tc39.es/ecma262/#sec-module-namespace-exotic-objects-get-p-receiver)
    ///
    /// Reads go through the resolved export into the owning module's
    /// environment. Reading an export whose binding is still uninitialized
    /// (a dependency cycle observed too early) throws a `ReferenceError`.
    pub fn get(self, agent: &mut Agent, key: String) -> JsResult<Value> {
        let data = &agent[self];
        // 4. Let exports be O.[[Exports]]. If exports does not contain P,
        //    return undefined.
        if !data.exports.contains(&key) {
            return Ok(Value::Undefined);
        }
        let module = data.module;
        // 6. Let binding be m.ResolveExport(P).
        // 7. Assert: binding is a ResolvedBinding Record: unresolvable and
        //    ambiguous names were filtered out when the namespace was built.
        let resolution = module.resolve_export(agent, key, &mut Vec::new());
        let Some(ResolveExportResult::Resolved(ResolvedBinding {
            module: target,
            binding_name,
        })) = resolution
        else {
            unreachable!("Namespace export failed to resolve");
        };
        match binding_name {
            // 9. If binding.[[BindingName]] is namespace, return
            //    GetModuleNamespace(targetModule).
            ResolvedBindingName::Namespace => {
                Ok(Value::Module(get_module_namespace(agent, target)))
            }
            ResolvedBindingName::Name(name) => {
                // 10-11. Read the binding from the target module's
                //        environment.
                let env = target
                    .environment(agent)
                    .expect("Namespace target module is not linked");
                DeclarativeEnvironment::from(env).get_binding_value(agent, name, true)
            }
        }
    }

    /// The sorted export names this namespace exposes.
    pub fn exports(self, agent: &Agent) -> &[String] {
        &agent[self].exports
    }

    pub(crate) fn get_index(self) -> usize {
        self.0.into_index()
    }
}

/// ### [16.2.1.10 GetModuleNamespace ( module )](https://tc39.es/ecma262/#sec-getmodulenamespace)
///
/// The namespace is created lazily on first request and cached on the
/// module record.
pub fn get_module_namespace(agent: &mut Agent, module: SourceTextModule) -> Module {
    // 2. Let namespace be module.[[Namespace]].
    if let Some(namespace) = module.namespace(agent) {
        return namespace;
    }
    // 3. If namespace is empty, then
    // a. Let exportedNames be module.GetExportedNames().
    let exported_names = module.get_exported_names(agent, &mut Vec::new());
    // b. Let unambiguousNames be a new empty List.
    let mut unambiguous_names = Vec::with_capacity(exported_names.len());
    // c. For each element name of exportedNames, do
    for name in exported_names {
        // i. Let resolution be module.ResolveExport(name).
        let resolution = module.resolve_export(agent, name, &mut Vec::new());
        // ii. If resolution is a ResolvedBinding Record, append name to
        //     unambiguousNames.
        if matches!(resolution, Some(ResolveExportResult::Resolved(_))) {
            unambiguous_names.push(name);
        }
    }
    // ModuleNamespaceCreate sorts the exports by code unit order.
    unambiguous_names.sort_by(|a, b| a.as_str(agent).cmp(b.as_str(agent)));
    let namespace = agent.heap.create(ModuleHeapData {
        module,
        exports: unambiguous_names.into_boxed_slice(),
    });
    module.set_namespace(agent, namespace);
    namespace
}

impl Index<Module> for Agent {
    type Output = ModuleHeapData;

    fn index(&self, index: Module) -> &Self::Output {
        &self.heap.modules[index.get_index()]
    }
}

impl IndexMut<Module> for Agent {
    fn index_mut(&mut self, index: Module) -> &mut Self::Output {
        &mut self.heap.modules[index.get_index()]
    }
}

impl CreateHeapData<ModuleHeapData, Module> for Heap {
    fn create(&mut self, data: ModuleHeapData) -> Module {
        self.modules.push(data);
        Module(BaseIndex::last(&self.modules))
    }
}
