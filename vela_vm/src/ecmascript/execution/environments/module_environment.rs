// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::{
    declarative_environment::{new_declarative_environment, Binding, DeclarativeEnvironment},
    OuterEnv,
};
use crate::ecmascript::{
    execution::Agent,
    scripts_and_modules::module::module_semantics::source_text_module_records::SourceTextModule,
    types::{String, Value},
};

/// ### [9.1.1.5 Module Environment Records](https://tc39.es/ecma262/#sec-module-environment-records)
///
/// A Module Environment Record is a Declarative Environment Record that is
/// used to represent the outer scope of an ECMAScript Module. In addition to
/// normal mutable and immutable bindings, Module Environment Records also
/// provide immutable import bindings which are bindings that provide indirect
/// access to a target binding that exists in another Environment Record.
///
/// There is no data-wise difference between a declarative and a module
/// environment, so the wrapper only adds the import binding operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub(crate) struct ModuleEnvironment(DeclarativeEnvironment);

impl ModuleEnvironment {
    /// ##### [9.1.1.5.5 CreateImportBinding ( N, M, N2 )](https://tc39.es/ecma262/#sec-createimportbinding)
    ///
    /// Create a new initialized immutable indirect binding for the name `N`.
    /// A binding must not already exist in this Environment Record for `N`.
    /// `N2` is the name of a binding that exists in `M`'s Module Environment
    /// Record.
    pub(crate) fn create_import_binding(
        self,
        agent: &mut Agent,
        name: String,
        module: SourceTextModule,
        binding_name: String,
    ) {
        // 1. Assert: envRec does not already have a binding for N.
        debug_assert!(!self.0.has_binding(agent, name));
        // 2. Create an immutable indirect binding in envRec for N that
        //    references M and N2 as its target binding and record that the
        //    binding is initialized.
        agent[self.0].bindings_mut().insert(
            name,
            Binding::Indirect {
                module,
                binding_name,
            },
        );
        // 3. Return UNUSED.
    }

    pub(crate) fn create_immutable_binding(self, agent: &mut Agent, name: String) {
        self.0.create_immutable_binding(agent, name, true);
    }

    pub(crate) fn create_mutable_binding(self, agent: &mut Agent, name: String) {
        self.0.create_mutable_binding(agent, name);
    }

    pub(crate) fn initialize_binding(self, agent: &mut Agent, name: String, value: Value) {
        self.0.initialize_binding(agent, name, value);
    }
}

impl From<ModuleEnvironment> for DeclarativeEnvironment {
    fn from(value: ModuleEnvironment) -> Self {
        value.0
    }
}

/// #### [9.1.2.6 NewModuleEnvironment ( E )](https://tc39.es/ecma262/#sec-newmoduleenvironment)
pub(crate) fn new_module_environment(agent: &mut Agent, outer_env: OuterEnv) -> ModuleEnvironment {
    // 1. Let env be a new Module Environment Record containing no bindings.
    // 2. Set env.[[OuterEnv]] to E.
    // 3. Return env.
    ModuleEnvironment(new_declarative_environment(agent, outer_env))
}
