// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::ops::{Index, IndexMut};

use ahash::AHashMap;

use super::OuterEnv;
use crate::{
    ecmascript::{
        execution::{agent::ExceptionType, Agent, JsResult},
        scripts_and_modules::module::module_semantics::source_text_module_records::SourceTextModule,
        types::{String, Value},
    },
    heap::{indexes::BaseIndex, CreateHeapData, Heap},
};

/// #### [9.1.1.1 Declarative Environment Records](https://tc39.es/ecma262/#sec-declarative-environment-records)
///
/// A Declarative Environment Record is used to define the effect of
/// syntactic elements such as FunctionDeclarations, VariableDeclarations,
/// and block scopes that directly associate identifier bindings with
/// language values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub(crate) struct DeclarativeEnvironment(BaseIndex<DeclarativeEnvironmentRecord>);

#[derive(Debug, Clone)]
pub(crate) struct DeclarativeEnvironmentRecord {
    /// ### \[\[OuterEnv\]\]
    outer_env: OuterEnv,

    /// The environment's bindings.
    bindings: AHashMap<String, Binding>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Binding {
    /// A direct binding holding its value in this environment.
    Lexical {
        /// None signifies an uninitialized binding.
        value: Option<Value>,
        mutable: bool,
        strict: bool,
    },
    /// An import binding: an indirect, immutable binding that aliases a name
    /// in the target module's environment, resolved at link time.
    Indirect {
        module: SourceTextModule,
        binding_name: String,
    },
}

impl DeclarativeEnvironmentRecord {
    /// #### [9.1.2.2 NewDeclarativeEnvironment ( E )](https://tc39.es/ecma262/#sec-newdeclarativeenvironment)
    pub(crate) fn new(outer_env: OuterEnv) -> DeclarativeEnvironmentRecord {
        // 1. Let env be a new Declarative Environment Record containing no bindings.
        // 2. Set env.[[OuterEnv]] to E.
        // 3. Return env.
        DeclarativeEnvironmentRecord {
            outer_env,
            bindings: AHashMap::default(),
        }
    }

    /// ##### [9.1.1.1.1 HasBinding ( N )](https://tc39.es/ecma262/#sec-declarative-environment-records-hasbinding-n)
    fn has_binding(&self, name: String) -> bool {
        // 1. If envRec has a binding for N, return true.
        // 2. Return false.
        self.bindings.contains_key(&name)
    }

    /// ##### [9.1.1.1.2 CreateMutableBinding ( N, D )](https://tc39.es/ecma262/#sec-declarative-environment-records-createmutablebinding-n-d)
    fn create_mutable_binding(&mut self, name: String) {
        // 1. Assert: envRec does not already have a binding for N.
        debug_assert!(!self.has_binding(name));
        // 2. Create a mutable binding in envRec for N and record that it is
        //    uninitialized.
        self.bindings.insert(
            name,
            Binding::Lexical {
                value: None,
                // Strictness only matters for immutable bindings.
                strict: false,
                mutable: true,
            },
        );
        // 3. Return UNUSED.
    }

    /// ##### [9.1.1.1.3 CreateImmutableBinding ( N, S )](https://tc39.es/ecma262/#sec-declarative-environment-records-createimmutablebinding-n-s)
    fn create_immutable_binding(&mut self, name: String, is_strict: bool) {
        // 1. Assert: envRec does not already have a binding for N.
        debug_assert!(!self.has_binding(name));
        // 2. Create an immutable binding in envRec for N and record that it
        //    is uninitialized. If S is true, record that the newly created
        //    binding is a strict binding.
        self.bindings.insert(
            name,
            Binding::Lexical {
                value: None,
                strict: is_strict,
                mutable: false,
            },
        );
        // 3. Return UNUSED.
    }

    pub(super) fn bindings_mut(&mut self) -> &mut AHashMap<String, Binding> {
        &mut self.bindings
    }

    /// ##### [9.1.1.1.4 InitializeBinding ( N, V )](https://tc39.es/ecma262/#sec-declarative-environment-records-initializebinding-n-v)
    fn initialize_binding(&mut self, name: String, new_value: Value) {
        // 1. Assert: envRec must have an uninitialized binding for N.
        let Some(Binding::Lexical { value, .. }) = self.bindings.get_mut(&name) else {
            unreachable!("Attempted to initialize a missing or indirect binding");
        };
        debug_assert!(value.is_none());
        // 2. Set the bound value for N in envRec to V.
        // 3. Record that the binding for N in envRec has been initialized.
        // Note: Initialization status of N is determined by the Some/None.
        *value = Some(new_value);
        // 4. Return UNUSED.
    }
}

impl DeclarativeEnvironment {
    pub(crate) fn get_outer_env(self, agent: &Agent) -> OuterEnv {
        agent[self].outer_env
    }

    /// ##### [9.1.1.1.1 HasBinding ( N )](https://tc39.es/ecma262/#sec-declarative-environment-records-hasbinding-n)
    pub(crate) fn has_binding(self, agent: &Agent, name: String) -> bool {
        agent[self].has_binding(name)
    }

    /// ##### [9.1.1.1.2 CreateMutableBinding ( N, D )](https://tc39.es/ecma262/#sec-declarative-environment-records-createmutablebinding-n-d)
    pub(crate) fn create_mutable_binding(self, agent: &mut Agent, name: String) {
        agent[self].create_mutable_binding(name);
    }

    /// ##### [9.1.1.1.3 CreateImmutableBinding ( N, S )](https://tc39.es/ecma262/#sec-declarative-environment-records-createimmutablebinding-n-s)
    pub(crate) fn create_immutable_binding(self, agent: &mut Agent, name: String, is_strict: bool) {
        agent[self].create_immutable_binding(name, is_strict);
    }

    /// ##### [9.1.1.1.4 InitializeBinding ( N, V )](https://tc39.es/ecma262/#sec-declarative-environment-records-initializebinding-n-v)
    pub(crate) fn initialize_binding(self, agent: &mut Agent, name: String, value: Value) {
        agent[self].initialize_binding(name, value);
    }

    /// ##### [9.1.1.1.5 SetMutableBinding ( N, V, S )](https://tc39.es/ecma262/#sec-declarative-environment-records-setmutablebinding-n-v-s)
    pub(crate) fn set_mutable_binding(
        self,
        agent: &mut Agent,
        name: String,
        new_value: Value,
        mut is_strict: bool,
    ) -> JsResult<()> {
        // 1. If envRec does not have a binding for N, then
        let Some(&binding) = agent[self].bindings.get(&name) else {
            // a. If S is true, throw a ReferenceError exception.
            if is_strict {
                let error_message = format!(
                    "Cannot assign to nonexisting binding '{}'.",
                    name.as_str(agent)
                );
                return Err(agent.throw_exception(ExceptionType::ReferenceError, error_message));
            }
            // b. Perform ! envRec.CreateMutableBinding(N, true).
            // c. Perform ! envRec.InitializeBinding(N, V).
            let env_rec = &mut agent[self];
            env_rec.create_mutable_binding(name);
            env_rec.initialize_binding(name, new_value);
            // d. Return UNUSED.
            return Ok(());
        };
        let Binding::Lexical {
            value,
            mutable,
            strict,
        } = binding
        else {
            // Import bindings are immutable; module code is strict.
            let error_message =
                format!("Cannot assign to import binding '{}'.", name.as_str(agent));
            return Err(agent.throw_exception(ExceptionType::TypeError, error_message));
        };
        // 2. If the binding for N in envRec is a strict binding, set S to true.
        if strict {
            is_strict = true;
        }
        // 3. If the binding for N in envRec has not yet been initialized, then
        if value.is_none() {
            // a. Throw a ReferenceError exception.
            let error_message =
                format!("Identifier '{}' has not been initialized.", name.as_str(agent));
            return Err(agent.throw_exception(ExceptionType::ReferenceError, error_message));
        }
        // 4. Else if the binding for N in envRec is a mutable binding, then
        if mutable {
            // a. Change its bound value to V.
            agent[self].bindings.insert(
                name,
                Binding::Lexical {
                    value: Some(new_value),
                    mutable,
                    strict,
                },
            );
        }
        // 5. Else,
        else {
            // a. Assert: This is an attempt to change the value of an
            //    immutable binding.
            // b. If S is true, throw a TypeError exception.
            if is_strict {
                let error_message = format!(
                    "Cannot assign to immutable identifier '{}' in strict mode.",
                    name.as_str(agent)
                );
                return Err(agent.throw_exception(ExceptionType::TypeError, error_message));
            }
        }
        // 6. Return UNUSED.
        Ok(())
    }

    /// ##### [9.1.1.1.6 GetBindingValue ( N, S )](https://tc39.es/ecma262/#sec-declarative-environment-records-getbindingvalue-n-s)
    ///
    /// Returns the value of the bound identifier `name`. If the binding
    /// exists but is uninitialized, a `ReferenceError` is thrown. Import
    /// bindings read through to the target module's environment.
    pub(crate) fn get_binding_value(
        self,
        agent: &mut Agent,
        name: String,
        is_strict: bool,
    ) -> JsResult<Value> {
        // 1. Assert: envRec has a binding for N.
        let binding = *agent[self]
            .bindings
            .get(&name)
            .expect("Environment does not have the requested binding");
        match binding {
            Binding::Lexical { value, .. } => match value {
                // 3. Return the value currently bound to N in envRec.
                Some(value) => Ok(value),
                // 2. If the binding for N in envRec is an uninitialized
                //    binding, throw a ReferenceError exception.
                None => {
                    let error_message = format!(
                        "Could not get value of binding '{}': binding is uninitialized.",
                        name.as_str(agent)
                    );
                    Err(agent.throw_exception(ExceptionType::ReferenceError, error_message))
                }
            },
            // [9.1.1.5.1 GetBindingValue ( N, S )](https://tc39.es/ecma262/#sec-module-environment-records-getbindingvalue-n-s)
            // 2. If the binding for N is an indirect binding, then
            Binding::Indirect {
                module,
                binding_name,
            } => {
                // a. Let M and N2 be the indirection values provided when
                //    this binding for N was created.
                // b. Let targetEnv be M.[[Environment]].
                let Some(target_env) = module.environment(agent) else {
                    // c. If targetEnv is empty, throw a ReferenceError
                    //    exception.
                    let error_message = format!(
                        "Could not get value of import binding '{}': module is not linked.",
                        name.as_str(agent)
                    );
                    return Err(
                        agent.throw_exception(ExceptionType::ReferenceError, error_message)
                    );
                };
                // d. Return ? targetEnv.GetBindingValue(N2, true).
                DeclarativeEnvironment::from(target_env).get_binding_value(
                    agent,
                    binding_name,
                    is_strict,
                )
            }
        }
    }

    pub(crate) fn get_index(self) -> usize {
        self.0.into_index()
    }
}

impl Index<DeclarativeEnvironment> for Agent {
    type Output = DeclarativeEnvironmentRecord;

    fn index(&self, index: DeclarativeEnvironment) -> &Self::Output {
        &self.heap.environments[index.get_index()]
    }
}

impl IndexMut<DeclarativeEnvironment> for Agent {
    fn index_mut(&mut self, index: DeclarativeEnvironment) -> &mut Self::Output {
        &mut self.heap.environments[index.get_index()]
    }
}

impl CreateHeapData<DeclarativeEnvironmentRecord, DeclarativeEnvironment> for Heap {
    fn create(&mut self, data: DeclarativeEnvironmentRecord) -> DeclarativeEnvironment {
        self.environments.push(data);
        DeclarativeEnvironment(BaseIndex::last(&self.environments))
    }
}

/// #### [9.1.2.2 NewDeclarativeEnvironment ( E )](https://tc39.es/ecma262/#sec-newdeclarativeenvironment)
pub(crate) fn new_declarative_environment(
    agent: &mut Agent,
    outer_env: OuterEnv,
) -> DeclarativeEnvironment {
    agent
        .heap
        .create(DeclarativeEnvironmentRecord::new(outer_env))
}
