// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod indexes;

use hashbrown::HashMap;

use crate::{
    ecmascript::{
        builtins::{
            control_abstraction_objects::{
                async_function_objects::await_reaction::AwaitReaction,
                promise_objects::promise_abstract_operations::promise_reaction_records::PromiseReactionRecord,
            },
            module::data::ModuleHeapData,
            promise::data::PromiseHeapData,
        },
        execution::{environments::DeclarativeEnvironmentRecord, realm::RealmRecord},
        scripts_and_modules::module::module_semantics::source_text_module_records::SourceTextModuleRecord,
        types::{
            BuiltinFunctionHeapData, ECMAScriptFunctionHeapData, ErrorHeapData, ObjectHeapData,
            String, StringHeapData,
        },
    },
    engine::executable::ExecutableHeapData,
};

/// The arena all engine data lives in.
///
/// Records reference each other through [`indexes::BaseIndex`] handles rather
/// than owning pointers, which keeps the cyclic module graph and its
/// back-references (`[[AsyncParentModules]]`, `[[CycleRoot]]`) representable
/// without ownership cycles. Storage is append-only: the engine performs no
/// garbage collection, that is delegated to the host runtime's lifetime
/// management of the whole agent.
#[derive(Debug, Default)]
pub(crate) struct Heap {
    pub(crate) await_reactions: Vec<AwaitReaction>,
    pub(crate) builtin_functions: Vec<BuiltinFunctionHeapData>,
    pub(crate) ecmascript_functions: Vec<ECMAScriptFunctionHeapData>,
    pub(crate) environments: Vec<DeclarativeEnvironmentRecord>,
    pub(crate) errors: Vec<ErrorHeapData>,
    pub(crate) executables: Vec<ExecutableHeapData>,
    pub(crate) modules: Vec<ModuleHeapData>,
    pub(crate) objects: Vec<ObjectHeapData>,
    pub(crate) promise_reaction_records: Vec<PromiseReactionRecord>,
    pub(crate) promises: Vec<PromiseHeapData>,
    pub(crate) realms: Vec<RealmRecord>,
    pub(crate) source_text_module_records: Vec<SourceTextModuleRecord>,
    pub(crate) strings: Vec<StringHeapData>,
    /// Interning table for heap strings: [`String`] handles compare equal if
    /// and only if their string data is equal.
    pub(crate) string_lookup: HashMap<Box<str>, String>,
}

impl Heap {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

/// A partial view to the heap that allows inserting new values of type `T`
/// and getting a handle of type `H` to them.
pub(crate) trait CreateHeapData<T, H> {
    fn create(&mut self, data: T) -> H;
}
