// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::ops::{Index, IndexMut};

use ahash::AHashMap;

use crate::{
    ecmascript::{
        execution::Agent,
        types::{String, Value},
    },
    heap::{indexes::BaseIndex, CreateHeapData, Heap},
};

/// ### [10.1 Ordinary Object Internal Methods](https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots)
///
/// A plain data object with string-keyed data properties. The full property
/// descriptor machinery lives outside this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct OrdinaryObject(BaseIndex<ObjectHeapData>);

#[derive(Debug, Clone, Default)]
pub struct ObjectHeapData {
    pub(crate) properties: AHashMap<String, Value>,
}

impl OrdinaryObject {
    pub fn create(agent: &mut Agent) -> OrdinaryObject {
        agent.heap.create(ObjectHeapData::default())
    }

    pub fn get(self, agent: &Agent, key: String) -> Option<Value> {
        agent[self].properties.get(&key).copied()
    }

    pub fn set(self, agent: &mut Agent, key: String, value: Value) {
        agent[self].properties.insert(key, value);
    }

    pub(crate) fn get_index(self) -> usize {
        self.0.into_index()
    }
}

impl Index<OrdinaryObject> for Agent {
    type Output = ObjectHeapData;

    fn index(&self, index: OrdinaryObject) -> &Self::Output {
        &self.heap.objects[index.get_index()]
    }
}

impl IndexMut<OrdinaryObject> for Agent {
    fn index_mut(&mut self, index: OrdinaryObject) -> &mut Self::Output {
        &mut self.heap.objects[index.get_index()]
    }
}

impl CreateHeapData<ObjectHeapData, OrdinaryObject> for Heap {
    fn create(&mut self, data: ObjectHeapData) -> OrdinaryObject {
        self.objects.push(data);
        OrdinaryObject(BaseIndex::last(&self.objects))
    }
}
