use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::runtime::object::{ObjectId, ObjectValue};

/// A registered object plus its reference count.
#[derive(Clone, Debug)]
pub struct ManagedObject {
    id: ObjectId,
    ref_count: u32,
    value: ObjectValue,
}

impl ManagedObject {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    pub fn value(&self) -> &ObjectValue {
        &self.value
    }
}

/// Arena of reference-counted script objects.
///
/// Objects are destroyed when their count drops to zero; destruction releases the objects they
/// hold. During [`MemoryManager::teardown`] the manager is in cleanup mode: reference changes
/// are ignored and every remaining object is freed without touching its peers.
#[derive(Debug, Default)]
pub struct MemoryManager {
    objects: BTreeMap<ObjectId, ManagedObject>,
    next_id: u32,
    cleanup_mode: bool,
}

impl MemoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn with_next_id(next_id: u32) -> Self {
        Self {
            objects: BTreeMap::new(),
            next_id,
            cleanup_mode: false,
        }
    }

    /// Registers a new object with a reference count of zero.
    ///
    /// Panics when the id space is exhausted.
    pub fn register(&mut self, value: ObjectValue) -> ObjectId {
        let id = ObjectId(self.next_id);
        let Some(next) = self.next_id.checked_add(1) else {
            panic!("object id space exhausted");
        };
        self.next_id = next;
        self.objects.insert(
            id,
            ManagedObject {
                id,
                ref_count: 0,
                value,
            },
        );
        id
    }

    fn object_mut(&mut self, id: ObjectId) -> &mut ManagedObject {
        match self.objects.get_mut(&id) {
            Some(object) => object,
            None => panic!("object {id} is not registered"),
        }
    }

    pub fn add_ref(&mut self, id: ObjectId) {
        if self.cleanup_mode {
            return;
        }
        self.object_mut(id).ref_count += 1;
    }

    /// Drops one reference; objects reaching zero are destroyed together with everything only
    /// they kept alive.
    pub fn release(&mut self, id: ObjectId) {
        if self.cleanup_mode {
            return;
        }
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            let object = self.object_mut(id);
            let Some(count) = object.ref_count.checked_sub(1) else {
                panic!("object {id} released without a reference");
            };
            object.ref_count = count;
            if count == 0 {
                pending.extend(self.remove(id));
            }
        }
    }

    /// Destroys an unreferenced object, releasing its children.
    ///
    /// Panics when the object is still referenced.
    pub fn destroy(&mut self, id: ObjectId) {
        let children = self.remove(id);
        for child in children {
            self.release(child);
        }
    }

    fn remove(&mut self, id: ObjectId) -> Vec<ObjectId> {
        let refs = self.object_mut(id).ref_count;
        assert!(refs == 0, "object {id} destroyed with {refs} live references");
        self.objects
            .remove(&id)
            .map(|object| object.value.children())
            .unwrap_or_default()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&ManagedObject> {
        self.objects.get(&id)
    }

    /// Value of a registered object. Panics on unknown ids.
    pub fn value(&self, id: ObjectId) -> &ObjectValue {
        match self.objects.get(&id) {
            Some(object) => &object.value,
            None => panic!("object {id} is not registered"),
        }
    }

    pub fn value_mut(&mut self, id: ObjectId) -> &mut ObjectValue {
        &mut self.object_mut(id).value
    }

    pub fn ref_count(&self, id: ObjectId) -> Option<u32> {
        self.objects.get(&id).map(|o| o.ref_count)
    }

    pub fn live_count(&self) -> usize {
        self.objects.len()
    }

    /// Frees every remaining object without reference bookkeeping; returns how many were left.
    pub fn teardown(&mut self) -> usize {
        self.cleanup_mode = true;
        let leaked = self.objects.len();
        self.objects.clear();
        leaked
    }

    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "objects: {}", self.objects.len());
        for object in self.objects.values() {
            let _ = writeln!(
                out,
                "{}: {} {}, {} refs",
                object.id,
                object.value.type_name(),
                object.value.describe(),
                object.ref_count
            );
        }
        out
    }
}

impl Drop for MemoryManager {
    fn drop(&mut self) {
        if !self.objects.is_empty() {
            tracing::debug!(count = self.objects.len(), "freeing objects still registered");
        }
        self.teardown();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/memory.rs"]
mod tests;
