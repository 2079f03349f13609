use std::collections::HashMap;

use crate::runtime::memory::MemoryManager;
use crate::runtime::object::ObjectId;

const PRUNE_MIN: usize = 64;

/// Renderer slot backing each height map and height profile handle.
///
/// Entries of destroyed handles are dropped whenever the table has doubled since the last
/// sweep, so it stays proportional to the live rasters.
#[derive(Clone, Debug, Default)]
pub struct SlotTable {
    slots: HashMap<ObjectId, usize>,
    prune_at: usize,
}

impl SlotTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, id: ObjectId, slot: usize, memory: &MemoryManager) {
        if self.slots.len() >= self.prune_at {
            self.prune(memory);
        }
        let previous = self.slots.insert(id, slot);
        assert!(previous.is_none(), "object {id} already owns a renderer slot");
    }

    /// Forgets handles the memory manager no longer holds.
    pub fn prune(&mut self, memory: &MemoryManager) {
        let before = self.slots.len();
        self.slots.retain(|id, _| memory.contains(*id));
        self.prune_at = (self.slots.len() * 2).max(PRUNE_MIN);
        tracing::trace!(removed = before - self.slots.len(), "slot table pruned");
    }

    pub fn get(&self, id: ObjectId) -> Option<usize> {
        self.slots.get(&id).copied()
    }

    /// Slot of a raster handle. Panics for objects that never got one.
    pub fn slot_of(&self, id: ObjectId) -> usize {
        match self.slots.get(&id) {
            Some(slot) => *slot,
            None => panic!("object {id} has no renderer slot"),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/slots.rs"]
mod tests;
