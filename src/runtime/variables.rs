use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::runtime::memory::MemoryManager;
use crate::runtime::object::ObjectId;

/// One name binding. The table holds one reference to `value`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VariableTableItem {
    value: ObjectId,
    is_const: bool,
}

impl VariableTableItem {
    pub fn value(&self) -> ObjectId {
        self.value
    }

    pub fn is_const(&self) -> bool {
        self.is_const
    }

    /// Rebinds to `value`. Returns `false` (and changes nothing) for const bindings.
    pub fn set_value(&mut self, memory: &mut MemoryManager, value: ObjectId) -> bool {
        if self.is_const {
            return false;
        }
        if self.value == value {
            return true;
        }
        memory.add_ref(value);
        memory.release(self.value);
        self.value = value;
        true
    }
}

/// Name to object bindings of one scope.
#[derive(Clone, Debug, Default)]
pub struct VariableTable {
    items: BTreeMap<String, VariableTableItem>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a new name; returns `false` when the name is already declared in this table.
    pub fn declare(
        &mut self,
        memory: &mut MemoryManager,
        name: &str,
        value: ObjectId,
        is_const: bool,
    ) -> bool {
        if self.items.contains_key(name) {
            return false;
        }
        memory.add_ref(value);
        self.items
            .insert(name.to_string(), VariableTableItem { value, is_const });
        true
    }

    pub fn get(&self, name: &str) -> Option<&VariableTableItem> {
        self.items.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut VariableTableItem> {
        self.items.get_mut(name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drops every binding, releasing the bound objects.
    pub fn release_all(&mut self, memory: &mut MemoryManager) {
        for (_, item) in std::mem::take(&mut self.items) {
            memory.release(item.value);
        }
    }

    pub fn dump(&self, memory: &MemoryManager) -> String {
        let mut out = String::new();
        for (name, item) in &self.items {
            let value = memory
                .get(item.value)
                .map(|o| o.value().describe())
                .unwrap_or_else(|| "<freed>".to_string());
            let _ = writeln!(
                out,
                "{}{name} = {} {value}",
                if item.is_const { "const " } else { "" },
                item.value
            );
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/variables.rs"]
mod tests;
