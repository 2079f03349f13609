use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::foundation::number::{Number, is_number_int};
use crate::foundation::random::RandomSequence;
use crate::runtime::memory::MemoryManager;
use crate::runtime::object::{ObjectId, ObjectValue};

/// Comparable projection of an object used to key arrays and to compare values.
///
/// Value types compare by value; everything else compares by identity. Values of different
/// types order by type first.
#[derive(Clone, Debug)]
pub enum ArrayKey {
    Null,
    Boolean(bool),
    Number(Number),
    String(String),
    Point(Number, Number),
    Enum(String, i32),
    Identity(ObjectId),
}

impl ArrayKey {
    pub fn of(memory: &MemoryManager, id: ObjectId) -> Self {
        match memory.value(id) {
            ObjectValue::Null => Self::Null,
            ObjectValue::Boolean(b) => Self::Boolean(*b),
            ObjectValue::Number(n) => Self::Number(*n),
            ObjectValue::String(s) => Self::String(s.clone()),
            ObjectValue::Point { x, y } => Self::Point(*x, *y),
            ObjectValue::Enum { type_name, value } => Self::Enum(type_name.clone(), *value),
            _ => Self::Identity(id),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Boolean(_) => 1,
            Self::Number(_) => 2,
            Self::String(_) => 3,
            Self::Point(..) => 4,
            Self::Enum(..) => 5,
            Self::Identity(_) => 6,
        }
    }
}

impl Ord for ArrayKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Boolean(a), Self::Boolean(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::Point(ax, ay), Self::Point(bx, by)) => {
                ax.total_cmp(bx).then_with(|| ay.total_cmp(by))
            }
            (Self::Enum(at, av), Self::Enum(bt, bv)) => at.cmp(bt).then(av.cmp(bv)),
            (Self::Identity(a), Self::Identity(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for ArrayKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ArrayKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ArrayKey {}

/// Orders two objects the way array keys are ordered.
pub fn compare_objects(memory: &MemoryManager, a: ObjectId, b: ObjectId) -> Ordering {
    ArrayKey::of(memory, a).cmp(&ArrayKey::of(memory, b))
}

/// Key and value objects stored under one array key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArrayEntry {
    pub key: ObjectId,
    pub value: ObjectId,
}

/// Ordered key/value container.
///
/// `order` keeps insertion (or sorted) order and `entries` maps each key to its objects; every
/// key appears exactly once in both. This type does no reference counting: the free functions
/// in this module wrap it and keep the memory manager in sync.
#[derive(Clone, Debug)]
pub struct ArrayObject {
    order: Vec<ArrayKey>,
    entries: BTreeMap<ArrayKey, ArrayEntry>,
    max_integer_key: i64,
}

impl Default for ArrayObject {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            entries: BTreeMap::new(),
            max_integer_key: -1,
        }
    }
}

impl ArrayObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, key: &ArrayKey) -> Option<ArrayEntry> {
        self.entries.get(key).copied()
    }

    pub fn contains_key(&self, key: &ArrayKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Inserts or replaces; a replaced key keeps its position. Returns the replaced entry.
    pub fn insert(&mut self, key: ArrayKey, entry: ArrayEntry) -> Option<ArrayEntry> {
        if let ArrayKey::Number(n) = key
            && is_number_int(n)
        {
            self.max_integer_key = self.max_integer_key.max(n as i64);
        }
        let replaced = self.entries.insert(key.clone(), entry);
        if replaced.is_none() {
            self.order.push(key);
        }
        replaced
    }

    pub fn remove(&mut self, key: &ArrayKey) -> Option<ArrayEntry> {
        let removed = self.entries.remove(key)?;
        self.order.retain(|k| k != key);
        Some(removed)
    }

    /// Key the next auto-indexed element gets.
    pub fn next_integer_key(&self) -> Number {
        (self.max_integer_key + 1) as Number
    }

    pub fn entry_at(&self, index: usize) -> Option<ArrayEntry> {
        self.order.get(index).and_then(|k| self.get(k))
    }

    pub fn front(&self) -> Option<ArrayEntry> {
        self.entry_at(0)
    }

    pub fn back(&self) -> Option<ArrayEntry> {
        self.len().checked_sub(1).and_then(|i| self.entry_at(i))
    }

    pub fn pop_front(&mut self) -> Option<ArrayEntry> {
        let key = self.order.first()?.clone();
        self.remove(&key)
    }

    pub fn pop_back(&mut self) -> Option<ArrayEntry> {
        let key = self.order.last()?.clone();
        self.remove(&key)
    }

    /// Entries in iteration order.
    pub fn entries(&self) -> impl Iterator<Item = ArrayEntry> + '_ {
        self.order.iter().filter_map(|k| self.get(k))
    }

    pub fn sort_by_keys(&mut self) {
        self.order.sort();
    }

    /// Reorders by a precomputed projection of each entry.
    fn sort_by_projection(&mut self, projections: &BTreeMap<ArrayKey, ArrayKey>) {
        self.order
            .sort_by(|a, b| match (projections.get(a), projections.get(b)) {
                (Some(pa), Some(pb)) => pa.cmp(pb).then_with(|| a.cmp(b)),
                _ => a.cmp(b),
            });
    }

    /// Fisher-Yates over the iteration order.
    pub fn shuffle(&mut self, random: &mut RandomSequence) {
        for i in (1..self.order.len()).rev() {
            let j = random.next_int(0, i as i64) as usize;
            self.order.swap(i, j);
        }
    }

    pub fn children(&self) -> Vec<ObjectId> {
        self.entries
            .values()
            .flat_map(|e| [e.key, e.value])
            .collect()
    }
}

fn array_mut(memory: &mut MemoryManager, array: ObjectId) -> &mut ArrayObject {
    match memory.value_mut(array) {
        ObjectValue::Array(a) => a,
        other => panic!("object {array} is a {}, not an array", other.type_name()),
    }
}

/// Array view of an object. Panics when the object is not an array.
pub fn array_ref(memory: &MemoryManager, array: ObjectId) -> &ArrayObject {
    match memory.value(array) {
        ObjectValue::Array(a) => a,
        other => panic!("object {array} is a {}, not an array", other.type_name()),
    }
}

/// Stores `value` under `key`, retaining both and releasing whatever was replaced.
pub fn set(memory: &mut MemoryManager, array: ObjectId, key: ObjectId, value: ObjectId) {
    let array_key = ArrayKey::of(memory, key);
    memory.add_ref(key);
    memory.add_ref(value);
    let replaced = array_mut(memory, array).insert(array_key, ArrayEntry { key, value });
    if let Some(old) = replaced {
        memory.release(old.key);
        memory.release(old.value);
    }
}

/// Appends under the next integer key.
pub fn push_back(memory: &mut MemoryManager, array: ObjectId, value: ObjectId) {
    let next = array_ref(memory, array).next_integer_key();
    let key = memory.register(ObjectValue::Number(next));
    set(memory, array, key, value);
}

pub fn get(memory: &MemoryManager, array: ObjectId, key: ObjectId) -> Option<ObjectId> {
    let array_key = ArrayKey::of(memory, key);
    array_ref(memory, array).get(&array_key).map(|e| e.value)
}

/// Key object equal to `key` that is actually stored in the array.
pub fn get_actual_key(memory: &MemoryManager, array: ObjectId, key: ObjectId) -> Option<ObjectId> {
    let array_key = ArrayKey::of(memory, key);
    array_ref(memory, array).get(&array_key).map(|e| e.key)
}

pub fn contains_key(memory: &MemoryManager, array: ObjectId, key: ObjectId) -> bool {
    let array_key = ArrayKey::of(memory, key);
    array_ref(memory, array).contains_key(&array_key)
}

pub fn contains_value(memory: &MemoryManager, array: ObjectId, value: ObjectId) -> bool {
    array_ref(memory, array)
        .entries()
        .any(|e| compare_objects(memory, e.value, value) == Ordering::Equal)
}

/// Removes the entry stored under `key`; returns whether one existed.
pub fn remove_key(memory: &mut MemoryManager, array: ObjectId, key: ObjectId) -> bool {
    let array_key = ArrayKey::of(memory, key);
    match array_mut(memory, array).remove(&array_key) {
        Some(entry) => {
            memory.release(entry.key);
            memory.release(entry.value);
            true
        }
        None => false,
    }
}

/// Removes every entry whose value equals `value`; returns how many were removed.
pub fn remove_value(memory: &mut MemoryManager, array: ObjectId, value: ObjectId) -> usize {
    let doomed: Vec<ArrayKey> = {
        let a = array_ref(memory, array);
        a.order
            .iter()
            .filter(|k| {
                a.get(k).is_some_and(|e| compare_objects(memory, e.value, value) == Ordering::Equal)
            })
            .cloned()
            .collect()
    };
    for key in &doomed {
        if let Some(entry) = array_mut(memory, array).remove(key) {
            memory.release(entry.key);
            memory.release(entry.value);
        }
    }
    doomed.len()
}

/// Removes the first entry. The caller receives ownership of one reference to each object.
pub fn pop_front(memory: &mut MemoryManager, array: ObjectId) -> Option<ArrayEntry> {
    array_mut(memory, array).pop_front()
}

/// Removes the last entry. The caller receives ownership of one reference to each object.
pub fn pop_back(memory: &mut MemoryManager, array: ObjectId) -> Option<ArrayEntry> {
    array_mut(memory, array).pop_back()
}

pub fn sort_by_keys(memory: &mut MemoryManager, array: ObjectId) {
    array_mut(memory, array).sort_by_keys();
}

pub fn sort_by_values(memory: &mut MemoryManager, array: ObjectId) {
    let projections: BTreeMap<ArrayKey, ArrayKey> = {
        let a = array_ref(memory, array);
        a.order
            .iter()
            .filter_map(|k| a.get(k).map(|e| (k.clone(), ArrayKey::of(memory, e.value))))
            .collect()
    };
    array_mut(memory, array).sort_by_projection(&projections);
}

pub fn shuffle(memory: &mut MemoryManager, array: ObjectId, random: &mut RandomSequence) {
    array_mut(memory, array).shuffle(random);
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/array.rs"]
mod tests;
