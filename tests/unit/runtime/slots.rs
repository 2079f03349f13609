use super::*;
use crate::runtime::object::ObjectValue;

#[test]
fn assign_and_look_up() {
    let mut memory = MemoryManager::new();
    let mut table = SlotTable::new();
    let map = memory.register(ObjectValue::HeightMap);
    table.assign(map, 3, &memory);
    assert_eq!(table.get(map), Some(3));
    assert_eq!(table.slot_of(map), 3);
    assert_eq!(table.len(), 1);
}

#[test]
#[should_panic(expected = "already owns a renderer slot")]
fn a_handle_gets_one_slot() {
    let mut memory = MemoryManager::new();
    let mut table = SlotTable::new();
    let map = memory.register(ObjectValue::HeightMap);
    table.assign(map, 0, &memory);
    table.assign(map, 1, &memory);
}

#[test]
#[should_panic(expected = "has no renderer slot")]
fn slot_of_unknown_handle_panics() {
    let mut memory = MemoryManager::new();
    let table = SlotTable::new();
    let number = memory.register(ObjectValue::Number(1.0));
    let _ = table.slot_of(number);
}

#[test]
fn destroyed_handles_are_forgotten() {
    let mut memory = MemoryManager::new();
    let mut table = SlotTable::new();
    let kept = memory.register(ObjectValue::HeightProfile);
    table.assign(kept, 0, &memory);
    for slot in 1..200 {
        let temporary = memory.register(ObjectValue::HeightMap);
        table.assign(temporary, slot, &memory);
        memory.destroy(temporary);
    }
    assert!(table.len() <= 2 * PRUNE_MIN);
    assert_eq!(table.get(kept), Some(0));

    table.prune(&memory);
    assert_eq!(table.len(), 1);
    assert!(!table.is_empty());
}
