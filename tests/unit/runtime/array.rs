use super::*;

fn number(memory: &mut MemoryManager, n: Number) -> ObjectId {
    memory.register(ObjectValue::Number(n))
}

fn new_array(memory: &mut MemoryManager) -> ObjectId {
    let id = memory.register(ObjectValue::Array(ArrayObject::new()));
    memory.add_ref(id);
    id
}

fn values(memory: &MemoryManager, array: ObjectId) -> Vec<Number> {
    array_ref(memory, array)
        .entries()
        .map(|e| match memory.value(e.value) {
            ObjectValue::Number(n) => *n,
            other => panic!("unexpected {}", other.type_name()),
        })
        .collect()
}

#[test]
fn keys_compare_by_value_for_value_types() {
    let mut memory = MemoryManager::new();
    let a = number(&mut memory, 3.0);
    let b = number(&mut memory, 3.0);
    let s = memory.register(ObjectValue::String("3".into()));
    assert_eq!(ArrayKey::of(&memory, a), ArrayKey::of(&memory, b));
    assert_ne!(ArrayKey::of(&memory, a), ArrayKey::of(&memory, s));
    assert!(ArrayKey::of(&memory, a) < ArrayKey::of(&memory, s));

    let m1 = memory.register(ObjectValue::HeightMap);
    let m2 = memory.register(ObjectValue::HeightMap);
    assert_ne!(ArrayKey::of(&memory, m1), ArrayKey::of(&memory, m2));
}

#[test]
fn push_back_uses_next_integer_key() {
    let mut memory = MemoryManager::new();
    let array = new_array(&mut memory);
    let seven = number(&mut memory, 7.0);
    let key = number(&mut memory, 10.0);
    set(&mut memory, array, key, seven);
    let x = number(&mut memory, 1.0);
    push_back(&mut memory, array, x);

    let eleven = number(&mut memory, 11.0);
    assert_eq!(get(&memory, array, eleven), Some(x));
    assert_eq!(values(&memory, array), vec![7.0, 1.0]);
}

#[test]
fn fractional_keys_do_not_advance_the_index() {
    let mut memory = MemoryManager::new();
    let array = new_array(&mut memory);
    let key = number(&mut memory, 2.5);
    let v = number(&mut memory, 0.0);
    set(&mut memory, array, key, v);
    assert_eq!(array_ref(&memory, array).next_integer_key(), 0.0);
}

#[test]
fn replacing_a_key_keeps_position_and_releases_old_objects() {
    let mut memory = MemoryManager::new();
    let array = new_array(&mut memory);
    for n in [1.0, 2.0, 3.0] {
        let v = number(&mut memory, n);
        push_back(&mut memory, array, v);
    }
    let key = number(&mut memory, 1.0);
    let replaced_value = {
        let k = number(&mut memory, 1.0);
        let v = get(&memory, array, k);
        memory.destroy(k);
        v
    };
    let v = number(&mut memory, 20.0);
    set(&mut memory, array, key, v);

    assert_eq!(values(&memory, array), vec![1.0, 20.0, 3.0]);
    assert!(replaced_value.is_some_and(|id| !memory.contains(id)));
    let probe = number(&mut memory, 1.0);
    assert_eq!(get_actual_key(&memory, array, probe), Some(key));
}

#[test]
fn remove_key_and_value() {
    let mut memory = MemoryManager::new();
    let array = new_array(&mut memory);
    for n in [4.0, 5.0, 4.0] {
        let v = number(&mut memory, n);
        push_back(&mut memory, array, v);
    }
    let four = number(&mut memory, 4.0);
    assert!(contains_value(&memory, array, four));
    assert_eq!(remove_value(&mut memory, array, four), 2);
    assert!(!contains_value(&memory, array, four));
    assert_eq!(values(&memory, array), vec![5.0]);

    let one = number(&mut memory, 1.0);
    assert!(contains_key(&memory, array, one));
    assert!(remove_key(&mut memory, array, one));
    assert!(!remove_key(&mut memory, array, one));
    assert!(array_ref(&memory, array).is_empty());
}

#[test]
fn pop_hands_references_to_the_caller() {
    let mut memory = MemoryManager::new();
    let array = new_array(&mut memory);
    for n in [1.0, 2.0] {
        let v = number(&mut memory, n);
        push_back(&mut memory, array, v);
    }
    let Some(entry) = pop_back(&mut memory, array) else {
        panic!("array was not empty");
    };
    assert_eq!(memory.ref_count(entry.value), Some(1));
    memory.release(entry.key);
    memory.release(entry.value);
    let Some(front) = pop_front(&mut memory, array) else {
        panic!("array was not empty");
    };
    assert_eq!(memory.value(front.value).describe(), "1");
    assert!(pop_front(&mut memory, array).is_none());
    memory.release(front.key);
    memory.release(front.value);
    memory.release(array);
    assert_eq!(memory.live_count(), 0);
}

#[test]
fn sorting_reorders_iteration() {
    let mut memory = MemoryManager::new();
    let array = new_array(&mut memory);
    for (k, v) in [(3.0, 10.0), (1.0, 30.0), (2.0, 20.0)] {
        let key = number(&mut memory, k);
        let value = number(&mut memory, v);
        set(&mut memory, array, key, value);
    }
    sort_by_keys(&mut memory, array);
    assert_eq!(values(&memory, array), vec![30.0, 20.0, 10.0]);
    sort_by_values(&mut memory, array);
    assert_eq!(values(&memory, array), vec![10.0, 20.0, 30.0]);
    assert_eq!(array_ref(&memory, array).back().map(|e| e.value), {
        let k = number(&mut memory, 1.0);
        get(&memory, array, k)
    });
}

#[test]
fn shuffle_is_a_seeded_permutation() {
    let mut memory = MemoryManager::new();
    let array = new_array(&mut memory);
    for n in 0..20 {
        let v = number(&mut memory, f64::from(n));
        push_back(&mut memory, array, v);
    }
    shuffle(&mut memory, array, &mut RandomSequence::new(5));
    let first = values(&memory, array);
    let mut sorted = first.clone();
    sorted.sort_by(f64::total_cmp);
    assert_eq!(sorted, (0..20).map(f64::from).collect::<Vec<_>>());

    sort_by_keys(&mut memory, array);
    shuffle(&mut memory, array, &mut RandomSequence::new(5));
    assert_eq!(values(&memory, array), first);
}
