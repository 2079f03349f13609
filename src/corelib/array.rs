use crate::corelib::args::NativeCall;
use crate::corelib::operators::index_argument;
use crate::foundation::error::{ErrorCode, ReliefError, ReliefResult};
use crate::foundation::number::Number;
use crate::runtime::array::{self, ArrayObject};
use crate::runtime::object::{ObjectId, ObjectValue};
use crate::runtime::vm::VirtualMachine;

/// `Array.Empty()` and `Array.FromList(...)`.
pub fn call_static(
    vm: &mut VirtualMachine<'_>,
    call: &NativeCall<'_>,
) -> Option<ReliefResult<ObjectId>> {
    let result = match call.name {
        "Empty" => call
            .expect_count(0, 0)
            .map(|()| vm.memory.register(ObjectValue::Array(ArrayObject::new()))),
        "FromList" => {
            let id = vm.memory.register(ObjectValue::Array(ArrayObject::new()));
            for &value in call.args {
                array::push_back(&mut vm.memory, id, value);
            }
            Ok(id)
        }
        _ => return None,
    };
    Some(result)
}

/// Instance methods. Mutating methods return the array itself.
pub fn call_method(
    vm: &mut VirtualMachine<'_>,
    instance: ObjectId,
    call: &NativeCall<'_>,
) -> Option<ReliefResult<ObjectId>> {
    let result = match call.name {
        "Count" => call.expect_count(0, 0).map(|()| {
            let count = array::array_ref(&vm.memory, instance).len() as Number;
            vm.memory.register(ObjectValue::Number(count))
        }),
        "Front" | "Back" => front_back(vm, instance, call),
        "PushBack" => call.expect_count(1, 1).and_then(|()| {
            array::push_back(&mut vm.memory, instance, call.id(0)?);
            Ok(instance)
        }),
        "PopFront" | "PopBack" => pop(vm, instance, call),
        "ContainsKey" | "ContainsValue" => call.expect_count(1, 1).and_then(|()| {
            let probe = call.id(0)?;
            let found = if call.name == "ContainsKey" {
                array::contains_key(&vm.memory, instance, probe)
            } else {
                array::contains_value(&vm.memory, instance, probe)
            };
            Ok(vm.memory.register(ObjectValue::Boolean(found)))
        }),
        "RemoveKey" => call.expect_count(1, 1).and_then(|()| {
            let key = call.id(0)?;
            if array::remove_key(&mut vm.memory, instance, key) {
                Ok(instance)
            } else {
                Err(call.error(
                    ErrorCode::ArrayKeyNotFound,
                    format!("key {} not found", vm.memory.value(key).describe()),
                ))
            }
        }),
        "RemoveValue" => call.expect_count(1, 1).and_then(|()| {
            array::remove_value(&mut vm.memory, instance, call.id(0)?);
            Ok(instance)
        }),
        "GetKeyByIndex" | "GetValueByIndex" => by_index(vm, instance, call),
        "SortByKeys" => call.expect_count(0, 0).map(|()| {
            array::sort_by_keys(&mut vm.memory, instance);
            instance
        }),
        "SortByValues" => call.expect_count(0, 0).map(|()| {
            array::sort_by_values(&mut vm.memory, instance);
            instance
        }),
        "Shuffle" => call.expect_count(0, 0).map(|()| {
            array::shuffle(&mut vm.memory, instance, &mut vm.random);
            instance
        }),
        _ => return None,
    };
    Some(result)
}

fn empty_error(call: &NativeCall<'_>) -> ReliefError {
    call.error(
        ErrorCode::EmptyArray,
        format!("{} called on an empty array", call.name),
    )
}

fn front_back(
    vm: &mut VirtualMachine<'_>,
    instance: ObjectId,
    call: &NativeCall<'_>,
) -> ReliefResult<ObjectId> {
    call.expect_count(0, 0)?;
    let a = array::array_ref(&vm.memory, instance);
    let entry = if call.name == "Front" { a.front() } else { a.back() };
    entry.map(|e| e.value).ok_or_else(|| empty_error(call))
}

/// Removes an end element and returns its value. The removed key and value references are
/// handed to the VM, which drops them once the value is on the stack.
fn pop(
    vm: &mut VirtualMachine<'_>,
    instance: ObjectId,
    call: &NativeCall<'_>,
) -> ReliefResult<ObjectId> {
    call.expect_count(0, 0)?;
    let entry = if call.name == "PopFront" {
        array::pop_front(&mut vm.memory, instance)
    } else {
        array::pop_back(&mut vm.memory, instance)
    };
    let entry = entry.ok_or_else(|| empty_error(call))?;
    vm.release_after_call(entry.key);
    vm.release_after_call(entry.value);
    Ok(entry.value)
}

fn by_index(
    vm: &mut VirtualMachine<'_>,
    instance: ObjectId,
    call: &NativeCall<'_>,
) -> ReliefResult<ObjectId> {
    call.expect_count(1, 1)?;
    let index = index_argument(vm, call, 0)?;
    let entry = array::array_ref(&vm.memory, instance)
        .entry_at(index)
        .ok_or_else(|| {
            call.error(
                ErrorCode::ArrayKeyNotFound,
                format!("index {index} is out of range"),
            )
        })?;
    Ok(if call.name == "GetKeyByIndex" {
        entry.key
    } else {
        entry.value
    })
}

#[cfg(test)]
#[path = "../../tests/unit/corelib/array.rs"]
mod tests;
