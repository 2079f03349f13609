#![allow(dead_code)]

use crate::config::VmConfig;
use crate::corelib::args::NativeCall;
use crate::foundation::error::{CodeLocation, ErrorCode, ReliefResult};
use crate::foundation::geometry::Direction;
use crate::runtime::array::{self, ArrayObject};
use crate::runtime::object::{ObjectId, ObjectValue};
use crate::runtime::script::CompiledScript;
use crate::runtime::vm::VirtualMachine;

pub fn script(value: serde_json::Value) -> CompiledScript {
    serde_json::from_value(value).unwrap()
}

pub fn empty_script() -> CompiledScript {
    script(serde_json::json!({ "main": [] }))
}

pub fn vm(script: &CompiledScript) -> VirtualMachine<'_> {
    let parameters = script.create_script_parameters().unwrap();
    VirtualMachine::new(script, parameters, VmConfig::default()).unwrap()
}

pub fn native<'c>(name: &'c str, args: &'c [ObjectId]) -> NativeCall<'c> {
    NativeCall {
        location: CodeLocation::new(4, 2),
        name,
        args,
    }
}

pub fn number(vm: &mut VirtualMachine<'_>, n: f64) -> ObjectId {
    vm.memory.register(ObjectValue::Number(n))
}

pub fn string(vm: &mut VirtualMachine<'_>, s: &str) -> ObjectId {
    vm.memory.register(ObjectValue::String(s.to_string()))
}

pub fn boolean(vm: &mut VirtualMachine<'_>, b: bool) -> ObjectId {
    vm.memory.register(ObjectValue::Boolean(b))
}

pub fn point(vm: &mut VirtualMachine<'_>, x: f64, y: f64) -> ObjectId {
    vm.memory.register(ObjectValue::Point { x, y })
}

pub fn direction(vm: &mut VirtualMachine<'_>, d: Direction) -> ObjectId {
    vm.memory.register(ObjectValue::Enum {
        type_name: "Direction".to_string(),
        value: d.as_number(),
    })
}

/// Array of numbers keyed 0, 1, 2, ...
pub fn number_array(vm: &mut VirtualMachine<'_>, values: &[f64]) -> ObjectId {
    let id = vm.memory.register(ObjectValue::Array(ArrayObject::new()));
    for &v in values {
        let value = number(vm, v);
        array::push_back(&mut vm.memory, id, value);
    }
    id
}

/// Array with explicit numeric keys.
pub fn keyed_array(vm: &mut VirtualMachine<'_>, pairs: &[(f64, f64)]) -> ObjectId {
    let id = vm.memory.register(ObjectValue::Array(ArrayObject::new()));
    for &(k, v) in pairs {
        let key = number(vm, k);
        let value = number(vm, v);
        array::set(&mut vm.memory, id, key, value);
    }
    id
}

pub fn as_number(vm: &VirtualMachine<'_>, id: ObjectId) -> f64 {
    match vm.memory.value(id) {
        ObjectValue::Number(n) => *n,
        other => panic!("expected a Number, got {}", other.type_name()),
    }
}

pub fn as_bool(vm: &VirtualMachine<'_>, id: ObjectId) -> bool {
    match vm.memory.value(id) {
        ObjectValue::Boolean(b) => *b,
        other => panic!("expected a Boolean, got {}", other.type_name()),
    }
}

pub fn as_string(vm: &VirtualMachine<'_>, id: ObjectId) -> String {
    match vm.memory.value(id) {
        ObjectValue::String(s) => s.clone(),
        other => panic!("expected a String, got {}", other.type_name()),
    }
}

pub fn error_code(result: ReliefResult<ObjectId>) -> ErrorCode {
    result.unwrap_err().code().unwrap()
}
