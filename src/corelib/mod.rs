//! Native functions and types callable from scripts.
//!
//! Every native receives the VM and a [`NativeCall`](args::NativeCall) and returns the object
//! to push. Objects are registered with no references; pushing the result takes the first
//! one. Raster natives never touch samples: they record steps into the rendering sequence.

use crate::foundation::error::{CodeLocation, ErrorCode, ReliefError, ReliefResult};
use crate::runtime::object::{ObjectId, ObjectValue};
use crate::runtime::vm::VirtualMachine;

use args::NativeCall;

/// Typed argument accessors.
pub mod args;
/// `Array` statics and instance methods.
pub mod array;
/// Enum members, `FromNumber` and the `Parameters` object.
pub mod enums;
/// `HeightMap` constructors and methods.
pub mod height_map;
/// `HeightProfile` constructors and methods.
pub mod height_profile;
/// Math and utility globals.
pub mod math;
/// Operator functions.
pub mod operators;

/// Dispatches a call of a global native function.
pub fn call_global(vm: &mut VirtualMachine<'_>, call: &NativeCall<'_>) -> ReliefResult<ObjectId> {
    if let Some(result) = operators::call(vm, call) {
        return result;
    }
    if let Some(result) = math::call(vm, call) {
        return result;
    }
    Err(call.error(
        ErrorCode::UndefinedFunction,
        format!("undefined function {}", call.name),
    ))
}

/// Receiver of a member access, detached from the memory borrow.
enum Receiver {
    Null,
    Static(String),
    HeightMap,
    HeightProfile,
    Array,
    Parameters,
    Other(String),
}

impl Receiver {
    fn of(vm: &VirtualMachine<'_>, instance: ObjectId) -> Self {
        match vm.memory.value(instance) {
            ObjectValue::Null => Self::Null,
            ObjectValue::Static { type_name } => Self::Static(type_name.clone()),
            ObjectValue::HeightMap => Self::HeightMap,
            ObjectValue::HeightProfile => Self::HeightProfile,
            ObjectValue::Array(_) => Self::Array,
            ObjectValue::Parameters => Self::Parameters,
            other => Self::Other(other.type_name().to_string()),
        }
    }

    fn type_name(&self) -> &str {
        match self {
            Self::Null => "Null",
            Self::Static(name) | Self::Other(name) => name,
            Self::HeightMap => "HeightMap",
            Self::HeightProfile => "HeightProfile",
            Self::Array => "Array",
            Self::Parameters => "Parameters",
        }
    }
}

/// Dispatches a member call on `instance`.
pub fn call_member(
    vm: &mut VirtualMachine<'_>,
    instance: ObjectId,
    call: &NativeCall<'_>,
) -> ReliefResult<ObjectId> {
    let receiver = Receiver::of(vm, instance);
    let result = match &receiver {
        Receiver::Null => {
            return Err(call.error(
                ErrorCode::NullReference,
                format!("{} called on null", call.name),
            ));
        }
        Receiver::Static(type_name) => match type_name.as_str() {
            "HeightMap" => height_map::call_static(vm, call),
            "HeightProfile" => height_profile::call_static(vm, call),
            "Array" => array::call_static(vm, call),
            _ => enums::call_static(vm, type_name, call),
        },
        Receiver::HeightMap => height_map::call_method(vm, instance, call),
        Receiver::HeightProfile => height_profile::call_method(vm, instance, call),
        Receiver::Array => array::call_method(vm, instance, call),
        Receiver::Parameters | Receiver::Other(_) => None,
    };
    result.unwrap_or_else(|| {
        Err(call.error(
            ErrorCode::UndefinedFunction,
            format!("{} has no function {}", receiver.type_name(), call.name),
        ))
    })
}

/// Reads a member variable of `instance`.
pub fn load_member(
    vm: &mut VirtualMachine<'_>,
    instance: ObjectId,
    name: &str,
    location: CodeLocation,
) -> ReliefResult<ObjectId> {
    let receiver = Receiver::of(vm, instance);
    let result = match &receiver {
        Receiver::Null => {
            return Err(ReliefError::script(
                ErrorCode::NullReference,
                location,
                format!("member {name} read from null"),
            ));
        }
        Receiver::Static(type_name) => enums::load_static_member(vm, type_name, name, location),
        Receiver::Parameters => enums::load_parameter(vm, name),
        _ => None,
    };
    result.unwrap_or_else(|| {
        Err(ReliefError::script(
            ErrorCode::UndefinedMemberVariable,
            location,
            format!("{} has no member {name}", receiver.type_name()),
        ))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/corelib/mod.rs"]
mod tests;
