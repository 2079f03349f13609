use std::cmp::Ordering;

use crate::corelib::args::NativeCall;
use crate::foundation::error::{ErrorCode, ReliefResult};
use crate::foundation::number::{Number, is_number_int};
use crate::runtime::array;
use crate::runtime::object::{ObjectId, ObjectValue};
use crate::runtime::vm::VirtualMachine;

/// Runs an operator function; `None` when `call` names no operator.
pub fn call(vm: &mut VirtualMachine<'_>, call: &NativeCall<'_>) -> Option<ReliefResult<ObjectId>> {
    let result = match call.name {
        "+" => add(vm, call),
        "-" => subtract(vm, call),
        "*" | "/" | "%" => multiplicative(vm, call),
        "==" | "!=" => equality(vm, call),
        "<" | "<=" | ">" | ">=" => relational(vm, call),
        "&&" | "||" => logical(vm, call),
        "!" => not(vm, call),
        "++pre" | "++post" | "--pre" | "--post" => increment(vm, call),
        "[]" => index_get(vm, call),
        "[]=" => index_set(vm, call),
        _ => return None,
    };
    Some(result)
}

/// Rejects results that left the finite range. `operands_nonzero` turns an exact zero into
/// an underflow.
pub(crate) fn check_number(
    call: &NativeCall<'_>,
    value: Number,
    operands_nonzero: bool,
) -> ReliefResult<Number> {
    if value.is_nan() {
        return Err(call.error(
            ErrorCode::MathDefinitionRange,
            format!("{} is not defined for its arguments", call.name),
        ));
    }
    if value.is_infinite() {
        return Err(call.error(
            ErrorCode::NumberOverflow,
            format!("{} overflowed", call.name),
        ));
    }
    if value == 0.0 && operands_nonzero {
        return Err(call.error(
            ErrorCode::NumberUnderflow,
            format!("{} underflowed", call.name),
        ));
    }
    Ok(value)
}

fn operand_number(vm: &VirtualMachine<'_>, call: &NativeCall<'_>, index: usize) -> ReliefResult<Number> {
    match vm.memory.value(call.id(index)?) {
        ObjectValue::Number(n) => Ok(*n),
        other => Err(call.error(
            ErrorCode::IncorrectOperandType,
            format!("operator {} cannot take {}", call.name, other.type_name()),
        )),
    }
}

fn operand_boolean(vm: &VirtualMachine<'_>, call: &NativeCall<'_>, index: usize) -> ReliefResult<bool> {
    match vm.memory.value(call.id(index)?) {
        ObjectValue::Boolean(b) => Ok(*b),
        other => Err(call.error(
            ErrorCode::IncorrectOperandType,
            format!("operator {} cannot take {}", call.name, other.type_name()),
        )),
    }
}

fn number(vm: &mut VirtualMachine<'_>, value: Number) -> ObjectId {
    vm.memory.register(ObjectValue::Number(value))
}

fn boolean(vm: &mut VirtualMachine<'_>, value: bool) -> ObjectId {
    vm.memory.register(ObjectValue::Boolean(value))
}

/// Numeric addition, or concatenation when either side is a string.
fn add(vm: &mut VirtualMachine<'_>, call: &NativeCall<'_>) -> ReliefResult<ObjectId> {
    call.expect_count(2, 2)?;
    let (a, b) = (call.id(0)?, call.id(1)?);
    let concatenated = match (vm.memory.value(a), vm.memory.value(b)) {
        (l @ ObjectValue::String(_), r) | (l, r @ ObjectValue::String(_)) => {
            Some(format!("{}{}", l.describe(), r.describe()))
        }
        _ => None,
    };
    if let Some(text) = concatenated {
        return Ok(vm.memory.register(ObjectValue::String(text)));
    }
    let sum = operand_number(vm, call, 0)? + operand_number(vm, call, 1)?;
    let sum = check_number(call, sum, false)?;
    Ok(number(vm, sum))
}

/// Binary subtraction or unary negation.
fn subtract(vm: &mut VirtualMachine<'_>, call: &NativeCall<'_>) -> ReliefResult<ObjectId> {
    call.expect_count(1, 2)?;
    let value = if call.len() == 1 {
        -operand_number(vm, call, 0)?
    } else {
        operand_number(vm, call, 0)? - operand_number(vm, call, 1)?
    };
    let value = check_number(call, value, false)?;
    Ok(number(vm, value))
}

fn multiplicative(vm: &mut VirtualMachine<'_>, call: &NativeCall<'_>) -> ReliefResult<ObjectId> {
    call.expect_count(2, 2)?;
    let a = operand_number(vm, call, 0)?;
    let b = operand_number(vm, call, 1)?;
    let value = match call.name {
        "*" => check_number(call, a * b, a != 0.0 && b != 0.0)?,
        _ if b == 0.0 => {
            return Err(call.error(
                ErrorCode::DivisionByZero,
                format!("{a} {} 0", call.name),
            ));
        }
        "/" => check_number(call, a / b, a != 0.0)?,
        _ => check_number(call, a % b, false)?,
    };
    Ok(number(vm, value))
}

fn equality(vm: &mut VirtualMachine<'_>, call: &NativeCall<'_>) -> ReliefResult<ObjectId> {
    call.expect_count(2, 2)?;
    let equal = array::compare_objects(&vm.memory, call.id(0)?, call.id(1)?) == Ordering::Equal;
    Ok(boolean(vm, equal == (call.name == "==")))
}

fn relational(vm: &mut VirtualMachine<'_>, call: &NativeCall<'_>) -> ReliefResult<ObjectId> {
    call.expect_count(2, 2)?;
    let a = operand_number(vm, call, 0)?;
    let b = operand_number(vm, call, 1)?;
    let result = match call.name {
        "<" => a < b,
        "<=" => a <= b,
        ">" => a > b,
        _ => a >= b,
    };
    Ok(boolean(vm, result))
}

fn logical(vm: &mut VirtualMachine<'_>, call: &NativeCall<'_>) -> ReliefResult<ObjectId> {
    call.expect_count(2, 2)?;
    let a = operand_boolean(vm, call, 0)?;
    let b = operand_boolean(vm, call, 1)?;
    let result = if call.name == "&&" { a && b } else { a || b };
    Ok(boolean(vm, result))
}

fn not(vm: &mut VirtualMachine<'_>, call: &NativeCall<'_>) -> ReliefResult<ObjectId> {
    call.expect_count(1, 1)?;
    let value = operand_boolean(vm, call, 0)?;
    Ok(boolean(vm, !value))
}

/// `++`/`--` through a reference. Prefix forms return the new value, postfix forms the old.
fn increment(vm: &mut VirtualMachine<'_>, call: &NativeCall<'_>) -> ReliefResult<ObjectId> {
    call.expect_count(1, 1)?;
    let target = match vm.memory.value(call.id(0)?) {
        ObjectValue::Reference(target) => target.clone(),
        other => {
            return Err(call.error(
                ErrorCode::IncorrectOperandType,
                format!("operator {} needs a variable, got {}", call.name, other.type_name()),
            ));
        }
    };
    let current = vm.variable(&target)?.value();
    let old = match vm.memory.value(current) {
        ObjectValue::Number(n) => *n,
        other => {
            return Err(call.error(
                ErrorCode::IncorrectOperandType,
                format!("operator {} cannot take {}", call.name, other.type_name()),
            ));
        }
    };
    let delta = if call.name.starts_with("++") { 1.0 } else { -1.0 };
    let new = check_number(call, old + delta, false)?;

    let stored = number(vm, new);
    vm.memory.add_ref(stored);
    let assigned = vm.assign(&target, stored, call.location);
    vm.memory.release(stored);
    assigned?;

    let returned = if call.name.ends_with("pre") { new } else { old };
    Ok(number(vm, returned))
}

fn operand_array(vm: &VirtualMachine<'_>, call: &NativeCall<'_>) -> ReliefResult<ObjectId> {
    let id = call.id(0)?;
    match vm.memory.value(id) {
        ObjectValue::Array(_) => Ok(id),
        other => Err(call.error(
            ErrorCode::IncorrectOperandType,
            format!("{} cannot be indexed", other.type_name()),
        )),
    }
}

fn index_get(vm: &mut VirtualMachine<'_>, call: &NativeCall<'_>) -> ReliefResult<ObjectId> {
    call.expect_count(2, 2)?;
    let array_id = operand_array(vm, call)?;
    let key = call.id(1)?;
    array::get(&vm.memory, array_id, key).ok_or_else(|| {
        call.error(
            ErrorCode::ArrayKeyNotFound,
            format!("key {} not found", vm.memory.value(key).describe()),
        )
    })
}

/// `a[k] = v` with three arguments, `a[] = v` (append) with two. Returns the stored value.
fn index_set(vm: &mut VirtualMachine<'_>, call: &NativeCall<'_>) -> ReliefResult<ObjectId> {
    call.expect_count(2, 3)?;
    let array_id = operand_array(vm, call)?;
    if call.len() == 2 {
        let value = call.id(1)?;
        array::push_back(&mut vm.memory, array_id, value);
        return Ok(value);
    }
    let key = call.id(1)?;
    let value = call.id(2)?;
    array::set(&mut vm.memory, array_id, key, value);
    Ok(value)
}

/// Integer-valued number argument usable as an index.
pub(crate) fn index_argument(
    vm: &VirtualMachine<'_>,
    call: &NativeCall<'_>,
    index: usize,
) -> ReliefResult<usize> {
    let n = call.number(&vm.memory, index)?;
    if !is_number_int(n) || n < 0.0 {
        return Err(call.error(
            ErrorCode::ArrayKeyNotFound,
            format!("{n} is not a valid index"),
        ));
    }
    Ok(n as usize)
}

#[cfg(test)]
#[path = "../../tests/unit/corelib/operators.rs"]
mod tests;
