use crate::corelib::args::NativeCall;
use crate::corelib::operators::check_number;
use crate::foundation::error::{ErrorCode, ReliefResult};
use crate::foundation::number::{Number, is_number_int};
use crate::runtime::object::{ObjectId, ObjectValue};
use crate::runtime::vm::VirtualMachine;

/// Runs a math or utility global; `None` when `call` names none.
pub fn call(vm: &mut VirtualMachine<'_>, call: &NativeCall<'_>) -> Option<ReliefResult<ObjectId>> {
    let result = match call.name {
        "Point" => point(vm, call),
        "Min" | "Max" => min_max(vm, call),
        "Abs" | "Sqrt" | "Log" | "Sin" | "Cos" | "Floor" | "Ceil" | "Round" => unary(vm, call),
        "Pow" => pow(vm, call),
        "Random" => random(vm, call),
        "Print" => print(vm, call),
        _ => return None,
    };
    Some(result)
}

fn number(vm: &mut VirtualMachine<'_>, value: Number) -> ObjectId {
    vm.memory.register(ObjectValue::Number(value))
}

fn point(vm: &mut VirtualMachine<'_>, call: &NativeCall<'_>) -> ReliefResult<ObjectId> {
    call.expect_count(2, 2)?;
    let x = call.number(&vm.memory, 0)?;
    let y = call.number(&vm.memory, 1)?;
    Ok(vm.memory.register(ObjectValue::Point { x, y }))
}

fn min_max(vm: &mut VirtualMachine<'_>, call: &NativeCall<'_>) -> ReliefResult<ObjectId> {
    call.expect_count(2, usize::MAX)?;
    let mut result = call.number(&vm.memory, 0)?;
    for index in 1..call.len() {
        let n = call.number(&vm.memory, index)?;
        result = if call.name == "Min" { result.min(n) } else { result.max(n) };
    }
    Ok(number(vm, result))
}

fn unary(vm: &mut VirtualMachine<'_>, call: &NativeCall<'_>) -> ReliefResult<ObjectId> {
    call.expect_count(1, 1)?;
    let n = call.number(&vm.memory, 0)?;
    let out_of_domain = match call.name {
        "Sqrt" => n < 0.0,
        "Log" => n <= 0.0,
        _ => false,
    };
    if out_of_domain {
        return Err(call.error(
            ErrorCode::MathDefinitionRange,
            format!("{} is not defined for {n}", call.name),
        ));
    }
    let value = match call.name {
        "Abs" => n.abs(),
        "Sqrt" => n.sqrt(),
        "Log" => n.ln(),
        "Sin" => n.sin(),
        "Cos" => n.cos(),
        "Floor" => n.floor(),
        "Ceil" => n.ceil(),
        _ => n.round(),
    };
    let value = check_number(call, value, false)?;
    Ok(number(vm, value))
}

fn pow(vm: &mut VirtualMachine<'_>, call: &NativeCall<'_>) -> ReliefResult<ObjectId> {
    call.expect_count(2, 2)?;
    let base = call.number(&vm.memory, 0)?;
    let exponent = call.number(&vm.memory, 1)?;
    let value = check_number(call, base.powf(exponent), base != 0.0)?;
    Ok(number(vm, value))
}

/// `Random()` is uniform in [0, 1); `Random(min, max)` is an integer in [min, max].
fn random(vm: &mut VirtualMachine<'_>, call: &NativeCall<'_>) -> ReliefResult<ObjectId> {
    call.expect_count(0, 2)?;
    if call.is_empty() {
        let value = vm.random.next_f64();
        return Ok(number(vm, value));
    }
    call.expect_count(2, 2)?;
    let min = call.number(&vm.memory, 0)?;
    let max = call.number(&vm.memory, 1)?;
    if !is_number_int(min) || !is_number_int(max) || min > max {
        return Err(call.error(
            ErrorCode::MathDefinitionRange,
            format!("Random needs integer bounds with min <= max, got {min} and {max}"),
        ));
    }
    let value = vm.random.next_int(min as i64, max as i64) as Number;
    Ok(number(vm, value))
}

/// Formats `{0}`, `{1}`, ... placeholders of the first argument with the remaining ones.
fn print(vm: &mut VirtualMachine<'_>, call: &NativeCall<'_>) -> ReliefResult<ObjectId> {
    call.expect_count(1, usize::MAX)?;
    let mut message = call.string(&vm.memory, 0)?.to_string();
    for index in 1..call.len() {
        let value = vm.memory.value(call.id(index)?).describe();
        message = message.replace(&format!("{{{}}}", index - 1), &value);
    }
    vm.print(message);
    Ok(vm.null)
}

#[cfg(test)]
#[path = "../../tests/unit/corelib/math.rs"]
mod tests;
