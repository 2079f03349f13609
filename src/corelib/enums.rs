use crate::corelib::args::NativeCall;
use crate::foundation::error::{CodeLocation, ErrorCode, ReliefError, ReliefResult};
use crate::foundation::number::{Number, is_number_int};
use crate::runtime::object::{ObjectId, ObjectValue};
use crate::runtime::parameters::{MapSizeParameter, ParameterKind};
use crate::runtime::vm::VirtualMachine;

/// `<Enum>.FromNumber(n)`.
pub fn call_static(
    vm: &mut VirtualMachine<'_>,
    type_name: &str,
    call: &NativeCall<'_>,
) -> Option<ReliefResult<ObjectId>> {
    let definition = vm.script.enum_definition(type_name)?;
    if call.name != "FromNumber" {
        return None;
    }
    let result = call.expect_count(1, 1).and_then(|()| {
        let n = call.number(&vm.memory, 0)?;
        let value = is_number_int(n)
            .then_some(n as i32)
            .filter(|v| definition.value_name(*v).is_some())
            .ok_or_else(|| {
                call.error(
                    ErrorCode::InvalidEnumValue,
                    format!("{n} is not a value of {type_name}"),
                )
            })?;
        Ok(vm.memory.register(ObjectValue::Enum {
            type_name: type_name.to_string(),
            value,
        }))
    });
    Some(result)
}

/// Enum members such as `Direction.Vertical`.
pub fn load_static_member(
    vm: &mut VirtualMachine<'_>,
    type_name: &str,
    name: &str,
    location: CodeLocation,
) -> Option<ReliefResult<ObjectId>> {
    let definition = vm.script.enum_definition(type_name)?;
    let result = match definition.values.get(name) {
        Some(&value) => Ok(vm.memory.register(ObjectValue::Enum {
            type_name: type_name.to_string(),
            value,
        })),
        None => Err(ReliefError::script(
            ErrorCode::UndefinedMemberVariable,
            location,
            format!("{type_name} has no value {name}"),
        )),
    };
    Some(result)
}

/// Members of the `Parameters` object: the map and render settings plus every declared
/// script parameter.
pub fn load_parameter(
    vm: &mut VirtualMachine<'_>,
    name: &str,
) -> Option<ReliefResult<ObjectId>> {
    let size = |s: &MapSizeParameter| Number::from(s.value());
    let arguments = &vm.arguments;
    let value = match name {
        "MapWidth" => ObjectValue::Number(size(&arguments.map_width)),
        "MapHeight" => ObjectValue::Number(size(&arguments.map_height)),
        "RenderOriginX" => ObjectValue::Number(Number::from(arguments.render_origin.x)),
        "RenderOriginY" => ObjectValue::Number(Number::from(arguments.render_origin.y)),
        "RenderWidth" => ObjectValue::Number(Number::from(vm.render_rectangle().size.width)),
        "RenderHeight" => ObjectValue::Number(Number::from(vm.render_rectangle().size.height)),
        "RenderScale" => ObjectValue::Number(arguments.render_scale),
        _ => match &arguments.get(name)?.kind {
            ParameterKind::Boolean { value, .. } => ObjectValue::Boolean(*value),
            ParameterKind::Number { value, .. } => ObjectValue::Number(*value),
            ParameterKind::Enum {
                type_name, value, ..
            } => ObjectValue::Enum {
                type_name: type_name.clone(),
                value: *value,
            },
        },
    };
    Some(Ok(vm.memory.register(value)))
}

#[cfg(test)]
#[path = "../../tests/unit/corelib/enums.rs"]
mod tests;
