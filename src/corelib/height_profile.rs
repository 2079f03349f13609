use std::collections::BTreeMap;

use crate::corelib::args::NativeCall;
use crate::corelib::height_map::{height_range, noise_layer_arguments, noise_layers, noise_seed};
use crate::foundation::error::{ErrorCode, ReliefResult};
use crate::foundation::geometry::{Coordinate, Interval};
use crate::foundation::number::{Height, number_to_coordinate, number_to_height};
use crate::renderer::step::StepKind;
use crate::runtime::array;
use crate::runtime::object::{ObjectId, ObjectValue};
use crate::runtime::vm::VirtualMachine;

/// Static members of `HeightProfile`.
pub fn call_static(
    vm: &mut VirtualMachine<'_>,
    call: &NativeCall<'_>,
) -> Option<ReliefResult<ObjectId>> {
    let result = match call.name {
        "Flat" | "Gradient" | "FromArray" | "Noise" | "Slice" | "Clone" => create(vm, call),
        _ => return None,
    };
    Some(result)
}

fn create(vm: &mut VirtualMachine<'_>, call: &NativeCall<'_>) -> ReliefResult<ObjectId> {
    let memory = &vm.memory;
    let (kind, inputs): (StepKind, Vec<ObjectId>) = match call.name {
        "Flat" => {
            call.expect_count(0, 1)?;
            let height = call.optional_height(memory, 0, 0)?;
            (StepKind::ProfileFlat { height }, vec![])
        }
        "Gradient" => {
            call.expect_count(4, 4)?;
            let kind = StepKind::ProfileGradient {
                source: call.coordinate(memory, 0)?,
                destination: call.coordinate(memory, 1)?,
                from: call.height(memory, 2)?,
                to: call.height(memory, 3)?,
            };
            (kind, vec![])
        }
        "FromArray" => {
            call.expect_count(1, 1)?;
            (StepKind::ProfileFromArray { keys: control_points(vm, call)? }, vec![])
        }
        "Noise" => {
            call.expect_count(0, 2)?;
            let layers = noise_layers(vm, call, 0)?;
            let seed = noise_seed(vm, call, 1)?;
            (StepKind::ProfileNoise { layers, seed }, vec![])
        }
        "Slice" => {
            call.expect_count(3, 3)?;
            let map = call.map(memory, 0)?;
            let direction = call.direction(memory, 1)?;
            let coordinate = call.coordinate(memory, 2)?;
            (StepKind::ProfileSlice { direction, coordinate }, vec![map])
        }
        _ => {
            call.expect_count(1, 1)?;
            (StepKind::ProfileClone, vec![call.profile(memory, 0)?])
        }
    };
    vm.emit_creator(kind, &inputs, call.location)
}

/// `{coordinate: height}` pairs of a `FromArray` call.
fn control_points(
    vm: &VirtualMachine<'_>,
    call: &NativeCall<'_>,
) -> ReliefResult<BTreeMap<Coordinate, Height>> {
    let table = call.array(&vm.memory, 0)?;
    let mut points = BTreeMap::new();
    for entry in array::array_ref(&vm.memory, table).entries() {
        let (ObjectValue::Number(key), ObjectValue::Number(value)) =
            (vm.memory.value(entry.key), vm.memory.value(entry.value))
        else {
            return Err(call.error(
                ErrorCode::IncorrectNativeFunctionArgumentType,
                "FromArray needs an array of numbers keyed by numbers",
            ));
        };
        let coordinate = number_to_coordinate(*key).ok_or_else(|| {
            call.error(
                ErrorCode::CoordinateOverflow,
                format!("coordinate {key} is out of range"),
            )
        })?;
        let height = number_to_height(*value).ok_or_else(|| {
            call.error(
                ErrorCode::HeightOverflow,
                format!("height {value} is outside [-1, 1]"),
            )
        })?;
        points.insert(coordinate, height);
    }
    Ok(points)
}

/// Instance methods of `HeightProfile`. Every method modifies the profile and returns it.
pub fn call_method(
    vm: &mut VirtualMachine<'_>,
    instance: ObjectId,
    call: &NativeCall<'_>,
) -> Option<ReliefResult<ObjectId>> {
    let (kind, inputs) = match plan_method(vm, call) {
        Ok(Some(planned)) => planned,
        Ok(None) => return None,
        Err(error) => return Some(Err(error)),
    };
    Some(vm.emit_in_place(instance, kind, &inputs, call.location))
}

fn interval_argument(
    vm: &VirtualMachine<'_>,
    call: &NativeCall<'_>,
    first: usize,
) -> ReliefResult<Interval> {
    Ok(Interval::from_coordinates(
        call.coordinate(&vm.memory, first)?,
        call.coordinate(&vm.memory, first + 1)?,
    ))
}

fn plan_method(
    vm: &VirtualMachine<'_>,
    call: &NativeCall<'_>,
) -> ReliefResult<Option<(StepKind, Vec<ObjectId>)>> {
    let memory = &vm.memory;
    let planned = match call.name {
        "Abs" => {
            call.expect_count(0, 0)?;
            (StepKind::ProfileAbs, vec![])
        }
        "Add" => {
            call.expect_count(1, 1)?;
            (StepKind::ProfileAdd { height: call.height(memory, 0)? }, vec![])
        }
        "AddProfile" => {
            call.expect_count(1, 1)?;
            (StepKind::ProfileAddProfile, vec![call.profile(memory, 0)?])
        }
        "AddMasked" => {
            call.expect_count(2, 2)?;
            let mask = call.profile(memory, 1)?;
            match memory.value(call.id(0)?) {
                ObjectValue::Number(_) => (
                    StepKind::ProfileAddMasked { height: call.height(memory, 0)? },
                    vec![mask],
                ),
                _ => (
                    StepKind::ProfileAddProfileMasked,
                    vec![call.profile(memory, 0)?, mask],
                ),
            }
        }
        "Blur" => {
            call.expect_count(1, 1)?;
            (StepKind::ProfileBlur { radius: call.size(memory, 0)? }, vec![])
        }
        "ClampHeights" => {
            call.expect_count(2, 2)?;
            let (min, max) = height_range(vm, call, 0)?;
            (StepKind::ProfileClampHeights { min, max }, vec![])
        }
        "Combine" => {
            call.expect_count(2, 2)?;
            (
                StepKind::ProfileCombine,
                vec![call.profile(memory, 0)?, call.profile(memory, 1)?],
            )
        }
        "Crop" => {
            call.expect_count(2, 3)?;
            let interval = interval_argument(vm, call, 0)?;
            let height = call.optional_height(memory, 2, 0)?;
            (StepKind::ProfileCrop { interval, height }, vec![])
        }
        "CropHeights" => {
            call.expect_count(2, 3)?;
            let (min, max) = height_range(vm, call, 0)?;
            let replace = call.optional_height(memory, 2, 0)?;
            (StepKind::ProfileCropHeights { min, max, replace }, vec![])
        }
        "FillInterval" => {
            call.expect_count(3, 3)?;
            let interval = interval_argument(vm, call, 0)?;
            let height = call.height(memory, 2)?;
            (StepKind::ProfileFillInterval { interval, height }, vec![])
        }
        "Flip" => {
            call.expect_count(0, 0)?;
            (StepKind::ProfileFlip, vec![])
        }
        "Intersect" => {
            call.expect_count(1, 1)?;
            (StepKind::ProfileIntersect, vec![call.profile(memory, 0)?])
        }
        "Invert" => {
            call.expect_count(0, 0)?;
            (StepKind::ProfileInvert, vec![])
        }
        "Move" => {
            call.expect_count(1, 1)?;
            (StepKind::ProfileMove { offset: call.coordinate(memory, 0)? }, vec![])
        }
        "Multiply" => {
            call.expect_count(1, 1)?;
            (StepKind::ProfileMultiply { factor: call.number(memory, 0)? }, vec![])
        }
        "MultiplyProfile" => {
            call.expect_count(1, 1)?;
            (StepKind::ProfileMultiplyProfile, vec![call.profile(memory, 0)?])
        }
        "NoiseLayer" => {
            call.expect_count(2, 3)?;
            let (wave_length, amplitude) = noise_layer_arguments(vm, call)?;
            let seed = noise_seed(vm, call, 2)?;
            let kind = StepKind::ProfileNoiseLayer {
                wave_length,
                amplitude,
                seed,
            };
            (kind, vec![])
        }
        "Pattern" => {
            call.expect_count(3, 3)?;
            let pattern = call.profile(memory, 0)?;
            let repeat = interval_argument(vm, call, 1)?;
            (StepKind::ProfilePattern { repeat }, vec![pattern])
        }
        "Rescale" => {
            call.expect_count(1, 1)?;
            (StepKind::ProfileRescale { scale: call.scale(memory, 0)? }, vec![])
        }
        "Resize" => {
            call.expect_count(2, 3)?;
            let interval = interval_argument(vm, call, 0)?;
            let height = call.optional_height(memory, 2, 0)?;
            (StepKind::ProfileResize { interval, height }, vec![])
        }
        "Unify" => {
            call.expect_count(1, 1)?;
            (StepKind::ProfileUnify, vec![call.profile(memory, 0)?])
        }
        _ => return Ok(None),
    };
    Ok(Some(planned))
}

#[cfg(test)]
#[path = "../../tests/unit/corelib/height_profile.rs"]
mod tests;
