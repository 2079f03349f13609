use crate::corelib::args::NativeCall;
use crate::foundation::error::{ErrorCode, ReliefResult};
use crate::foundation::geometry::{Interval, Rectangle};
use crate::foundation::number::{
    HEIGHT_MAX, HEIGHT_MIN, Height, Number, is_number_int, number_to_height,
};
use crate::foundation::random::{RandomSeed, combine_seeds};
use crate::genlib::matrix::TransformationMatrix;
use crate::genlib::noise::NoiseLayers;
use crate::renderer::step::StepKind;
use crate::runtime::array;
use crate::runtime::object::{ObjectId, ObjectValue};
use crate::runtime::vm::VirtualMachine;

/// Noise layer table from an optional `{waveLength: amplitude}` array argument; the standard
/// table when the argument is missing or null.
pub(crate) fn noise_layers(
    vm: &VirtualMachine<'_>,
    call: &NativeCall<'_>,
    index: usize,
) -> ReliefResult<NoiseLayers> {
    if !call.has(index) || matches!(vm.memory.value(call.id(index)?), ObjectValue::Null) {
        return Ok(NoiseLayers::standard());
    }
    let table = call.array(&vm.memory, index)?;
    let mut layers = NoiseLayers::new();
    for entry in array::array_ref(&vm.memory, table).entries() {
        let wave_length = match vm.memory.value(entry.key) {
            ObjectValue::Number(n) => *n,
            other => {
                return Err(call.error(
                    ErrorCode::IncorrectNativeFunctionArgumentType,
                    format!("noise wave lengths must be numbers, got {}", other.type_name()),
                ));
            }
        };
        let amplitude = match vm.memory.value(entry.value) {
            ObjectValue::Number(n) => *n,
            other => {
                return Err(call.error(
                    ErrorCode::IncorrectNativeFunctionArgumentType,
                    format!("noise amplitudes must be numbers, got {}", other.type_name()),
                ));
            }
        };
        let (wave_length, amplitude) = noise_layer(call, wave_length, amplitude)?;
        layers.insert(wave_length, amplitude);
    }
    Ok(layers)
}

/// Seed for a noise call: the optional script seed mixed with the run's seed.
pub(crate) fn noise_seed(
    vm: &VirtualMachine<'_>,
    call: &NativeCall<'_>,
    index: usize,
) -> ReliefResult<RandomSeed> {
    let local = call.optional_number(&vm.memory, index, 0.0)?;
    if !is_number_int(local) || local < 0.0 || local > Number::from(u32::MAX) {
        return Err(call.error(
            ErrorCode::NumberOverflow,
            format!("seed {local} is not a valid seed"),
        ));
    }
    Ok(combine_seeds(local as RandomSeed, vm.arguments.random_seed))
}

/// Static members of `HeightMap`.
pub fn call_static(
    vm: &mut VirtualMachine<'_>,
    call: &NativeCall<'_>,
) -> Option<ReliefResult<ObjectId>> {
    let result = match call.name {
        "Flat" | "Noise" | "Gradient" | "RadialGradient" | "Projection" | "Clone" => {
            create(vm, call)
        }
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
            (StepKind::MapFlat { height }, vec![])
        }
        "Noise" => {
            call.expect_count(0, 2)?;
            let layers = noise_layers(vm, call, 0)?;
            let seed = noise_seed(vm, call, 1)?;
            (StepKind::MapNoise { layers, seed }, vec![])
        }
        "Gradient" => {
            call.expect_count(4, 4)?;
            let kind = StepKind::MapGradient {
                source: call.point(memory, 0)?,
                destination: call.point(memory, 1)?,
                from: call.height(memory, 2)?,
                to: call.height(memory, 3)?,
            };
            (kind, vec![])
        }
        "RadialGradient" => {
            call.expect_count(4, 4)?;
            let kind = StepKind::MapRadialGradient {
                center: call.point(memory, 0)?,
                radius: call.size(memory, 1)?,
                from: call.height(memory, 2)?,
                to: call.height(memory, 3)?,
            };
            (kind, vec![])
        }
        "Projection" => {
            call.expect_count(2, 2)?;
            let profile = call.profile(memory, 0)?;
            let direction = call.direction(memory, 1)?;
            (StepKind::MapProjection { direction }, vec![profile])
        }
        _ => {
            call.expect_count(1, 1)?;
            (StepKind::MapClone, vec![call.map(memory, 0)?])
        }
    };
    vm.emit_creator(kind, &inputs, call.location)
}

/// Instance methods of `HeightMap`. Every method modifies the map and returns it.
pub fn call_method(
    vm: &mut VirtualMachine<'_>,
    instance: ObjectId,
    call: &NativeCall<'_>,
) -> Option<ReliefResult<ObjectId>> {
    let planned = match plan_method(vm, call) {
        Ok(Some(planned)) => planned,
        Ok(None) => return None,
        Err(error) => return Some(Err(error)),
    };
    let (kind, inputs) = planned;
    Some(vm.emit_in_place(instance, kind, &inputs, call.location))
}

fn rect_argument(
    vm: &VirtualMachine<'_>,
    call: &NativeCall<'_>,
    first: usize,
) -> ReliefResult<Rectangle> {
    Ok(Rectangle::from_points(
        call.point(&vm.memory, first)?,
        call.point(&vm.memory, first + 1)?,
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
            (StepKind::MapAbs, vec![])
        }
        "Add" => {
            call.expect_count(1, 1)?;
            (StepKind::MapAdd { height: call.height(memory, 0)? }, vec![])
        }
        "AddMap" => {
            call.expect_count(1, 1)?;
            (StepKind::MapAddMap, vec![call.map(memory, 0)?])
        }
        "AddMasked" => {
            call.expect_count(2, 2)?;
            let mask = call.map(memory, 1)?;
            match memory.value(call.id(0)?) {
                ObjectValue::Number(_) => (
                    StepKind::MapAddMasked { height: call.height(memory, 0)? },
                    vec![mask],
                ),
                _ => (StepKind::MapAddMapMasked, vec![call.map(memory, 0)?, mask]),
            }
        }
        "Blur" => {
            call.expect_count(1, 1)?;
            (StepKind::MapBlur { radius: call.size(memory, 0)? }, vec![])
        }
        "ClampHeights" => {
            call.expect_count(2, 2)?;
            let (min, max) = height_range(vm, call, 0)?;
            (StepKind::MapClampHeights { min, max }, vec![])
        }
        "Combine" => {
            call.expect_count(2, 2)?;
            (StepKind::MapCombine, vec![call.map(memory, 0)?, call.map(memory, 1)?])
        }
        "ConvexityMap" => {
            call.expect_count(1, 1)?;
            (StepKind::MapConvexity { radius: call.size(memory, 0)? }, vec![])
        }
        "Crop" => {
            call.expect_count(2, 3)?;
            let rect = rect_argument(vm, call, 0)?;
            let height = call.optional_height(memory, 2, 0)?;
            (StepKind::MapCrop { rect, height }, vec![])
        }
        "CropHeights" => {
            call.expect_count(2, 3)?;
            let (min, max) = height_range(vm, call, 0)?;
            let replace = call.optional_height(memory, 2, 0)?;
            (StepKind::MapCropHeights { min, max, replace }, vec![])
        }
        "DistanceMap" => {
            call.expect_count(1, 1)?;
            (StepKind::MapDistanceMap { max_distance: call.size(memory, 0)? }, vec![])
        }
        "Distort" => {
            call.expect_count(3, 3)?;
            let horizontal = call.map(memory, 0)?;
            let vertical = call.map(memory, 1)?;
            let max_distance = call.size(memory, 2)?;
            (StepKind::MapDistort { max_distance }, vec![horizontal, vertical])
        }
        "DrawLine" => {
            call.expect_count(3, 3)?;
            let kind = StepKind::MapDrawLine {
                start: call.point(memory, 0)?,
                end: call.point(memory, 1)?,
                height: call.height(memory, 2)?,
            };
            (kind, vec![])
        }
        "FillRectangle" => {
            call.expect_count(3, 3)?;
            let rect = rect_argument(vm, call, 0)?;
            let height = call.height(memory, 2)?;
            (StepKind::MapFillRectangle { rect, height }, vec![])
        }
        "Intersect" => {
            call.expect_count(1, 1)?;
            (StepKind::MapIntersect, vec![call.map(memory, 0)?])
        }
        "Invert" => {
            call.expect_count(0, 0)?;
            (StepKind::MapInvert, vec![])
        }
        "Move" => {
            call.expect_count(1, 1)?;
            (StepKind::MapMove { offset: call.point(memory, 0)? }, vec![])
        }
        "Multiply" => {
            call.expect_count(1, 1)?;
            (StepKind::MapMultiply { factor: call.number(memory, 0)? }, vec![])
        }
        "MultiplyMap" => {
            call.expect_count(1, 1)?;
            (StepKind::MapMultiplyMap, vec![call.map(memory, 0)?])
        }
        "NoiseLayer" => {
            call.expect_count(2, 4)?;
            let (wave_length, amplitude) = noise_layer_arguments(vm, call)?;
            let ridged = if call.has(2) { call.boolean(memory, 2)? } else { false };
            let seed = noise_seed(vm, call, 3)?;
            let kind = StepKind::MapNoiseLayer {
                wave_length,
                amplitude,
                seed,
                ridged,
            };
            (kind, vec![])
        }
        "Pattern" => {
            call.expect_count(3, 3)?;
            let pattern = call.map(memory, 0)?;
            let repeat = rect_argument(vm, call, 1)?;
            (StepKind::MapPattern { repeat }, vec![pattern])
        }
        "Rescale" => {
            call.expect_count(1, 2)?;
            let horizontal = call.scale(memory, 0)?;
            let vertical = if call.has(1) { call.scale(memory, 1)? } else { horizontal };
            (StepKind::MapRescale { horizontal, vertical }, vec![])
        }
        "Resize" => {
            call.expect_count(2, 3)?;
            let rect = rect_argument(vm, call, 0)?;
            let height = call.optional_height(memory, 2, 0)?;
            (StepKind::MapResize { rect, height }, vec![])
        }
        "Shift" => {
            call.expect_count(3, 3)?;
            let profile = call.profile(memory, 0)?;
            let max_distance = call.size(memory, 1)?;
            let direction = call.direction(memory, 2)?;
            (StepKind::MapShift { max_distance, direction }, vec![profile])
        }
        "Transform" => {
            call.expect_count(4, 4)?;
            let matrix = TransformationMatrix::new(
                call.number(memory, 0)?,
                call.number(memory, 1)?,
                call.number(memory, 2)?,
                call.number(memory, 3)?,
                0.0,
                0.0,
            );
            if !matrix.is_invertible() {
                return Err(call.error(
                    ErrorCode::NonInvertibleTransformation,
                    "transformation matrix is not invertible",
                ));
            }
            (StepKind::MapTransform { matrix }, vec![])
        }
        "TransformHeights" => {
            call.expect_count(3, 5)?;
            let profile = call.profile(memory, 0)?;
            let interval = Interval::from_coordinates(
                call.coordinate(memory, 1)?,
                call.coordinate(memory, 2)?,
            );
            let min = call.optional_height(memory, 3, HEIGHT_MIN)?;
            let max = call.optional_height(memory, 4, HEIGHT_MAX)?;
            (StepKind::MapTransformHeights { interval, min, max }, vec![profile])
        }
        "Unify" => {
            call.expect_count(1, 1)?;
            (StepKind::MapUnify, vec![call.map(memory, 0)?])
        }
        _ => return Ok(None),
    };
    Ok(Some(planned))
}

/// `(min, max)` height pair at `first` and `first + 1`.
pub(crate) fn height_range(
    vm: &VirtualMachine<'_>,
    call: &NativeCall<'_>,
    first: usize,
) -> ReliefResult<(Height, Height)> {
    let min = call.height(&vm.memory, first)?;
    let max = call.height(&vm.memory, first + 1)?;
    if min > max {
        return Err(call.error(
            ErrorCode::MathDefinitionRange,
            format!("{} needs min <= max", call.name),
        ));
    }
    Ok((min, max))
}

/// Wave length and amplitude of a single noise layer call.
pub(crate) fn noise_layer_arguments(
    vm: &VirtualMachine<'_>,
    call: &NativeCall<'_>,
) -> ReliefResult<(u32, Height)> {
    let wave_length = call.number(&vm.memory, 0)?;
    let amplitude = call.number(&vm.memory, 1)?;
    noise_layer(call, wave_length, amplitude)
}

fn noise_layer(
    call: &NativeCall<'_>,
    wave_length: Number,
    amplitude: Number,
) -> ReliefResult<(u32, Height)> {
    if !is_number_int(wave_length) || wave_length < 1.0 || wave_length > Number::from(u32::MAX) {
        return Err(call.error(
            ErrorCode::NonpositiveNoiseLayerWaveLength,
            format!("noise wave length {wave_length} must be a positive integer"),
        ));
    }
    match number_to_height(amplitude) {
        Some(h) if h > 0 => Ok((wave_length as u32, h)),
        _ => Err(call.error(
            ErrorCode::NonpositiveNoiseLayerAmplitude,
            format!("noise amplitude {amplitude} must be in (0, 1]"),
        )),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/corelib/height_map.rs"]
mod tests;
