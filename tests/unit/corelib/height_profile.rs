use super::*;
use crate::foundation::geometry::Direction;
use crate::foundation::number::HEIGHT_MAX;

#[path = "support.rs"]
mod support;

use support::*;

fn create(vm: &mut VirtualMachine<'_>, name: &str, args: &[ObjectId]) -> ReliefResult<ObjectId> {
    call_static(vm, &native(name, args)).expect("constructor exists")
}

fn method(
    vm: &mut VirtualMachine<'_>,
    profile: ObjectId,
    name: &str,
    args: &[ObjectId],
) -> ReliefResult<ObjectId> {
    call_method(vm, profile, &native(name, args)).expect("method exists")
}

fn last_kind(vm: &VirtualMachine<'_>) -> StepKind {
    vm.rendering_sequence().steps().last().unwrap().kind.clone()
}

#[test]
fn flat_and_gradient_profiles() {
    let script = empty_script();
    let mut vm = vm(&script);
    let p = create(&mut vm, "Flat", &[]).unwrap();
    assert!(matches!(vm.memory.value(p), ObjectValue::HeightProfile));
    assert_eq!(last_kind(&vm), StepKind::ProfileFlat { height: 0 });

    let start = number(&mut vm, 10.0);
    let end = number(&mut vm, -10.0);
    let low = number(&mut vm, -1.0);
    let high = number(&mut vm, 1.0);
    create(&mut vm, "Gradient", &[start, end, low, high]).unwrap();
    assert_eq!(
        last_kind(&vm),
        StepKind::ProfileGradient {
            source: 10,
            destination: -10,
            from: -HEIGHT_MAX,
            to: HEIGHT_MAX,
        }
    );
}

#[test]
fn from_array_reads_control_points() {
    let script = empty_script();
    let mut vm = vm(&script);
    let table = keyed_array(&mut vm, &[(20.0, 1.0), (-5.0, 0.0)]);
    create(&mut vm, "FromArray", &[table]).unwrap();
    let expected = BTreeMap::from([(-5, 0), (20, HEIGHT_MAX)]);
    assert_eq!(last_kind(&vm), StepKind::ProfileFromArray { keys: expected });

    let out_of_range = keyed_array(&mut vm, &[(0.0, 2.0)]);
    assert_eq!(
        error_code(create(&mut vm, "FromArray", &[out_of_range])),
        ErrorCode::HeightOverflow
    );
    let labels = vm.memory.register(ObjectValue::Array(crate::runtime::array::ArrayObject::new()));
    let key = string(&mut vm, "a");
    let value = number(&mut vm, 0.5);
    array::set(&mut vm.memory, labels, key, value);
    assert_eq!(
        error_code(create(&mut vm, "FromArray", &[labels])),
        ErrorCode::IncorrectNativeFunctionArgumentType
    );
}

#[test]
fn slice_reads_a_map_row_or_column() {
    let script = empty_script();
    let mut vm = vm(&script);
    let map = crate::corelib::height_map::call_static(&mut vm, &native("Flat", &[]))
        .unwrap()
        .unwrap();
    let horizontal = direction(&mut vm, Direction::Horizontal);
    let row = number(&mut vm, 4.0);
    let profile = create(&mut vm, "Slice", &[map, horizontal, row]).unwrap();

    let step = vm.rendering_sequence().steps().last().unwrap();
    assert_eq!(
        step.kind,
        StepKind::ProfileSlice {
            direction: Direction::Horizontal,
            coordinate: 4,
        }
    );
    assert_eq!(step.arguments.as_slice(), &[vm.slots.slot_of(map)]);
    assert_eq!(step.target, vm.slots.slot_of(profile));
}

#[test]
fn methods_record_in_place_steps() {
    let script = empty_script();
    let mut vm = vm(&script);
    let p = create(&mut vm, "Flat", &[]).unwrap();
    let q = create(&mut vm, "Flat", &[]).unwrap();
    let slot = vm.slots.slot_of(p);

    let offset = number(&mut vm, -3.0);
    assert_eq!(method(&mut vm, p, "Move", &[offset]).unwrap(), p);
    assert_eq!(last_kind(&vm), StepKind::ProfileMove { offset: -3 });
    assert_eq!(vm.rendering_sequence().steps().last().unwrap().target, slot);

    let a = number(&mut vm, 5.0);
    let b = number(&mut vm, 1.0);
    let half = number(&mut vm, 0.5);
    method(&mut vm, p, "FillInterval", &[a, b, half]).unwrap();
    assert_eq!(
        last_kind(&vm),
        StepKind::ProfileFillInterval {
            interval: Interval::new(1, 5),
            height: HEIGHT_MAX / 2,
        }
    );

    method(&mut vm, p, "AddMasked", &[q, q]).unwrap();
    assert_eq!(last_kind(&vm), StepKind::ProfileAddProfileMasked);
    method(&mut vm, p, "Unify", &[q]).unwrap();
    assert_eq!(last_kind(&vm), StepKind::ProfileUnify);
}

#[test]
fn method_errors() {
    let script = empty_script();
    let mut vm = vm(&script);
    let p = create(&mut vm, "Flat", &[]).unwrap();
    let high = number(&mut vm, 0.9);
    let low = number(&mut vm, 0.1);
    let zero = number(&mut vm, 0.0);

    assert_eq!(
        error_code(method(&mut vm, p, "CropHeights", &[high, low])),
        ErrorCode::MathDefinitionRange
    );
    assert_eq!(
        error_code(method(&mut vm, p, "NoiseLayer", &[low, high])),
        ErrorCode::NonpositiveNoiseLayerWaveLength
    );
    assert_eq!(
        error_code(method(&mut vm, p, "Rescale", &[zero])),
        ErrorCode::InvalidScale
    );
    assert!(call_method(&mut vm, p, &native("DrawLine", &[])).is_none());
}
