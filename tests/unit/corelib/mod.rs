use super::*;

#[path = "support.rs"]
mod support;

use support::*;

fn static_object(vm: &mut VirtualMachine<'_>, type_name: &str) -> ObjectId {
    vm.memory.register(ObjectValue::Static {
        type_name: type_name.to_string(),
    })
}

#[test]
fn globals_dispatch_to_operators_then_math() {
    let script = empty_script();
    let mut vm = vm(&script);
    let a = number(&mut vm, 2.0);
    let b = number(&mut vm, 3.0);
    let sum = call_global(&mut vm, &native("+", &[a, b])).unwrap();
    assert_eq!(as_number(&vm, sum), 5.0);
    let max = call_global(&mut vm, &native("Max", &[a, b])).unwrap();
    assert_eq!(as_number(&vm, max), 3.0);

    let err = call_global(&mut vm, &native("Erode", &[a])).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::UndefinedFunction));
    assert!(err.to_string().contains("undefined function Erode"));
}

#[test]
fn members_dispatch_on_the_receiver() {
    let script = empty_script();
    let mut vm = vm(&script);
    let height_map = static_object(&mut vm, "HeightMap");
    let map = call_member(&mut vm, height_map, &native("Flat", &[])).unwrap();
    assert!(matches!(vm.memory.value(map), ObjectValue::HeightMap));

    let same = call_member(&mut vm, map, &native("Invert", &[])).unwrap();
    assert_eq!(same, map);
    assert_eq!(vm.rendering_sequence().len(), 2);

    let array_type = static_object(&mut vm, "Array");
    let list = call_member(&mut vm, array_type, &native("Empty", &[])).unwrap();
    let count = call_member(&mut vm, list, &native("Count", &[])).unwrap();
    assert_eq!(as_number(&vm, count), 0.0);

    let direction_type = static_object(&mut vm, "Direction");
    let one = number(&mut vm, 1.0);
    let vertical = call_member(&mut vm, direction_type, &native("FromNumber", &[one])).unwrap();
    assert!(matches!(vm.memory.value(vertical), ObjectValue::Enum { value: 1, .. }));
}

#[test]
fn member_errors_name_the_receiver() {
    let script = empty_script();
    let mut vm = vm(&script);
    let null = vm.null;
    assert_eq!(
        error_code(call_member(&mut vm, null, &native("Blur", &[]))),
        ErrorCode::NullReference
    );

    let n = number(&mut vm, 1.0);
    let err = call_member(&mut vm, n, &native("Blur", &[])).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::UndefinedFunction));
    assert!(err.to_string().contains("Number has no function Blur"));

    let height_map = static_object(&mut vm, "HeightMap");
    let err = call_member(&mut vm, height_map, &native("Blur", &[])).unwrap_err();
    assert!(err.to_string().contains("HeightMap has no function Blur"));
}

#[test]
fn member_variables() {
    let script = empty_script();
    let mut vm = vm(&script);
    let location = CodeLocation::new(1, 9);

    let parameters = vm.memory.register(ObjectValue::Parameters);
    let scale = load_member(&mut vm, parameters, "RenderScale", location).unwrap();
    assert_eq!(as_number(&vm, scale), 1.0);
    assert_eq!(
        error_code(load_member(&mut vm, parameters, "Missing", location)),
        ErrorCode::UndefinedMemberVariable
    );

    let direction_type = static_object(&mut vm, "Direction");
    let horizontal = load_member(&mut vm, direction_type, "Horizontal", location).unwrap();
    assert!(matches!(vm.memory.value(horizontal), ObjectValue::Enum { value: 0, .. }));

    let null = vm.null;
    let err = load_member(&mut vm, null, "Horizontal", location).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::NullReference));
    assert_eq!(err.location(), Some(location));

    let n = number(&mut vm, 1.0);
    assert_eq!(
        error_code(load_member(&mut vm, n, "Length", location)),
        ErrorCode::UndefinedMemberVariable
    );
}
