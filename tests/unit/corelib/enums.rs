use super::*;

#[path = "support.rs"]
mod support;

use support::*;

fn biome_script() -> crate::runtime::script::CompiledScript {
    script(serde_json::json!({
        "main": [],
        "enums": [{ "name": "Biome", "values": { "Desert": 2, "Forest": 4 } }],
        "metadata": {
            "Width": { "KeyValue": { "Default": { "Number": 300 } } },
            "Parameters": { "KeyValue": {
                "Rivers": { "KeyValue": { "Default": { "Boolean": true } } },
                "Biome": { "KeyValue": {
                    "Type": { "Identifier": "Biome" },
                    "Default": { "Identifier": "Forest" }
                } }
            } }
        }
    }))
}

fn read(vm: &mut VirtualMachine<'_>, name: &str) -> Option<ObjectId> {
    load_parameter(vm, name).map(|r| r.unwrap())
}

fn enum_value(vm: &VirtualMachine<'_>, id: ObjectId) -> (String, i32) {
    match vm.memory.value(id) {
        ObjectValue::Enum { type_name, value } => (type_name.clone(), *value),
        other => panic!("expected an enum, got {}", other.type_name()),
    }
}

#[test]
fn static_members_resolve_enum_values() {
    let script = biome_script();
    let mut vm = vm(&script);
    let location = CodeLocation::new(2, 1);

    let forest = load_static_member(&mut vm, "Biome", "Forest", location).unwrap().unwrap();
    assert_eq!(enum_value(&vm, forest), ("Biome".to_string(), 4));
    let vertical = load_static_member(&mut vm, "Direction", "Vertical", location)
        .unwrap()
        .unwrap();
    assert_eq!(enum_value(&vm, vertical), ("Direction".to_string(), 1));

    let err = load_static_member(&mut vm, "Biome", "Swamp", location)
        .unwrap()
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::UndefinedMemberVariable));
    assert_eq!(err.location(), Some(location));
    assert!(load_static_member(&mut vm, "HeightMap", "Flat", location).is_none());
}

#[test]
fn from_number_validates_the_value() {
    let script = biome_script();
    let mut vm = vm(&script);
    let two = number(&mut vm, 2.0);
    let three = number(&mut vm, 3.0);
    let fractional = number(&mut vm, 2.5);

    let desert = call_static(&mut vm, "Biome", &native("FromNumber", &[two]))
        .unwrap()
        .unwrap();
    assert_eq!(enum_value(&vm, desert), ("Biome".to_string(), 2));
    assert_eq!(
        error_code(call_static(&mut vm, "Biome", &native("FromNumber", &[three])).unwrap()),
        ErrorCode::InvalidEnumValue
    );
    assert_eq!(
        error_code(call_static(&mut vm, "Biome", &native("FromNumber", &[fractional])).unwrap()),
        ErrorCode::InvalidEnumValue
    );
    assert!(call_static(&mut vm, "Biome", &native("Values", &[])).is_none());
    assert!(call_static(&mut vm, "Array", &native("FromNumber", &[two])).is_none());
}

#[test]
fn parameters_expose_sizes_and_declared_values() {
    let script = biome_script();
    let mut vm = vm(&script);
    let width = read(&mut vm, "MapWidth").unwrap();
    assert_eq!(as_number(&vm, width), 300.0);
    let render_width = read(&mut vm, "RenderWidth").unwrap();
    assert_eq!(as_number(&vm, render_width), 300.0);
    let render_height = read(&mut vm, "RenderHeight").unwrap();
    assert_eq!(as_number(&vm, render_height), 1000.0);
    let scale = read(&mut vm, "RenderScale").unwrap();
    assert_eq!(as_number(&vm, scale), 1.0);

    let rivers = read(&mut vm, "Rivers").unwrap();
    assert!(as_bool(&vm, rivers));
    let biome = read(&mut vm, "Biome").unwrap();
    assert_eq!(enum_value(&vm, biome), ("Biome".to_string(), 4));
    assert!(read(&mut vm, "Unknown").is_none());
}
