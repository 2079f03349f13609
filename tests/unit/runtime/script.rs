use super::*;
use crate::runtime::instruction::InstructionKind;
use crate::runtime::parameters::{MAP_SIZE_DEFAULT, ParameterKind};

fn script(metadata: serde_json::Value) -> CompiledScript {
    let json = serde_json::json!({
        "main": [],
        "enums": [{ "name": "Biome", "values": { "Desert": 2, "Forest": 4 } }],
        "metadata": metadata,
    });
    match serde_json::from_value(json) {
        Ok(script) => script,
        Err(e) => panic!("script fixture does not parse: {e}"),
    }
}

fn error_code(metadata: serde_json::Value) -> Option<ErrorCode> {
    script(metadata)
        .create_script_parameters()
        .err()
        .and_then(|e| e.code())
}

#[test]
fn parses_instructions_with_source_locations() {
    let json = r#"{
        "main": [
            { "op": "load_const_number", "value": 2, "location": { "line": 3, "column": 7 } },
            { "op": "break" }
        ],
        "functions": { "f": { "parameters": ["a"], "body": [{ "op": "return" }] } }
    }"#;
    let script = CompiledScript::from_reader(json.as_bytes()).unwrap();
    assert_eq!(script.main.len(), 2);
    assert_eq!(
        script.main.get(0).map(|i| i.location),
        Some(CodeLocation::new(3, 7))
    );
    assert_eq!(
        script.main.get(1).map(|i| i.kind.clone()),
        Some(InstructionKind::Break { depth: 1 })
    );
    assert_eq!(script.supported_maps, vec![MAIN_MAP_NAME.to_string()]);
    assert!(!script.configuration.main_map_is_mandatory);
    assert!(script.dump().contains("function f(a):"));
}

#[test]
fn malformed_json_is_a_serde_error() {
    let err = CompiledScript::from_reader("{ \"main\": 5 }".as_bytes()).unwrap_err();
    assert!(matches!(err, ReliefError::Serde(_)));
}

#[test]
fn missing_sizes_are_infinite() {
    let params = script(serde_json::json!({})).create_script_parameters().unwrap();
    assert!(params.map_width.is_infinite());
    assert!(params.map_height.is_infinite());
}

#[test]
fn finite_and_keyed_sizes() {
    let params = script(serde_json::json!({
        "Width": { "Identifier": "Finite" },
        "Height": { "KeyValue": { "Min": { "Number": 100 }, "Max": { "Number": 500 }, "Default": { "Number": 200 } } },
    }))
    .create_script_parameters()
    .unwrap();
    assert_eq!(params.map_width.value(), MAP_SIZE_DEFAULT);
    assert_eq!(params.map_height.value(), 200);
    assert_eq!((params.map_height.min, params.map_height.max), (100, 500));
}

#[test]
fn invalid_size_declarations() {
    assert_eq!(
        error_code(serde_json::json!({ "Width": { "KeyValue": { "Min": { "Number": 3 } } } })),
        Some(ErrorCode::IncorrectMapSizeNumericValue)
    );
    assert_eq!(
        error_code(serde_json::json!({
            "Width": { "KeyValue": { "Min": { "Number": 500 }, "Max": { "Number": 100 } } }
        })),
        Some(ErrorCode::MinGreaterThanMax)
    );
    assert_eq!(
        error_code(serde_json::json!({ "Width": { "Identifier": "Huge" } })),
        Some(ErrorCode::UndefinedMetadataIdentifier)
    );
    assert_eq!(
        error_code(serde_json::json!({ "Width": { "Number": 5 } })),
        Some(ErrorCode::IncorrectMetadataValueType)
    );
}

#[test]
fn parameter_types_are_inferred_or_declared() {
    let params = script(serde_json::json!({
        "Parameters": { "KeyValue": {
            "Rivers": { "KeyValue": { "Default": { "Boolean": true } } },
            "Height": { "KeyValue": { "Min": { "Number": 1 }, "Max": { "Number": 10 }, "Default": { "Number": 30 } } },
            "Biome": { "KeyValue": { "Type": { "Identifier": "Biome" }, "Default": { "Identifier": "Forest" }, "Label": { "String": "Terrain" } } },
        } }
    }))
    .create_script_parameters()
    .unwrap();

    assert!(matches!(
        params.get("Rivers").map(|p| &p.kind),
        Some(ParameterKind::Boolean { value: true, .. })
    ));
    assert!(matches!(
        params.get("Height").map(|p| &p.kind),
        Some(ParameterKind::Number { value, .. }) if *value == 10.0
    ));
    let biome = params.get("Biome").unwrap();
    assert_eq!(biome.label, "Terrain");
    assert!(matches!(biome.kind, ParameterKind::Enum { value: 4, .. }));
}

#[test]
fn invalid_parameter_declarations() {
    let case = |declaration: serde_json::Value| {
        error_code(serde_json::json!({
            "Parameters": { "KeyValue": { "P": declaration } }
        }))
    };
    assert_eq!(
        case(serde_json::json!({ "KeyValue": {} })),
        Some(ErrorCode::ScriptParameterTypeNotSpecified)
    );
    assert_eq!(
        case(serde_json::json!({ "KeyValue": { "Min": { "Number": 5 }, "Max": { "Number": 1 } } })),
        Some(ErrorCode::MinGreaterThanMax)
    );
    assert_eq!(
        case(serde_json::json!({ "KeyValue": { "Type": { "Identifier": "Number" }, "Restriction": { "Identifier": "Odd" } } })),
        Some(ErrorCode::IncorrectScriptParameterValueRestriction)
    );
    assert_eq!(
        case(serde_json::json!({ "KeyValue": { "Type": { "Identifier": "Color" } } })),
        Some(ErrorCode::IncorrectEnumScriptParameterType)
    );
    assert_eq!(
        case(serde_json::json!({ "KeyValue": { "Type": { "Identifier": "Biome" }, "Default": { "Identifier": "Ocean" } } })),
        Some(ErrorCode::UndefinedMetadataIdentifier)
    );
    assert_eq!(
        case(serde_json::json!({ "KeyValue": { "Type": { "String": "Number" } } })),
        Some(ErrorCode::IncorrectScriptParameterAttributeType)
    );
    assert_eq!(
        error_code(serde_json::json!({
            "Parameters": { "KeyValue": { "MapWidth": { "KeyValue": { "Default": { "Number": 1 } } } } }
        })),
        Some(ErrorCode::ReservedScriptParameterName)
    );
}

#[test]
fn number_bounds_must_satisfy_the_restriction() {
    let declare = |mut attributes: serde_json::Value| {
        attributes["Type"] = serde_json::json!({ "Identifier": "Number" });
        script(serde_json::json!({
            "Parameters": { "KeyValue": { "Depth": { "KeyValue": attributes } } }
        }))
        .create_script_parameters()
    };
    let code = |attributes: serde_json::Value| declare(attributes).err().and_then(|e| e.code());

    for attributes in [
        serde_json::json!({ "Restriction": { "Identifier": "Integers" }, "Min": { "Number": 0.5 } }),
        serde_json::json!({ "Restriction": { "Identifier": "Integers" }, "Max": { "Number": 9.5 } }),
        serde_json::json!({ "Restriction": { "Identifier": "Integers" }, "Default": { "Number": 2.5 } }),
        serde_json::json!({ "Restriction": { "Identifier": "PowersOf2" }, "Min": { "Number": 1 }, "Max": { "Number": 100 } }),
        serde_json::json!({ "Restriction": { "Identifier": "PowersOf10" }, "Min": { "Number": 1 }, "Max": { "Number": 100 }, "Default": { "Number": 50 } }),
    ] {
        assert_eq!(
            code(attributes),
            Some(ErrorCode::IncorrectScriptParameterValueRestriction)
        );
    }

    let params = declare(serde_json::json!({
        "Restriction": { "Identifier": "PowersOf2" },
        "Min": { "Number": 2 },
        "Max": { "Number": 64 },
        "Default": { "Number": 8 },
    }))
    .unwrap();
    let mut depth = params.get("Depth").unwrap().clone();
    depth.set_number(1.0);
    assert!(matches!(depth.kind, ParameterKind::Number { value, .. } if value == 2.0));
    depth.set_number(40.0);
    assert!(matches!(depth.kind, ParameterKind::Number { value, .. } if value == 32.0));
}

#[test]
fn builtin_direction_enum() {
    let s = script(serde_json::json!({}));
    let direction = s.enum_definition("Direction").unwrap();
    assert_eq!(direction.values.len(), 2);
    assert_eq!(s.enum_definition("Biome").map(|e| e.default_value()), Some(2));
    assert_eq!(
        s.enum_definition("Biome").and_then(|e| e.value_name(4).map(str::to_string)),
        Some("Forest".to_string())
    );
    assert!(s.enum_definition("Nope").is_none());
    assert!(s.is_map_supported("main"));
    assert!(!s.is_map_supported("water"));
}
