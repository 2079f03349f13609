use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::error::{CodeLocation, ErrorCode, ReliefError, ReliefResult};
use crate::foundation::geometry::Direction;
use crate::foundation::number::Number;
use crate::runtime::instruction::CodeBlock;
use crate::runtime::parameters::{
    MAP_SIZE_AUTOMATIC, MAP_SIZE_MAX, MAP_SIZE_MIN, MapSizeParameter,
    RESERVED_PARAMETER_NAMES, Restriction, ScriptParameter, ScriptParameters,
};

/// Name of the implicit function wrapping the script's top-level code.
pub const MAIN_FUNCTION_NAME: &str = "<main>";
/// Output map every script yields by default.
pub const MAIN_MAP_NAME: &str = "main";

/// Node of the metadata tree a script declares in its header.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum MetadataValue {
    Number(Number),
    String(String),
    Boolean(bool),
    Identifier(String),
    KeyValue(BTreeMap<String, MetadataValue>),
}

impl MetadataValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "Number",
            Self::String(_) => "String",
            Self::Boolean(_) => "Boolean",
            Self::Identifier(_) => "Identifier",
            Self::KeyValue(_) => "KeyValue",
        }
    }
}

/// Literal a global variable starts out with.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ConstantValue {
    #[default]
    Null,
    Boolean(bool),
    Number(Number),
    String(String),
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GlobalVariableDefinition {
    pub name: String,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub initial: ConstantValue,
}

/// Script-defined enum; values are keyed by name.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EnumDefinition {
    pub name: String,
    pub values: BTreeMap<String, i32>,
}

impl EnumDefinition {
    /// Value used when nothing else was chosen: the lowest one.
    pub fn default_value(&self) -> i32 {
        self.values.values().min().copied().unwrap_or(0)
    }

    pub fn value_name(&self, value: i32) -> Option<&str> {
        self.values
            .iter()
            .find(|(_, v)| **v == value)
            .map(|(n, _)| n.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScriptFunction {
    #[serde(default)]
    pub parameters: Vec<String>,
    pub body: Arc<CodeBlock>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScriptConfiguration {
    /// Finishing without a `main` yield is an error.
    pub main_map_is_mandatory: bool,
}

/// Validated program handed over by the compiler front end.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CompiledScript {
    pub main: Arc<CodeBlock>,
    #[serde(default)]
    pub functions: BTreeMap<String, ScriptFunction>,
    #[serde(default)]
    pub globals: Vec<GlobalVariableDefinition>,
    #[serde(default)]
    pub enums: Vec<EnumDefinition>,
    #[serde(default)]
    pub metadata: BTreeMap<String, MetadataValue>,
    #[serde(default = "default_supported_maps")]
    pub supported_maps: Vec<String>,
    #[serde(default)]
    pub configuration: ScriptConfiguration,
}

fn default_supported_maps() -> Vec<String> {
    vec![MAIN_MAP_NAME.to_string()]
}

fn metadata_error(code: ErrorCode, msg: impl Into<String>) -> ReliefError {
    ReliefError::script(code, CodeLocation::default(), msg)
}

impl CompiledScript {
    pub fn from_reader(reader: impl Read) -> ReliefResult<Self> {
        serde_json::from_reader(reader).map_err(|e| ReliefError::serde(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> ReliefResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("cannot open {}", path.display()))?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Script enum or one of the built-in ones.
    pub fn enum_definition(&self, name: &str) -> Option<EnumDefinition> {
        if name == "Direction" {
            return Some(EnumDefinition {
                name: name.to_string(),
                values: [Direction::Horizontal, Direction::Vertical]
                    .into_iter()
                    .map(|d| (d.name().to_string(), d.as_number()))
                    .collect(),
            });
        }
        self.enums.iter().find(|e| e.name == name).cloned()
    }

    pub fn is_map_supported(&self, name: &str) -> bool {
        name == MAIN_MAP_NAME || self.supported_maps.iter().any(|m| m == name)
    }

    /// Builds the parameter table from the metadata tree, validating every declaration.
    pub fn create_script_parameters(&self) -> ReliefResult<ScriptParameters> {
        let map_width = map_size(self.metadata.get("Width"), "Width")?;
        let map_height = map_size(self.metadata.get("Height"), "Height")?;
        let mut parameters = ScriptParameters::new(map_width, map_height);

        let section = match self.metadata.get("Parameters") {
            None => return Ok(parameters),
            Some(MetadataValue::KeyValue(section)) => section,
            Some(other) => {
                return Err(metadata_error(
                    ErrorCode::IncorrectMetadataValueType,
                    format!("Parameters must be a key-value section, got {}", other.type_name()),
                ));
            }
        };

        for (name, declaration) in section {
            let MetadataValue::KeyValue(attributes) = declaration else {
                return Err(metadata_error(
                    ErrorCode::IncorrectMetadataValueType,
                    format!("parameter {name} must be a key-value section"),
                ));
            };
            if RESERVED_PARAMETER_NAMES.contains(&name.as_str()) {
                return Err(metadata_error(
                    ErrorCode::ReservedScriptParameterName,
                    format!("{name} is a reserved parameter name"),
                ));
            }
            let parameter = self.script_parameter(name, attributes)?;
            parameters.insert(name.clone(), parameter);
        }
        Ok(parameters)
    }

    fn script_parameter(
        &self,
        name: &str,
        attributes: &BTreeMap<String, MetadataValue>,
    ) -> ReliefResult<ScriptParameter> {
        let label = string_attribute(attributes, name, "Label")?.unwrap_or_else(|| name.to_string());
        let description = string_attribute(attributes, name, "Description")?.unwrap_or_default();
        let default = attributes.get("Default");

        let type_name = match attributes.get("Type") {
            Some(MetadataValue::Identifier(t)) => t.clone(),
            Some(other) => {
                return Err(metadata_error(
                    ErrorCode::IncorrectScriptParameterAttributeType,
                    format!("Type of {name} must be an identifier, got {}", other.type_name()),
                ));
            }
            None => match default {
                Some(MetadataValue::Boolean(_)) => "Boolean".to_string(),
                Some(MetadataValue::Number(_)) => "Number".to_string(),
                _ if ["Min", "Max", "Restriction"]
                    .iter()
                    .any(|k| attributes.contains_key(*k)) =>
                {
                    "Number".to_string()
                }
                _ => {
                    return Err(metadata_error(
                        ErrorCode::ScriptParameterTypeNotSpecified,
                        format!("type of parameter {name} cannot be inferred"),
                    ));
                }
            },
        };

        match type_name.as_str() {
            "Boolean" => {
                let default = match default {
                    None => false,
                    Some(MetadataValue::Boolean(b)) => *b,
                    Some(other) => return Err(attribute_type_error(name, "Default", other)),
                };
                Ok(ScriptParameter::boolean(label, description, default))
            }
            "Number" => {
                let default = number_attribute(attributes, name, "Default")?.unwrap_or(0.0);
                let min = number_attribute(attributes, name, "Min")?.unwrap_or(0.0);
                let max = number_attribute(attributes, name, "Max")?.unwrap_or(100.0);
                if min > max {
                    return Err(metadata_error(
                        ErrorCode::MinGreaterThanMax,
                        format!("Min of {name} is greater than its Max"),
                    ));
                }
                let restriction = match attributes.get("Restriction") {
                    None => Restriction::Unrestricted,
                    Some(MetadataValue::Identifier(r)) => {
                        Restriction::from_name(r).ok_or_else(|| {
                            metadata_error(
                                ErrorCode::IncorrectScriptParameterValueRestriction,
                                format!("unknown restriction {r} on {name}"),
                            )
                        })?
                    }
                    Some(other) => return Err(attribute_type_error(name, "Restriction", other)),
                };
                for (attribute, value) in [("Min", min), ("Max", max), ("Default", default)] {
                    if restriction.apply(value) != value {
                        return Err(metadata_error(
                            ErrorCode::IncorrectScriptParameterValueRestriction,
                            format!("{attribute} of {name} does not match its restriction"),
                        ));
                    }
                }
                let mut parameter =
                    ScriptParameter::number(label, description, default, min, max, restriction);
                parameter.set_number(default);
                Ok(parameter)
            }
            enum_name => {
                let definition = self.enum_definition(enum_name).ok_or_else(|| {
                    metadata_error(
                        ErrorCode::IncorrectEnumScriptParameterType,
                        format!("{enum_name} is not an enum type"),
                    )
                })?;
                let default = match default {
                    None => None,
                    Some(MetadataValue::Identifier(value)) => {
                        Some(*definition.values.get(value).ok_or_else(|| {
                            metadata_error(
                                ErrorCode::UndefinedMetadataIdentifier,
                                format!("{enum_name} has no value {value}"),
                            )
                        })?)
                    }
                    Some(other) => return Err(attribute_type_error(name, "Default", other)),
                };
                Ok(ScriptParameter::enumeration(
                    label,
                    description,
                    definition.name,
                    definition.values,
                    default,
                ))
            }
        }
    }

    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "main:");
        out.push_str(&self.main.dump());
        for (name, function) in &self.functions {
            let _ = writeln!(out, "function {name}({}):", function.parameters.join(", "));
            out.push_str(&function.body.dump());
        }
        for global in &self.globals {
            let _ = writeln!(
                out,
                "global {}{} = {:?}",
                if global.is_const { "const " } else { "" },
                global.name,
                global.initial
            );
        }
        for definition in &self.enums {
            let _ = writeln!(out, "enum {} {:?}", definition.name, definition.values);
        }
        let _ = writeln!(out, "supported maps: {}", self.supported_maps.join(", "));
        out
    }
}

fn attribute_type_error(name: &str, attribute: &str, value: &MetadataValue) -> ReliefError {
    metadata_error(
        ErrorCode::IncorrectScriptParameterAttributeType,
        format!("{attribute} of {name} has the wrong type {}", value.type_name()),
    )
}

fn string_attribute(
    attributes: &BTreeMap<String, MetadataValue>,
    name: &str,
    attribute: &str,
) -> ReliefResult<Option<String>> {
    match attributes.get(attribute) {
        None => Ok(None),
        Some(MetadataValue::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(attribute_type_error(name, attribute, other)),
    }
}

fn number_attribute(
    attributes: &BTreeMap<String, MetadataValue>,
    name: &str,
    attribute: &str,
) -> ReliefResult<Option<Number>> {
    match attributes.get(attribute) {
        None => Ok(None),
        Some(MetadataValue::Number(n)) => Ok(Some(*n)),
        Some(other) => Err(attribute_type_error(name, attribute, other)),
    }
}

/// Reads `Width`/`Height`: absent or `Infinite` is unbounded, `Finite` picks the defaults.
fn map_size(value: Option<&MetadataValue>, key: &str) -> ReliefResult<MapSizeParameter> {
    let attributes = match value {
        None => return Ok(MapSizeParameter::infinite()),
        Some(MetadataValue::Identifier(id)) if id == "Infinite" => {
            return Ok(MapSizeParameter::infinite());
        }
        Some(MetadataValue::Identifier(id)) if id == "Finite" => {
            return Ok(MapSizeParameter::new(
                MAP_SIZE_AUTOMATIC,
                MAP_SIZE_MIN,
                MAP_SIZE_MAX,
            ));
        }
        Some(MetadataValue::Identifier(id)) => {
            return Err(metadata_error(
                ErrorCode::UndefinedMetadataIdentifier,
                format!("{key} cannot be {id}"),
            ));
        }
        Some(MetadataValue::KeyValue(attributes)) => attributes,
        Some(other) => {
            return Err(metadata_error(
                ErrorCode::IncorrectMetadataValueType,
                format!("{key} cannot be a {}", other.type_name()),
            ));
        }
    };

    let size = |attribute: &str, fallback: u32| -> ReliefResult<u32> {
        match attributes.get(attribute) {
            None => Ok(fallback),
            Some(MetadataValue::Number(n)) => {
                let valid = n.fract() == 0.0
                    && (f64::from(MAP_SIZE_MIN)..=f64::from(MAP_SIZE_MAX)).contains(n);
                if valid {
                    Ok(*n as u32)
                } else {
                    Err(metadata_error(
                        ErrorCode::IncorrectMapSizeNumericValue,
                        format!(
                            "{key}.{attribute} must be an integer in [{MAP_SIZE_MIN}, {MAP_SIZE_MAX}]"
                        ),
                    ))
                }
            }
            Some(other) => Err(attribute_type_error(key, attribute, other)),
        }
    };

    let min = size("Min", MAP_SIZE_MIN)?;
    let max = size("Max", MAP_SIZE_MAX)?;
    if min > max {
        return Err(metadata_error(
            ErrorCode::MinGreaterThanMax,
            format!("{key}.Min is greater than {key}.Max"),
        ));
    }
    let default = size("Default", MAP_SIZE_AUTOMATIC)?;
    Ok(MapSizeParameter::new(default, min, max))
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/script.rs"]
mod tests;
