use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::foundation::geometry::{Point, Scale, Size1D};
use crate::foundation::number::Number;
use crate::foundation::random::RandomSeed;

/// Map size resolved from the script's defaults at VM start.
pub const MAP_SIZE_AUTOMATIC: Size1D = 0;
/// Map without a bound along an axis.
pub const MAP_SIZE_INFINITE: Size1D = Size1D::MAX;
pub const MAP_SIZE_MIN: Size1D = 10;
pub const MAP_SIZE_MAX: Size1D = 100_000;
/// Size an automatic finite map dimension resolves to.
pub const MAP_SIZE_DEFAULT: Size1D = 1024;
/// Render size used along an infinite axis when none was requested.
pub const RENDER_SIZE_DEFAULT: Size1D = 1000;

/// Names scripts may not use for their own parameters.
pub const RESERVED_PARAMETER_NAMES: [&str; 7] = [
    "MapWidth",
    "MapHeight",
    "RenderOriginX",
    "RenderOriginY",
    "RenderWidth",
    "RenderHeight",
    "RenderScale",
];

/// Bounds and value of the map width or height.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MapSizeParameter {
    pub default: Size1D,
    pub min: Size1D,
    pub max: Size1D,
    value: Size1D,
}

impl MapSizeParameter {
    pub fn new(default: Size1D, min: Size1D, max: Size1D) -> Self {
        let mut size = Self {
            default,
            min,
            max,
            value: default,
        };
        size.set(default);
        size
    }

    pub fn infinite() -> Self {
        Self::new(MAP_SIZE_INFINITE, MAP_SIZE_INFINITE, MAP_SIZE_INFINITE)
    }

    pub fn is_infinite(&self) -> bool {
        self.max == MAP_SIZE_INFINITE
    }

    pub fn value(&self) -> Size1D {
        self.value
    }

    /// Sets the size, clamped into `[min, max]`; [`MAP_SIZE_AUTOMATIC`] picks the default.
    pub fn set(&mut self, value: Size1D) {
        if self.is_infinite() {
            self.value = MAP_SIZE_INFINITE;
            return;
        }
        let value = match value {
            MAP_SIZE_AUTOMATIC if self.default != MAP_SIZE_AUTOMATIC => self.default,
            MAP_SIZE_AUTOMATIC => MAP_SIZE_DEFAULT,
            v => v,
        };
        self.value = value.clamp(self.min, self.max);
    }

    fn same_definition(&self, other: &Self) -> bool {
        self.default == other.default && self.min == other.min && self.max == other.max
    }
}

/// Value restriction of a numeric parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Restriction {
    Unrestricted,
    Integers,
    PowersOf2,
    PowersOf10,
}

impl Restriction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Unrestricted" => Some(Self::Unrestricted),
            "Integers" => Some(Self::Integers),
            "PowersOf2" => Some(Self::PowersOf2),
            "PowersOf10" => Some(Self::PowersOf10),
            _ => None,
        }
    }

    /// Largest allowed value not above `value`.
    pub fn apply(self, value: Number) -> Number {
        match self {
            Self::Unrestricted => value,
            Self::Integers => value.floor(),
            Self::PowersOf2 => 2f64.powf(value.max(1.0).log2().floor()),
            Self::PowersOf10 => 10f64.powf(value.max(1.0).log10().floor()),
        }
    }
}

/// Typed part of a script parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum ParameterKind {
    Boolean {
        default: bool,
        value: bool,
    },
    Number {
        default: Number,
        min: Number,
        max: Number,
        restriction: Restriction,
        value: Number,
    },
    Enum {
        type_name: String,
        options: BTreeMap<String, i32>,
        default: i32,
        value: i32,
    },
}

/// Parameter a script declares in its metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct ScriptParameter {
    pub label: String,
    pub description: String,
    pub kind: ParameterKind,
}

impl ScriptParameter {
    pub fn boolean(label: String, description: String, default: bool) -> Self {
        Self {
            label,
            description,
            kind: ParameterKind::Boolean {
                default,
                value: default,
            },
        }
    }

    pub fn number(
        label: String,
        description: String,
        default: Number,
        min: Number,
        max: Number,
        restriction: Restriction,
    ) -> Self {
        Self {
            label,
            description,
            kind: ParameterKind::Number {
                default,
                min,
                max,
                restriction,
                value: default,
            },
        }
    }

    /// Undefined defaults fall back to the smallest option.
    pub fn enumeration(
        label: String,
        description: String,
        type_name: String,
        options: BTreeMap<String, i32>,
        default: Option<i32>,
    ) -> Self {
        let fallback = options.values().min().copied().unwrap_or(0);
        let default = default
            .filter(|d| options.values().any(|v| v == d))
            .unwrap_or(fallback);
        Self {
            label,
            description,
            kind: ParameterKind::Enum {
                type_name,
                options,
                default,
                value: default,
            },
        }
    }

    pub fn set_boolean(&mut self, new: bool) {
        if let ParameterKind::Boolean { value, .. } = &mut self.kind {
            *value = new;
        }
    }

    /// Clamps into `[min, max]`, then applies the restriction.
    pub fn set_number(&mut self, new: Number) {
        if let ParameterKind::Number {
            min,
            max,
            restriction,
            value,
            ..
        } = &mut self.kind
        {
            *value = restriction.apply(new.clamp(*min, *max));
        }
    }

    /// Values the enum does not define leave the default in place.
    pub fn set_enum(&mut self, new: i32) {
        if let ParameterKind::Enum {
            options,
            default,
            value,
            ..
        } = &mut self.kind
        {
            *value = if options.values().any(|v| *v == new) {
                new
            } else {
                *default
            };
        }
    }

    /// Parses a caller-supplied string; returns `false` when it does not fit the type.
    pub fn set_from_str(&mut self, text: &str) -> bool {
        match &self.kind {
            ParameterKind::Boolean { .. } => match text {
                "true" | "1" => self.set_boolean(true),
                "false" | "0" => self.set_boolean(false),
                _ => return false,
            },
            ParameterKind::Number { .. } => match text.parse::<Number>() {
                Ok(n) if n.is_finite() => self.set_number(n),
                _ => return false,
            },
            ParameterKind::Enum { options, .. } => {
                let parsed = options
                    .get(text)
                    .copied()
                    .or_else(|| text.parse::<i32>().ok());
                match parsed {
                    Some(v) => self.set_enum(v),
                    None => return false,
                }
            }
        }
        true
    }

    fn same_definition(&self, other: &Self) -> bool {
        if self.label != other.label || self.description != other.description {
            return false;
        }
        match (&self.kind, &other.kind) {
            (
                ParameterKind::Boolean { default: a, .. },
                ParameterKind::Boolean { default: b, .. },
            ) => a == b,
            (
                ParameterKind::Number {
                    default: ad,
                    min: amin,
                    max: amax,
                    restriction: ar,
                    ..
                },
                ParameterKind::Number {
                    default: bd,
                    min: bmin,
                    max: bmax,
                    restriction: br,
                    ..
                },
            ) => ad == bd && amin == bmin && amax == bmax && ar == br,
            (
                ParameterKind::Enum {
                    type_name: at,
                    default: ad,
                    ..
                },
                ParameterKind::Enum {
                    type_name: bt,
                    default: bd,
                    ..
                },
            ) => at == bt && ad == bd,
            _ => false,
        }
    }

    fn describe_value(&self) -> String {
        match &self.kind {
            ParameterKind::Boolean { value, .. } => value.to_string(),
            ParameterKind::Number { value, .. } => value.to_string(),
            ParameterKind::Enum {
                type_name,
                options,
                value,
                ..
            } => {
                let name = options
                    .iter()
                    .find(|(_, v)| *v == value)
                    .map(|(n, _)| n.as_str())
                    .unwrap_or("?");
                format!("{type_name}.{name}")
            }
        }
    }
}

/// Inputs of one script run: map size, render window, seed and declared parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct ScriptParameters {
    pub map_width: MapSizeParameter,
    pub map_height: MapSizeParameter,
    /// Logical top-left corner of the rendered window.
    pub render_origin: Point,
    /// Rendered window size; [`MAP_SIZE_AUTOMATIC`] derives it from the map size.
    pub render_width: Size1D,
    pub render_height: Size1D,
    pub render_scale: Scale,
    pub random_seed: RandomSeed,
    /// Maps to render; empty renders every map the script yields.
    pub enabled_maps: Vec<String>,
    parameters: BTreeMap<String, ScriptParameter>,
}

impl ScriptParameters {
    pub fn new(map_width: MapSizeParameter, map_height: MapSizeParameter) -> Self {
        Self {
            map_width,
            map_height,
            render_origin: Point::default(),
            render_width: MAP_SIZE_AUTOMATIC,
            render_height: MAP_SIZE_AUTOMATIC,
            render_scale: 1.0,
            random_seed: 0,
            enabled_maps: Vec::new(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, parameter: ScriptParameter) {
        self.parameters.insert(name.into(), parameter);
    }

    pub fn get(&self, name: &str) -> Option<&ScriptParameter> {
        self.parameters.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ScriptParameter> {
        self.parameters.get_mut(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScriptParameter)> {
        self.parameters.iter().map(|(n, p)| (n.as_str(), p))
    }

    pub fn is_map_enabled(&self, name: &str) -> bool {
        self.enabled_maps.is_empty() || self.enabled_maps.iter().any(|m| m == name)
    }

    /// Applies a caller override. Unknown names and values that do not parse are reported
    /// as warnings and leave the current value untouched.
    pub fn set_from_str(&mut self, name: &str, text: &str) -> bool {
        let applied = match self.parameters.get_mut(name) {
            Some(parameter) => parameter.set_from_str(text),
            None => {
                tracing::warn!(name, "unknown script parameter");
                return false;
            }
        };
        if !applied {
            tracing::warn!(name, value = text, "cannot convert script parameter value");
        }
        applied
    }

    /// Whether both tables were created from the same declarations (values may differ).
    pub fn same_definition(&self, other: &ScriptParameters) -> bool {
        self.map_width.same_definition(&other.map_width)
            && self.map_height.same_definition(&other.map_height)
            && self.parameters.len() == other.parameters.len()
            && self
                .parameters
                .iter()
                .zip(&other.parameters)
                .all(|((an, a), (bn, b))| an == bn && a.same_definition(b))
    }

    pub fn dump(&self) -> String {
        let size = |s: &MapSizeParameter| {
            if s.is_infinite() {
                "infinite".to_string()
            } else {
                format!("{} [{}, {}]", s.value(), s.min, s.max)
            }
        };
        let mut out = String::new();
        let _ = writeln!(out, "MapWidth: {}", size(&self.map_width));
        let _ = writeln!(out, "MapHeight: {}", size(&self.map_height));
        let _ = writeln!(
            out,
            "Render: origin ({}, {}), size {}x{}, scale {}",
            self.render_origin.x,
            self.render_origin.y,
            self.render_width,
            self.render_height,
            self.render_scale
        );
        let _ = writeln!(out, "RandomSeed: {}", self.random_seed);
        for (name, parameter) in &self.parameters {
            let _ = writeln!(
                out,
                "{name} ({}): {}",
                parameter.label,
                parameter.describe_value()
            );
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/parameters.rs"]
mod tests;
