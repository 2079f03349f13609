use crate::foundation::number::Number;
use crate::runtime::array::ArrayObject;

/// Stable handle of a managed object; ids are allocated monotonically and never reused.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ObjectId(pub u32);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Variable a reference object points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReferenceTarget {
    Global(String),
    /// Local variable in code block `block_index` of call `call_index`.
    Local {
        call_index: usize,
        block_index: usize,
        name: String,
    },
}

/// Script-visible value held by a managed object.
#[derive(Clone, Debug)]
pub enum ObjectValue {
    Null,
    Boolean(bool),
    Number(Number),
    String(String),
    Point { x: Number, y: Number },
    Enum { type_name: String, value: i32 },
    Array(ArrayObject),
    Reference(ReferenceTarget),
    /// Handle of a deferred 2D raster; the samples live in the renderer object table.
    HeightMap,
    /// Handle of a deferred 1D raster.
    HeightProfile,
    /// Type object giving access to static members (`HeightMap.Flat`, `Direction.Vertical`).
    Static { type_name: String },
    Parameters,
}

impl ObjectValue {
    pub fn type_name(&self) -> &str {
        match self {
            Self::Null => "Null",
            Self::Boolean(_) => "Boolean",
            Self::Number(_) => "Number",
            Self::String(_) => "String",
            Self::Point { .. } => "Point",
            Self::Enum { type_name, .. } => type_name,
            Self::Array(_) => "Array",
            Self::Reference(_) => "Reference",
            Self::HeightMap => "HeightMap",
            Self::HeightProfile => "HeightProfile",
            Self::Static { type_name } => type_name,
            Self::Parameters => "Parameters",
        }
    }

    /// Objects this value holds references to.
    pub fn children(&self) -> Vec<ObjectId> {
        match self {
            Self::Array(array) => array.children(),
            _ => Vec::new(),
        }
    }

    /// Short human-readable rendering used by `Print` and dumps.
    pub fn describe(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::Number(n) => n.to_string(),
            Self::String(s) => s.clone(),
            Self::Point { x, y } => format!("[{x}, {y}]"),
            Self::Enum { type_name, value } => format!("{type_name}({value})"),
            Self::Array(array) => format!("Array({} items)", array.len()),
            Self::Reference(ReferenceTarget::Global(name)) => format!("&{name}"),
            Self::Reference(ReferenceTarget::Local {
                call_index,
                block_index,
                name,
            }) => format!("&{name}@{call_index}:{block_index}"),
            Self::HeightMap => "HeightMap".to_string(),
            Self::HeightProfile => "HeightProfile".to_string(),
            Self::Static { type_name } => format!("type {type_name}"),
            Self::Parameters => "Parameters".to_string(),
        }
    }
}
