use std::fmt;

/// Convenience result type used across relief.
pub type ReliefResult<T> = Result<T, ReliefError>;

/// Line/column position in the script source an instruction was compiled from.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct CodeLocation {
    pub line: u32,
    pub column: u32,
}

impl CodeLocation {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for CodeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Stable numeric error codes reported with script and resource-limit errors.
///
/// Codes are grouped by hundreds: 14xx script metadata and parameter declarations, 21xx types
/// and arguments, 22xx undefined symbols, 23xx arithmetic and value ranges, 24xx outputs,
/// 25xx resource limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    IncorrectMapSizeNumericValue = 1402,
    IncorrectMetadataValueType = 1403,
    UndefinedMetadataIdentifier = 1404,
    MinGreaterThanMax = 1405,
    ScriptParameterTypeNotSpecified = 1406,
    IncorrectScriptParameterValueRestriction = 1407,
    ReservedScriptParameterName = 1408,
    IncorrectScriptParameterAttributeType = 1409,
    IncorrectEnumScriptParameterType = 1410,

    IncorrectNativeFunctionArgumentType = 2101,
    IncorrectOperandType = 2102,
    IncorrectNumberOfArguments = 2103,
    IncorrectConditionResultType = 2104,
    IncorrectCoordinateComponentType = 2105,
    NullReference = 2106,
    IncorrectYieldType = 2107,
    ReadOnlyWrite = 2108,

    UndefinedFunction = 2201,
    UndefinedVariable = 2202,
    UndefinedMemberVariable = 2203,
    VariableAlreadyDefined = 2204,

    DivisionByZero = 2301,
    NumberOverflow = 2302,
    HeightOverflow = 2303,
    CoordinateOverflow = 2304,
    SizeOverflow = 2305,
    ArrayKeyNotFound = 2306,
    InvalidEnumValue = 2307,
    NumberUnderflow = 2308,
    MathDefinitionRange = 2309,
    InvalidStrength = 2310,
    NonpositiveNoiseLayerWaveLength = 2311,
    NonpositiveNoiseLayerAmplitude = 2312,
    EmptyArray = 2313,
    InvalidScale = 2314,
    NonInvertibleTransformation = 2315,

    MainMapNotGenerated = 2401,
    UnsupportedMapName = 2402,

    RenderingSequenceTooLong = 2501,
    CallStackOverflow = 2502,
    CodeBlockStackOverflow = 2503,
    ObjectStackOverflow = 2504,
    RendererMemoryLimit = 2505,
}

impl ErrorCode {
    /// Numeric value of the code.
    pub fn number(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.number())
    }
}

/// A coded error attributed to a script source location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptError {
    pub code: ErrorCode,
    pub location: CodeLocation,
    pub message: String,
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.code, self.location, self.message)
    }
}

impl std::error::Error for ScriptError {}

/// Top-level error taxonomy used by runtime APIs.
///
/// Internal invariant violations are not represented here: they panic.
#[derive(thiserror::Error, Debug)]
pub enum ReliefError {
    /// Recoverable error raised by script execution or by script declarations.
    #[error("script error: {0}")]
    Script(ScriptError),

    /// A configured limit was exceeded (stack depth, sequence length, renderer memory).
    #[error("resource limit exceeded: {0}")]
    ResourceLimit(ScriptError),

    /// The instruction stream handed to the virtual machine is malformed.
    #[error("intermediate code error: {0}")]
    IntermediateCode(String),

    /// A runtime API was called in the wrong state or with mismatched inputs.
    #[error("api usage error: {0}")]
    ApiUsage(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReliefError {
    /// Build a [`ReliefError::Script`] value.
    pub fn script(code: ErrorCode, location: CodeLocation, msg: impl Into<String>) -> Self {
        Self::Script(ScriptError {
            code,
            location,
            message: msg.into(),
        })
    }

    /// Build a [`ReliefError::ResourceLimit`] value.
    pub fn limit(code: ErrorCode, location: CodeLocation, msg: impl Into<String>) -> Self {
        Self::ResourceLimit(ScriptError {
            code,
            location,
            message: msg.into(),
        })
    }

    /// Build a [`ReliefError::IntermediateCode`] value.
    pub fn intermediate_code(msg: impl Into<String>) -> Self {
        Self::IntermediateCode(msg.into())
    }

    /// Build a [`ReliefError::ApiUsage`] value.
    pub fn api_usage(msg: impl Into<String>) -> Self {
        Self::ApiUsage(msg.into())
    }

    /// Build a [`ReliefError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Error code for coded (script and resource-limit) errors.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Script(e) | Self::ResourceLimit(e) => Some(e.code),
            _ => None,
        }
    }

    /// Source location for coded errors.
    pub fn location(&self) -> Option<CodeLocation> {
        match self {
            Self::Script(e) | Self::ResourceLimit(e) => Some(e.location),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
