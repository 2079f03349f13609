use crate::foundation::error::{CodeLocation, ErrorCode, ReliefError, ReliefResult};
use crate::foundation::geometry::{Coordinate, Direction, Point, Scale, Size1D};
use crate::foundation::number::{
    Height, Number, number_to_coordinate, number_to_height, number_to_scale, number_to_size,
};
use crate::runtime::memory::MemoryManager;
use crate::runtime::object::{ObjectId, ObjectValue};

/// Arguments of one native call, in script order.
#[derive(Clone, Copy, Debug)]
pub struct NativeCall<'c> {
    pub location: CodeLocation,
    pub name: &'c str,
    pub args: &'c [ObjectId],
}

impl NativeCall<'_> {
    pub fn error(&self, code: ErrorCode, msg: impl Into<String>) -> ReliefError {
        ReliefError::script(code, self.location, msg)
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn has(&self, index: usize) -> bool {
        index < self.args.len()
    }

    pub fn expect_count(&self, min: usize, max: usize) -> ReliefResult<()> {
        let n = self.args.len();
        if n < min || n > max {
            let expected = if min == max {
                min.to_string()
            } else {
                format!("{min} to {max}")
            };
            return Err(self.error(
                ErrorCode::IncorrectNumberOfArguments,
                format!("{} takes {expected} arguments, {n} given", self.name),
            ));
        }
        Ok(())
    }

    pub fn id(&self, index: usize) -> ReliefResult<ObjectId> {
        self.args.get(index).copied().ok_or_else(|| {
            self.error(
                ErrorCode::IncorrectNumberOfArguments,
                format!("{} needs argument {}", self.name, index + 1),
            )
        })
    }

    fn type_error(&self, memory: &MemoryManager, index: usize, expected: &str) -> ReliefError {
        let actual = self
            .args
            .get(index)
            .map(|&id| memory.value(id).type_name().to_string())
            .unwrap_or_else(|| "nothing".to_string());
        let code = match self.args.get(index).map(|&id| memory.value(id)) {
            Some(ObjectValue::Null) => ErrorCode::NullReference,
            _ => ErrorCode::IncorrectNativeFunctionArgumentType,
        };
        self.error(
            code,
            format!(
                "argument {} of {} must be {expected}, got {actual}",
                index + 1,
                self.name
            ),
        )
    }

    pub fn number(&self, memory: &MemoryManager, index: usize) -> ReliefResult<Number> {
        match memory.value(self.id(index)?) {
            ObjectValue::Number(n) => Ok(*n),
            _ => Err(self.type_error(memory, index, "a Number")),
        }
    }

    pub fn optional_number(
        &self,
        memory: &MemoryManager,
        index: usize,
        default: Number,
    ) -> ReliefResult<Number> {
        if self.has(index) {
            self.number(memory, index)
        } else {
            Ok(default)
        }
    }

    pub fn boolean(&self, memory: &MemoryManager, index: usize) -> ReliefResult<bool> {
        match memory.value(self.id(index)?) {
            ObjectValue::Boolean(b) => Ok(*b),
            _ => Err(self.type_error(memory, index, "a Boolean")),
        }
    }

    pub fn string<'m>(&self, memory: &'m MemoryManager, index: usize) -> ReliefResult<&'m str> {
        match memory.value(self.id(index)?) {
            ObjectValue::String(s) => Ok(s),
            _ => Err(self.type_error(memory, index, "a String")),
        }
    }

    /// Height argument given as a number in [-1, 1].
    pub fn height(&self, memory: &MemoryManager, index: usize) -> ReliefResult<Height> {
        let n = self.number(memory, index)?;
        number_to_height(n).ok_or_else(|| {
            self.error(
                ErrorCode::HeightOverflow,
                format!("height {n} is outside [-1, 1]"),
            )
        })
    }

    pub fn optional_height(
        &self,
        memory: &MemoryManager,
        index: usize,
        default: Height,
    ) -> ReliefResult<Height> {
        if self.has(index) {
            self.height(memory, index)
        } else {
            Ok(default)
        }
    }

    pub fn coordinate(&self, memory: &MemoryManager, index: usize) -> ReliefResult<Coordinate> {
        let n = self.number(memory, index)?;
        number_to_coordinate(n).ok_or_else(|| {
            self.error(
                ErrorCode::CoordinateOverflow,
                format!("coordinate {n} is out of range"),
            )
        })
    }

    pub fn size(&self, memory: &MemoryManager, index: usize) -> ReliefResult<Size1D> {
        let n = self.number(memory, index)?;
        number_to_size(n).ok_or_else(|| {
            self.error(ErrorCode::SizeOverflow, format!("size {n} is out of range"))
        })
    }

    pub fn scale(&self, memory: &MemoryManager, index: usize) -> ReliefResult<Scale> {
        let n = self.number(memory, index)?;
        number_to_scale(n).ok_or_else(|| {
            self.error(
                ErrorCode::InvalidScale,
                format!("scale {n} is outside [0.1, 10]"),
            )
        })
    }

    pub fn point(&self, memory: &MemoryManager, index: usize) -> ReliefResult<Point> {
        let (x, y) = match memory.value(self.id(index)?) {
            ObjectValue::Point { x, y } => (*x, *y),
            _ => return Err(self.type_error(memory, index, "a Point")),
        };
        let component = |v: Number| {
            number_to_coordinate(v).ok_or_else(|| {
                self.error(
                    ErrorCode::CoordinateOverflow,
                    format!("point component {v} is out of range"),
                )
            })
        };
        Ok(Point::new(component(x)?, component(y)?))
    }

    pub fn direction(&self, memory: &MemoryManager, index: usize) -> ReliefResult<Direction> {
        match memory.value(self.id(index)?) {
            ObjectValue::Enum { type_name, value } if type_name == "Direction" => {
                Direction::from_number(*value).ok_or_else(|| {
                    self.error(
                        ErrorCode::InvalidEnumValue,
                        format!("{value} is not a Direction"),
                    )
                })
            }
            _ => Err(self.type_error(memory, index, "a Direction")),
        }
    }

    /// Height map handle argument.
    pub fn map(&self, memory: &MemoryManager, index: usize) -> ReliefResult<ObjectId> {
        let id = self.id(index)?;
        match memory.value(id) {
            ObjectValue::HeightMap => Ok(id),
            _ => Err(self.type_error(memory, index, "a HeightMap")),
        }
    }

    pub fn profile(&self, memory: &MemoryManager, index: usize) -> ReliefResult<ObjectId> {
        let id = self.id(index)?;
        match memory.value(id) {
            ObjectValue::HeightProfile => Ok(id),
            _ => Err(self.type_error(memory, index, "a HeightProfile")),
        }
    }

    pub fn array(&self, memory: &MemoryManager, index: usize) -> ReliefResult<ObjectId> {
        let id = self.id(index)?;
        match memory.value(id) {
            ObjectValue::Array(_) => Ok(id),
            _ => Err(self.type_error(memory, index, "an Array")),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/corelib/args.rs"]
mod tests;
