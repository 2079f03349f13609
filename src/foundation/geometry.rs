use std::ops::{Add, Neg, Sub};

/// Signed integer coordinate in the logical or physical plane.
pub type Coordinate = i32;
/// Unsigned one-dimensional extent.
pub type Size1D = u32;
/// Factor relating logical coordinates to physical sample indices.
pub type Scale = f64;

pub const COORDINATE_MIN: Coordinate = Coordinate::MIN;
pub const COORDINATE_MAX: Coordinate = Coordinate::MAX;
pub const SIZE1D_MAX: Size1D = Size1D::MAX;

fn narrow_coordinate(v: i64) -> Coordinate {
    v.clamp(i64::from(COORDINATE_MIN), i64::from(COORDINATE_MAX)) as Coordinate
}

fn narrow_size(v: i64) -> Size1D {
    v.clamp(0, i64::from(SIZE1D_MAX)) as Size1D
}

/// Scales a half-open span so the result covers every physical sample the logical span touches.
fn scale_span(start: Coordinate, length: Size1D, scale: Scale) -> (Coordinate, Size1D) {
    let begin = (f64::from(start) * scale).floor() as i64;
    let end = ((f64::from(start) + f64::from(length)) * scale).ceil() as i64;
    let begin = i64::from(narrow_coordinate(begin));
    (begin as Coordinate, narrow_size(end - begin))
}

/// Integer point.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Point {
    pub x: Coordinate,
    pub y: Coordinate,
}

impl Point {
    pub const fn new(x: Coordinate, y: Coordinate) -> Self {
        Self { x, y }
    }

    /// Coordinate along `direction`.
    pub fn along(self, direction: Direction) -> Coordinate {
        match direction {
            Direction::Horizontal => self.x,
            Direction::Vertical => self.y,
        }
    }

    /// Multiplies both components by `scale`, rounding toward negative infinity.
    pub fn scaled(self, scale: Scale) -> Self {
        Self {
            x: narrow_coordinate((f64::from(self.x) * scale).floor() as i64),
            y: narrow_coordinate((f64::from(self.y) * scale).floor() as i64),
        }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(self, other: Point) -> f64 {
        let dx = f64::from(other.x) - f64::from(self.x);
        let dy = f64::from(other.y) - f64::from(self.y);
        (dx * dx + dy * dy).sqrt()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(
            narrow_coordinate(i64::from(self.x) + i64::from(rhs.x)),
            narrow_coordinate(i64::from(self.y) + i64::from(rhs.y)),
        )
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(
            narrow_coordinate(i64::from(self.x) - i64::from(rhs.x)),
            narrow_coordinate(i64::from(self.y) - i64::from(rhs.y)),
        )
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(self.x.saturating_neg(), self.y.saturating_neg())
    }
}

/// Two-dimensional extent.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Size2D {
    pub width: Size1D,
    pub height: Size1D,
}

impl Size2D {
    pub const fn new(width: Size1D, height: Size1D) -> Self {
        Self { width, height }
    }

    /// Number of samples covered, `width * height`.
    pub fn total_length(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    pub fn along(self, direction: Direction) -> Size1D {
        match direction {
            Direction::Horizontal => self.width,
            Direction::Vertical => self.height,
        }
    }
}

/// Axis selector used by directional operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Horizontal,
    Vertical,
}

impl Direction {
    /// Maps the script-level enum value; anything but 0 or 1 is not a direction.
    pub fn from_number(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Horizontal),
            1 => Some(Self::Vertical),
            _ => None,
        }
    }

    pub fn as_number(self) -> i32 {
        match self {
            Self::Horizontal => 0,
            Self::Vertical => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Horizontal => "Horizontal",
            Self::Vertical => "Vertical",
        }
    }
}

/// Half-open one-dimensional range `[start, start + length)`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Interval {
    pub start: Coordinate,
    pub length: Size1D,
}

impl Interval {
    /// Interval spanning the whole coordinate space.
    pub const MAX: Interval = Interval {
        start: COORDINATE_MIN,
        length: SIZE1D_MAX,
    };

    pub const fn new(start: Coordinate, length: Size1D) -> Self {
        Self { start, length }
    }

    /// Smallest interval containing both coordinates (inclusive).
    pub fn from_coordinates(a: Coordinate, b: Coordinate) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Self::new(lo, narrow_size(i64::from(hi) - i64::from(lo) + 1))
    }

    /// Exclusive end, computed without narrowing.
    pub fn end(self) -> i64 {
        i64::from(self.start) + i64::from(self.length)
    }

    pub fn is_empty(self) -> bool {
        self.length == 0
    }

    fn from_bounds(start: i64, end: i64) -> Self {
        let start = narrow_coordinate(start);
        Self::new(start, narrow_size(end - i64::from(start)))
    }

    fn hull(a: Interval, b: Interval) -> Interval {
        Self::from_bounds(
            i64::from(a.start.min(b.start)),
            a.end().max(b.end()),
        )
    }

    /// Minimal interval containing both; an empty operand is the identity.
    pub fn combine(a: Interval, b: Interval) -> Interval {
        if a.is_empty() {
            return b;
        }
        if b.is_empty() {
            return a;
        }
        Self::hull(a, b)
    }

    /// Overlap of both operands, empty when disjoint.
    pub fn intersect(a: Interval, b: Interval) -> Interval {
        let start = a.start.max(b.start);
        let end = a.end().min(b.end());
        Interval::new(start, narrow_size(end - i64::from(start)))
    }

    /// Grows the interval by `by` on both sides.
    pub fn expand(self, by: Size1D) -> Interval {
        Self::from_bounds(
            i64::from(self.start) - i64::from(by),
            self.end() + i64::from(by),
        )
    }

    /// Shrinks the interval by `by` on both sides; the length never goes below zero.
    pub fn contract(self, by: Size1D) -> Interval {
        let length = i64::from(self.length) - 2 * i64::from(by);
        Interval::new(
            narrow_coordinate(i64::from(self.start) + i64::from(by)),
            narrow_size(length),
        )
    }

    pub fn contains(self, coordinate: Coordinate) -> bool {
        let c = i64::from(coordinate);
        c >= i64::from(self.start) && c < self.end()
    }

    /// Inclusive containment of another interval; every interval contains an empty one.
    pub fn contains_interval(self, other: Interval) -> bool {
        other.is_empty() || (other.start >= self.start && other.end() <= self.end())
    }

    /// Logical to physical mapping covering every touched sample.
    pub fn scaled(self, scale: Scale) -> Interval {
        let (start, length) = scale_span(self.start, self.length, scale);
        Interval::new(start, length)
    }

    pub fn translated(self, offset: Coordinate) -> Interval {
        Interval::new(
            narrow_coordinate(i64::from(self.start) + i64::from(offset)),
            self.length,
        )
    }
}

/// Axis-aligned integer rectangle with half-open upper bounds.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Rectangle {
    pub position: Point,
    pub size: Size2D,
}

impl Rectangle {
    /// Rectangle spanning the whole coordinate space.
    pub const MAX: Rectangle = Rectangle {
        position: Point::new(COORDINATE_MIN, COORDINATE_MIN),
        size: Size2D::new(SIZE1D_MAX, SIZE1D_MAX),
    };

    pub const fn new(position: Point, size: Size2D) -> Self {
        Self { position, size }
    }

    /// Smallest rectangle containing both points (inclusive).
    pub fn from_points(a: Point, b: Point) -> Self {
        Self::combine(
            Rectangle::new(a, Size2D::new(1, 1)),
            Rectangle::new(b, Size2D::new(1, 1)),
        )
    }

    pub fn from_intervals(horizontal: Interval, vertical: Interval) -> Self {
        Self::new(
            Point::new(horizontal.start, vertical.start),
            Size2D::new(horizontal.length, vertical.length),
        )
    }

    pub fn horizontal(self) -> Interval {
        Interval::new(self.position.x, self.size.width)
    }

    pub fn vertical(self) -> Interval {
        Interval::new(self.position.y, self.size.height)
    }

    pub fn along(self, direction: Direction) -> Interval {
        match direction {
            Direction::Horizontal => self.horizontal(),
            Direction::Vertical => self.vertical(),
        }
    }

    pub fn is_empty(self) -> bool {
        self.size.total_length() == 0
    }

    /// Exclusive ending point, clamped into the coordinate range.
    pub fn ending_point(self) -> Point {
        Point::new(
            narrow_coordinate(self.horizontal().end()),
            narrow_coordinate(self.vertical().end()),
        )
    }

    /// Minimal bounding rectangle of both; a rectangle with no area is the identity.
    pub fn combine(a: Rectangle, b: Rectangle) -> Rectangle {
        if a.is_empty() {
            return b;
        }
        if b.is_empty() {
            return a;
        }
        Self::from_intervals(
            Interval::hull(a.horizontal(), b.horizontal()),
            Interval::hull(a.vertical(), b.vertical()),
        )
    }

    /// Overlap of both operands; sizes clamp to zero when disjoint.
    pub fn intersect(a: Rectangle, b: Rectangle) -> Rectangle {
        Self::from_intervals(
            Interval::intersect(a.horizontal(), b.horizontal()),
            Interval::intersect(a.vertical(), b.vertical()),
        )
    }

    /// Grows the rectangle by `by` on every side.
    pub fn expand(self, by: Size1D) -> Rectangle {
        Self::from_intervals(self.horizontal().expand(by), self.vertical().expand(by))
    }

    /// Grows the rectangle by `by` on both sides of one axis.
    pub fn expand_in(self, by: Size1D, direction: Direction) -> Rectangle {
        match direction {
            Direction::Horizontal => {
                Self::from_intervals(self.horizontal().expand(by), self.vertical())
            }
            Direction::Vertical => {
                Self::from_intervals(self.horizontal(), self.vertical().expand(by))
            }
        }
    }

    /// Shrinks the rectangle by `by` on every side; sizes clamp at zero.
    pub fn contract(self, by: Size1D) -> Rectangle {
        Self::from_intervals(self.horizontal().contract(by), self.vertical().contract(by))
    }

    pub fn contract_in(self, by: Size1D, direction: Direction) -> Rectangle {
        match direction {
            Direction::Horizontal => {
                Self::from_intervals(self.horizontal().contract(by), self.vertical())
            }
            Direction::Vertical => {
                Self::from_intervals(self.horizontal(), self.vertical().contract(by))
            }
        }
    }

    /// Whether `other` lies entirely within this rectangle. Empty rectangles are contained
    /// everywhere.
    pub fn contains_rect(self, other: Rectangle) -> bool {
        other.is_empty()
            || (self.horizontal().contains_interval(other.horizontal())
                && self.vertical().contains_interval(other.vertical()))
    }

    pub fn contains_point(self, point: Point) -> bool {
        self.horizontal().contains(point.x) && self.vertical().contains(point.y)
    }

    /// Logical to physical mapping covering every touched sample.
    pub fn scaled(self, scale: Scale) -> Rectangle {
        Self::from_intervals(self.horizontal().scaled(scale), self.vertical().scaled(scale))
    }

    pub fn translated(self, offset: Point) -> Rectangle {
        Rectangle::new(self.position + offset, self.size)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/geometry.rs"]
mod tests;
