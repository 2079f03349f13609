use crate::foundation::geometry::{Coordinate, Scale, Size1D};

/// Script-level number.
pub type Number = f64;
/// Terrain sample value.
pub type Height = i16;

pub const HEIGHT_MIN: Height = -32767;
pub const HEIGHT_MAX: Height = 32767;

pub const SCALE_MIN: Scale = 0.1;
pub const SCALE_MAX: Scale = 10.0;

/// Saturating height addition.
///
/// The bound implied by the sign of `x` is computed first; the raw sum is only formed when it
/// cannot cross that bound, so no intermediate ever leaves the `i16` range.
pub fn add_heights(x: Height, y: Height) -> Height {
    let bound = if x < 0 { HEIGHT_MIN } else { HEIGHT_MAX };
    let room = bound - x;
    if (x < 0) == (y > room) { x + y } else { bound }
}

/// Clamps a wide intermediate into the height range.
pub fn clamp_height(value: i64) -> Height {
    value.clamp(i64::from(HEIGHT_MIN), i64::from(HEIGHT_MAX)) as Height
}

/// Clamps and truncates a floating point intermediate into the height range.
pub fn clamp_height_f64(value: f64) -> Height {
    value.clamp(f64::from(HEIGHT_MIN), f64::from(HEIGHT_MAX)) as Height
}

/// Linear interpolation between two heights anchored at two coordinates.
pub fn lerp(from_coord: f64, to_coord: f64, from_height: Height, to_height: Height, point: f64) -> Height {
    let from = f64::from(from_height);
    let to = f64::from(to_height);
    clamp_height_f64(from + (to - from) * (point - from_coord) / (to_coord - from_coord))
}

/// Blend factor in [0, 1] read from a mask sample; negative samples count as 0.
pub fn mask_factor(mask: Height) -> f64 {
    f64::from(mask.max(0)) / f64::from(HEIGHT_MAX)
}

pub fn is_number_int(n: Number) -> bool {
    n.is_finite() && n.fract() == 0.0
}

/// Script number to height: [-1, 1] maps onto [HEIGHT_MIN, HEIGHT_MAX].
pub fn number_to_height(n: Number) -> Option<Height> {
    if !(-1.0..=1.0).contains(&n) {
        return None;
    }
    Some((n * f64::from(HEIGHT_MAX)) as Height)
}

pub fn height_to_number(h: Height) -> Number {
    f64::from(h) / f64::from(HEIGHT_MAX)
}

/// Truncates toward zero; `None` outside the coordinate range.
pub fn number_to_coordinate(n: Number) -> Option<Coordinate> {
    if !n.is_finite() || n < f64::from(Coordinate::MIN) || n > f64::from(Coordinate::MAX) {
        return None;
    }
    Some(n as Coordinate)
}

/// Truncates toward zero; `None` when negative or too large.
pub fn number_to_size(n: Number) -> Option<Size1D> {
    if !n.is_finite() || n < 0.0 || n > f64::from(Size1D::MAX) {
        return None;
    }
    Some(n as Size1D)
}

pub fn number_to_scale(n: Number) -> Option<Scale> {
    (SCALE_MIN..=SCALE_MAX).contains(&n).then_some(n)
}

/// Largest multiple of `m` that is `<= x`.
pub fn previous_multiple_of_inclusive(x: i64, m: u32) -> i64 {
    x.div_euclid(i64::from(m)) * i64::from(m)
}

/// Largest multiple of `m` that is `< x`.
pub fn previous_multiple_of_exclusive(x: i64, m: u32) -> i64 {
    previous_multiple_of_inclusive(x - 1, m)
}

/// Smallest multiple of `m` that is `> x`.
pub fn next_multiple_of_exclusive(x: i64, m: u32) -> i64 {
    previous_multiple_of_inclusive(x, m) + i64::from(m)
}

/// Smallest multiple of `m` that is `>= x`.
pub fn next_multiple_of_inclusive(x: i64, m: u32) -> i64 {
    next_multiple_of_exclusive(x - 1, m)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/number.rs"]
mod tests;
