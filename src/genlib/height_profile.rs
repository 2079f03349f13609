use std::collections::BTreeMap;
use std::mem::size_of;

use crate::foundation::geometry::{
    Coordinate, Direction, Interval, Point, Rectangle, Scale, Size1D,
};
use crate::foundation::number::{
    HEIGHT_MAX, HEIGHT_MIN, Height, add_heights, clamp_height_f64, lerp, mask_factor,
    next_multiple_of_exclusive, previous_multiple_of_exclusive, previous_multiple_of_inclusive,
};
use crate::foundation::random::{RandomSeed, RandomSequence2D};
use crate::genlib::height_map::HeightMap;
use crate::genlib::line::{blur_line, catmull_rom};
use crate::genlib::noise::NoiseLayers;

/// One-dimensional raster of heights over a physical interval.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightProfile {
    interval: Interval,
    scale: Scale,
    data: Vec<Height>,
}

impl HeightProfile {
    pub fn new(interval: Interval, height: Height, scale: Scale) -> Self {
        Self {
            interval,
            scale,
            data: vec![height; interval.length as usize],
        }
    }

    pub fn for_logical(interval: Interval, height: Height, scale: Scale) -> Self {
        Self::new(interval.scaled(scale), height, scale)
    }

    /// Copy of the part of `other` inside the physical `cutout`; samples outside `other` are 0.
    pub fn cutout(other: &HeightProfile, cutout: Interval) -> Self {
        let mut profile = HeightProfile::new(cutout, 0, other.scale);
        profile.zip_with(other, |_, o| o);
        profile
    }

    pub fn memory_size(interval: Interval, scale: Scale) -> u64 {
        size_of::<HeightProfile>() as u64
            + (size_of::<Height>() * interval.scaled(scale).length as usize) as u64
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn length(&self) -> Size1D {
        self.interval.length
    }

    pub fn heights(&self) -> &[Height] {
        &self.data
    }

    /// Sample at a local index. The caller keeps `x` inside the profile.
    #[inline]
    pub fn get(&self, x: Coordinate) -> Height {
        debug_assert!(x >= 0 && (x as u32) < self.interval.length);
        self.data[x as usize]
    }

    #[inline]
    pub fn set(&mut self, x: Coordinate, height: Height) {
        debug_assert!(x >= 0 && (x as u32) < self.interval.length);
        self.data[x as usize] = height;
    }

    pub fn try_get(&self, x: Coordinate) -> Option<Height> {
        usize::try_from(x).ok().and_then(|i| self.data.get(i).copied())
    }

    /// Linear sample at a fractional local index, clamped into the profile.
    pub fn sample(&self, x: f64) -> Height {
        if self.data.is_empty() {
            return 0;
        }
        let x = x.clamp(0.0, (self.data.len() - 1) as f64);
        let left = x.floor();
        let right = x.ceil();
        if left == right {
            return self.data[left as usize];
        }
        lerp(left, right, self.data[left as usize], self.data[right as usize], x)
    }

    /// Logical interval in local sample coordinates.
    pub fn physical_interval(&self, logical: Interval) -> Interval {
        logical.scaled(self.scale).translated(-self.interval.start)
    }

    pub fn physical_coordinate(&self, logical: Coordinate) -> Coordinate {
        ((f64::from(logical) * self.scale).floor() as i64 - i64::from(self.interval.start))
            .clamp(i64::from(Coordinate::MIN), i64::from(Coordinate::MAX)) as Coordinate
    }

    pub fn logical_coordinate(&self, local: f64) -> f64 {
        (local + f64::from(self.interval.start)) / self.scale
    }

    pub fn scaled_size(&self, size: Size1D) -> Size1D {
        (f64::from(size) * self.scale) as Size1D
    }

    fn local_interval(&self) -> Interval {
        Interval::new(0, self.interval.length)
    }

    fn overlap(&self, other: Interval) -> std::ops::Range<Coordinate> {
        let shared = Interval::intersect(self.interval, other).translated(-self.interval.start);
        shared.start..shared.start + shared.length as Coordinate
    }

    fn zip_with(&mut self, other: &HeightProfile, mut f: impl FnMut(Height, Height) -> Height) {
        let offset = self.interval.start - other.interval.start;
        for x in self.overlap(other.interval) {
            let o = other.get(x + offset);
            let h = &mut self.data[x as usize];
            *h = f(*h, o);
        }
    }

    fn zip3_with(
        &mut self,
        a: &HeightProfile,
        b: &HeightProfile,
        mut f: impl FnMut(Height, Height, Height) -> Height,
    ) {
        let offset_a = self.interval.start - a.interval.start;
        let offset_b = self.interval.start - b.interval.start;
        for x in self.overlap(Interval::intersect(a.interval, b.interval)) {
            let va = a.get(x + offset_a);
            let vb = b.get(x + offset_b);
            let h = &mut self.data[x as usize];
            *h = f(*h, va, vb);
        }
    }

    pub fn abs(&mut self) {
        for h in &mut self.data {
            *h = h.saturating_abs();
        }
    }

    pub fn add(&mut self, addend: Height) {
        for h in &mut self.data {
            *h = add_heights(*h, addend);
        }
    }

    pub fn add_masked(&mut self, addend: Height, mask: &HeightProfile) {
        self.zip_with(mask, |h, m| {
            add_heights(h, (f64::from(addend) * mask_factor(m)) as Height)
        });
    }

    pub fn add_profile(&mut self, addend: &HeightProfile) {
        self.zip_with(addend, add_heights);
    }

    pub fn add_profile_masked(&mut self, addend: &HeightProfile, mask: &HeightProfile) {
        self.zip3_with(addend, mask, |h, a, m| {
            add_heights(h, (f64::from(a) * mask_factor(m)) as Height)
        });
    }

    pub fn blur(&mut self, radius: Size1D) {
        let mut blurred = vec![0 as Height; self.data.len()];
        blur_line(&self.data, self.scaled_size(radius) as usize, &mut blurred);
        self.data = blurred;
    }

    pub fn clamp_heights(&mut self, min: Height, max: Height) {
        for h in &mut self.data {
            *h = (*h).clamp(min, max);
        }
    }

    pub fn combine(&mut self, other: &HeightProfile, mask: &HeightProfile) {
        self.zip3_with(other, mask, |h, o, m| {
            let f = mask_factor(m);
            add_heights(
                (f64::from(h) * f) as Height,
                (f64::from(o) * (1.0 - f)) as Height,
            )
        });
    }

    /// Replaces every sample outside the logical `interval` with `height`.
    pub fn crop(&mut self, interval: Interval, height: Height) {
        let keep = self.physical_interval(interval);
        for (x, h) in self.data.iter_mut().enumerate() {
            if !keep.contains(x as Coordinate) {
                *h = height;
            }
        }
    }

    pub fn crop_heights(&mut self, min: Height, max: Height, replace: Height) {
        for h in &mut self.data {
            if *h < min || *h > max {
                *h = replace;
            }
        }
    }

    pub fn fill_interval(&mut self, interval: Interval, height: Height) {
        let op = Interval::intersect(self.local_interval(), self.physical_interval(interval));
        for x in op.start..op.start + op.length as Coordinate {
            self.data[x as usize] = height;
        }
    }

    /// Mirrors the profile around coordinate 0.
    pub fn flip(&mut self) {
        self.data.reverse();
        let end = self.interval.end();
        self.interval = Interval::new(
            (-end).clamp(i64::from(Coordinate::MIN), i64::from(Coordinate::MAX)) as Coordinate,
            self.interval.length,
        );
    }

    /// Piecewise linear profile through logical key points; samples beyond the first and
    /// last key keep the nearest key height.
    pub fn from_array(&mut self, keys: &BTreeMap<Coordinate, Height>) {
        let Some((&first_x, &first_h)) = keys.iter().next() else {
            return;
        };
        let Some((&last_x, &last_h)) = keys.iter().next_back() else {
            return;
        };
        for i in 0..self.data.len() {
            let logical = self.logical_coordinate(i as f64);
            let value = if logical <= f64::from(first_x) {
                first_h
            } else if logical >= f64::from(last_x) {
                last_h
            } else {
                let probe = logical.floor() as Coordinate;
                let (&x0, &h0) = keys.range(..=probe).next_back().unwrap_or((&first_x, &first_h));
                let (&x1, &h1) = keys
                    .range(probe.saturating_add(1)..)
                    .next()
                    .unwrap_or((&last_x, &last_h));
                if x0 == x1 {
                    h0
                } else {
                    lerp(f64::from(x0), f64::from(x1), h0, h1, logical)
                }
            };
            self.data[i] = value;
        }
    }

    /// Linear gradient between two logical coordinates. With `fill_outside` the samples beyond
    /// the ends take the end heights, otherwise they are left unchanged.
    pub fn gradient(
        &mut self,
        source: Coordinate,
        destination: Coordinate,
        from: Height,
        to: Height,
        fill_outside: bool,
    ) {
        let s = f64::from(self.physical_coordinate(source));
        let d = f64::from(self.physical_coordinate(destination));
        for (x, h) in self.data.iter_mut().enumerate() {
            let x = x as f64;
            let t = if s == d {
                if x < s { -1.0 } else { 2.0 }
            } else {
                (x - s) / (d - s)
            };
            if t < 0.0 {
                if fill_outside {
                    *h = from;
                }
            } else if t > 1.0 {
                if fill_outside {
                    *h = to;
                }
            } else {
                *h = lerp(0.0, 1.0, from, to, t);
            }
        }
    }

    pub fn intersect(&mut self, other: &HeightProfile) {
        self.zip_with(other, |h, o| h.min(o));
    }

    pub fn invert(&mut self) {
        for h in &mut self.data {
            *h = h.saturating_neg();
        }
    }

    /// Moves the profile so the sample at `x` ends up at `x + offset` (logical).
    pub fn move_by(&mut self, offset: Coordinate) {
        let physical = (f64::from(offset) * self.scale).floor() as i64;
        self.interval = self.interval.translated(
            physical.clamp(i64::from(Coordinate::MIN), i64::from(Coordinate::MAX)) as Coordinate,
        );
    }

    pub fn multiply(&mut self, factor: f64) {
        for h in &mut self.data {
            *h = clamp_height_f64(f64::from(*h) * factor);
        }
    }

    pub fn multiply_profile(&mut self, factor: &HeightProfile) {
        self.zip_with(factor, |h, f| (f64::from(h) * mask_factor(f)) as Height);
    }

    pub fn noise(&mut self, layers: &NoiseLayers, seed: RandomSeed) {
        self.data.fill(0);
        for (step, (wave_length, amplitude)) in layers.iter().enumerate() {
            self.noise_layer(wave_length, amplitude, seed, step as u32);
        }
    }

    /// Adds one octave of lattice noise keyed by logical coordinates (row 0 of the 2D lattice).
    pub fn noise_layer(
        &mut self,
        wave_length: Size1D,
        amplitude: Height,
        seed: RandomSeed,
        seed_step: u32,
    ) {
        let random = RandomSequence2D::new(seed, seed_step);
        let amp = i64::from(amplitude);
        let lattice = |c: i64| {
            random.get_int(Point::new(c as Coordinate, 0), -amp, amp)
        };
        let physical_wave_length = self.scaled_size(wave_length);
        if physical_wave_length == 1 {
            for i in 0..self.data.len() {
                let logical = self.logical_coordinate(i as f64).floor() as i64;
                self.data[i] = add_heights(self.data[i], lattice(logical) as Height);
            }
        } else if physical_wave_length > 1 {
            for i in 0..self.data.len() {
                let logical = self.logical_coordinate(i as f64);
                let base = logical.floor() as i64;
                let x1 = previous_multiple_of_inclusive(base, wave_length);
                let x0 = previous_multiple_of_exclusive(x1, wave_length);
                let x2 = next_multiple_of_exclusive(base, wave_length);
                let x3 = next_multiple_of_exclusive(x2, wave_length);
                let t = (logical - x1 as f64) / f64::from(wave_length);
                let value = catmull_rom(
                    lattice(x0) as f64,
                    lattice(x1) as f64,
                    lattice(x2) as f64,
                    lattice(x3) as f64,
                    t,
                );
                let h = &mut self.data[i];
                *h = (value + f64::from(*h)).clamp(f64::from(HEIGHT_MIN), f64::from(HEIGHT_MAX))
                    as Height;
            }
        }
    }

    /// Tiles the logical `repeat` interval of `pattern` over the whole profile.
    pub fn pattern(&mut self, pattern: &HeightProfile, repeat: Interval) {
        if repeat.is_empty() {
            return;
        }
        let source = Interval::intersect(pattern.physical_interval(repeat), pattern.local_interval());
        if source.is_empty() {
            return;
        }
        let w = i64::from(source.length);
        let origin = i64::from(self.interval.start);
        for (x, h) in self.data.iter_mut().enumerate() {
            let p = (x as i64 + origin).rem_euclid(w) as Coordinate;
            *h = pattern.get(p + source.start);
        }
    }

    pub fn rescale(&mut self, scale: Scale) {
        let start = (f64::from(self.interval.start) * scale) as Coordinate;
        let length = (f64::from(self.interval.length) * scale) as Size1D;
        let factor = if length <= 1 || self.interval.length <= 1 {
            0.0
        } else {
            f64::from(self.interval.length - 1) / f64::from(length - 1)
        };
        let mut rescaled = HeightProfile::new(Interval::new(start, length), 0, self.scale);
        for (x, h) in rescaled.data.iter_mut().enumerate() {
            *h = self.sample(x as f64 * factor);
        }
        *self = rescaled;
    }

    /// Reallocates to the logical `interval`; new samples get `height`.
    pub fn resize(&mut self, interval: Interval, height: Height) {
        let mut resized = HeightProfile::for_logical(interval, height, self.scale);
        resized.zip_with(self, |_, o| o);
        *self = resized;
    }

    /// Copies a one-sample-wide line of `map`.
    ///
    /// With [`Direction::Horizontal`] the profile runs along x and reads row `coordinate`
    /// (logical); with [`Direction::Vertical`] it runs along y and reads that column. Samples
    /// the map does not cover are left unchanged.
    pub fn slice(&mut self, map: &HeightMap, direction: Direction, coordinate: Coordinate) {
        let across = ((f64::from(coordinate) * self.scale).floor() as i64)
            .clamp(i64::from(Coordinate::MIN), i64::from(Coordinate::MAX))
            as Coordinate;
        let map_rect = map.raster_rectangle();
        let map_along = map_rect.along(direction);
        let map_across = match direction {
            Direction::Horizontal => map_rect.vertical(),
            Direction::Vertical => map_rect.horizontal(),
        };
        if !map_across.contains(across) {
            return;
        }
        let local_across = across - map_across.start;
        let offset = self.interval.start - map_along.start;
        for x in self.overlap(map_along) {
            let value = match direction {
                Direction::Horizontal => map.get(x + offset, local_across),
                Direction::Vertical => map.get(local_across, x + offset),
            };
            self.data[x as usize] = value;
        }
    }

    pub fn unify(&mut self, other: &HeightProfile) {
        self.zip_with(other, |h, o| h.max(o));
    }
}

/// Rectangle covered by a profile stretched across the plane, see [`HeightMap::projection`].
pub(crate) fn profile_rectangle(interval: Interval, direction: Direction) -> Rectangle {
    match direction {
        Direction::Horizontal => Rectangle::from_intervals(Interval::MAX, interval),
        Direction::Vertical => Rectangle::from_intervals(interval, Interval::MAX),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/genlib/height_profile.rs"]
mod tests;
