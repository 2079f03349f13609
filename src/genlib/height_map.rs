use std::mem::size_of;

use crate::foundation::geometry::{
    Coordinate, Direction, Interval, Point, Rectangle, Scale, Size1D, Size2D,
};
use crate::foundation::number::{
    HEIGHT_MAX, HEIGHT_MIN, Height, add_heights, clamp_height_f64, lerp, mask_factor,
    next_multiple_of_exclusive, previous_multiple_of_exclusive, previous_multiple_of_inclusive,
};
use crate::foundation::random::{RandomSeed, RandomSequence2D};
use crate::genlib::height_profile::{HeightProfile, profile_rectangle};
use crate::genlib::line::{bicubic, blur_line, distance_transform_line};
use crate::genlib::matrix::TransformationMatrix;
use crate::genlib::noise::NoiseLayers;

/// Iterates the local coordinates of a rectangle row by row.
fn cells(rect: Rectangle) -> impl Iterator<Item = (Coordinate, Coordinate)> {
    let end = rect.ending_point();
    (rect.position.y..end.y).flat_map(move |y| (rect.position.x..end.x).map(move |x| (x, y)))
}

/// Two-dimensional raster of heights.
///
/// `logical` is the placement scripts see; `rectangle` is the same area in physical (scaled)
/// coordinates and sizes the sample buffer. Sample `(x, y)` in local coordinates lives at
/// `x + width * y`.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightMap {
    logical: Rectangle,
    rectangle: Rectangle,
    scale: Scale,
    data: Vec<Height>,
}

impl HeightMap {
    /// Map covering the logical `rectangle` at `scale`, filled with `height`.
    pub fn new(rectangle: Rectangle, height: Height, scale: Scale) -> Self {
        Self::with_rectangles(rectangle, rectangle.scaled(scale), height, scale)
    }

    fn with_rectangles(
        logical: Rectangle,
        physical: Rectangle,
        height: Height,
        scale: Scale,
    ) -> Self {
        Self {
            logical,
            rectangle: physical,
            scale,
            data: vec![height; physical.size.total_length()],
        }
    }

    /// Copy of the part of `other` inside the logical `cutout`; samples outside `other` are 0.
    pub fn cutout(other: &HeightMap, cutout: Rectangle) -> Self {
        let mut map = HeightMap::new(cutout, 0, other.scale);
        map.copy_overlap(other);
        map
    }

    /// Bytes needed by a map covering the logical `rectangle` at `scale`.
    pub fn memory_size(rectangle: Rectangle, scale: Scale) -> u64 {
        size_of::<HeightMap>() as u64
            + (size_of::<Height>() * rectangle.scaled(scale).size.total_length()) as u64
    }

    /// Logical placement of the map.
    pub fn rectangle(&self) -> Rectangle {
        self.logical
    }

    /// Physical area covered by the samples.
    pub fn raster_rectangle(&self) -> Rectangle {
        self.rectangle
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    /// Samples per row.
    pub fn width(&self) -> Size1D {
        self.rectangle.size.width
    }

    pub fn height(&self) -> Size1D {
        self.rectangle.size.height
    }

    /// Samples in row-major order.
    pub fn heights(&self) -> &[Height] {
        &self.data
    }

    pub fn own_memory_size(&self) -> u64 {
        size_of::<HeightMap>() as u64 + (size_of::<Height>() * self.data.len()) as u64
    }

    fn local_rect(&self) -> Rectangle {
        Rectangle::new(Point::default(), self.rectangle.size)
    }

    #[inline]
    fn index(&self, x: Coordinate, y: Coordinate) -> usize {
        debug_assert!(
            self.local_rect().contains_point(Point::new(x, y)),
            "sample ({x}, {y}) outside {:?}",
            self.rectangle.size
        );
        x as usize + self.rectangle.size.width as usize * y as usize
    }

    /// Sample at local coordinates.
    ///
    /// The caller keeps `(x, y)` inside the local rectangle; only debug builds verify it.
    #[inline]
    pub fn get(&self, x: Coordinate, y: Coordinate) -> Height {
        self.data[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: Coordinate, y: Coordinate, height: Height) {
        let i = self.index(x, y);
        self.data[i] = height;
    }

    #[inline]
    fn at_mut(&mut self, x: Coordinate, y: Coordinate) -> &mut Height {
        let i = self.index(x, y);
        &mut self.data[i]
    }

    /// Bounds-checked sample at local coordinates.
    pub fn try_get(&self, x: Coordinate, y: Coordinate) -> Option<Height> {
        self.local_rect()
            .contains_point(Point::new(x, y))
            .then(|| self.get(x, y))
    }

    /// Bounds-checked write; returns whether the sample exists.
    pub fn try_set(&mut self, x: Coordinate, y: Coordinate, height: Height) -> bool {
        let inside = self.local_rect().contains_point(Point::new(x, y));
        if inside {
            self.set(x, y, height);
        }
        inside
    }

    /// Bilinear sample at fractional local coordinates.
    pub fn sample(&self, mut x: f64, mut y: f64) -> Height {
        if x.floor() + 0.00005 > x {
            x = x.floor();
        }
        if y.floor() + 0.00005 > y {
            y = y.floor();
        }
        let left = x.floor() as Coordinate;
        let right = x.ceil() as Coordinate;
        let top = y.floor() as Coordinate;
        let bottom = y.ceil() as Coordinate;

        let row = |row: Coordinate| {
            if left == right {
                self.get(left, row)
            } else {
                lerp(
                    f64::from(left),
                    f64::from(right),
                    self.get(left, row),
                    self.get(right, row),
                    x,
                )
            }
        };
        let upper = row(top);
        if top == bottom {
            upper
        } else {
            lerp(f64::from(top), f64::from(bottom), upper, row(bottom), y)
        }
    }

    /// Bilinear sample with coordinates clamped into the map.
    pub fn sample_clamped(&self, x: f64, y: f64) -> Height {
        let max_x = f64::from(self.width().saturating_sub(1));
        let max_y = f64::from(self.height().saturating_sub(1));
        self.sample(x.clamp(0.0, max_x), y.clamp(0.0, max_y))
    }

    /// Logical rectangle in local sample coordinates.
    pub fn physical_rectangle(&self, logical: Rectangle) -> Rectangle {
        logical.scaled(self.scale).translated(-self.rectangle.position)
    }

    /// Physical rectangle in local sample coordinates.
    pub fn physical_rectangle_unscaled(&self, physical: Rectangle) -> Rectangle {
        physical.translated(-self.rectangle.position)
    }

    pub fn physical_point(&self, logical: Point) -> Point {
        logical.scaled(self.scale) - self.rectangle.position
    }

    pub fn physical_point_unscaled(&self, physical: Point) -> Point {
        physical - self.rectangle.position
    }

    /// Fractional logical coordinate to fractional local coordinate.
    pub fn physical_coordinate(&self, logical: f64, direction: Direction) -> f64 {
        logical * self.scale - f64::from(self.rectangle.position.along(direction))
    }

    /// Local sample to the logical point containing it.
    pub fn logical_point(&self, local: Point) -> Point {
        let absolute = local + self.rectangle.position;
        Point::new(
            (f64::from(absolute.x) / self.scale).floor() as Coordinate,
            (f64::from(absolute.y) / self.scale).floor() as Coordinate,
        )
    }

    pub fn logical_x(&self, local_x: f64) -> f64 {
        (local_x + f64::from(self.rectangle.position.x)) / self.scale
    }

    pub fn logical_y(&self, local_y: f64) -> f64 {
        (local_y + f64::from(self.rectangle.position.y)) / self.scale
    }

    /// Logical length to physical samples.
    pub fn scaled_size(&self, size: Size1D) -> Size1D {
        (f64::from(size) * self.scale) as Size1D
    }

    /// Local rectangle shared with another physical rectangle.
    fn overlap(&self, other: Rectangle) -> Rectangle {
        self.physical_rectangle_unscaled(Rectangle::intersect(self.rectangle, other))
    }

    fn copy_overlap(&mut self, other: &HeightMap) {
        self.zip_with(other, |_, o| o);
    }

    /// Applies `f(this, other)` over the overlap of both maps.
    fn zip_with(&mut self, other: &HeightMap, mut f: impl FnMut(Height, Height) -> Height) {
        let op = self.overlap(other.rectangle);
        let offset = self.rectangle.position - other.rectangle.position;
        for (x, y) in cells(op) {
            let o = other.get(x + offset.x, y + offset.y);
            let h = self.at_mut(x, y);
            *h = f(*h, o);
        }
    }

    /// Applies `f(this, a, b)` over the overlap of all three maps.
    fn zip3_with(
        &mut self,
        a: &HeightMap,
        b: &HeightMap,
        mut f: impl FnMut(Height, Height, Height) -> Height,
    ) {
        let shared = Rectangle::intersect(a.rectangle, b.rectangle);
        let op = self.overlap(shared);
        let offset_a = self.rectangle.position - a.rectangle.position;
        let offset_b = self.rectangle.position - b.rectangle.position;
        for (x, y) in cells(op) {
            let va = a.get(x + offset_a.x, y + offset_a.y);
            let vb = b.get(x + offset_b.x, y + offset_b.y);
            let h = self.at_mut(x, y);
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

    /// Adds `addend` weighted by `mask`. Samples the mask does not cover are left unchanged.
    pub fn add_masked(&mut self, addend: Height, mask: &HeightMap) {
        self.zip_with(mask, |h, m| {
            add_heights(h, (f64::from(addend) * mask_factor(m)) as Height)
        });
    }

    pub fn add_map(&mut self, addend: &HeightMap) {
        self.zip_with(addend, add_heights);
    }

    pub fn add_map_masked(&mut self, addend: &HeightMap, mask: &HeightMap) {
        self.zip3_with(addend, mask, |h, a, m| {
            add_heights(h, (f64::from(a) * mask_factor(m)) as Height)
        });
    }

    /// Box blur in both directions.
    pub fn blur(&mut self, radius: Size1D) {
        self.blur_in(radius, Direction::Horizontal);
        self.blur_in(radius, Direction::Vertical);
    }

    /// Box blur along one axis; `radius` is logical.
    pub fn blur_in(&mut self, radius: Size1D, direction: Direction) {
        let radius = self.scaled_size(radius) as usize;
        let width = self.width() as usize;
        let height = self.height() as usize;
        if width == 0 || height == 0 {
            return;
        }
        let mut blurred = vec![0 as Height; self.data.len()];
        match direction {
            Direction::Horizontal => {
                for (src, dst) in self.data.chunks(width).zip(blurred.chunks_mut(width)) {
                    blur_line(src, radius, dst);
                }
            }
            Direction::Vertical => {
                let mut column = vec![0 as Height; height];
                let mut out = vec![0 as Height; height];
                for x in 0..width {
                    for (y, c) in column.iter_mut().enumerate() {
                        *c = self.data[x + y * width];
                    }
                    blur_line(&column, radius, &mut out);
                    for (y, &v) in out.iter().enumerate() {
                        blurred[x + y * width] = v;
                    }
                }
            }
        }
        self.data = blurred;
    }

    pub fn clamp_heights(&mut self, min: Height, max: Height) {
        for h in &mut self.data {
            *h = (*h).clamp(min, max);
        }
    }

    /// Blends `this` and `other`: `this * f + other * (1 - f)` with `f` read from `mask`.
    pub fn combine(&mut self, other: &HeightMap, mask: &HeightMap) {
        self.zip3_with(other, mask, |h, o, m| {
            let f = mask_factor(m);
            add_heights(
                (f64::from(h) * f) as Height,
                (f64::from(o) * (1.0 - f)) as Height,
            )
        });
    }

    /// Difference between the map and its blurred version.
    pub fn convexity_map(&mut self, radius: Size1D) {
        let unsmoothed = self.clone();
        self.blur(radius);
        self.invert();
        self.add_map(&unsmoothed);
    }

    /// Replaces every sample outside the logical `rectangle` with `height`.
    pub fn crop(&mut self, rectangle: Rectangle, height: Height) {
        let keep = self.physical_rectangle(rectangle);
        for (x, y) in cells(self.local_rect()) {
            if !keep.contains_point(Point::new(x, y)) {
                self.set(x, y, height);
            }
        }
    }

    /// Replaces every sample outside `[min, max]` with `replace`.
    pub fn crop_heights(&mut self, min: Height, max: Height, replace: Height) {
        for h in &mut self.data {
            if *h < min || *h > max {
                *h = replace;
            }
        }
    }

    /// Euclidean distance to the nearest sample `<= 0`, scaled so `max_distance` maps to
    /// `HEIGHT_MAX`.
    pub fn distance_map(&mut self, max_distance: Size1D) {
        let width = self.width() as usize;
        let height = self.height() as usize;
        if width == 0 || height == 0 {
            return;
        }
        let max = f64::from(self.scaled_size(max_distance).max(1));
        let seed = max * max;
        let mut distances: Vec<f64> = self
            .data
            .iter()
            .map(|&h| if h <= 0 { 0.0 } else { seed })
            .collect();

        let mut out = vec![0.0; width];
        for row in distances.chunks_mut(width) {
            distance_transform_line(row, &mut out);
            row.copy_from_slice(&out);
        }

        let mut column = vec![0.0; height];
        let mut out = vec![0.0; height];
        for x in 0..width {
            for (y, c) in column.iter_mut().enumerate() {
                *c = distances[x + y * width];
            }
            distance_transform_line(&column, &mut out);
            for (y, &v) in out.iter().enumerate() {
                distances[x + y * width] = v;
            }
        }

        for (h, d) in self.data.iter_mut().zip(distances) {
            *h = clamp_height_f64(d.sqrt() * f64::from(HEIGHT_MAX) / max);
        }
    }

    /// Displaces samples by the two distortion maps; `HEIGHT_MAX` moves by `max_distance`.
    pub fn distort(&mut self, horizontal: &HeightMap, vertical: &HeightMap, max_distance: Size1D) {
        let copy = self.clone();
        let factor = f64::from(self.scaled_size(max_distance)) / f64::from(HEIGHT_MAX);
        let op = self.overlap(Rectangle::intersect(horizontal.rectangle, vertical.rectangle));
        let offset_h = self.rectangle.position - horizontal.rectangle.position;
        let offset_v = self.rectangle.position - vertical.rectangle.position;
        for (x, y) in cells(op) {
            let dx = f64::from(horizontal.get(x + offset_h.x, y + offset_h.y)) * factor;
            let dy = f64::from(vertical.get(x + offset_v.x, y + offset_v.y)) * factor;
            let value = copy.sample_clamped(f64::from(x) + dx, f64::from(y) + dy);
            self.set(x, y, value);
        }
    }

    /// Draws a one-sample-wide line between two logical points.
    pub fn draw_line(&mut self, start: Point, end: Point, height: Height) {
        let (a, b) = if start.x <= end.x { (start, end) } else { (end, start) };
        let actual_start = self.physical_point(a);
        let actual_end = self.physical_point(b);
        let bounds = self.local_rect();
        let Some((sx, sy, ex, ey)) = clip_line(
            f64::from(actual_start.x),
            f64::from(actual_start.y),
            f64::from(actual_end.x),
            f64::from(actual_end.y),
            bounds,
        ) else {
            return;
        };

        let full_dx = f64::from(actual_end.x) - f64::from(actual_start.x);
        let full_dy = f64::from(actual_end.y) - f64::from(actual_start.y);
        let (mut x, mut y) = (sx, sy);
        self.try_set(x as Coordinate, y as Coordinate, height);
        if (ex - x).abs() >= (ey - y).abs() {
            let step_y = if full_dx == 0.0 { 0.0 } else { full_dy / full_dx };
            while x < ex {
                x += 1.0;
                y += step_y;
                self.try_set(x as Coordinate, y as Coordinate, height);
            }
        } else {
            let step_x = full_dx / full_dy;
            if y < ey {
                while y < ey {
                    x += step_x;
                    y += 1.0;
                    self.try_set(x as Coordinate, y as Coordinate, height);
                }
            } else {
                while y > ey {
                    x -= step_x;
                    y -= 1.0;
                    self.try_set(x as Coordinate, y as Coordinate, height);
                }
            }
        }
    }

    pub fn fill_rectangle(&mut self, rectangle: Rectangle, height: Height) {
        let op = Rectangle::intersect(self.local_rect(), self.physical_rectangle(rectangle));
        for (x, y) in cells(op) {
            self.set(x, y, height);
        }
    }

    /// Linear gradient along the logical segment `source -> destination`. Samples projecting
    /// before the source get `from`, after the destination get `to`.
    pub fn gradient(&mut self, source: Point, destination: Point, from: Height, to: Height) {
        let s = self.physical_point(source);
        let d = self.physical_point(destination);
        let gx = f64::from(d.x) - f64::from(s.x);
        let gy = f64::from(d.y) - f64::from(s.y);
        let length_sq = gx * gx + gy * gy;
        if length_sq == 0.0 {
            self.data.fill(from);
            return;
        }
        for (x, y) in cells(self.local_rect()) {
            let px = f64::from(x) - f64::from(s.x);
            let py = f64::from(y) - f64::from(s.y);
            let t = (px * gx + py * gy) / length_sq;
            let value = if t <= 0.0 {
                from
            } else if t >= 1.0 {
                to
            } else {
                lerp(0.0, 1.0, from, to, t)
            };
            self.set(x, y, value);
        }
    }

    pub fn intersect(&mut self, other: &HeightMap) {
        self.zip_with(other, |h, o| h.min(o));
    }

    pub fn invert(&mut self) {
        for h in &mut self.data {
            *h = h.saturating_neg();
        }
    }

    /// Shifts the map by a logical offset without touching the samples.
    pub fn move_by(&mut self, offset: Point) {
        self.logical = self.logical.translated(offset);
        self.rectangle = self.rectangle.translated(offset.scaled(self.scale));
    }

    pub fn multiply(&mut self, factor: f64) {
        for h in &mut self.data {
            *h = clamp_height_f64(f64::from(*h) * factor);
        }
    }

    /// Multiplies by `factor / HEIGHT_MAX`; negative factors count as 0.
    pub fn multiply_map(&mut self, factor: &HeightMap) {
        self.zip_with(factor, |h, f| (f64::from(h) * mask_factor(f)) as Height);
    }

    /// Replaces the content with layered noise; layer `i` uses seed step `i`.
    pub fn noise(&mut self, layers: &NoiseLayers, seed: RandomSeed) {
        self.data.fill(0);
        for (step, (wave_length, amplitude)) in layers.iter().enumerate() {
            self.noise_layer(wave_length, amplitude, seed, step as u32, false);
        }
    }

    /// Adds one octave of lattice noise keyed by logical coordinates.
    pub fn noise_layer(
        &mut self,
        wave_length: Size1D,
        amplitude: Height,
        seed: RandomSeed,
        seed_step: u32,
        ridged: bool,
    ) {
        let random = RandomSequence2D::new(seed, seed_step);
        let amp = i64::from(amplitude);
        let physical_wave_length = self.scaled_size(wave_length);

        if physical_wave_length == 1 {
            for (x, y) in cells(self.local_rect()) {
                let logical = self.logical_point(Point::new(x, y));
                let mut value = random.get_int(logical, -amp, amp);
                if ridged {
                    value = value.abs();
                }
                let h = self.at_mut(x, y);
                *h = add_heights(*h, value as Height);
            }
        } else if physical_wave_length > 1 {
            let lattice = |cx: i64, cy: i64| {
                random.get_int(Point::new(cx as Coordinate, cy as Coordinate), -amp, amp) as f64
            };
            for (x, y) in cells(self.local_rect()) {
                let lx = self.logical_x(f64::from(x));
                let ly = self.logical_y(f64::from(y));
                let xs = lattice_coordinates(lx, wave_length);
                let ys = lattice_coordinates(ly, wave_length);
                let mut p = [[0.0; 4]; 4];
                for (i, &cx) in xs.iter().enumerate() {
                    for (j, &cy) in ys.iter().enumerate() {
                        p[i][j] = lattice(cx, cy);
                    }
                }
                let tx = (lx - xs[1] as f64) / f64::from(wave_length);
                let ty = (ly - ys[1] as f64) / f64::from(wave_length);
                let mut value = bicubic(&p, tx, ty);
                if ridged {
                    value = value.abs();
                }
                let h = self.at_mut(x, y);
                *h = (value + f64::from(*h)).clamp(f64::from(HEIGHT_MIN), f64::from(HEIGHT_MAX))
                    as Height;
            }
        }
    }

    /// Tiles the logical `repeat` rectangle of `pattern` over the whole map.
    pub fn pattern(&mut self, pattern: &HeightMap, repeat: Rectangle) {
        if repeat.is_empty() {
            return;
        }
        let source = Rectangle::intersect(
            pattern.physical_rectangle(repeat),
            pattern.local_rect(),
        );
        if source.is_empty() {
            return;
        }
        let w = i64::from(source.size.width);
        let h = i64::from(source.size.height);
        let origin = self.rectangle.position;
        for (x, y) in cells(self.local_rect()) {
            let px = (i64::from(x) + i64::from(origin.x)).rem_euclid(w) as Coordinate;
            let py = (i64::from(y) + i64::from(origin.y)).rem_euclid(h) as Coordinate;
            let value = pattern.get(px + source.position.x, py + source.position.y);
            self.set(x, y, value);
        }
    }

    /// Stretches `profile` across the map.
    ///
    /// With [`Direction::Horizontal`] the profile runs along the vertical axis and every row
    /// takes the profile sample at its y; with [`Direction::Vertical`] every column takes the
    /// sample at its x. Samples outside the profile's interval are left unchanged.
    pub fn projection(&mut self, profile: &HeightProfile, direction: Direction) {
        let interval = profile.interval();
        let op = self.overlap(profile_rectangle(interval, direction));
        let origin = self.rectangle.position;
        for (x, y) in cells(op) {
            let absolute = match direction {
                Direction::Horizontal => y + origin.y,
                Direction::Vertical => x + origin.x,
            };
            let value = profile.get(absolute - interval.start);
            self.set(x, y, value);
        }
    }

    /// Radial gradient: `from` at the logical `center`, `to` at `radius` and beyond.
    pub fn radial_gradient(&mut self, center: Point, radius: Size1D, from: Height, to: Height) {
        let c = self.physical_point(center);
        let r = f64::from(self.scaled_size(radius));
        for (x, y) in cells(self.local_rect()) {
            let d = Point::new(x, y).distance_to(c);
            let value = if d >= r {
                if r == 0.0 && d == 0.0 { from } else { to }
            } else {
                lerp(0.0, r, from, to, d)
            };
            self.set(x, y, value);
        }
    }

    /// Resamples the map so its footprint grows by the given factors.
    pub fn rescale(&mut self, horizontal: Scale, vertical: Scale) {
        let grow = |rect: Rectangle| {
            Rectangle::new(
                Point::new(
                    (f64::from(rect.position.x) * horizontal) as Coordinate,
                    (f64::from(rect.position.y) * vertical) as Coordinate,
                ),
                Size2D::new(
                    (f64::from(rect.size.width) * horizontal) as Size1D,
                    (f64::from(rect.size.height) * vertical) as Size1D,
                ),
            )
        };
        let old = self.rectangle;
        let new_rect = grow(old);
        let actual = |new_len: Size1D, old_len: Size1D| {
            if new_len <= 1 || old_len <= 1 {
                0.0
            } else {
                f64::from(old_len - 1) / f64::from(new_len - 1)
            }
        };
        let fx = actual(new_rect.size.width, old.size.width);
        let fy = actual(new_rect.size.height, old.size.height);
        let mut rescaled =
            HeightMap::with_rectangles(grow(self.logical), new_rect, 0, self.scale);
        if !self.data.is_empty() {
            for (x, y) in cells(rescaled.local_rect()) {
                let value = self.sample_clamped(f64::from(x) * fx, f64::from(y) * fy);
                rescaled.set(x, y, value);
            }
        }
        *self = rescaled;
    }

    /// Reallocates to the logical `rectangle`; new samples get `height`.
    pub fn resize(&mut self, rectangle: Rectangle, height: Height) {
        let mut resized = HeightMap::new(rectangle, height, self.scale);
        resized.copy_overlap(self);
        *self = resized;
    }

    /// Shifts rows (or columns) by the profile heights; `HEIGHT_MAX` shifts by `max_distance`.
    ///
    /// With [`Direction::Horizontal`] row `y` moves horizontally by the profile sample at `y`.
    pub fn shift(&mut self, profile: &HeightProfile, max_distance: Size1D, direction: Direction) {
        let interval = profile.interval();
        let factor = f64::from(self.scaled_size(max_distance)) / f64::from(HEIGHT_MAX);
        let copy = self.clone();
        let origin = self.rectangle.position;
        for (x, y) in cells(self.local_rect()) {
            let (along, across) = match direction {
                Direction::Horizontal => (y + origin.y, Direction::Horizontal),
                Direction::Vertical => (x + origin.x, Direction::Vertical),
            };
            if !interval.contains(along) {
                continue;
            }
            let offset = f64::from(profile.get(along - interval.start)) * factor;
            let value = match across {
                Direction::Horizontal => copy.sample_clamped(f64::from(x) - offset, f64::from(y)),
                Direction::Vertical => copy.sample_clamped(f64::from(x), f64::from(y) - offset),
            };
            self.set(x, y, value);
        }
    }

    /// Inverse-maps every sample of the logical `transformed` rectangle through `matrix` and
    /// samples the previous content. Samples mapping outside the old map become 0.
    pub fn transform(&mut self, matrix: &TransformationMatrix, transformed: Rectangle) {
        let inverse = matrix.inverse();
        let scale = self.scale;
        let old = std::mem::replace(self, HeightMap::new(transformed, 0, scale));
        if old.data.is_empty() {
            return;
        }
        let max_x = f64::from(old.width() - 1);
        let max_y = f64::from(old.height() - 1);
        for (x, y) in cells(self.local_rect()) {
            let lx = self.logical_x(f64::from(x));
            let ly = self.logical_y(f64::from(y));
            let (tx, ty) = inverse.apply(lx, ly);
            let sx = old.physical_coordinate(tx, Direction::Horizontal);
            let sy = old.physical_coordinate(ty, Direction::Vertical);
            if (0.0..=max_x).contains(&sx) && (0.0..=max_y).contains(&sy) {
                self.set(x, y, old.sample(sx, sy));
            }
        }
    }

    /// Remaps heights in `[min, max]` through `function`, spread over its logical `interval`.
    pub fn transform_heights(
        &mut self,
        function: &HeightProfile,
        interval: Interval,
        min: Height,
        max: Height,
    ) {
        let local = function.physical_interval(interval);
        if local.is_empty() || min > max {
            return;
        }
        let span = (i64::from(max) - i64::from(min)).max(1) as f64;
        let start = f64::from(local.start);
        let last = f64::from(local.length - 1);
        for h in &mut self.data {
            if *h >= min && *h <= max {
                let fraction = (i64::from(*h) - i64::from(min)) as f64 / span;
                *h = function.sample(start + fraction * last);
            }
        }
    }

    pub fn unify(&mut self, other: &HeightMap) {
        self.zip_with(other, |h, o| h.max(o));
    }
}

/// Lattice coordinates `X0..X3` around `coordinate` for the given wave length.
fn lattice_coordinates(coordinate: f64, wave_length: Size1D) -> [i64; 4] {
    let base = coordinate.floor() as i64;
    let x1 = previous_multiple_of_inclusive(base, wave_length);
    let x0 = previous_multiple_of_exclusive(x1, wave_length);
    let x2 = next_multiple_of_exclusive(base, wave_length);
    let x3 = next_multiple_of_exclusive(x2, wave_length);
    [x0, x1, x2, x3]
}

const OUT_LEFT: u8 = 1;
const OUT_RIGHT: u8 = 2;
const OUT_TOP: u8 = 4;
const OUT_BOTTOM: u8 = 8;

fn out_code(x: f64, y: f64, bounds: Rectangle) -> u8 {
    let end = bounds.ending_point();
    let mut code = 0;
    if x < f64::from(bounds.position.x) {
        code |= OUT_LEFT;
    } else if x >= f64::from(end.x) {
        code |= OUT_RIGHT;
    }
    if y < f64::from(bounds.position.y) {
        code |= OUT_TOP;
    } else if y >= f64::from(end.y) {
        code |= OUT_BOTTOM;
    }
    code
}

/// Cohen-Sutherland clipping of a segment against local `bounds` (origin at 0).
fn clip_line(
    mut sx: f64,
    mut sy: f64,
    mut ex: f64,
    mut ey: f64,
    bounds: Rectangle,
) -> Option<(f64, f64, f64, f64)> {
    if bounds.is_empty() {
        return None;
    }
    let last_x = f64::from(bounds.size.width - 1);
    let last_y = f64::from(bounds.size.height - 1);
    let mut code_start = out_code(sx, sy, bounds);
    let mut code_end = out_code(ex, ey, bounds);
    loop {
        if code_start | code_end == 0 {
            return Some((sx, sy, ex, ey));
        }
        if code_start & code_end != 0 {
            return None;
        }
        let out = if code_start != 0 { code_start } else { code_end };
        let (ix, iy) = if out & OUT_BOTTOM != 0 {
            (sx + (ex - sx) * (last_y - sy) / (ey - sy), last_y)
        } else if out & OUT_TOP != 0 {
            (sx + (ex - sx) * (0.0 - sy) / (ey - sy), 0.0)
        } else if out & OUT_RIGHT != 0 {
            (last_x, sy + (ey - sy) * (last_x - sx) / (ex - sx))
        } else {
            (0.0, sy + (ey - sy) * (0.0 - sx) / (ex - sx))
        };
        if out == code_start {
            sx = ix;
            sy = iy;
            code_start = out_code(sx, sy, bounds);
        } else {
            ex = ix;
            ey = iy;
            code_end = out_code(ex, ey, bounds);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/genlib/height_map.rs"]
mod tests;
