use super::*;
use crate::foundation::geometry::Size2D;

fn profile(start: Coordinate, heights: &[Height]) -> HeightProfile {
    let mut p = HeightProfile::new(Interval::new(start, heights.len() as Size1D), 0, 1.0);
    for (i, &h) in heights.iter().enumerate() {
        p.set(i as Coordinate, h);
    }
    p
}

#[test]
fn blur_keeps_flat_profiles_flat() {
    let mut p = HeightProfile::new(Interval::new(-5, 11), -300, 1.0);
    p.blur(4);
    assert!(p.heights().iter().all(|&h| h == -300));
}

#[test]
fn sample_interpolates_and_clamps() {
    let p = profile(0, &[0, 100]);
    assert_eq!(p.sample(0.5), 50);
    assert_eq!(p.sample(-3.0), 0);
    assert_eq!(p.sample(7.0), 100);
}

#[test]
fn flip_mirrors_around_zero() {
    let mut p = profile(2, &[1, 2, 3]);
    p.flip();
    assert_eq!(p.interval(), Interval::new(-5, 3));
    assert_eq!(p.heights(), &[3, 2, 1]);
}

#[test]
fn from_array_interpolates_between_keys_and_extends_ends() {
    let mut p = HeightProfile::new(Interval::new(-2, 9), 0, 1.0);
    let keys = BTreeMap::from([(0, 0), (4, 400)]);
    p.from_array(&keys);
    assert_eq!(p.heights(), &[0, 0, 0, 100, 200, 300, 400, 400, 400]);
}

#[test]
fn gradient_fill_outside_controls_the_tails() {
    let mut filled = HeightProfile::new(Interval::new(0, 6), 7, 1.0);
    filled.gradient(1, 3, 0, 200, true);
    assert_eq!(filled.heights(), &[0, 0, 100, 200, 200, 200]);

    let mut kept = HeightProfile::new(Interval::new(0, 6), 7, 1.0);
    kept.gradient(1, 3, 0, 200, false);
    assert_eq!(kept.heights(), &[7, 0, 100, 200, 7, 7]);
}

#[test]
fn noise_layer_depends_only_on_seed_and_step() {
    let mut a = HeightProfile::new(Interval::new(-10, 40), 0, 1.0);
    let mut b = a.clone();
    let mut c = a.clone();
    a.noise_layer(8, 3000, 11, 2);
    b.noise_layer(8, 3000, 11, 2);
    c.noise_layer(8, 3000, 11, 3);
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn noise_replaces_previous_content() {
    let layers = NoiseLayers::with_persistence(4, 0.5);
    let mut a = HeightProfile::new(Interval::new(0, 16), 1234, 1.0);
    let mut b = HeightProfile::new(Interval::new(0, 16), -50, 1.0);
    a.noise(&layers, 5);
    b.noise(&layers, 5);
    assert_eq!(a, b);
}

#[test]
fn add_profile_only_touches_the_overlap() {
    let mut p = profile(0, &[10, 10, 10]);
    p.add_profile(&profile(1, &[5, 5, 5]));
    assert_eq!(p.heights(), &[10, 15, 15]);
}

#[test]
fn crop_and_fill_use_logical_intervals() {
    let mut p = profile(0, &[1, 2, 3, 4, 5]);
    p.crop(Interval::new(1, 3), 0);
    assert_eq!(p.heights(), &[0, 2, 3, 4, 0]);
    p.fill_interval(Interval::new(3, 10), 9);
    assert_eq!(p.heights(), &[0, 2, 3, 9, 9]);
}

#[test]
fn pattern_wraps_negative_coordinates() {
    let tile = profile(0, &[1, 2, 3]);
    let mut p = HeightProfile::new(Interval::new(-2, 5), 0, 1.0);
    p.pattern(&tile, Interval::new(0, 3));
    assert_eq!(p.heights(), &[2, 3, 1, 2, 3]);
}

#[test]
fn rescale_keeps_both_ends() {
    let mut p = profile(0, &[0, 100, 200, 300, 400]);
    p.rescale(0.5);
    assert_eq!(p.interval(), Interval::new(0, 2));
    assert_eq!(p.heights(), &[0, 400]);
}

#[test]
fn resize_keeps_overlap_and_fills_the_rest() {
    let mut p = profile(0, &[1, 2, 3]);
    p.resize(Interval::new(1, 4), -1);
    assert_eq!(p.heights(), &[2, 3, -1, -1]);
}

#[test]
fn slice_reads_rows_and_columns() {
    let mut map = HeightMap::new(Rectangle::new(Point::new(0, 0), Size2D::new(3, 2)), 0, 1.0);
    map.set(0, 1, 10);
    map.set(1, 1, 20);
    map.set(2, 1, 30);
    map.set(1, 0, 5);

    let mut along_x = HeightProfile::new(Interval::new(0, 4), -1, 1.0);
    along_x.slice(&map, Direction::Horizontal, 1);
    assert_eq!(along_x.heights(), &[10, 20, 30, -1]);

    let mut along_y = HeightProfile::new(Interval::new(0, 2), -1, 1.0);
    along_y.slice(&map, Direction::Vertical, 1);
    assert_eq!(along_y.heights(), &[5, 20]);

    let mut missed = HeightProfile::new(Interval::new(0, 2), -1, 1.0);
    missed.slice(&map, Direction::Horizontal, 7);
    assert_eq!(missed.heights(), &[-1, -1]);
}

#[test]
fn invert_and_abs_saturate() {
    let mut p = profile(0, &[HEIGHT_MIN, -3, 4]);
    p.invert();
    assert_eq!(p.heights(), &[HEIGHT_MAX, 3, -4]);
    p.abs();
    assert_eq!(p.heights(), &[HEIGHT_MAX, 3, 4]);
}
