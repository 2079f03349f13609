use super::*;

fn rect(x: Coordinate, y: Coordinate, w: Size1D, h: Size1D) -> Rectangle {
    Rectangle::new(Point::new(x, y), Size2D::new(w, h))
}

fn row(map: &HeightMap, y: Coordinate) -> Vec<Height> {
    (0..map.width() as Coordinate).map(|x| map.get(x, y)).collect()
}

#[test]
fn blur_keeps_flat_maps_flat() {
    for radius in [0, 1, 3, 20] {
        let mut map = HeightMap::new(rect(-3, 2, 7, 5), 1000, 1.0);
        map.blur(radius);
        assert!(map.heights().iter().all(|&h| h == 1000), "radius {radius}");
    }
}

#[test]
fn noise_layer_is_deterministic_per_seed_step() {
    let area = rect(-8, -8, 16, 16);
    let mut a = HeightMap::new(area, 0, 1.0);
    let mut b = HeightMap::new(area, 0, 1.0);
    let mut c = HeightMap::new(area, 0, 1.0);
    a.noise_layer(4, 1000, 42, 0, false);
    b.noise_layer(4, 1000, 42, 0, false);
    c.noise_layer(4, 1000, 42, 1, false);
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn noise_is_stable_under_cropping() {
    let mut whole = HeightMap::new(rect(0, 0, 32, 32), 0, 1.0);
    let mut part = HeightMap::new(rect(8, 8, 8, 8), 0, 1.0);
    whole.noise_layer(8, 5000, 7, 3, false);
    part.noise_layer(8, 5000, 7, 3, false);
    for (x, y) in cells(rect(0, 0, 8, 8)) {
        assert_eq!(part.get(x, y), whole.get(x + 8, y + 8));
    }
}

#[test]
fn ridged_single_sample_noise_is_non_negative() {
    let mut map = HeightMap::new(rect(0, 0, 10, 10), 0, 1.0);
    map.noise_layer(1, 2000, 3, 0, true);
    assert!(map.heights().iter().all(|&h| (0..=2000).contains(&h)));
}

#[test]
fn zero_wave_length_adds_nothing() {
    let mut map = HeightMap::new(rect(0, 0, 4, 4), 17, 1.0);
    map.noise_layer(0, 2000, 3, 0, false);
    assert!(map.heights().iter().all(|&h| h == 17));
}

#[test]
fn cutout_zero_fills_outside_the_source() {
    let source = HeightMap::new(rect(0, 0, 4, 4), 5, 1.0);
    let cut = HeightMap::cutout(&source, rect(2, 2, 4, 4));
    assert_eq!(cut.rectangle(), rect(2, 2, 4, 4));
    assert_eq!(cut.get(0, 0), 5);
    assert_eq!(cut.get(1, 1), 5);
    assert_eq!(cut.get(2, 2), 0);
    assert_eq!(cut.get(3, 0), 0);
}

#[test]
fn checked_accessors_reject_outside_samples() {
    let mut map = HeightMap::new(rect(10, 10, 2, 2), 1, 1.0);
    assert_eq!(map.try_get(1, 1), Some(1));
    assert_eq!(map.try_get(2, 0), None);
    assert_eq!(map.try_get(-1, 0), None);
    assert!(!map.try_set(0, 2, 9));
    assert!(map.try_set(0, 1, 9));
    assert_eq!(map.get(0, 1), 9);
}

#[test]
fn distance_map_grows_away_from_low_ground() {
    let mut map = HeightMap::new(rect(0, 0, 5, 1), 100, 1.0);
    map.set(0, 0, 0);
    map.distance_map(4);
    let values = row(&map, 0);
    assert_eq!(values[0], 0);
    assert_eq!(values[4], HEIGHT_MAX);
    assert!(values.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn horizontal_line_fills_one_row() {
    let mut map = HeightMap::new(rect(0, 0, 5, 5), 0, 1.0);
    map.draw_line(Point::new(4, 2), Point::new(0, 2), 7);
    assert_eq!(row(&map, 2), vec![7; 5]);
    assert_eq!(row(&map, 1), vec![0; 5]);
    assert_eq!(row(&map, 3), vec![0; 5]);
}

#[test]
fn lines_outside_the_map_are_clipped_away() {
    let mut map = HeightMap::new(rect(0, 0, 5, 5), 0, 1.0);
    map.draw_line(Point::new(10, 10), Point::new(20, 12), 7);
    assert!(map.heights().iter().all(|&h| h == 0));
}

#[test]
fn gradient_interpolates_and_clamps_to_endpoints() {
    let mut map = HeightMap::new(rect(-2, 0, 9, 1), 0, 1.0);
    map.gradient(Point::new(0, 0), Point::new(4, 0), 0, 400);
    assert_eq!(row(&map, 0), vec![0, 0, 0, 100, 200, 300, 400, 400, 400]);
}

#[test]
fn degenerate_gradient_fills_with_the_start_height() {
    let mut map = HeightMap::new(rect(0, 0, 3, 3), 9, 1.0);
    map.gradient(Point::new(1, 1), Point::new(1, 1), 50, 400);
    assert!(map.heights().iter().all(|&h| h == 50));
}

#[test]
fn identity_transform_keeps_samples() {
    let mut map = HeightMap::new(rect(0, 0, 4, 3), 0, 1.0);
    map.gradient(Point::new(0, 0), Point::new(3, 0), 0, 300);
    let before = map.clone();
    map.transform(&TransformationMatrix::identity(), rect(0, 0, 4, 3));
    assert_eq!(map, before);
}

#[test]
fn rescale_stretches_the_footprint_and_keeps_corners() {
    let mut map = HeightMap::new(rect(0, 0, 2, 2), 0, 1.0);
    map.set(1, 1, 1000);
    map.rescale(2.0, 2.0);
    assert_eq!(map.rectangle(), rect(0, 0, 4, 4));
    assert_eq!(map.get(0, 0), 0);
    assert_eq!(map.get(3, 3), 1000);
}

#[test]
fn combine_uses_the_mask_as_weight() {
    let area = rect(0, 0, 2, 1);
    let mut this = HeightMap::new(area, 1000, 1.0);
    let other = HeightMap::new(area, -1000, 1.0);
    let mut mask = HeightMap::new(area, HEIGHT_MAX, 1.0);
    mask.set(1, 0, -5);
    this.combine(&other, &mask);
    assert_eq!(row(&this, 0), vec![1000, -1000]);
}

#[test]
fn add_saturates() {
    let mut map = HeightMap::new(rect(0, 0, 2, 1), 20000, 1.0);
    map.add(20000);
    assert_eq!(row(&map, 0), vec![HEIGHT_MAX; 2]);
    map.add(-1);
    assert_eq!(row(&map, 0), vec![HEIGHT_MAX - 1; 2]);
}

#[test]
fn masked_ops_only_touch_the_overlap() {
    let mut map = HeightMap::new(rect(0, 0, 4, 1), 0, 1.0);
    let mask = HeightMap::new(rect(2, 0, 4, 1), HEIGHT_MAX, 1.0);
    map.add_masked(100, &mask);
    assert_eq!(row(&map, 0), vec![0, 0, 100, 100]);
}

#[test]
fn horizontal_projection_runs_down_the_rows() {
    let mut profile = HeightProfile::new(Interval::new(0, 3), 0, 1.0);
    profile.set(0, 10);
    profile.set(1, 20);
    profile.set(2, 30);
    let mut map = HeightMap::new(rect(0, 0, 2, 4), -1, 1.0);
    map.projection(&profile, Direction::Horizontal);
    assert_eq!(row(&map, 0), vec![10, 10]);
    assert_eq!(row(&map, 2), vec![30, 30]);
    assert_eq!(row(&map, 3), vec![-1, -1]);
}

#[test]
fn pattern_repeats_the_source_tile() {
    let mut tile = HeightMap::new(rect(0, 0, 2, 1), 0, 1.0);
    tile.set(1, 0, 9);
    let mut map = HeightMap::new(rect(-1, 0, 5, 1), 0, 1.0);
    map.pattern(&tile, rect(0, 0, 2, 1));
    assert_eq!(row(&map, 0), vec![9, 0, 9, 0, 9]);
}

#[test]
fn move_translates_the_footprint_by_scaled_offset() {
    let mut map = HeightMap::new(rect(0, 0, 2, 2), 1, 2.0);
    map.move_by(Point::new(3, -1));
    assert_eq!(map.rectangle().position, Point::new(3, -1));
    assert_eq!(map.raster_rectangle().position, Point::new(6, -2));
}

#[test]
fn scaled_maps_report_the_logical_rectangle() {
    let map = HeightMap::new(rect(1, 2, 5, 3), 7, 2.0);
    assert_eq!(map.rectangle(), rect(1, 2, 5, 3));
    assert_eq!(map.raster_rectangle(), rect(2, 4, 10, 6));
    assert_eq!(map.heights().len(), 60);

    let cut = HeightMap::cutout(&map, rect(0, 2, 3, 1));
    assert_eq!(cut.rectangle(), rect(0, 2, 3, 1));
    assert_eq!(cut.raster_rectangle(), rect(0, 4, 6, 2));
    assert_eq!(row(&cut, 0), vec![0, 0, 7, 7, 7, 7]);
}

#[test]
fn rescale_scales_both_rectangles() {
    let mut map = HeightMap::new(rect(2, 0, 3, 2), 0, 2.0);
    map.rescale(2.0, 1.0);
    assert_eq!(map.rectangle(), rect(4, 0, 6, 2));
    assert_eq!(map.raster_rectangle(), rect(8, 0, 12, 4));
}

#[test]
fn transform_heights_maps_the_range_through_the_function() {
    let mut function = HeightProfile::new(Interval::new(0, 2), 0, 1.0);
    function.set(0, 500);
    function.set(1, 700);
    let mut map = HeightMap::new(rect(0, 0, 3, 1), 0, 1.0);
    map.set(1, 0, 100);
    map.set(2, 0, 200);
    map.transform_heights(&function, Interval::new(0, 2), 100, 200);
    assert_eq!(row(&map, 0), vec![0, 500, 700]);
}

#[test]
fn logical_memory_size_accounts_for_scale() {
    let small = HeightMap::memory_size(rect(0, 0, 10, 10), 1.0);
    let large = HeightMap::memory_size(rect(0, 0, 10, 10), 2.0);
    assert_eq!(large - small, 2 * 300);
}
