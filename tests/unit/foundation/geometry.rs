use super::*;

fn rect(x: i32, y: i32, w: u32, h: u32) -> Rectangle {
    Rectangle::new(Point::new(x, y), Size2D::new(w, h))
}

fn samples() -> Vec<Rectangle> {
    vec![
        rect(0, 0, 10, 10),
        rect(-5, 3, 4, 20),
        rect(7, -9, 1, 1),
        rect(100, 100, 3, 2),
        rect(-20, -20, 15, 15),
    ]
}

#[test]
fn combine_treats_empty_as_identity() {
    let empty = rect(1000, -1000, 0, 0);
    let thin = rect(50, 50, 12, 0);
    for r in samples() {
        assert_eq!(Rectangle::combine(r, empty), r);
        assert_eq!(Rectangle::combine(empty, r), r);
        assert_eq!(Rectangle::combine(r, thin), r);
    }
}

#[test]
fn combine_is_commutative_and_covers_both() {
    for a in samples() {
        for b in samples() {
            let c = Rectangle::combine(a, b);
            assert_eq!(c, Rectangle::combine(b, a));
            assert!(c.contains_rect(a));
            assert!(c.contains_rect(b));
        }
    }
}

#[test]
fn intersect_points_are_in_both_operands() {
    for a in samples() {
        for b in samples() {
            let i = Rectangle::intersect(a, b);
            for y in -30..40 {
                for x in -30..40 {
                    let p = Point::new(x, y);
                    if i.contains_point(p) {
                        assert!(a.contains_point(p) && b.contains_point(p));
                    }
                }
            }
        }
    }
}

#[test]
fn disjoint_intersection_is_empty() {
    let i = Rectangle::intersect(rect(0, 0, 5, 5), rect(10, 10, 5, 5));
    assert!(i.is_empty());
    assert_eq!(i.size, Size2D::new(0, 0));
}

#[test]
fn contains_point_is_half_open() {
    let r = rect(0, 0, 10, 10);
    assert!(r.contains_point(Point::new(0, 0)));
    assert!(r.contains_point(Point::new(9, 9)));
    assert!(!r.contains_point(Point::new(10, 5)));
    assert!(!r.contains_point(Point::new(5, 10)));
    assert!(!r.contains_point(Point::new(-1, 5)));
}

#[test]
fn from_points_is_inclusive() {
    let r = Rectangle::from_points(Point::new(4, 8), Point::new(1, 2));
    assert_eq!(r, rect(1, 2, 4, 7));
}

#[test]
fn expand_and_contract() {
    let r = rect(0, 0, 10, 4);
    assert_eq!(r.expand(2), rect(-2, -2, 14, 8));
    assert_eq!(r.expand_in(3, Direction::Horizontal), rect(-3, 0, 16, 4));
    assert_eq!(r.expand_in(3, Direction::Vertical), rect(0, -3, 10, 10));
    assert_eq!(r.contract(1), rect(1, 1, 8, 2));
    assert_eq!(r.contract(5).size, Size2D::new(0, 0));
    assert_eq!(r.contract_in(2, Direction::Horizontal), rect(2, 0, 6, 4));
}

#[test]
fn coordinate_arithmetic_does_not_wrap() {
    let r = Rectangle::MAX;
    assert_eq!(r.ending_point(), Point::new(COORDINATE_MAX, COORDINATE_MAX));
    let grown = rect(COORDINATE_MAX - 2, 0, 2, 2).expand(10);
    assert_eq!(grown.ending_point().x, COORDINATE_MAX);
    let p = Point::new(COORDINATE_MAX, 0) + Point::new(5, 0);
    assert_eq!(p.x, COORDINATE_MAX);
}

#[test]
fn scaling_covers_touched_samples() {
    assert_eq!(rect(0, 0, 10, 10).scaled(2.0), rect(0, 0, 20, 20));
    assert_eq!(rect(1, 1, 3, 3).scaled(0.5), rect(0, 0, 2, 2));
    assert_eq!(rect(-3, 0, 3, 1).scaled(0.5), rect(-2, 0, 2, 1));
    assert_eq!(Interval::new(5, 5).scaled(1.0), Interval::new(5, 5));
}

#[test]
fn interval_semantics_mirror_rectangles() {
    let a = Interval::new(0, 10);
    let b = Interval::new(5, 10);
    assert_eq!(Interval::combine(a, b), Interval::new(0, 15));
    assert_eq!(Interval::combine(a, Interval::new(99, 0)), a);
    assert_eq!(Interval::intersect(a, b), Interval::new(5, 5));
    assert!(Interval::intersect(a, Interval::new(20, 3)).is_empty());
    assert!(a.contains(9) && !a.contains(10));
    assert_eq!(Interval::from_coordinates(7, 3), Interval::new(3, 5));
}

#[test]
fn direction_numbers_round_trip() {
    assert_eq!(Direction::from_number(0), Some(Direction::Horizontal));
    assert_eq!(Direction::from_number(1), Some(Direction::Vertical));
    assert_eq!(Direction::from_number(2), None);
    assert_eq!(Direction::Vertical.as_number(), 1);
}
