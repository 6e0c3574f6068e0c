//! Tolerance policy shared by every geometric comparison in the workspace.
//!
//! Call sites pick one of two policies:
//! - *grow*: treat points within the epsilon of a border as touching it, so the tested region is
//!   slightly larger (used for "does this segment reach the obstacle" style queries);
//! - *shrink*: require points to be more than the epsilon inside, so the tested region is
//!   slightly smaller (used for "is this strictly inside an obstacle" queries).

use std::cmp::Ordering;

use crate::Point;

/// Digits kept when rounding coordinates.
pub const DISTANCE_EPSILON_PRECISION: i32 = 6;

/// Two coordinates closer than this are the same coordinate.
pub const DISTANCE_EPSILON: f64 = 1e-6;

pub const SQUARE_OF_DISTANCE_EPSILON: f64 = 1e-12;

/// Two intersection points closer than this are the same intersection.
pub const INTERSECTION_EPSILON: f64 = 1e-4;

/// Parameter tolerance for line/line intersections.
pub const TOLERANCE: f64 = 1e-8;

const ROUNDING_SCALE: f64 = 1e6;

pub fn round(value: f64) -> f64 {
    let r = (value * ROUNDING_SCALE).round() / ROUNDING_SCALE;
    // Normalize negative zero so hashing and formatting stay stable.
    if r == 0.0 { 0.0 } else { r }
}

pub fn round_point(p: Point) -> Point {
    crate::point(round(p.x), round(p.y))
}

/// Integer key of a point after rounding; equal keys mean equal rounded points.
pub fn point_key(p: Point) -> (i64, i64) {
    (
        (p.x * ROUNDING_SCALE).round() as i64,
        (p.y * ROUNDING_SCALE).round() as i64,
    )
}

pub fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= DISTANCE_EPSILON
}

pub fn close_within(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() <= epsilon
}

pub fn points_close(a: Point, b: Point) -> bool {
    (a - b).square_length() <= SQUARE_OF_DISTANCE_EPSILON
}

pub fn close_intersections(a: Point, b: Point) -> bool {
    (a - b).square_length() < INTERSECTION_EPSILON * INTERSECTION_EPSILON
}

/// Three-way comparison that treats values within [`DISTANCE_EPSILON`] as equal.
pub fn compare(a: f64, b: f64) -> Ordering {
    let d = a - b;
    if d < -DISTANCE_EPSILON {
        Ordering::Less
    } else if d > DISTANCE_EPSILON {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// Lexicographic (x, then y) comparison with the same tolerance as [`compare`].
pub fn compare_points(a: Point, b: Point) -> Ordering {
    compare(a.x, b.x).then_with(|| compare(a.y, b.y))
}

pub fn sign(value: f64) -> i32 {
    if value > DISTANCE_EPSILON {
        1
    } else if value < -DISTANCE_EPSILON {
        -1
    } else {
        0
    }
}

/// Scale factor for closeness tests against a side whose direction vector has the given
/// components along (`parallel`) and across (`perpendicular`) the probing axis.
///
/// Nearly parallel sides drift further per unit of rounding, so the tolerance grows with
/// their slope.
pub fn deviation_multiplier(parallel: f64, perpendicular: f64) -> f64 {
    let parallel = parallel.abs();
    let perpendicular = perpendicular.abs();
    if perpendicular != 0.0 && parallel > perpendicular {
        parallel / perpendicular
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_keeps_six_digits_and_drops_negative_zero() {
        assert_eq!(round(1.123_456_78), 1.123_457);
        assert_eq!(round(-0.000_000_1).to_bits(), 0.0f64.to_bits());
    }

    #[test]
    fn deviation_multiplier_only_grows_for_shallow_sides() {
        assert_eq!(deviation_multiplier(1.0, 1.0), 1.0);
        assert_eq!(deviation_multiplier(-4.0, 1.0), 4.0);
        assert_eq!(deviation_multiplier(4.0, 0.0), 1.0);
    }

    #[test]
    fn compare_treats_near_values_as_equal() {
        assert_eq!(compare(1.0, 1.0 + 1e-7), Ordering::Equal);
        assert_eq!(compare(1.0, 1.1), Ordering::Less);
        assert_eq!(sign(-1e-3), -1);
    }
}
