#![forbid(unsafe_code)]

//! Geometry primitives used by `narwhal`: points, rectangles, polylines, boundary curves,
//! compass directions, a shared tolerance policy and a generic bounding-box hierarchy.
//!
//! The y axis grows upward: `top` is the larger y coordinate of a rectangle and a clockwise
//! polygon has negative signed area.

pub mod curve;
pub mod direction;
pub mod epsilon;
pub mod polyline;
pub mod rect;
pub mod rect_tree;

pub use curve::Curve;
pub use direction::Directions;
pub use polyline::{PointLocation, Polyline, SegmentIntersection};
pub use rect::RectExt;
pub use rect_tree::{HitTestBehavior, RectangleNode, cross_rectangle_nodes};

pub type Unit = euclid::UnknownUnit;

pub type Point = euclid::Point2D<f64, Unit>;
pub type Vector = euclid::Vector2D<f64, Unit>;
pub type Rect = euclid::Box2D<f64, Unit>;

pub fn point(x: f64, y: f64) -> Point {
    euclid::point2(x, y)
}

pub fn vector(x: f64, y: f64) -> Vector {
    euclid::vec2(x, y)
}

/// Sum of the absolute coordinate differences.
pub fn manhattan_distance(a: Point, b: Point) -> f64 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Twice the signed area of the triangle `a, b, c`; negative for a clockwise turn.
pub fn cross(a: Point, b: Point, c: Point) -> f64 {
    (b - a).cross(c - a)
}

/// Intersection of the infinite lines through `a0, a1` and `b0, b1`.
pub fn line_line_intersection(a0: Point, a1: Point, b0: Point, b1: Point) -> Option<Point> {
    let da = a1 - a0;
    let db = b1 - b0;
    let denom = da.cross(db);
    if denom.abs() < epsilon::TOLERANCE * da.length().max(1.0) * db.length().max(1.0) {
        return None;
    }
    let t = (b0 - a0).cross(db) / denom;
    Some(a0 + da * t)
}

/// Closest point to `p` on the segment `a, b` and its parameter in `[0, 1]`.
pub fn closest_point_on_segment(a: Point, b: Point, p: Point) -> (f64, Point) {
    let d = b - a;
    let len2 = d.square_length();
    if len2 <= epsilon::SQUARE_OF_DISTANCE_EPSILON {
        return (0.0, a);
    }
    let t = ((p - a).dot(d) / len2).clamp(0.0, 1.0);
    (t, a + d * t)
}
