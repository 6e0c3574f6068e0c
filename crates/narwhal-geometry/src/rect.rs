use crate::epsilon::DISTANCE_EPSILON;
use crate::{Directions, Point, Rect, point};

/// Routing-oriented helpers on top of [`euclid::Box2D`].
///
/// `euclid`'s own `contains`/`intersects` are half-open and strict respectively; routing needs
/// closed rectangles where touching borders count.
pub trait RectExt: Sized {
    fn from_corners(a: Point, b: Point) -> Self;
    fn left(&self) -> f64;
    fn right(&self) -> f64;
    fn bottom(&self) -> f64;
    fn top(&self) -> f64;
    fn left_bottom(&self) -> Point;
    fn right_top(&self) -> Point;
    fn corners(&self) -> [Point; 4];
    fn padded(&self, padding: f64) -> Self;
    fn add_point(&self, p: Point) -> Self;
    /// Closed-rectangle containment (border points count).
    fn contains_point_inclusive(&self, p: Point) -> bool;
    /// Containment with a tolerance that grows the rectangle by `epsilon`.
    fn contains_point_within(&self, p: Point, epsilon: f64) -> bool;
    /// Strict interior containment, shrunk by the distance epsilon.
    fn contains_point_strictly(&self, p: Point) -> bool;
    fn contains_rect_inclusive(&self, other: &Self) -> bool;
    /// Closed-rectangle intersection (touching counts).
    fn intersects_inclusive(&self, other: &Self) -> bool;
    /// True when the interiors share positive area.
    fn interiors_intersect(&self, other: &Self) -> bool;
    /// Point where a ray from an interior point `p` in direction `dir` leaves the rectangle.
    fn border_point(&self, p: Point, dir: Directions) -> Point;
}

impl RectExt for Rect {
    fn from_corners(a: Point, b: Point) -> Self {
        Rect::new(point(a.x.min(b.x), a.y.min(b.y)), point(a.x.max(b.x), a.y.max(b.y)))
    }

    fn left(&self) -> f64 {
        self.min.x
    }

    fn right(&self) -> f64 {
        self.max.x
    }

    fn bottom(&self) -> f64 {
        self.min.y
    }

    fn top(&self) -> f64 {
        self.max.y
    }

    fn left_bottom(&self) -> Point {
        self.min
    }

    fn right_top(&self) -> Point {
        self.max
    }

    /// Clockwise from the left-bottom corner.
    fn corners(&self) -> [Point; 4] {
        [
            self.min,
            point(self.min.x, self.max.y),
            self.max,
            point(self.max.x, self.min.y),
        ]
    }

    fn padded(&self, padding: f64) -> Self {
        self.inflate(padding, padding)
    }

    fn add_point(&self, p: Point) -> Self {
        Rect::new(
            point(self.min.x.min(p.x), self.min.y.min(p.y)),
            point(self.max.x.max(p.x), self.max.y.max(p.y)),
        )
    }

    fn contains_point_inclusive(&self, p: Point) -> bool {
        self.contains_point_within(p, DISTANCE_EPSILON)
    }

    fn contains_point_within(&self, p: Point, epsilon: f64) -> bool {
        p.x >= self.min.x - epsilon
            && p.x <= self.max.x + epsilon
            && p.y >= self.min.y - epsilon
            && p.y <= self.max.y + epsilon
    }

    fn contains_point_strictly(&self, p: Point) -> bool {
        p.x > self.min.x + DISTANCE_EPSILON
            && p.x < self.max.x - DISTANCE_EPSILON
            && p.y > self.min.y + DISTANCE_EPSILON
            && p.y < self.max.y - DISTANCE_EPSILON
    }

    fn contains_rect_inclusive(&self, other: &Self) -> bool {
        self.contains_point_inclusive(other.min) && self.contains_point_inclusive(other.max)
    }

    fn intersects_inclusive(&self, other: &Self) -> bool {
        self.min.x <= other.max.x + DISTANCE_EPSILON
            && other.min.x <= self.max.x + DISTANCE_EPSILON
            && self.min.y <= other.max.y + DISTANCE_EPSILON
            && other.min.y <= self.max.y + DISTANCE_EPSILON
    }

    fn interiors_intersect(&self, other: &Self) -> bool {
        self.min.x < other.max.x - DISTANCE_EPSILON
            && other.min.x < self.max.x - DISTANCE_EPSILON
            && self.min.y < other.max.y - DISTANCE_EPSILON
            && other.min.y < self.max.y - DISTANCE_EPSILON
    }

    fn border_point(&self, p: Point, dir: Directions) -> Point {
        match dir {
            Directions::NORTH => point(p.x, self.max.y),
            Directions::SOUTH => point(p.x, self.min.y),
            Directions::EAST => point(self.max.x, p.y),
            Directions::WEST => point(self.min.x, p.y),
            _ => p,
        }
    }
}
