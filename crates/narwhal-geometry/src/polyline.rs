use crate::epsilon::{self, DISTANCE_EPSILON, INTERSECTION_EPSILON, SQUARE_OF_DISTANCE_EPSILON};
use crate::{Point, Rect, RectExt, Vector, closest_point_on_segment, cross, line_line_intersection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointLocation {
    Outside,
    Boundary,
    Inside,
}

/// One crossing of a query segment with a polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentIntersection {
    pub point: Point,
    /// Position along the query segment, in `[0, 1]`.
    pub segment_param: f64,
    /// Position along the polyline: side index plus the fraction along that side.
    pub polyline_param: f64,
}

/// A sequence of points, optionally closed into a polygon.
///
/// Closed polylines produced by this crate are clockwise (negative signed area).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polyline {
    points: Vec<Point>,
    closed: bool,
}

impl Polyline {
    pub fn new(points: Vec<Point>, closed: bool) -> Self {
        Self { points, closed }
    }

    pub fn closed(points: Vec<Point>) -> Self {
        Self::new(points, true)
    }

    pub fn open(points: Vec<Point>) -> Self {
        Self::new(points, false)
    }

    /// Clockwise polygon of a rectangle, starting at its left-bottom corner.
    pub fn from_rect(rect: &Rect) -> Self {
        Self::closed(rect.corners().to_vec())
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn start(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<Point> {
        self.points.last().copied()
    }

    pub fn bounding_box(&self) -> Rect {
        let Some(first) = self.points.first() else {
            return Rect::zero();
        };
        self.points[1..]
            .iter()
            .fold(Rect::new(*first, *first), |r, p| r.add_point(*p))
    }

    pub fn segment_count(&self) -> usize {
        match self.points.len() {
            0 | 1 => 0,
            n if self.closed => n,
            n => n - 1,
        }
    }

    pub fn segment(&self, i: usize) -> (Point, Point) {
        let n = self.points.len();
        (self.points[i], self.points[(i + 1) % n])
    }

    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        (0..self.segment_count()).map(|i| self.segment(i))
    }

    /// Positive for counterclockwise polygons.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            sum += a.x * b.y - b.x * a.y;
        }
        sum / 2.0
    }

    pub fn is_clockwise(&self) -> bool {
        self.signed_area() < 0.0
    }

    pub fn make_clockwise(&mut self) {
        if self.signed_area() > 0.0 {
            self.points.reverse();
        }
    }

    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| (b - a).length()).sum()
    }

    pub fn translate(&mut self, delta: Vector) {
        for p in &mut self.points {
            *p += delta;
        }
    }

    /// Point at a parameter in `[0, segment_count]`.
    pub fn point_at(&self, param: f64) -> Point {
        let count = self.segment_count();
        if count == 0 {
            return self.points.first().copied().unwrap_or(Point::origin());
        }
        let i = (param.floor().max(0.0) as usize).min(count - 1);
        let frac = (param - i as f64).clamp(0.0, 1.0);
        let (a, b) = self.segment(i);
        a + (b - a) * frac
    }

    /// Direction of the side containing `param`.
    pub fn derivative(&self, param: f64) -> Vector {
        let count = self.segment_count();
        if count == 0 {
            return Vector::zero();
        }
        let i = (param.floor().max(0.0) as usize).min(count - 1);
        let (a, b) = self.segment(i);
        b - a
    }

    /// Parameter and position of the boundary point closest to `p`.
    pub fn closest_point(&self, p: Point) -> (f64, Point) {
        let mut best = (0.0, self.points.first().copied().unwrap_or(p));
        let mut best_d2 = f64::INFINITY;
        for (i, (a, b)) in self.segments().enumerate() {
            let (t, q) = closest_point_on_segment(a, b, p);
            let d2 = (q - p).square_length();
            if d2 < best_d2 {
                best_d2 = d2;
                best = (i as f64 + t, q);
            }
        }
        best
    }

    pub fn distance_to_boundary(&self, p: Point) -> f64 {
        let (_, q) = self.closest_point(p);
        (q - p).length()
    }

    /// Classifies `p`; points within `epsilon` of a side are on the boundary.
    pub fn location_within(&self, p: Point, epsilon: f64) -> PointLocation {
        if self.points.is_empty() {
            return PointLocation::Outside;
        }
        if self.distance_to_boundary(p) <= epsilon {
            return PointLocation::Boundary;
        }
        if !self.closed || self.points.len() < 3 {
            return PointLocation::Outside;
        }
        let mut inside = false;
        let n = self.points.len();
        let mut j = n - 1;
        for i in 0..n {
            let pi = self.points[i];
            let pj = self.points[j];
            if (pi.y > p.y) != (pj.y > p.y) {
                let x = pj.x + (p.y - pj.y) * (pi.x - pj.x) / (pi.y - pj.y);
                if p.x < x {
                    inside = !inside;
                }
            }
            j = i;
        }
        if inside {
            PointLocation::Inside
        } else {
            PointLocation::Outside
        }
    }

    pub fn location(&self, p: Point) -> PointLocation {
        self.location_within(p, DISTANCE_EPSILON)
    }

    /// Shrink policy: border points are not inside.
    pub fn contains_strictly(&self, p: Point) -> bool {
        self.bounding_box().contains_point_inclusive(p)
            && self.location(p) == PointLocation::Inside
    }

    /// Grow policy: border points are inside.
    pub fn contains_inclusive(&self, p: Point) -> bool {
        self.bounding_box().contains_point_inclusive(p)
            && self.location(p) != PointLocation::Outside
    }

    /// All crossings of the segment `a, b` with this polyline, sorted along the segment.
    ///
    /// Collinear overlaps report both ends of the overlap. Crossings closer than
    /// [`INTERSECTION_EPSILON`] are merged.
    pub fn intersect_segment(&self, a: Point, b: Point) -> Vec<SegmentIntersection> {
        let mut out = Vec::new();
        let d = b - a;
        let d_len = d.length();
        if d_len <= DISTANCE_EPSILON {
            return out;
        }
        let seg_box = Rect::from_corners(a, b).padded(INTERSECTION_EPSILON);
        if !seg_box.intersects_inclusive(&self.bounding_box()) {
            return out;
        }
        for (i, (p, q)) in self.segments().enumerate() {
            let e = q - p;
            let e_len = e.length();
            if e_len <= DISTANCE_EPSILON {
                continue;
            }
            if !seg_box.intersects_inclusive(&Rect::from_corners(p, q)) {
                continue;
            }
            let denom = d.cross(e);
            if denom.abs() <= epsilon::TOLERANCE * d_len * e_len {
                // Parallel; only collinear overlaps count.
                if ((p - a).cross(d) / d_len).abs() > INTERSECTION_EPSILON {
                    continue;
                }
                let tp = (p - a).dot(d) / (d_len * d_len);
                let tq = (q - a).dot(d) / (d_len * d_len);
                let slack = INTERSECTION_EPSILON / d_len;
                let lo = tp.min(tq).max(0.0);
                let hi = tp.max(tq).min(1.0);
                if lo > hi + slack {
                    continue;
                }
                for t in [lo, hi.max(lo)] {
                    let pt = a + d * t;
                    let (u, _) = closest_point_on_segment(p, q, pt);
                    out.push(SegmentIntersection {
                        point: pt,
                        segment_param: t,
                        polyline_param: i as f64 + u,
                    });
                }
                continue;
            }
            let t = (p - a).cross(e) / denom;
            let u = (p - a).cross(d) / denom;
            let t_slack = INTERSECTION_EPSILON / d_len;
            let u_slack = INTERSECTION_EPSILON / e_len;
            if t < -t_slack || t > 1.0 + t_slack || u < -u_slack || u > 1.0 + u_slack {
                continue;
            }
            let t = t.clamp(0.0, 1.0);
            let u = u.clamp(0.0, 1.0);
            out.push(SegmentIntersection {
                point: p + e * u,
                segment_param: t,
                polyline_param: i as f64 + u,
            });
        }
        out.sort_by(|x, y| x.segment_param.total_cmp(&y.segment_param));
        out.dedup_by(|later, earlier| epsilon::close_intersections(later.point, earlier.point));
        out
    }

    /// True when the boundaries touch or cross.
    pub fn boundary_intersects(&self, other: &Polyline) -> bool {
        if !self
            .bounding_box()
            .intersects_inclusive(&other.bounding_box())
        {
            return false;
        }
        self.segments()
            .any(|(a, b)| !other.intersect_segment(a, b).is_empty())
    }

    pub fn is_convex(&self) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut sign = 0;
        for i in 0..n {
            let c = cross(self.points[i], self.points[(i + 1) % n], self.points[(i + 2) % n]);
            let s = epsilon::sign(c);
            if s == 0 {
                continue;
            }
            if sign == 0 {
                sign = s;
            } else if sign != s {
                return false;
            }
        }
        true
    }

    /// Four sides, each horizontal or vertical.
    pub fn is_axis_aligned_rectangle(&self) -> bool {
        if !self.closed || self.points.len() != 4 {
            return false;
        }
        self.segments().all(|(a, b)| {
            (epsilon::close(a.x, b.x) && !epsilon::close(a.y, b.y))
                || (epsilon::close(a.y, b.y) && !epsilon::close(a.x, b.x))
        })
    }

    /// Rounds every vertex and drops repeated and collinear vertices.
    pub fn rounded_and_simplified(&self) -> Polyline {
        let mut pts: Vec<Point> = self.points.iter().map(|p| epsilon::round_point(*p)).collect();
        pts.dedup_by(|a, b| epsilon::points_close(*a, *b));
        if self.closed && pts.len() > 1 && epsilon::points_close(pts[0], pts[pts.len() - 1]) {
            pts.pop();
        }
        loop {
            let n = pts.len();
            if n < 3 {
                break;
            }
            let last = if self.closed { n } else { n - 1 };
            let first = if self.closed { 0 } else { 1 };
            let redundant = (first..last).find(|&i| {
                let prev = pts[(i + n - 1) % n];
                let next = pts[(i + 1) % n];
                is_collinear_vertex(prev, pts[i], next)
            });
            match redundant {
                Some(i) => {
                    pts.remove(i);
                }
                None => break,
            }
        }
        Polyline::new(pts, self.closed)
    }

    /// Offsets a convex polygon outward by `padding`; corners sharper than a right angle are
    /// bevelled so no vertex ends up further than needed from the original shape.
    pub fn pad_convex(&self, padding: f64) -> Polyline {
        let mut src = self.clone();
        src.make_clockwise();
        let n = src.points.len();
        if n < 3 || padding <= 0.0 {
            return src;
        }
        let pts = &src.points;
        let mut out = Vec::with_capacity(n * 2);
        for i in 0..n {
            let prev = pts[(i + n - 1) % n];
            let v = pts[i];
            let next = pts[(i + 1) % n];
            let n1 = outward_normal(prev, v);
            let n2 = outward_normal(v, next);
            let l1 = (prev + n1 * padding, v + n1 * padding);
            let l2 = (v + n2 * padding, next + n2 * padding);
            let Some(miter) = line_line_intersection(l1.0, l1.1, l2.0, l2.1) else {
                out.push(v + n1 * padding);
                continue;
            };
            let max_miter = padding * std::f64::consts::SQRT_2 * (1.0 + 1e-9) + DISTANCE_EPSILON;
            if (miter - v).length() <= max_miter {
                out.push(miter);
                continue;
            }
            let bisector = n1 + n2;
            if bisector.square_length() <= SQUARE_OF_DISTANCE_EPSILON {
                out.push(miter);
                continue;
            }
            let b = bisector.normalize();
            let t0 = v + b * padding;
            let t1 = t0 + Vector::new(-b.y, b.x);
            match (
                line_line_intersection(l1.0, l1.1, t0, t1),
                line_line_intersection(t0, t1, l2.0, l2.1),
            ) {
                (Some(c0), Some(c1)) => {
                    out.push(c0);
                    out.push(c1);
                }
                _ => out.push(miter),
            }
        }
        Polyline::closed(out)
    }

    /// Clockwise convex hull of `points` (monotone chain); collinear points are dropped.
    pub fn convex_hull(points: impl IntoIterator<Item = Point>) -> Polyline {
        let mut pts: Vec<Point> = points.into_iter().collect();
        pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        pts.dedup_by(|a, b| epsilon::points_close(*a, *b));
        if pts.len() < 3 {
            return Polyline::closed(pts);
        }
        let mut lower: Vec<Point> = Vec::new();
        for p in &pts {
            while lower.len() >= 2
                && cross(lower[lower.len() - 2], lower[lower.len() - 1], *p) <= 0.0
            {
                lower.pop();
            }
            lower.push(*p);
        }
        let mut upper: Vec<Point> = Vec::new();
        for p in pts.iter().rev() {
            while upper.len() >= 2
                && cross(upper[upper.len() - 2], upper[upper.len() - 1], *p) <= 0.0
            {
                upper.pop();
            }
            upper.push(*p);
        }
        lower.pop();
        upper.pop();
        lower.extend(upper);
        // Monotone chain yields counterclockwise order.
        lower.reverse();
        Polyline::closed(lower)
    }
}

fn outward_normal(a: Point, b: Point) -> Vector {
    let d = b - a;
    let len = d.length();
    if len <= DISTANCE_EPSILON {
        return Vector::zero();
    }
    // Left normal; outward for clockwise polygons.
    Vector::new(-d.y / len, d.x / len)
}

fn is_collinear_vertex(prev: Point, v: Point, next: Point) -> bool {
    let base = (next - prev).length();
    if base <= DISTANCE_EPSILON {
        return false;
    }
    let height = cross(prev, v, next).abs() / base;
    if height > DISTANCE_EPSILON {
        return false;
    }
    // Only a vertex lying between its neighbours is redundant.
    (v - prev).dot(next - prev) >= 0.0 && (v - next).dot(prev - next) >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point;

    #[test]
    fn collinear_vertices_are_removed() {
        let p = Polyline::closed(vec![
            point(0.0, 0.0),
            point(0.0, 5.0),
            point(0.0, 10.0),
            point(10.0, 10.0),
            point(10.0, 0.0),
        ]);
        let s = p.rounded_and_simplified();
        assert_eq!(s.len(), 4);
        assert!(s.is_axis_aligned_rectangle());
    }

    #[test]
    fn padding_a_square_keeps_it_axis_aligned() {
        let p = Polyline::from_rect(&Rect::new(point(0.0, 0.0), point(10.0, 10.0)));
        let padded = p.pad_convex(2.0).rounded_and_simplified();
        assert!(padded.is_axis_aligned_rectangle());
        assert_eq!(
            padded.bounding_box(),
            Rect::new(point(-2.0, -2.0), point(12.0, 12.0))
        );
    }
}
