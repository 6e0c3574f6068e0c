use std::f64::consts::{FRAC_PI_2, PI, TAU};

use crate::{Point, Polyline, Rect, RectExt, Vector, point};

/// Segments used when a curve is sampled for boundary parameters.
const PARAMETER_SEGMENTS: usize = 64;

/// Closed boundary curve of a shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Curve {
    Rectangle(Rect),
    RoundedRect {
        rect: Rect,
        radius_x: f64,
        radius_y: f64,
    },
    Ellipse {
        center: Point,
        radius_x: f64,
        radius_y: f64,
    },
    Polygon(Polyline),
}

impl Curve {
    /// Axis-aligned rectangle of the given size centered on `center`.
    pub fn rectangle_centered(center: Point, width: f64, height: f64) -> Self {
        let half = Vector::new(width / 2.0, height / 2.0);
        Self::Rectangle(Rect::new(center - half, center + half))
    }

    pub fn rounded_rectangle_centered(
        center: Point,
        width: f64,
        height: f64,
        radius_x: f64,
        radius_y: f64,
    ) -> Self {
        let half = Vector::new(width / 2.0, height / 2.0);
        Self::RoundedRect {
            rect: Rect::new(center - half, center + half),
            radius_x: radius_x.min(width / 2.0).max(0.0),
            radius_y: radius_y.min(height / 2.0).max(0.0),
        }
    }

    pub fn ellipse(center: Point, radius_x: f64, radius_y: f64) -> Self {
        Self::Ellipse {
            center,
            radius_x,
            radius_y,
        }
    }

    pub fn polygon(points: Vec<Point>) -> Self {
        let mut p = Polyline::closed(points);
        p.make_clockwise();
        Self::Polygon(p)
    }

    pub fn bounding_box(&self) -> Rect {
        match self {
            Self::Rectangle(r) | Self::RoundedRect { rect: r, .. } => *r,
            Self::Ellipse {
                center,
                radius_x,
                radius_y,
            } => {
                let half = Vector::new(radius_x.abs(), radius_y.abs());
                Rect::new(*center - half, *center + half)
            }
            Self::Polygon(p) => p.bounding_box(),
        }
    }

    pub fn center(&self) -> Point {
        match self {
            Self::Ellipse { center, .. } => *center,
            _ => self.bounding_box().center(),
        }
    }

    pub fn translate(&mut self, delta: Vector) {
        match self {
            Self::Rectangle(r) | Self::RoundedRect { rect: r, .. } => *r = r.translate(delta),
            Self::Ellipse { center, .. } => *center += delta,
            Self::Polygon(p) => p.translate(delta),
        }
    }

    /// Whether the boundary is exactly an axis-aligned rectangle.
    pub fn is_rectangle(&self) -> bool {
        match self {
            Self::Rectangle(_) => true,
            Self::RoundedRect {
                radius_x, radius_y, ..
            } => *radius_x <= 0.0 || *radius_y <= 0.0,
            Self::Ellipse { .. } => false,
            Self::Polygon(p) => p.rounded_and_simplified().is_axis_aligned_rectangle(),
        }
    }

    /// Clockwise polygon through points of the curve (inscribed for curved parts).
    pub fn approximate(&self, segments: usize) -> Polyline {
        let segments = segments.max(4);
        match self {
            Self::Rectangle(r) => Polyline::from_rect(r),
            Self::RoundedRect {
                rect,
                radius_x,
                radius_y,
            } => rounded_rect_points(rect, *radius_x, *radius_y, segments, false),
            Self::Ellipse {
                center,
                radius_x,
                radius_y,
            } => ellipse_points(*center, *radius_x, *radius_y, segments, 1.0),
            Self::Polygon(p) => {
                let mut p = p.clone();
                p.make_clockwise();
                p
            }
        }
    }

    /// Clockwise convex polygon that contains the whole curve.
    pub fn circumscribed(&self, segments: usize) -> Polyline {
        let segments = segments.max(4);
        match self {
            Self::Rectangle(r) => Polyline::from_rect(r),
            Self::RoundedRect {
                rect,
                radius_x,
                radius_y,
            } => Polyline::convex_hull(
                rounded_rect_points(rect, *radius_x, *radius_y, segments, true).into_points(),
            ),
            Self::Ellipse {
                center,
                radius_x,
                radius_y,
            } => {
                let scale = 1.0 / (PI / segments as f64).cos();
                ellipse_points(*center, *radius_x, *radius_y, segments, scale)
            }
            Self::Polygon(p) => Polyline::convex_hull(p.points().iter().copied()),
        }
    }

    /// Convex polygon at distance `padding` outside the curve, rounded and simplified.
    pub fn padded_polyline(&self, padding: f64, segments: usize) -> Polyline {
        if let Self::Rectangle(r) = self {
            return Polyline::from_rect(&r.padded(padding)).rounded_and_simplified();
        }
        self.circumscribed(segments)
            .pad_convex(padding)
            .rounded_and_simplified()
    }

    /// Point at a normalized boundary parameter; `0` is the first vertex of
    /// [`Curve::approximate`] and the parameter grows clockwise with arc length.
    pub fn point_at(&self, t: f64) -> Point {
        let table = ArcLengthTable::new(self.approximate(PARAMETER_SEGMENTS));
        table.point_at(t.rem_euclid(1.0))
    }

    /// Normalized parameter of the boundary point closest to `p`.
    pub fn parameter_of(&self, p: Point) -> f64 {
        let table = ArcLengthTable::new(self.approximate(PARAMETER_SEGMENTS));
        table.parameter_of(p)
    }

    /// Bounding box of the boundary between two normalized parameters, walking clockwise
    /// from `start` to `end` (wrapping past `1`).
    pub fn span_bounding_box(&self, start: f64, end: f64) -> Rect {
        let table = ArcLengthTable::new(self.approximate(PARAMETER_SEGMENTS));
        let start = start.rem_euclid(1.0);
        let end = if (end - 1.0).abs() <= f64::EPSILON {
            1.0
        } else {
            end.rem_euclid(1.0)
        };
        let p0 = table.point_at(start);
        let mut rect = Rect::new(p0, p0).add_point(table.point_at(end));
        for (i, t) in table.vertex_params().enumerate() {
            let inside = if start <= end {
                t >= start && t <= end
            } else {
                t >= start || t <= end
            };
            if inside {
                rect = rect.add_point(table.polyline.points()[i]);
            }
        }
        rect
    }
}

fn ellipse_points(center: Point, rx: f64, ry: f64, segments: usize, scale: f64) -> Polyline {
    // Start at the left-most point and walk clockwise (decreasing angle from PI).
    let points = (0..segments)
        .map(|k| {
            let angle = PI - TAU * k as f64 / segments as f64;
            point(
                center.x + rx * scale * angle.cos(),
                center.y + ry * scale * angle.sin(),
            )
        })
        .collect();
    Polyline::closed(points)
}

fn rounded_rect_points(rect: &Rect, rx: f64, ry: f64, segments: usize, outer: bool) -> Polyline {
    if rx <= 0.0 || ry <= 0.0 {
        return Polyline::from_rect(rect);
    }
    let per_corner = (segments / 4).max(2);
    let step = FRAC_PI_2 / per_corner as f64;
    // Corner centers, clockwise from the left-bottom one, with their arc start angles.
    let corners = [
        (point(rect.left() + rx, rect.bottom() + ry), PI * 1.5),
        (point(rect.left() + rx, rect.top() - ry), PI),
        (point(rect.right() - rx, rect.top() - ry), FRAC_PI_2),
        (point(rect.right() - rx, rect.bottom() + ry), 0.0),
    ];
    let mut points = Vec::new();
    for (c, from) in corners {
        // Walk clockwise: from `from` down to `from - PI/2`.
        let arc_start = if from == 0.0 { TAU } else { from };
        points.push(point(c.x + rx * arc_start.cos(), c.y + ry * arc_start.sin()));
        for j in 0..per_corner {
            if outer {
                let a = arc_start - step * (j as f64 + 0.5);
                let scale = 1.0 / (step / 2.0).cos();
                points.push(point(c.x + rx * scale * a.cos(), c.y + ry * scale * a.sin()));
            } else if j > 0 {
                let a = arc_start - step * j as f64;
                points.push(point(c.x + rx * a.cos(), c.y + ry * a.sin()));
            }
        }
        let arc_end = arc_start - FRAC_PI_2;
        points.push(point(c.x + rx * arc_end.cos(), c.y + ry * arc_end.sin()));
    }
    let mut p = Polyline::closed(points).rounded_and_simplified();
    p.make_clockwise();
    p
}

struct ArcLengthTable {
    polyline: Polyline,
    cumulative: Vec<f64>,
    total: f64,
}

impl ArcLengthTable {
    fn new(polyline: Polyline) -> Self {
        let mut cumulative = Vec::with_capacity(polyline.len() + 1);
        let mut total = 0.0;
        cumulative.push(0.0);
        for (a, b) in polyline.segments() {
            total += (b - a).length();
            cumulative.push(total);
        }
        Self {
            polyline,
            cumulative,
            total,
        }
    }

    fn vertex_params(&self) -> impl Iterator<Item = f64> + '_ {
        let total = self.total;
        self.cumulative
            .iter()
            .take(self.polyline.len())
            .map(move |c| if total > 0.0 { c / total } else { 0.0 })
    }

    fn point_at(&self, t: f64) -> Point {
        if self.total <= 0.0 {
            return self.polyline.start().unwrap_or(Point::origin());
        }
        let target = t.clamp(0.0, 1.0) * self.total;
        let i = match self
            .cumulative
            .binary_search_by(|c| c.total_cmp(&target))
        {
            Ok(i) => i.min(self.polyline.segment_count().saturating_sub(1)),
            Err(i) => i.saturating_sub(1).min(self.polyline.segment_count().saturating_sub(1)),
        };
        let side = self.cumulative[i + 1] - self.cumulative[i];
        let frac = if side > 0.0 {
            (target - self.cumulative[i]) / side
        } else {
            0.0
        };
        self.polyline.point_at(i as f64 + frac)
    }

    fn parameter_of(&self, p: Point) -> f64 {
        if self.total <= 0.0 {
            return 0.0;
        }
        let (param, _) = self.polyline.closest_point(p);
        let i = (param.floor() as usize).min(self.polyline.segment_count().saturating_sub(1));
        let frac = param - i as f64;
        let side = self.cumulative[i + 1] - self.cumulative[i];
        ((self.cumulative[i] + frac * side) / self.total).rem_euclid(1.0)
    }
}
