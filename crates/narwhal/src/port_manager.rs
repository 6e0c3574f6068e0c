//! Resolves ports to splice points and splices them into the visibility graph.

use narwhal_geometry::epsilon::{self, DISTANCE_EPSILON, INTERSECTION_EPSILON};
use narwhal_geometry::{Curve, Directions, Point, Polyline, Rect, RectExt};

use crate::error::{EndpointDescription, Error, Result};
use crate::model::{Port, PortEntry, PortId, PortKind, Shape, ShapeId};
use crate::obstacle::ObstacleId;
use crate::obstacle_tree::ObstacleTree;
use crate::scan_segment::{ScanDirection, ScanSegmentSet};
use crate::visibility_graph::{
    NORMAL_WEIGHT, OVERLAPPED_WEIGHT, TransientLog, VertexIndex, VisibilityGraph,
};

/// One place a path may start or end.
#[derive(Debug, Clone, PartialEq)]
pub struct PortCandidate {
    pub location: Point,
    /// Directions a path may leave (or, at the far end, arrive from).
    pub directions: Directions,
    /// Offset index of a multi-location port.
    pub offset_index: Option<usize>,
}

/// A port (or waypoint) resolved against the current obstacles.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEndpoint {
    pub port: Option<PortId>,
    pub shape: Option<ShapeId>,
    pub obstacle: Option<ObstacleId>,
    pub candidates: Vec<PortCandidate>,
}

impl ResolvedEndpoint {
    pub fn waypoint(location: Point) -> Self {
        Self {
            port: None,
            shape: None,
            obstacle: None,
            candidates: vec![PortCandidate {
                location: epsilon::round_point(location),
                directions: Directions::ALL,
                offset_index: None,
            }],
        }
    }

    /// First candidate location; every resolved endpoint has at least one.
    pub fn location(&self) -> Point {
        self.candidates
            .first()
            .map(|c| c.location)
            .unwrap_or_else(Point::origin)
    }

    pub fn locations(&self) -> impl Iterator<Item = Point> + '_ {
        self.candidates.iter().map(|c| c.location)
    }

    pub fn description(&self) -> EndpointDescription {
        EndpointDescription {
            port: self.port,
            shape: self.shape,
            location: self.location(),
        }
    }
}

/// Resolves `port` to its candidate splice points.
///
/// A port bound to a shape missing from `shapes` or from `tree` is dangling. With
/// `active_only`, a multi-location port only yields its active offset (when one was chosen).
pub fn resolve_port(
    id: PortId,
    port: &Port,
    shapes: &[Option<Shape>],
    tree: &ObstacleTree,
    active_only: bool,
) -> Result<ResolvedEndpoint> {
    let (shape, obstacle) = match port.shape {
        Some(shape_id) => {
            let shape = shapes.get(shape_id.0).and_then(Option::as_ref);
            let obstacle = tree.obstacle_of(shape_id);
            match (shape, obstacle) {
                (Some(shape), Some(obstacle)) => (Some((shape_id, shape)), Some(obstacle)),
                _ => {
                    return Err(Error::DanglingPort {
                        port: id,
                        shape: shape_id,
                    });
                }
            }
        }
        None => (None, None),
    };

    let center = shape.map(|(_, s)| s.boundary.center());
    let mut locations: Vec<(Point, Option<usize>)> = match &port.kind {
        PortKind::MultiLocationFloating { .. } => port
            .locations(center)
            .into_iter()
            .enumerate()
            .map(|(i, p)| (p, Some(i)))
            .collect(),
        _ => port.locations(center).into_iter().map(|p| (p, None)).collect(),
    };
    if active_only {
        if let Some(active) = port.active_offset {
            locations.retain(|(_, i)| *i == Some(active));
        }
    }
    if locations.is_empty() {
        return Err(Error::PortWithoutLocation { port: id });
    }

    let candidates = locations
        .into_iter()
        .map(|(location, offset_index)| {
            let (location, directions) = match (&port.entry, shape, obstacle) {
                (Some(entry), Some((_, s)), Some(o)) if !entry.spans.is_empty() => {
                    let clipped = clip_to_entry(&s.boundary, entry, location);
                    let directions = outward_directions(tree.obstacle(o).boundary(), clipped);
                    (clipped, directions)
                }
                _ => (location, Directions::ALL),
            };
            PortCandidate {
                location: epsilon::round_point(location),
                directions,
                offset_index,
            }
        })
        .collect();

    Ok(ResolvedEndpoint {
        port: Some(id),
        shape: shape.map(|(id, _)| id),
        obstacle,
        candidates,
    })
}

/// Nearest point to `location` on the allowed spans of the boundary.
fn clip_to_entry(curve: &Curve, entry: &PortEntry, location: Point) -> Point {
    let t = curve.parameter_of(location);
    let mut best: Option<(f64, Point)> = None;
    for &(start, end) in &entry.spans {
        let inside = if start <= end {
            t >= start && t <= end
        } else {
            t >= start || t <= end
        };
        let candidates = if inside {
            vec![curve.point_at(t)]
        } else {
            vec![curve.point_at(start), curve.point_at(end)]
        };
        for c in candidates {
            let d = (c - location).length();
            if best.is_none_or(|(bd, _)| d < bd) {
                best = Some((d, c));
            }
        }
    }
    best.map(|(_, p)| p).unwrap_or(location)
}

/// Directions in which a step from the boundary point `p` leaves the shape.
fn outward_directions(boundary: &Polyline, p: Point) -> Directions {
    let mut out = Directions::NONE;
    for d in Directions::PURE {
        let probe = p + d.unit_vector() * (INTERSECTION_EPSILON * 10.0);
        if !boundary.contains_inclusive(probe) {
            out |= d;
        }
    }
    if out.is_none() { Directions::ALL } else { out }
}

/// Splices splice points into the graph for the duration of one route.
pub struct PortSplicer<'a> {
    graph: &'a mut VisibilityGraph,
    tree: &'a ObstacleTree,
    segments: &'a ScanSegmentSet,
    log: &'a mut TransientLog,
    limit: Option<Rect>,
}

impl<'a> PortSplicer<'a> {
    pub fn new(
        graph: &'a mut VisibilityGraph,
        tree: &'a ObstacleTree,
        segments: &'a ScanSegmentSet,
        log: &'a mut TransientLog,
        limit: Option<Rect>,
    ) -> Self {
        Self {
            graph,
            tree,
            segments,
            log,
            limit,
        }
    }

    /// Adds a vertex at `location` and casts rays from it toward `directions`. Obstacles in
    /// `own` do not stop the rays and do not make passages through them overlapped.
    pub fn splice(&mut self, location: Point, directions: Directions, own: &[ObstacleId]) -> VertexIndex {
        let v = self.add_point(location);
        for dir in directions.iter() {
            self.cast_ray(v, dir, own);
        }
        v
    }

    /// The vertex at `p`, splitting any edge running through it, or a new isolated one.
    fn add_point(&mut self, p: Point) -> VertexIndex {
        let p = epsilon::round_point(p);
        if let Some(v) = self.graph.vertex_at(p) {
            return v;
        }
        let mut vertex = None;
        for e in self.graph.edges_containing(p) {
            vertex = Some(self.graph.split_edge(self.log, e, p, self.tree));
        }
        match vertex {
            Some(v) => v,
            None => self.graph.add_transient_vertex(self.log, p),
        }
    }

    fn cast_ray(&mut self, v: VertexIndex, dir: Directions, own: &[ObstacleId]) {
        if self.graph.vertex(v).neighbor(dir).is_some() {
            return;
        }
        let start = self.graph.point(v);
        let end = self.tree.restrict_ray(start, dir, self.limit, own);
        if epsilon::points_close(start, end) {
            return;
        }

        let direction = if dir.is_horizontal() {
            ScanDirection::Horizontal
        } else {
            ScanDirection::Vertical
        };
        let c = direction.coordinate(start);
        let (from, to) = (direction.along(start), direction.along(end));
        let (lo, hi) = (from.min(to), from.max(to));

        let mut stops: Vec<Point> = vec![end];
        stops.extend(
            self.graph
                .vertices_between(start, end, dir)
                .into_iter()
                .map(|q| self.graph.point(q)),
        );
        for s in self.segments.in_coordinate_range(direction.perpendicular(), lo, hi) {
            if c >= s.low() - DISTANCE_EPSILON && c <= s.high() + DISTANCE_EPSILON {
                stops.push(direction.point(s.coordinate(), c));
            }
        }
        for e in self.log.edges() {
            let edge = self.graph.edge(*e);
            let (a, b) = (self.graph.point(edge.source), self.graph.point(edge.target));
            if ScanDirection::of(a, b) != Some(direction.perpendicular()) {
                continue;
            }
            let along = direction.along(a);
            let (ca, cb) = (direction.coordinate(a), direction.coordinate(b));
            if along >= lo - DISTANCE_EPSILON
                && along <= hi + DISTANCE_EPSILON
                && c >= ca.min(cb) - DISTANCE_EPSILON
                && c <= ca.max(cb) + DISTANCE_EPSILON
            {
                stops.push(direction.point(along, c));
            }
        }
        let ray_box = Rect::from_corners(start, end);
        for o in self.tree.query_padded(ray_box, |_| true) {
            for x in o.padded_polyline().intersect_segment(start, end) {
                stops.push(direction.point(direction.along(x.point), c));
            }
        }
        for b in self.tree.barriers_in(ray_box) {
            for x in self.tree.barrier_polyline(b).intersect_segment(start, end) {
                stops.push(direction.point(direction.along(x.point), c));
            }
        }

        let sign = if to >= from { 1.0 } else { -1.0 };
        let mut stops: Vec<(f64, Point)> = stops
            .into_iter()
            .map(epsilon::round_point)
            .map(|p| ((direction.along(p) - from) * sign, p))
            .filter(|(d, _)| *d > DISTANCE_EPSILON && *d <= (to - from).abs() + DISTANCE_EPSILON)
            .collect();
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));
        stops.dedup_by(|a, b| epsilon::points_close(a.1, b.1));

        let mut prev = v;
        for (_, q) in stops {
            let qv = self.add_point(q);
            if qv == prev {
                continue;
            }
            match self.graph.neighbor(prev, dir) {
                Some((_, n)) if n == qv => {
                    prev = qv;
                    continue;
                }
                Some(_) => {
                    tracing::warn!(at = ?self.graph.point(prev), ?dir, "splice ray blocked by an inconsistent neighbor");
                    return;
                }
                None => {}
            }
            let (a, b) = (self.graph.point(prev), self.graph.point(qv));
            let weight = if self.tree.is_overlapped_passage(a, b, own) {
                OVERLAPPED_WEIGHT
            } else {
                NORMAL_WEIGHT
            };
            let barriers = self.tree.edge_barriers(a, b);
            if self
                .graph
                .add_transient_edge(self.log, prev, qv, weight, barriers)
                .is_none()
            {
                tracing::warn!(from = ?a, to = ?b, "splice edge rejected by occupied slot");
                return;
            }
            prev = qv;
        }
    }
}

/// Bounding box of the endpoint obstacles' padded boxes and the splice points.
pub fn endpoint_box(
    tree: &ObstacleTree,
    source: &ResolvedEndpoint,
    target: &ResolvedEndpoint,
) -> Option<Rect> {
    let mut rect: Option<Rect> = None;
    let mut grow = |r: Rect| {
        rect = Some(match rect {
            Some(x) => x.union(&r),
            None => r,
        });
    };
    for endpoint in [source, target] {
        if let Some(o) = endpoint.obstacle {
            grow(tree.obstacle(o).padded_box());
        }
        for p in endpoint.locations() {
            grow(Rect::new(p, p));
        }
    }
    rect
}

#[cfg(test)]
mod tests {
    use super::*;
    use narwhal_geometry::point;

    #[test]
    fn entry_clips_to_the_nearest_span_end() {
        let square = Curve::rectangle_centered(point(0.0, 0.0), 20.0, 20.0);
        // The right side runs from 0.5 to 0.75 clockwise from the left-bottom corner.
        let entry = PortEntry::new([(0.55, 0.7)]);
        let clipped = clip_to_entry(&square, &entry, point(10.0, 0.0));
        assert!(epsilon::points_close(clipped, point(10.0, 0.0)));
        let clipped = clip_to_entry(&square, &entry, point(0.0, 10.0));
        assert!(epsilon::points_close(clipped, square.point_at(0.55)));
    }

    #[test]
    fn outward_directions_on_a_side() {
        let square = Polyline::from_rect(&Rect::new(point(-10.0, -10.0), point(10.0, 10.0)));
        assert_eq!(outward_directions(&square, point(10.0, 0.0)), Directions::EAST);
        assert_eq!(
            outward_directions(&square, point(10.0, 10.0)),
            Directions::NORTH | Directions::EAST
        );
    }
}
