//! Independent legality check of routed curves.
//!
//! The verifier rebuilds its own obstacles, accretion and super clumps from the router's
//! shapes and never reads the router's obstacle tree, so a bug in the index cannot hide itself.

use std::fmt;

use narwhal_geometry::epsilon::{self, DISTANCE_EPSILON};
use narwhal_geometry::{Point, PointLocation, Polyline, Rect};

use crate::error::EndpointDescription;
use crate::model::{EdgeId, PortId, Shape, ShapeId};
use crate::obstacle::{ObstacleId, OverlapMembership};
use crate::obstacle_tree::ObstacleTree;
use crate::port_manager::{ResolvedEndpoint, resolve_port};
use crate::router::RectilinearRouter;

#[derive(Debug, Clone, PartialEq)]
pub enum VerificationFailure {
    /// A curve runs through an obstacle it has no reason to enter.
    IllegalCrossing {
        edge: EdgeId,
        obstacle: ShapeId,
        crossing_points: Vec<Point>,
        source: EndpointDescription,
        target: EndpointDescription,
    },
    /// The visibility graph still holds splice state.
    TransientResidue { vertices: usize, edges: usize },
    UnroutedEdge { edge: EdgeId },
    /// An endpoint of a routed edge no longer resolves.
    UnresolvedPort { edge: EdgeId, port: PortId },
    /// The obstacles themselves are rejected (degenerate boundary, bad hierarchy).
    InvalidObstacles { reason: String },
    /// A scan segment's overlapped tag disagrees with a direct hit test.
    ScanSegmentMismatch {
        start: Point,
        end: Point,
        tagged_overlapped: bool,
    },
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalCrossing {
                edge,
                obstacle,
                crossing_points,
                source,
                target,
            } => {
                write!(f, "{edge} from {source} to {target} crosses {obstacle} at")?;
                for p in crossing_points {
                    write!(f, " ({}, {})", p.x, p.y)?;
                }
                Ok(())
            }
            Self::TransientResidue { vertices, edges } => write!(
                f,
                "visibility graph holds {vertices} transient vertices and {edges} transient edges"
            ),
            Self::UnroutedEdge { edge } => write!(f, "{edge} has no curve"),
            Self::UnresolvedPort { edge, port } => write!(f, "{edge}: {port} does not resolve"),
            Self::InvalidObstacles { reason } => write!(f, "obstacles rejected: {reason}"),
            Self::ScanSegmentMismatch {
                start,
                end,
                tagged_overlapped,
            } => write!(
                f,
                "scan segment ({}, {}) -> ({}, {}) tagged overlapped={tagged_overlapped}",
                start.x, start.y, end.x, end.y
            ),
        }
    }
}

/// Part of a curve inside an obstacle's padded polygon.
#[derive(Debug, Clone, Copy)]
struct Piece {
    start: Point,
    end: Point,
}

impl Piece {
    fn mid(&self) -> Point {
        self.start.lerp(self.end, 0.5)
    }
}

#[derive(Debug)]
struct Crossing {
    obstacle: ObstacleId,
    pieces: Vec<Piece>,
}

/// Checks every routed curve against the obstacles, plus the router's graph and scan segments.
pub fn verify(router: &RectilinearRouter) -> Vec<VerificationFailure> {
    let mut failures = Vec::new();
    let shapes: Vec<(ShapeId, &Shape)> = router.shapes().collect();
    let tree = match ObstacleTree::build(&shapes, &[], router.options()) {
        Ok(tree) => tree,
        Err(err) => {
            failures.push(VerificationFailure::InvalidObstacles {
                reason: err.to_string(),
            });
            return failures;
        }
    };

    for (id, edge) in router.edge_geometries() {
        let Some(curve) = &edge.curve else {
            failures.push(VerificationFailure::UnroutedEdge { edge: id });
            continue;
        };
        let resolve = |port: PortId| -> Option<ResolvedEndpoint> {
            let p = router.port(port)?;
            resolve_port(port, p, router.raw_shapes(), &tree, true).ok()
        };
        let Some(source) = resolve(edge.source) else {
            failures.push(VerificationFailure::UnresolvedPort {
                edge: id,
                port: edge.source,
            });
            continue;
        };
        let Some(target) = resolve(edge.target) else {
            failures.push(VerificationFailure::UnresolvedPort {
                edge: id,
                port: edge.target,
            });
            continue;
        };

        for crossing in crossed_obstacles(&tree, curve) {
            if is_legal(&tree, &crossing, &source, &target) {
                continue;
            }
            let mut crossing_points: Vec<Point> = crossing
                .pieces
                .iter()
                .flat_map(|p| [p.start, p.end])
                .map(epsilon::round_point)
                .collect();
            crossing_points.dedup_by(|a, b| epsilon::points_close(*a, *b));
            failures.push(VerificationFailure::IllegalCrossing {
                edge: id,
                obstacle: tree.obstacle(crossing.obstacle).shape(),
                crossing_points,
                source: source.description(),
                target: target.description(),
            });
        }
    }

    if let Some(graph) = router.visibility_graph() {
        let (vertices, edges) = (graph.transient_vertex_count(), graph.transient_edge_count());
        if vertices > 0 || edges > 0 {
            failures.push(VerificationFailure::TransientResidue { vertices, edges });
        }
    }

    if let Some(segments) = router.scan_segments() {
        for s in segments.horizontal().iter().chain(segments.vertical()) {
            let mid = s.start.lerp(s.end, 0.5);
            let hit = tree
                .query_padded(Rect::new(mid, mid), |o| !o.is_group())
                .any(|o| {
                    let b = o.padded_box();
                    let (w, h) = (b.width(), b.height());
                    let tolerance = DISTANCE_EPSILON * epsilon::deviation_multiplier(w.max(h), w.min(h));
                    o.padded_polyline().location_within(mid, tolerance)
                        == PointLocation::Inside
                });
            if hit != s.overlapped {
                failures.push(VerificationFailure::ScanSegmentMismatch {
                    start: s.start,
                    end: s.end,
                    tagged_overlapped: s.overlapped,
                });
            }
        }
    }

    if !failures.is_empty() {
        tracing::debug!(failures = failures.len(), "verification failed");
    }
    failures
}

/// Splits `a, b` at its crossings with `poly` and keeps the sub-pieces that `keep` accepts.
fn pieces_of(poly: &Polyline, a: Point, b: Point, keep: impl Fn(Point) -> bool) -> Vec<Piece> {
    let mut cuts = vec![0.0];
    cuts.extend(poly.intersect_segment(a, b).iter().map(|x| x.segment_param));
    cuts.push(1.0);
    cuts.sort_by(|x, y| x.total_cmp(y));
    let length = (b - a).length();
    let mut out = Vec::new();
    for w in cuts.windows(2) {
        if (w[1] - w[0]) * length <= DISTANCE_EPSILON {
            continue;
        }
        let piece = Piece {
            start: a.lerp(b, w[0]),
            end: a.lerp(b, w[1]),
        };
        if keep(piece.mid()) {
            out.push(piece);
        }
    }
    out
}

/// Obstacles whose padded polygon the curve's interior enters. A group only counts when the
/// curve is both inside and outside it.
fn crossed_obstacles(tree: &ObstacleTree, curve: &Polyline) -> Vec<Crossing> {
    let mut out = Vec::new();
    for o in tree.query_padded(curve.bounding_box(), |_| true) {
        let poly = o.padded_polyline();
        let mut inside = Vec::new();
        let mut outside = false;
        for (a, b) in curve.segments() {
            inside.extend(pieces_of(poly, a, b, |m| poly.contains_strictly(m)));
            outside |= !pieces_of(poly, a, b, |m| !poly.contains_strictly(m)).is_empty();
        }
        let crossed = if o.is_group() {
            !inside.is_empty() && outside
        } else {
            !inside.is_empty()
        };
        if crossed {
            out.push(Crossing {
                obstacle: o.id(),
                pieces: inside,
            });
        }
    }
    out
}

fn is_legal(
    tree: &ObstacleTree,
    crossing: &Crossing,
    source: &ResolvedEndpoint,
    target: &ResolvedEndpoint,
) -> bool {
    let id = crossing.obstacle;
    let obstacle = tree.obstacle(id);
    let endpoints = [source, target];
    let locations: Vec<Point> = endpoints.iter().flat_map(|e| e.locations()).collect();

    if endpoints.iter().any(|e| e.obstacle == Some(id)) {
        return true;
    }

    // Only the padding band is entered.
    let boundary = obstacle.boundary();
    let grazes = crossing.pieces.iter().all(|p| {
        pieces_of(boundary, p.start, p.end, |m| boundary.contains_strictly(m)).is_empty()
    });
    if grazes {
        return true;
    }

    let membership = obstacle.membership();
    if membership != OverlapMembership::None
        && endpoints
            .iter()
            .filter_map(|e| e.obstacle)
            .any(|e| tree.obstacle(e).membership() == membership)
    {
        return true;
    }

    if locations.iter().any(|p| {
        obstacle.padded_polyline().contains_inclusive(*p)
            || obstacle.visibility_polyline().contains_inclusive(*p)
    }) {
        return true;
    }

    if obstacle.is_group() {
        let ancestor = endpoints.iter().filter_map(|e| e.obstacle).any(|e| {
            tree.ancestors(e).contains(&id) || tree.spatial_ancestors(e).contains(&id)
        });
        if ancestor || locations.iter().any(|p| tree.groups_containing(*p).contains(&id)) {
            return true;
        }
    }

    let (a, b) = (source.location(), target.location());
    let crosses_line = |poly: &Polyline| {
        poly.contains_inclusive(a) || poly.contains_inclusive(b) || !poly.intersect_segment(a, b).is_empty()
    };
    if let Some(sc) = tree.super_clumps().of(id) {
        let landlocked = locations.iter().any(|p| sc.landlocks_point(*p));
        if landlocked || crosses_line(&Polyline::from_rect(&sc.rectangle())) {
            return true;
        }
    }
    if let Some(c) = obstacle.clump() {
        if crosses_line(tree.clump(c).polyline()) {
            return true;
        }
    }

    // Entering a group port through the group's own padding band.
    if obstacle.is_group() {
        for group in endpoints.iter().filter_map(|e| e.obstacle) {
            let g = tree.obstacle(group);
            if !g.is_group() {
                continue;
            }
            let in_band = crossing.pieces.iter().all(|p| {
                [p.start, p.end, p.mid()].iter().all(|q| {
                    g.padded_polyline().contains_inclusive(*q) && !g.boundary().contains_strictly(*q)
                })
            });
            if in_band {
                return true;
            }
        }
    }
    false
}
