//! Orthogonal visibility graph: vertices at scan segment end points and crossings, with at most
//! one edge per compass direction per vertex.
//!
//! Port splicing adds transient vertices and edges and may split base edges; everything it does
//! is recorded in a [`TransientLog`] and undone by [`VisibilityGraph::restore`], which leaves the
//! base graph exactly as it was (same slots, same counts).

use std::collections::BTreeMap;

use narwhal_geometry::epsilon::{self, DISTANCE_EPSILON};
use narwhal_geometry::{Directions, Point};
use rustc_hash::FxBuildHasher;

use crate::obstacle_tree::{Barrier, ObstacleTree};
use crate::scan_segment::{ScanDirection, ScanSegmentSet};

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

pub const NORMAL_WEIGHT: f64 = 1.0;
pub const OVERLAPPED_WEIGHT: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexIndex(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeIndex(pub usize);

#[derive(Debug, Clone)]
pub struct VisibilityVertex {
    pub point: Point,
    /// Indexed by [`Directions::index`].
    neighbors: [Option<EdgeIndex>; 4],
    pub transient: bool,
}

impl VisibilityVertex {
    pub fn neighbor(&self, dir: Directions) -> Option<EdgeIndex> {
        dir.index().and_then(|i| self.neighbors[i])
    }

    pub fn degree(&self) -> usize {
        self.neighbors.iter().flatten().count()
    }
}

/// Axis-aligned edge from the lower (west or south) vertex to the upper one.
#[derive(Debug, Clone)]
pub struct VisibilityEdge {
    pub source: VertexIndex,
    pub target: VertexIndex,
    pub weight: f64,
    pub barriers: Vec<Barrier>,
    pub transient: bool,
}

impl VisibilityEdge {
    pub fn is_overlapped(&self) -> bool {
        self.weight >= OVERLAPPED_WEIGHT
    }

    /// The end opposite to `v`.
    pub fn other(&self, v: VertexIndex) -> VertexIndex {
        if self.source == v {
            self.target
        } else {
            self.source
        }
    }
}

/// Everything one splice added or removed.
#[derive(Debug, Default)]
pub struct TransientLog {
    vertices: Vec<VertexIndex>,
    edges: Vec<EdgeIndex>,
    removed: Vec<(EdgeIndex, VisibilityEdge)>,
}

impl TransientLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertices(&self) -> &[VertexIndex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[EdgeIndex] {
        &self.edges
    }

    pub fn split_edge_count(&self) -> usize {
        self.removed.len()
    }
}

#[derive(Debug, Default)]
pub struct VisibilityGraph {
    vertices: Vec<Option<VisibilityVertex>>,
    edges: Vec<Option<VisibilityEdge>>,
    by_point: HashMap<(i64, i64), VertexIndex>,
    /// `y` key, then `x` key.
    rows: BTreeMap<i64, BTreeMap<i64, VertexIndex>>,
    /// `x` key, then `y` key.
    columns: BTreeMap<i64, BTreeMap<i64, VertexIndex>>,
    vertex_count: usize,
    edge_count: usize,
    transient_vertex_count: usize,
    transient_edge_count: usize,
}

impl VisibilityGraph {
    pub fn build(segments: &ScanSegmentSet, tree: &ObstacleTree) -> Self {
        let mut graph = Self::default();
        for direction in [ScanDirection::Horizontal, ScanDirection::Vertical] {
            let crossing = direction.perpendicular();
            for s in segments.segments(direction) {
                let mut stops: Vec<Point> = vec![s.start, s.end];
                for other in segments.in_coordinate_range(crossing, s.low(), s.high()) {
                    let c = s.coordinate();
                    if c >= other.low() - DISTANCE_EPSILON && c <= other.high() + DISTANCE_EPSILON {
                        stops.push(direction.point(other.coordinate(), c));
                    }
                }
                stops.sort_by(|a, b| direction.along(*a).total_cmp(&direction.along(*b)));
                stops.dedup_by(|a, b| epsilon::points_close(*a, *b));
                let weight = s.weight();
                for w in stops.windows(2) {
                    let a = graph.add_vertex(w[0], false);
                    let b = graph.add_vertex(w[1], false);
                    let barriers = tree.edge_barriers(w[0], w[1]);
                    if graph.add_edge(a, b, weight, barriers, false).is_none() {
                        tracing::trace!(from = ?w[0], to = ?w[1], "duplicate base edge skipped");
                    }
                }
            }
        }
        tracing::debug!(
            vertices = graph.vertex_count,
            edges = graph.edge_count,
            "visibility graph built"
        );
        graph
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn transient_vertex_count(&self) -> usize {
        self.transient_vertex_count
    }

    pub fn transient_edge_count(&self) -> usize {
        self.transient_edge_count
    }

    /// Number of vertex slots; every live [`VertexIndex`] is below it.
    pub fn vertex_capacity(&self) -> usize {
        self.vertices.len()
    }

    pub fn vertex(&self, v: VertexIndex) -> &VisibilityVertex {
        self.vertices[v.0]
            .as_ref()
            .unwrap_or_else(|| panic!("vertex {} was removed", v.0))
    }

    pub fn edge(&self, e: EdgeIndex) -> &VisibilityEdge {
        self.edges[e.0]
            .as_ref()
            .unwrap_or_else(|| panic!("edge {} was removed", e.0))
    }

    pub fn point(&self, v: VertexIndex) -> Point {
        self.vertex(v).point
    }

    pub fn vertices(&self) -> impl Iterator<Item = (VertexIndex, &VisibilityVertex)> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|v| (VertexIndex(i), v)))
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeIndex, &VisibilityEdge)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (EdgeIndex(i), e)))
    }

    pub fn vertex_at(&self, p: Point) -> Option<VertexIndex> {
        self.by_point.get(&epsilon::point_key(p)).copied()
    }

    /// Edge leaving `v` toward `dir` and the vertex at its other end.
    pub fn neighbor(&self, v: VertexIndex, dir: Directions) -> Option<(EdgeIndex, VertexIndex)> {
        let e = self.vertex(v).neighbor(dir)?;
        Some((e, self.edge(e).other(v)))
    }

    /// Vertices on the axis line through `from` toward `dir`, strictly after `from` and no
    /// further than `to`, nearest first.
    pub fn vertices_between(&self, from: Point, to: Point, dir: Directions) -> Vec<VertexIndex> {
        let (from_key, to_key) = (epsilon::point_key(from), epsilon::point_key(to));
        let (line, lo, hi, reversed) = match dir {
            Directions::EAST => (self.rows.get(&from_key.1), from_key.0 + 1, to_key.0, false),
            Directions::WEST => (self.rows.get(&from_key.1), to_key.0, from_key.0 - 1, true),
            Directions::NORTH => (self.columns.get(&from_key.0), from_key.1 + 1, to_key.1, false),
            Directions::SOUTH => (self.columns.get(&from_key.0), to_key.1, from_key.1 - 1, true),
            _ => return Vec::new(),
        };
        let Some(line) = line else {
            return Vec::new();
        };
        if lo > hi {
            return Vec::new();
        }
        let mut out: Vec<VertexIndex> = line.range(lo..=hi).map(|(_, v)| *v).collect();
        if reversed {
            out.reverse();
        }
        out
    }

    /// Edges whose interior (end points excluded) contains `p`.
    pub fn edges_containing(&self, p: Point) -> Vec<EdgeIndex> {
        let key = epsilon::point_key(p);
        let mut out = Vec::new();
        let lines = [
            (self.rows.get(&key.1), key.0, Directions::EAST),
            (self.columns.get(&key.0), key.1, Directions::NORTH),
        ];
        for (line, along, upward) in lines {
            let Some(line) = line else {
                continue;
            };
            let Some((_, below)) = line.range(..along).next_back() else {
                continue;
            };
            if let Some((e, far)) = self.neighbor(*below, upward) {
                let far_key = epsilon::point_key(self.point(far));
                let far_along = if upward == Directions::EAST { far_key.0 } else { far_key.1 };
                if far_along > along {
                    out.push(e);
                }
            }
        }
        out
    }

    /// Returns the existing vertex at `p` or inserts a new one.
    pub fn add_vertex(&mut self, p: Point, transient: bool) -> VertexIndex {
        let p = epsilon::round_point(p);
        let key = epsilon::point_key(p);
        if let Some(v) = self.by_point.get(&key) {
            return *v;
        }
        let v = VertexIndex(self.vertices.len());
        self.vertices.push(Some(VisibilityVertex {
            point: p,
            neighbors: [None; 4],
            transient,
        }));
        self.index_vertex(key, v);
        self.vertex_count += 1;
        if transient {
            self.transient_vertex_count += 1;
        }
        v
    }

    fn index_vertex(&mut self, key: (i64, i64), v: VertexIndex) {
        self.by_point.insert(key, v);
        self.rows.entry(key.1).or_default().insert(key.0, v);
        self.columns.entry(key.0).or_default().insert(key.1, v);
    }

    fn unindex_vertex(&mut self, key: (i64, i64)) {
        self.by_point.remove(&key);
        if let Some(row) = self.rows.get_mut(&key.1) {
            row.remove(&key.0);
            if row.is_empty() {
                self.rows.remove(&key.1);
            }
        }
        if let Some(column) = self.columns.get_mut(&key.0) {
            column.remove(&key.1);
            if column.is_empty() {
                self.columns.remove(&key.0);
            }
        }
    }

    /// Connects two vertices on a common axis line. Returns `None` when they are not aligned
    /// or when either side already has an edge in that direction.
    pub fn add_edge(
        &mut self,
        a: VertexIndex,
        b: VertexIndex,
        weight: f64,
        barriers: Vec<Barrier>,
        transient: bool,
    ) -> Option<EdgeIndex> {
        let dir = Directions::between(self.point(a), self.point(b));
        let (source, target) = match dir {
            Directions::EAST | Directions::NORTH => (a, b),
            Directions::WEST | Directions::SOUTH => (b, a),
            _ => return None,
        };
        let up = if dir.is_horizontal() { Directions::EAST } else { Directions::NORTH };
        let (up_slot, down_slot) = (up.index()?, up.opposite().index()?);
        if self.vertex(source).neighbors[up_slot].is_some()
            || self.vertex(target).neighbors[down_slot].is_some()
        {
            return None;
        }
        let e = EdgeIndex(self.edges.len());
        self.edges.push(Some(VisibilityEdge {
            source,
            target,
            weight,
            barriers,
            transient,
        }));
        self.link(e, source, target, up_slot, down_slot);
        self.edge_count += 1;
        if transient {
            self.transient_edge_count += 1;
        }
        Some(e)
    }

    fn link(&mut self, e: EdgeIndex, source: VertexIndex, target: VertexIndex, up: usize, down: usize) {
        if let Some(v) = self.vertices[source.0].as_mut() {
            v.neighbors[up] = Some(e);
        }
        if let Some(v) = self.vertices[target.0].as_mut() {
            v.neighbors[down] = Some(e);
        }
    }

    fn slots(&self, e: &VisibilityEdge) -> (usize, usize) {
        if epsilon::close(self.point(e.source).y, self.point(e.target).y) {
            (1, 3)
        } else {
            (0, 2)
        }
    }

    fn remove_edge(&mut self, e: EdgeIndex) -> Option<VisibilityEdge> {
        let edge = self.edges.get_mut(e.0)?.take()?;
        let (up, down) = self.slots(&edge);
        if let Some(v) = self.vertices[edge.source.0].as_mut() {
            v.neighbors[up] = None;
        }
        if let Some(v) = self.vertices[edge.target.0].as_mut() {
            v.neighbors[down] = None;
        }
        self.edge_count -= 1;
        if edge.transient {
            self.transient_edge_count -= 1;
        }
        Some(edge)
    }

    fn remove_vertex(&mut self, v: VertexIndex) {
        let Some(vertex) = self.vertices.get_mut(v.0).and_then(Option::take) else {
            return;
        };
        self.unindex_vertex(epsilon::point_key(vertex.point));
        self.vertex_count -= 1;
        if vertex.transient {
            self.transient_vertex_count -= 1;
        }
    }

    pub fn add_transient_vertex(&mut self, log: &mut TransientLog, p: Point) -> VertexIndex {
        let before = self.vertices.len();
        let v = self.add_vertex(p, true);
        if v.0 >= before {
            log.vertices.push(v);
        }
        v
    }

    pub fn add_transient_edge(
        &mut self,
        log: &mut TransientLog,
        a: VertexIndex,
        b: VertexIndex,
        weight: f64,
        barriers: Vec<Barrier>,
    ) -> Option<EdgeIndex> {
        let e = self.add_edge(a, b, weight, barriers, true)?;
        log.edges.push(e);
        Some(e)
    }

    /// Splits edge `e` at the interior point `p`, replacing it by two transient halves.
    pub fn split_edge(
        &mut self,
        log: &mut TransientLog,
        e: EdgeIndex,
        p: Point,
        tree: &ObstacleTree,
    ) -> VertexIndex {
        let Some(edge) = self.remove_edge(e) else {
            return self.add_transient_vertex(log, p);
        };
        let weight = edge.weight;
        let (source, target) = (edge.source, edge.target);
        if edge.transient {
            log.edges.retain(|x| *x != e);
        } else {
            log.removed.push((e, edge));
        }
        let mid = self.add_transient_vertex(log, p);
        let (sp, mp, tp) = (self.point(source), self.point(mid), self.point(target));
        self.add_transient_edge(log, source, mid, weight, tree.edge_barriers(sp, mp));
        self.add_transient_edge(log, mid, target, weight, tree.edge_barriers(mp, tp));
        mid
    }

    /// Removes the transient vertices and edges recorded in `log` and reinstates every base
    /// edge it split.
    pub fn restore(&mut self, log: TransientLog) {
        for e in log.edges.iter().rev() {
            self.remove_edge(*e);
        }
        for v in log.vertices.iter().rev() {
            self.remove_vertex(*v);
        }
        for (e, edge) in log.removed.into_iter().rev() {
            let (up, down) = self.slots(&edge);
            let (source, target) = (edge.source, edge.target);
            if let Some(slot) = self.edges.get_mut(e.0) {
                *slot = Some(edge);
                self.link(e, source, target, up, down);
                self.edge_count += 1;
            }
        }
        while matches!(self.edges.last(), Some(None)) {
            self.edges.pop();
        }
        while matches!(self.vertices.last(), Some(None)) {
            self.vertices.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use narwhal_geometry::point;

    #[test]
    fn add_edge_rejects_occupied_slots() {
        let mut g = VisibilityGraph::default();
        let a = g.add_vertex(point(0.0, 0.0), false);
        let b = g.add_vertex(point(10.0, 0.0), false);
        let c = g.add_vertex(point(20.0, 0.0), false);
        assert!(g.add_edge(a, b, NORMAL_WEIGHT, Vec::new(), false).is_some());
        assert!(g.add_edge(a, c, NORMAL_WEIGHT, Vec::new(), false).is_none());
        assert!(g.add_edge(b, c, NORMAL_WEIGHT, Vec::new(), false).is_some());
        assert_eq!(g.neighbor(b, Directions::WEST).map(|(_, v)| v), Some(a));
        assert_eq!(g.vertices_between(point(0.0, 0.0), point(20.0, 0.0), Directions::EAST), vec![b, c]);
        assert_eq!(g.vertices_between(point(20.0, 0.0), point(0.0, 0.0), Directions::WEST), vec![b, a]);
    }

    #[test]
    fn edges_containing_finds_the_spanning_edge() {
        let mut g = VisibilityGraph::default();
        let a = g.add_vertex(point(0.0, 0.0), false);
        let b = g.add_vertex(point(0.0, 10.0), false);
        let e = g.add_edge(a, b, NORMAL_WEIGHT, Vec::new(), false);
        assert_eq!(g.edges_containing(point(0.0, 5.0)), e.into_iter().collect::<Vec<_>>());
        assert!(g.edges_containing(point(0.0, 10.0)).is_empty());
        assert!(g.edges_containing(point(1.0, 5.0)).is_empty());
    }
}
