//! Routing session: owns shapes, ports and edge geometries, the cached routing index, and
//! drives the per-edge splice / search / unsplice cycle.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use narwhal_geometry::{Point, Polyline, Rect, RectExt, epsilon::{self, DISTANCE_EPSILON}, point};
use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::model::{EdgeGeometry, EdgeId, Port, PortId, PortKind, Shape, ShapeId};
use crate::nudger::{self, NudgePath};
use crate::observer::{NoopObserver, RouterObserver};
use crate::obstacle::ObstacleId;
use crate::obstacle_tree::{Barrier, ObstacleTree};
use crate::options::RouterOptions;
use crate::path_search::{PathSearch, SearchEndpoint, SearchResult, bend_importance};
use crate::port_manager::{PortSplicer, ResolvedEndpoint, endpoint_box, resolve_port};
use crate::scan_segment::ScanSegmentSet;
use crate::snapshot::RouterSnapshot;
use crate::visibility_graph::{TransientLog, VisibilityEdge, VisibilityGraph};

/// Obstacle tree, scan segments and base visibility graph for one version of the obstacles.
#[derive(Debug)]
pub(crate) struct RoutingIndex {
    pub(crate) tree: ObstacleTree,
    pub(crate) segments: ScanSegmentSet,
    pub(crate) graph: VisibilityGraph,
}

/// Barriers enabled by one retry stage, on top of the earlier stages.
#[derive(Debug, Clone)]
struct RetryStage {
    name: String,
    barriers: Vec<Barrier>,
}

/// A path found for one edge geometry, before nudging and finalization.
#[derive(Debug, Clone)]
struct RoutedPath {
    edge: EdgeId,
    source: ResolvedEndpoint,
    target: ResolvedEndpoint,
    points: Vec<Point>,
    /// Indices into `points` of waypoints.
    fixed: Vec<usize>,
    self_loop: bool,
}

struct Leg {
    points: Vec<Point>,
    source: usize,
    target: usize,
}

pub struct RectilinearRouter {
    options: RouterOptions,
    shapes: Vec<Option<Shape>>,
    ports: Vec<Option<Port>>,
    edges: IndexMap<EdgeId, EdgeGeometry>,
    next_edge: usize,
    observer: Box<dyn RouterObserver>,
    index: Option<RoutingIndex>,
    index_builds: usize,
}

impl Default for RectilinearRouter {
    fn default() -> Self {
        Self::new(RouterOptions::default())
    }
}

impl std::fmt::Debug for RectilinearRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RectilinearRouter")
            .field("options", &self.options)
            .field("shapes", &self.shapes.iter().flatten().count())
            .field("ports", &self.ports.iter().flatten().count())
            .field("edges", &self.edges.len())
            .field("index_builds", &self.index_builds)
            .finish()
    }
}

impl RectilinearRouter {
    pub fn new(options: RouterOptions) -> Self {
        Self::with_observer(options, NoopObserver)
    }

    pub fn with_observer(options: RouterOptions, observer: impl RouterObserver + 'static) -> Self {
        Self {
            options,
            shapes: Vec::new(),
            ports: Vec::new(),
            edges: IndexMap::new(),
            next_edge: 0,
            observer: Box::new(observer),
            index: None,
            index_builds: 0,
        }
    }

    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    /// Number of times the obstacle tree and visibility graph have been (re)built.
    pub fn index_builds(&self) -> usize {
        self.index_builds
    }

    pub fn add_shape(&mut self, shape: Shape) -> ShapeId {
        let id = ShapeId(self.shapes.len());
        self.shapes.push(Some(shape));
        self.invalidate();
        id
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id.0).and_then(Option::as_ref)
    }

    pub fn shapes(&self) -> impl Iterator<Item = (ShapeId, &Shape)> + '_ {
        self.shapes
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (ShapeId(i), s)))
    }

    /// Replaces a shape. Only a change of boundary, children or group flag rebuilds the
    /// routing index.
    pub fn update_shape(&mut self, id: ShapeId, shape: Shape) -> Result<()> {
        let slot = self
            .shapes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(Error::UnknownShape(id))?;
        let rebuild = !slot.same_geometry(&shape);
        *slot = shape;
        if rebuild {
            tracing::debug!(shape = %id, "shape geometry changed");
            self.invalidate();
        }
        Ok(())
    }

    /// Removes a shape and drops it from its group. Ports bound to it become dangling.
    pub fn remove_shape(&mut self, id: ShapeId) -> Result<Shape> {
        let shape = self
            .shapes
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(Error::UnknownShape(id))?;
        for other in self.shapes.iter_mut().flatten() {
            other.children.retain(|c| *c != id);
        }
        self.invalidate();
        Ok(shape)
    }

    pub fn add_port(&mut self, port: Port) -> PortId {
        let id = PortId(self.ports.len());
        if let Some(shape) = port
            .shape
            .and_then(|s| self.shapes.get_mut(s.0))
            .and_then(Option::as_mut)
        {
            if !shape.ports.contains(&id) {
                shape.ports.push(id);
            }
        }
        let locations = self.port_locations(&port);
        self.ports.push(Some(port));
        self.invalidate_unless_covered(&locations);
        id
    }

    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(id.0).and_then(Option::as_ref)
    }

    pub fn add_edge_geometry(&mut self, edge: EdgeGeometry) -> EdgeId {
        let id = EdgeId(self.next_edge);
        self.next_edge += 1;
        let waypoints = edge.waypoints.clone();
        self.edges.insert(id, edge);
        self.invalidate_unless_covered(&waypoints);
        id
    }

    pub fn remove_edge_geometry(&mut self, id: EdgeId) -> Result<EdgeGeometry> {
        self.edges.shift_remove(&id).ok_or(Error::UnknownEdge(id))
    }

    pub fn edge_geometry(&self, id: EdgeId) -> Option<&EdgeGeometry> {
        self.edges.get(&id)
    }

    pub fn edge_geometries(&self) -> impl Iterator<Item = (EdgeId, &EdgeGeometry)> + '_ {
        self.edges.iter().map(|(id, e)| (*id, e))
    }

    /// Drops every shape, port and edge geometry.
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.ports.clear();
        self.edges.clear();
        self.next_edge = 0;
        self.invalidate();
    }

    pub fn obstacle_tree(&self) -> Option<&ObstacleTree> {
        self.index.as_ref().map(|i| &i.tree)
    }

    pub fn scan_segments(&self) -> Option<&ScanSegmentSet> {
        self.index.as_ref().map(|i| &i.segments)
    }

    pub fn visibility_graph(&self) -> Option<&VisibilityGraph> {
        self.index.as_ref().map(|i| &i.graph)
    }

    pub(crate) fn raw_shapes(&self) -> &[Option<Shape>] {
        &self.shapes
    }

    /// Routes every edge geometry, nudges the paths and writes the resulting curves.
    pub fn run(&mut self) -> Result<()> {
        let mut index = self.take_index()?;
        let result = self.route_all(&mut index);
        self.index = Some(index);
        result
    }

    /// Routes a single edge geometry on its own (no nudging against the other paths).
    pub fn route_edge(&mut self, id: EdgeId) -> Result<&EdgeGeometry> {
        if self.edge_geometry(id).is_none() {
            return Err(Error::UnknownEdge(id));
        }
        let mut index = self.take_index()?;
        let result = self
            .route_path(&mut index, id)
            .map(|path| self.finish(&index, vec![path]));
        self.index = Some(index);
        result?;
        self.edge_geometry(id).ok_or(Error::UnknownEdge(id))
    }

    /// Serializable view of the routing index and the current curves.
    pub fn snapshot(&mut self) -> Result<RouterSnapshot> {
        let index = self.take_index()?;
        let snapshot = RouterSnapshot::capture(&index, self.edge_geometries());
        self.index = Some(index);
        Ok(snapshot)
    }

    fn invalidate(&mut self) {
        self.index = None;
    }

    fn invalidate_unless_covered(&mut self, points: &[Point]) {
        let covered = self.index.as_ref().is_some_and(|index| {
            let graph_box = index.tree.graph_box();
            points.iter().all(|p| graph_box.contains_point_strictly(*p))
        });
        if !covered {
            self.invalidate();
        }
    }

    fn port_locations(&self, port: &Port) -> Vec<Point> {
        let center = port
            .shape
            .and_then(|s| self.shape(s))
            .map(|s| s.boundary.center());
        port.locations(center)
    }

    fn take_index(&mut self) -> Result<RoutingIndex> {
        if let Some(index) = self.index.take() {
            return Ok(index);
        }
        let timing_enabled = std::env::var("NARWHAL_ROUTE_TIMING")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let start = timing_enabled.then(std::time::Instant::now);

        let shapes: Vec<(ShapeId, &Shape)> = self.shapes().collect();
        let mut extra: Vec<Point> = self
            .ports
            .iter()
            .flatten()
            .flat_map(|p| self.port_locations(p))
            .collect();
        extra.extend(self.edges.values().flat_map(|e| e.waypoints.iter().copied()));

        let tree = ObstacleTree::build(&shapes, &extra, &self.options)?;
        let tree_done = start.map(|s| s.elapsed());
        self.observer.obstacle_tree_built(&tree);
        let segments = ScanSegmentSet::build(&tree);
        let segments_done = start.map(|s| s.elapsed());
        let graph = VisibilityGraph::build(&segments, &tree);
        self.observer.visibility_graph_built(&graph);
        self.index_builds += 1;

        if let (Some(s), Some(tree_done), Some(segments_done)) = (start, tree_done, segments_done) {
            eprintln!(
                "[narwhal-timing] phase=index obstacles={} segments={} vertices={} edges={} total={:?} tree={:?} segments={:?} graph={:?}",
                tree.obstacles().len(),
                segments.len(),
                graph.vertex_count(),
                graph.edge_count(),
                s.elapsed(),
                tree_done,
                segments_done - tree_done,
                s.elapsed() - segments_done,
            );
        }
        Ok(RoutingIndex {
            tree,
            segments,
            graph,
        })
    }

    fn route_all(&mut self, index: &mut RoutingIndex) -> Result<()> {
        let timing_enabled = std::env::var("NARWHAL_ROUTE_TIMING")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let start = timing_enabled.then(std::time::Instant::now);

        let ids: Vec<EdgeId> = self.edge_geometries().map(|(id, _)| id).collect();
        let mut paths = Vec::with_capacity(ids.len());
        for id in ids {
            paths.push(self.route_path(index, id)?);
        }
        let routed = start.map(|s| s.elapsed());
        let count = paths.len();
        self.finish(index, paths);

        if let (Some(s), Some(routed)) = (start, routed) {
            eprintln!(
                "[narwhal-timing] phase=run edges={} total={:?} route={:?} finish={:?}",
                count,
                s.elapsed(),
                routed,
                s.elapsed() - routed,
            );
        }
        Ok(())
    }

    fn route_path(&mut self, index: &mut RoutingIndex, id: EdgeId) -> Result<RoutedPath> {
        let edge = self
            .edge_geometry(id)
            .ok_or(Error::UnknownEdge(id))?
            .clone();
        let source_port = self.port(edge.source).ok_or(Error::UnknownPort(edge.source))?;
        let target_port = self.port(edge.target).ok_or(Error::UnknownPort(edge.target))?;
        let source = resolve_port(edge.source, source_port, &self.shapes, &index.tree, false)?;
        let target = resolve_port(edge.target, target_port, &self.shapes, &index.tree, false)?;

        let is_self_loop = edge.waypoints.is_empty()
            && source.candidates.len() == 1
            && target.candidates.len() == 1
            && epsilon::points_close(source.location(), target.location());
        if is_self_loop {
            let p = source.location();
            tracing::debug!(edge = %id, "self edge");
            return Ok(RoutedPath {
                edge: id,
                source,
                target,
                points: vec![p, p],
                fixed: Vec::new(),
                self_loop: true,
            });
        }

        let mut stops: Vec<ResolvedEndpoint> = Vec::with_capacity(edge.waypoints.len() + 2);
        stops.push(source);
        stops.extend(edge.waypoints.iter().map(|w| ResolvedEndpoint::waypoint(*w)));
        stops.push(target);

        let mut points: Vec<Point> = Vec::new();
        let mut fixed = Vec::new();
        let legs = stops.len() - 1;
        let mut chosen_source = 0;
        let mut chosen_target = 0;
        for k in 0..legs {
            let leg = self.route_leg(index, id, &stops[k], &stops[k + 1])?;
            if k == 0 {
                chosen_source = leg.source;
            }
            if k + 1 == legs {
                chosen_target = leg.target;
            }
            if points.is_empty() {
                points = leg.points;
            } else {
                fixed.push(points.len() - 1);
                points.extend(leg.points.into_iter().skip(1));
            }
        }

        let mut target = stops.pop().unwrap_or_else(|| ResolvedEndpoint::waypoint(Point::origin()));
        let mut source = stops.swap_remove(0);
        self.select_candidate(edge.source, &mut source, chosen_source);
        self.select_candidate(edge.target, &mut target, chosen_target);

        self.observer.path_routed(id, &points);
        Ok(RoutedPath {
            edge: id,
            source,
            target,
            points,
            fixed,
            self_loop: false,
        })
    }

    /// Keeps only the candidate the search picked and records it on multi-location ports.
    fn select_candidate(&mut self, port: PortId, endpoint: &mut ResolvedEndpoint, chosen: usize) {
        if endpoint.candidates.len() <= 1 {
            return;
        }
        let candidate = endpoint.candidates.swap_remove(chosen.min(endpoint.candidates.len() - 1));
        if let Some(Some(p)) = self.ports.get_mut(port.0) {
            if matches!(p.kind, PortKind::MultiLocationFloating { .. }) {
                p.active_offset = candidate.offset_index;
            }
        }
        endpoint.candidates = vec![candidate];
    }

    fn route_leg(
        &mut self,
        index: &mut RoutingIndex,
        id: EdgeId,
        from: &ResolvedEndpoint,
        to: &ResolvedEndpoint,
    ) -> Result<Leg> {
        let vertices_before = index.graph.vertex_count();
        let edges_before = index.graph.edge_count();
        let mut log = TransientLog::new();
        let limit = if self.options.limit_port_splice_to_endpoint_box {
            endpoint_box(&index.tree, from, to)
        } else {
            None
        };

        let (sources, targets) = {
            let mut splicer = PortSplicer::new(
                &mut index.graph,
                &index.tree,
                &index.segments,
                &mut log,
                limit,
            );
            let mut splice_all = |endpoint: &ResolvedEndpoint| -> Vec<SearchEndpoint> {
                let own: Vec<ObstacleId> = endpoint.obstacle.into_iter().collect();
                endpoint
                    .candidates
                    .iter()
                    .map(|c| SearchEndpoint {
                        vertex: splicer.splice(c.location, c.directions, &own),
                        directions: c.directions,
                    })
                    .collect()
            };
            let sources = splice_all(from);
            let targets = splice_all(to);
            (sources, targets)
        };
        tracing::trace!(
            edge = %id,
            transient_vertices = log.vertices().len(),
            transient_edges = log.edges().len(),
            split_edges = log.split_edge_count(),
            "ports spliced"
        );
        self.observer.ports_spliced(id, &index.graph);

        let found = self
            .search(index, id, from, to, &sources, &targets)
            .map(|r| {
                let points: Vec<Point> = r.vertices.iter().map(|v| index.graph.point(*v)).collect();
                (r, points)
            });

        index.graph.restore(log);
        self.observer.visibility_graph_restored(id, &index.graph);
        let (vertices_after, edges_after) = (index.graph.vertex_count(), index.graph.edge_count());
        if vertices_after != vertices_before || edges_after != edges_before {
            return Err(Error::GraphNotRestored {
                edge: id,
                vertices_before,
                vertices_after,
                edges_before,
                edges_after,
            });
        }

        let (result, points) = found?;
        let (points, _) = nudger::normalize(&points, &[]);
        Ok(Leg {
            points,
            source: result.source,
            target: result.target,
        })
    }

    fn search(
        &self,
        index: &RoutingIndex,
        id: EdgeId,
        from: &ResolvedEndpoint,
        to: &ResolvedEndpoint,
        sources: &[SearchEndpoint],
        targets: &[SearchEndpoint],
    ) -> Result<SearchResult> {
        let from_points: Vec<Point> = from.locations().collect();
        let to_points: Vec<Point> = to.locations().collect();
        let bend = bend_importance(&from_points, &to_points, self.options.bend_penalty_percent);

        let mut active: FxHashSet<Barrier> = FxHashSet::default();
        for (i, stage) in retry_stages(&index.tree, from, to).into_iter().enumerate() {
            let before = active.len();
            active.extend(stage.barriers);
            if i > 0 && active.len() == before {
                continue;
            }
            let search = PathSearch::new(&index.graph, bend, |e: &VisibilityEdge| {
                e.barriers.iter().all(|b| active.contains(b))
            });
            if let Some(result) = search.run(sources, targets) {
                tracing::debug!(edge = %id, stage = %stage.name, cost = result.cost, "path found");
                return Ok(result);
            }
            tracing::debug!(edge = %id, stage = %stage.name, "path blocked");
        }
        Err(Error::NoPath {
            edge: id,
            from: from.description(),
            to: to.description(),
        })
    }

    /// Nudges the paths, builds self loops and writes the finalized curves.
    fn finish(&mut self, index: &RoutingIndex, paths: Vec<RoutedPath>) {
        let (loops, mut paths): (Vec<RoutedPath>, Vec<RoutedPath>) =
            paths.into_iter().partition(|p| p.self_loop);

        let mut nudge_paths: Vec<NudgePath> = paths
            .iter()
            .map(|p| NudgePath {
                edge: p.edge,
                source_port: p.source.port.unwrap_or(PortId(usize::MAX)),
                target_port: p.target.port.unwrap_or(PortId(usize::MAX)),
                points: p.points.clone(),
                fixed: p.fixed.clone(),
            })
            .collect();
        if self.options.nudge {
            nudger::nudge(&mut nudge_paths, &index.tree, self.options.edge_separation);
        }
        for (path, nudged) in paths.iter_mut().zip(nudge_paths) {
            path.points = nudged.points;
        }
        for mut path in loops {
            path.points = self_loop_points(&index.tree, &path.source, &self.options);
            paths.push(path);
        }

        for path in paths {
            let points = finalize_points(&index.tree, &path, self.options.route_to_center);
            let Some(edge) = self.edges.get_mut(&path.edge) else {
                continue;
            };
            let mut points = points;
            if let Some(arrow) = edge.source_arrowhead.as_mut() {
                arrow.tip = Some(pull_back(&mut points, arrow.length));
            }
            if let Some(arrow) = edge.target_arrowhead.as_mut() {
                points.reverse();
                arrow.tip = Some(pull_back(&mut points, arrow.length));
                points.reverse();
            }
            edge.curve = Some(Polyline::open(points));
        }
    }
}

/// Barrier sets enabled in order until a path is found.
fn retry_stages(tree: &ObstacleTree, from: &ResolvedEndpoint, to: &ResolvedEndpoint) -> Vec<RetryStage> {
    let endpoints = [from, to];
    let mut stages = Vec::new();

    let mut own = Vec::new();
    let mut anchors: Vec<ObstacleId> = Vec::new();
    for ep in endpoints {
        if let Some(o) = ep.obstacle {
            own.extend(tree.ancestors(o).iter().map(|g| Barrier::Group(*g)));
            own.extend(tree.region_barrier(o));
            anchors.extend_from_slice(tree.ancestors(o));
            if tree.obstacle(o).is_group() {
                anchors.push(o);
            }
        }
        for p in ep.locations() {
            own.extend(
                tree.barriers_containing(p)
                    .into_iter()
                    .filter(|b| !matches!(b, Barrier::Group(_))),
            );
        }
    }
    stages.push(RetryStage {
        name: "endpoints".to_string(),
        barriers: own,
    });

    let mut spatial = Vec::new();
    for ep in endpoints {
        if let Some(o) = ep.obstacle {
            spatial.extend(tree.spatial_ancestors(o).into_iter().map(Barrier::Group));
        }
        for p in ep.locations() {
            spatial.extend(tree.groups_containing(p).into_iter().map(Barrier::Group));
        }
    }
    let (a, b) = (from.location(), to.location());
    let crosses = |poly: &Polyline| {
        poly.contains_inclusive(a) || poly.contains_inclusive(b) || !poly.intersect_segment(a, b).is_empty()
    };
    for sc in tree.super_clumps().super_clumps() {
        let landlocked = endpoints
            .iter()
            .flat_map(|ep| ep.locations())
            .any(|p| sc.landlocks_point(p));
        if landlocked || crosses(&Polyline::from_rect(&sc.rectangle())) {
            spatial.extend(sc.members().iter().filter_map(|m| tree.region_barrier(*m)));
        }
    }
    for clump in tree.clumps() {
        if crosses(clump.polyline()) {
            spatial.push(Barrier::Clump(clump.id()));
        }
    }
    stages.push(RetryStage {
        name: "spatial".to_string(),
        barriers: spatial,
    });

    let mut by_distance: BTreeMap<usize, Vec<Barrier>> = BTreeMap::new();
    for b in tree.barriers() {
        if let Barrier::Group(g) = b {
            by_distance
                .entry(tree.hierarchy_distance(g, &anchors))
                .or_default()
                .push(b);
        }
    }
    for (distance, barriers) in by_distance {
        stages.push(RetryStage {
            name: format!("hierarchy distance {distance}"),
            barriers,
        });
    }

    stages.push(RetryStage {
        name: "last chance".to_string(),
        barriers: tree.barriers(),
    });
    stages
}

/// Loop leaving the top of the endpoint's padded box and coming back through its side.
fn self_loop_points(tree: &ObstacleTree, endpoint: &ResolvedEndpoint, options: &RouterOptions) -> Vec<Point> {
    let p = endpoint.location();
    let rect = endpoint
        .obstacle
        .map(|o| tree.obstacle(o).padded_box())
        .unwrap_or_else(|| Rect::new(p, p).padded(options.padding.max(1.0)));
    let top = rect.top().max(p.y + options.edge_separation);
    let side = if rect.right() - p.x > DISTANCE_EPSILON {
        rect.right()
    } else {
        rect.left()
    };
    vec![p, point(p.x, top), point(side, top), point(side, p.y), p]
}

/// Trims both ends to the unpadded endpoint boundaries (unless routing to centers).
fn finalize_points(tree: &ObstacleTree, path: &RoutedPath, route_to_center: bool) -> Vec<Point> {
    let mut points = path.points.clone();
    if route_to_center {
        return points;
    }
    if let Some(o) = path.source.obstacle {
        trim_start(&mut points, tree.obstacle(o).boundary());
    }
    if let Some(o) = path.target.obstacle {
        points.reverse();
        trim_start(&mut points, tree.obstacle(o).boundary());
        points.reverse();
    }
    nudger::normalize(&points, &[]).0
}

/// Drops the part of the path inside `boundary` before its first exit.
fn trim_start(points: &mut Vec<Point>, boundary: &Polyline) {
    if points.len() < 2 || !boundary.contains_strictly(points[0]) {
        return;
    }
    for i in 0..points.len() - 1 {
        let (a, b) = (points[i], points[i + 1]);
        if boundary.contains_strictly(b) {
            continue;
        }
        let Some(exit) = boundary.intersect_segment(a, b).last().map(|x| x.point) else {
            return;
        };
        let mut rest = vec![epsilon::round_point(exit)];
        rest.extend_from_slice(&points[i + 1..]);
        *points = rest;
        return;
    }
}

/// Moves the first point `length` along the first segment when there is room; returns the
/// original first point.
fn pull_back(points: &mut [Point], length: f64) -> Point {
    let Some(&tip) = points.first() else {
        return Point::origin();
    };
    if let Some(&next) = points.get(1) {
        let d = next - tip;
        let len = d.length();
        if length > 0.0 && len > length + DISTANCE_EPSILON {
            points[0] = epsilon::round_point(tip + d * (length / len));
        }
    }
    tip
}
