//! Spatial index over the padded obstacles, with the accretion results and the group
//! hierarchy the router and the scan segment builder query.

use std::cell::OnceCell;

use narwhal_geometry::epsilon::{self, INTERSECTION_EPSILON};
use narwhal_geometry::{Directions, Point, Polyline, Rect, RectExt, RectangleNode, point};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::accretion::{self, Clump, OverlapConvexHull, SuperClumpMap};
use crate::error::{Error, Result};
use crate::model::{Shape, ShapeId};
use crate::obstacle::{ClumpId, HullId, Obstacle, ObstacleId, OverlapMembership};
use crate::options::RouterOptions;

/// A region whose border a path may only cross when the region is enabled for that path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Barrier {
    Group(ObstacleId),
    Clump(ClumpId),
    ConvexHull(HullId),
}

/// The visibility region an obstacle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum RegionKey {
    Single(ObstacleId),
    Clump(ClumpId),
    ConvexHull(HullId),
}

#[derive(Debug)]
pub struct ObstacleTree {
    obstacles: Vec<Obstacle>,
    by_shape: FxHashMap<ShapeId, ObstacleId>,
    clumps: Vec<Clump>,
    hulls: Vec<OverlapConvexHull>,
    /// Primary obstacles by visibility box.
    root: Option<RectangleNode<ObstacleId>>,
    /// Every obstacle by padded box.
    padded_root: Option<RectangleNode<ObstacleId>>,
    barrier_root: Option<RectangleNode<Barrier>>,
    parents: Vec<Option<ObstacleId>>,
    ancestors: Vec<Vec<ObstacleId>>,
    graph_box: Rect,
    super_clumps: OnceCell<SuperClumpMap>,
}

impl ObstacleTree {
    /// Wraps `shapes` (in handle order) into obstacles, runs overlap accretion and builds the
    /// hierarchies. `extra_points` (port and waypoint locations) widen the graph box.
    pub fn build(
        shapes: &[(ShapeId, &Shape)],
        extra_points: &[Point],
        options: &RouterOptions,
    ) -> Result<Self> {
        let mut obstacles = Vec::with_capacity(shapes.len());
        let mut by_shape = FxHashMap::default();
        for (i, (shape_id, shape)) in shapes.iter().enumerate() {
            obstacles.push(Obstacle::new(ObstacleId(i), *shape_id, shape, options)?);
            by_shape.insert(*shape_id, ObstacleId(i));
        }
        let parents = collect_parents(shapes, &by_shape)?;
        let ancestors = collect_ancestors(&parents)?;

        let accretion = accretion::accrete(&mut obstacles);

        let root = RectangleNode::build(
            obstacles
                .iter()
                .filter(|o| o.is_primary())
                .map(|o| (o.id(), o.visibility_box()))
                .collect(),
        );
        let padded_root = RectangleNode::build(
            obstacles
                .iter()
                .map(|o| (o.id(), o.padded_box()))
                .collect(),
        );

        let mut barriers: Vec<(Barrier, Rect)> = Vec::new();
        for o in obstacles.iter().filter(|o| o.is_group()) {
            barriers.push((Barrier::Group(o.id()), o.visibility_box()));
        }
        for c in &accretion.clumps {
            barriers.push((Barrier::Clump(c.id()), c.rect()));
        }
        for h in &accretion.hulls {
            if !obstacles[h.primary().0].is_group() {
                barriers.push((Barrier::ConvexHull(h.id()), h.polyline().bounding_box()));
            }
        }
        let barrier_root = RectangleNode::build(barriers);

        let mut graph_box = obstacles
            .iter()
            .map(|o| o.visibility_box())
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(Rect::zero);
        for p in extra_points {
            graph_box = graph_box.add_point(*p);
        }
        let margin = if options.padding > 0.0 { options.padding } else { 1.0 };
        let graph_box = Rect::new(
            epsilon::round_point(graph_box.min - narwhal_geometry::vector(margin, margin)),
            epsilon::round_point(graph_box.max + narwhal_geometry::vector(margin, margin)),
        );

        tracing::debug!(
            obstacles = obstacles.len(),
            clumps = accretion.clumps.len(),
            hulls = accretion.hulls.len(),
            "obstacle tree built"
        );

        Ok(Self {
            obstacles,
            by_shape,
            clumps: accretion.clumps,
            hulls: accretion.hulls,
            root,
            padded_root,
            barrier_root,
            parents,
            ancestors,
            graph_box,
            super_clumps: OnceCell::new(),
        })
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn obstacle(&self, id: ObstacleId) -> &Obstacle {
        &self.obstacles[id.0]
    }

    pub fn obstacle_of(&self, shape: ShapeId) -> Option<ObstacleId> {
        self.by_shape.get(&shape).copied()
    }

    pub fn clumps(&self) -> &[Clump] {
        &self.clumps
    }

    pub fn clump(&self, id: ClumpId) -> &Clump {
        &self.clumps[id.0]
    }

    pub fn convex_hulls(&self) -> &[OverlapConvexHull] {
        &self.hulls
    }

    pub fn convex_hull(&self, id: HullId) -> &OverlapConvexHull {
        &self.hulls[id.0]
    }

    pub fn root(&self) -> Option<&RectangleNode<ObstacleId>> {
        self.root.as_ref()
    }

    pub fn graph_box(&self) -> Rect {
        self.graph_box
    }

    /// Primary obstacles whose visibility box intersects `rect` and that satisfy `predicate`.
    pub fn query<'a, F>(&'a self, rect: Rect, mut predicate: F) -> impl Iterator<Item = &'a Obstacle> + 'a
    where
        F: FnMut(&Obstacle) -> bool + 'a,
    {
        let obstacles = &self.obstacles;
        self.root
            .as_ref()
            .map(move |root| root.query(rect, move |id: &ObstacleId| predicate(&obstacles[id.0])))
            .into_iter()
            .flatten()
            .map(move |id| &obstacles[id.0])
    }

    /// Every obstacle (groups and accreted members included) whose padded box intersects
    /// `rect` and that satisfies `predicate`.
    pub fn query_padded<'a, F>(
        &'a self,
        rect: Rect,
        mut predicate: F,
    ) -> impl Iterator<Item = &'a Obstacle> + 'a
    where
        F: FnMut(&Obstacle) -> bool + 'a,
    {
        let obstacles = &self.obstacles;
        self.padded_root
            .as_ref()
            .map(move |root| root.query(rect, move |id: &ObstacleId| predicate(&obstacles[id.0])))
            .into_iter()
            .flatten()
            .map(move |id| &obstacles[id.0])
    }

    /// Standalone hierarchy over the padded boxes of `subset`.
    pub fn calculate_hierarchy(&self, subset: &[ObstacleId]) -> Option<RectangleNode<ObstacleId>> {
        RectangleNode::build(
            subset
                .iter()
                .map(|id| (*id, self.obstacles[id.0].padded_box()))
                .collect(),
        )
    }

    pub fn super_clumps(&self) -> &SuperClumpMap {
        self.super_clumps
            .get_or_init(|| SuperClumpMap::build(&self.obstacles))
    }

    pub fn parent(&self, id: ObstacleId) -> Option<ObstacleId> {
        self.parents[id.0]
    }

    /// Groups that (transitively) list `id` as a child, nearest first.
    pub fn ancestors(&self, id: ObstacleId) -> &[ObstacleId] {
        &self.ancestors[id.0]
    }

    /// Groups whose visibility polygon overlaps the interior of `id`'s padded polygon.
    pub fn spatial_ancestors(&self, id: ObstacleId) -> Vec<ObstacleId> {
        let o = &self.obstacles[id.0];
        let center = o.center();
        self.obstacles
            .iter()
            .filter(|g| g.is_group() && g.id() != id)
            .filter(|g| g.visibility_box().interiors_intersect(&o.padded_box()))
            .filter(|g| {
                g.visibility_polyline().contains_strictly(center)
                    || g.visibility_polyline().boundary_intersects(o.padded_polyline())
            })
            .map(|g| g.id())
            .collect()
    }

    /// Groups whose visibility polygon strictly contains `p`.
    pub fn groups_containing(&self, p: Point) -> Vec<ObstacleId> {
        self.query(Rect::new(p, p), |o| o.is_group())
            .filter(|g| g.visibility_polyline().contains_strictly(p))
            .map(|g| g.id())
            .collect()
    }

    /// First non-group obstacle whose padded polygon strictly contains `p`.
    pub fn inside_hit_test(&self, p: Point) -> Option<ObstacleId> {
        self.query_padded(Rect::new(p, p), |o| !o.is_group())
            .find(|o| o.padded_polyline().contains_strictly(p))
            .map(|o| o.id())
    }

    /// Non-group obstacles whose padded polygon contains `p`, border included.
    pub fn obstacles_containing(&self, p: Point) -> Vec<ObstacleId> {
        self.query_padded(Rect::new(p, p), |o| !o.is_group())
            .filter(|o| o.padded_polyline().contains_inclusive(p))
            .map(|o| o.id())
            .collect()
    }

    /// The barrier guarding an obstacle's visibility region, if it has one.
    pub fn region_barrier(&self, id: ObstacleId) -> Option<Barrier> {
        let o = &self.obstacles[id.0];
        if o.is_group() {
            return Some(Barrier::Group(id));
        }
        match o.membership() {
            OverlapMembership::None => None,
            OverlapMembership::Clump(c) => Some(Barrier::Clump(c)),
            OverlapMembership::ConvexHull(h) => Some(Barrier::ConvexHull(h)),
        }
    }

    pub fn barrier_polyline(&self, barrier: Barrier) -> &Polyline {
        match barrier {
            Barrier::Group(g) => self.obstacles[g.0].visibility_polyline(),
            Barrier::Clump(c) => self.clumps[c.0].polyline(),
            Barrier::ConvexHull(h) => self.hulls[h.0].polyline(),
        }
    }

    pub fn barriers(&self) -> Vec<Barrier> {
        let mut out: Vec<Barrier> = self
            .barrier_root
            .as_ref()
            .map(|r| r.leaves().copied().collect())
            .unwrap_or_default();
        out.sort_unstable();
        out
    }

    /// Barriers whose bounding box intersects `rect`.
    pub fn barriers_in(&self, rect: Rect) -> Vec<Barrier> {
        self.barrier_root
            .as_ref()
            .map(|r| r.query(rect, |_: &Barrier| true).copied().collect())
            .unwrap_or_default()
    }

    pub fn barriers_containing(&self, p: Point) -> Vec<Barrier> {
        let Some(root) = &self.barrier_root else {
            return Vec::new();
        };
        let mut out: Vec<Barrier> = root
            .query(Rect::new(p, p), |b| self.barrier_polyline(*b).contains_strictly(p))
            .copied()
            .collect();
        out.sort_unstable();
        out
    }

    /// Barriers crossed by the segment `a, b`: exactly one endpoint is strictly inside.
    pub fn edge_barriers(&self, a: Point, b: Point) -> Vec<Barrier> {
        let Some(root) = &self.barrier_root else {
            return Vec::new();
        };
        let mut out: Vec<Barrier> = root
            .query(Rect::from_corners(a, b), |bar| {
                let poly = self.barrier_polyline(*bar);
                poly.contains_strictly(a) != poly.contains_strictly(b)
            })
            .copied()
            .collect();
        out.sort_unstable();
        out
    }

    /// Whether the segment `a, b` runs through the interior of a non-group obstacle other
    /// than those in `exclude`.
    pub fn is_overlapped_passage(&self, a: Point, b: Point, exclude: &[ObstacleId]) -> bool {
        let mid = point((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
        self.query_padded(Rect::new(mid, mid), |o| !o.is_group())
            .filter(|o| !exclude.contains(&o.id()))
            .any(|o| o.padded_polyline().contains_strictly(mid))
    }

    fn region_key(&self, id: ObstacleId) -> RegionKey {
        match self.obstacles[id.0].membership() {
            OverlapMembership::None => RegionKey::Single(id),
            OverlapMembership::Clump(c) => RegionKey::Clump(c),
            OverlapMembership::ConvexHull(h) => RegionKey::ConvexHull(h),
        }
    }

    /// End of a ray cast from `start` toward `dir`: the first point where it enters a
    /// non-group visibility region, else the graph box (or `limit`, when `start` is inside it).
    ///
    /// Regions holding an obstacle from `pass_through`, and regions that strictly contain
    /// `start`, do not stop the ray.
    pub fn restrict_ray(
        &self,
        start: Point,
        dir: Directions,
        limit: Option<Rect>,
        pass_through: &[ObstacleId],
    ) -> Point {
        let mut end = self.graph_box.border_point(start, dir);
        if let Some(limit) = limit.filter(|l| l.contains_point_inclusive(start)) {
            let cut = limit.border_point(start, dir);
            if (cut - start).length() < (end - start).length() {
                end = cut;
            }
        }
        let ignored: FxHashSet<RegionKey> =
            pass_through.iter().map(|id| self.region_key(*id)).collect();
        let unit = dir.unit_vector();
        let mut best = (end - start).length();
        let candidates: Vec<&Obstacle> = self
            .query(Rect::from_corners(start, end), |o| !o.is_group())
            .collect();
        for o in candidates {
            if ignored.contains(&self.region_key(o.id())) {
                continue;
            }
            let poly = o.visibility_polyline();
            if poly.contains_strictly(start) {
                continue;
            }
            for x in poly.intersect_segment(start, end) {
                let along = (x.point - start).dot(unit);
                if along <= INTERSECTION_EPSILON {
                    let probe = start + unit * (INTERSECTION_EPSILON * 10.0).min(best / 2.0);
                    if poly.contains_strictly(probe) {
                        best = 0.0;
                    }
                    continue;
                }
                if along < best {
                    best = along;
                }
                break;
            }
        }
        let end = start + unit * best;
        // Keep the ray exactly on its axis after rounding.
        if dir.is_vertical() {
            point(start.x, epsilon::round(end.y))
        } else {
            point(epsilon::round(end.x), start.y)
        }
    }

    /// Number of group levels between `group` and the nearest of `anchors` (or the top level)
    /// walking up the hierarchy; `anchors` are the endpoints' ancestors.
    pub fn hierarchy_distance(&self, group: ObstacleId, anchors: &[ObstacleId]) -> usize {
        let mut distance = 1;
        let mut current = self.parents[group.0];
        while let Some(p) = current {
            if anchors.contains(&p) {
                return distance;
            }
            distance += 1;
            current = self.parents[p.0];
        }
        distance
    }
}

fn collect_parents(
    shapes: &[(ShapeId, &Shape)],
    by_shape: &FxHashMap<ShapeId, ObstacleId>,
) -> Result<Vec<Option<ObstacleId>>> {
    let mut parents: Vec<Option<ObstacleId>> = vec![None; shapes.len()];
    for (i, (shape_id, shape)) in shapes.iter().enumerate() {
        if shape.children.is_empty() {
            continue;
        }
        if !shape.is_group {
            return Err(Error::InvalidHierarchy {
                group: *shape_id,
                reason: "only groups may have children".to_string(),
            });
        }
        for child in &shape.children {
            let Some(c) = by_shape.get(child) else {
                return Err(Error::UnknownShape(*child));
            };
            if c.0 == i {
                return Err(Error::InvalidHierarchy {
                    group: *shape_id,
                    reason: "a group cannot contain itself".to_string(),
                });
            }
            if let Some(existing) = parents[c.0] {
                if existing.0 != i {
                    return Err(Error::InvalidHierarchy {
                        group: *shape_id,
                        reason: format!("{child} already belongs to {}", shapes[existing.0].0),
                    });
                }
            }
            parents[c.0] = Some(ObstacleId(i));
        }
    }
    Ok(parents)
}

fn collect_ancestors(parents: &[Option<ObstacleId>]) -> Result<Vec<Vec<ObstacleId>>> {
    let mut out = Vec::with_capacity(parents.len());
    for start in 0..parents.len() {
        let mut chain = Vec::new();
        let mut current = parents[start];
        while let Some(p) = current {
            if p.0 == start || chain.len() > parents.len() {
                return Err(Error::InvalidHierarchy {
                    group: ShapeId(p.0),
                    reason: "group hierarchy contains a cycle".to_string(),
                });
            }
            chain.push(p);
            current = parents[p.0];
        }
        out.push(chain);
    }
    Ok(out)
}
