use std::cell::Cell;

use narwhal_geometry::epsilon::DISTANCE_EPSILON;
use narwhal_geometry::{Directions, Point, Polyline, Rect, RectExt, RectangleNode};
use rustc_hash::FxHashMap;

use crate::disjoint_set::DisjointSet;
use crate::obstacle::{ClumpId, Obstacle, ObstacleId};

/// Rectangular groups joined with the rectangular obstacles (and their clump siblings) that
/// straddle their borders.
#[derive(Debug)]
pub struct SuperClump {
    members: Vec<ObstacleId>,
    walls: Vec<Polyline>,
    hierarchy: Option<RectangleNode<usize>>,
    rect: Rect,
    ray_casts: Cell<usize>,
}

impl SuperClump {
    fn new(members: Vec<ObstacleId>, obstacles: &[Obstacle]) -> Self {
        let rect = members
            .iter()
            .map(|m| obstacles[m.0].padded_box())
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(Rect::zero);
        let walls: Vec<Polyline> = members
            .iter()
            .filter(|m| !obstacles[m.0].is_group())
            .map(|m| obstacles[m.0].padded_polyline().clone())
            .collect();
        let hierarchy = RectangleNode::build(
            walls
                .iter()
                .enumerate()
                .map(|(i, w)| (i, w.bounding_box()))
                .collect(),
        );
        Self {
            members,
            walls,
            hierarchy,
            rect,
            ray_casts: Cell::new(0),
        }
    }

    /// Sorted ascending; groups included.
    pub fn members(&self) -> &[ObstacleId] {
        &self.members
    }

    pub fn contains(&self, id: ObstacleId) -> bool {
        self.members.binary_search(&id).is_ok()
    }

    pub fn rectangle(&self) -> Rect {
        self.rect
    }

    /// Rays cast so far by [`SuperClump::landlocks_point`].
    pub fn ray_cast_count(&self) -> usize {
        self.ray_casts.get()
    }

    /// True if `p` lies within the combined rectangle and every axis-aligned ray from `p` hits
    /// a non-group member before leaving it. Members that contain `p` are not walls.
    pub fn landlocks_point(&self, p: Point) -> bool {
        if !self.rect.contains_point_inclusive(p) {
            return false;
        }
        Directions::PURE
            .iter()
            .all(|d| self.ray_hits_wall(p, *d))
    }

    fn ray_hits_wall(&self, p: Point, dir: Directions) -> bool {
        self.ray_casts.set(self.ray_casts.get() + 1);
        let Some(hierarchy) = &self.hierarchy else {
            return false;
        };
        let end = self.rect.padded(DISTANCE_EPSILON * 10.0).border_point(p, dir);
        let ray_box = Rect::from_corners(p, end);
        hierarchy
            .query(ray_box, |i| !self.walls[*i].contains_strictly(p))
            .any(|i| {
                let wall = &self.walls[*i];
                wall.contains_inclusive(p) || !wall.intersect_segment(p, end).is_empty()
            })
    }
}

/// Lazily built index from obstacles to the super clump containing them.
#[derive(Debug, Default)]
pub struct SuperClumpMap {
    clumps: Vec<SuperClump>,
    by_obstacle: FxHashMap<ObstacleId, usize>,
}

impl SuperClumpMap {
    pub fn build(obstacles: &[Obstacle]) -> Self {
        let candidates: Vec<ObstacleId> = obstacles
            .iter()
            .filter(|o| o.is_rectangle() && !o.is_in_convex_hull())
            .map(|o| o.id())
            .collect();
        let Some(tree) = RectangleNode::build(
            candidates
                .iter()
                .map(|id| (*id, obstacles[id.0].padded_box()))
                .collect(),
        ) else {
            return Self::default();
        };

        let mut ds = DisjointSet::new(obstacles.len());
        tree.cross_self(&mut |a: &ObstacleId, b: &ObstacleId| {
            let (oa, ob) = (&obstacles[a.0], &obstacles[b.0]);
            let (ra, rb) = (oa.padded_box(), ob.padded_box());
            let joined = match (oa.is_group(), ob.is_group()) {
                (true, true) => {
                    ra.interiors_intersect(&rb)
                        && !ra.contains_rect_inclusive(&rb)
                        && !rb.contains_rect_inclusive(&ra)
                }
                (true, false) => straddles(&ra, &rb),
                (false, true) => straddles(&rb, &ra),
                (false, false) => false,
            };
            if joined {
                ds.union(a.0, b.0);
            }
        });
        // Clump siblings travel together.
        let mut clump_heads: FxHashMap<ClumpId, usize> = FxHashMap::default();
        for o in obstacles {
            if let Some(c) = o.clump() {
                let head = *clump_heads.entry(c).or_insert(o.id().0);
                ds.union(head, o.id().0);
            }
        }

        let mut map = Self::default();
        for set in ds.sets(2) {
            if !set.iter().any(|i| obstacles[*i].is_group()) {
                continue;
            }
            let members: Vec<ObstacleId> = set.into_iter().map(ObstacleId).collect();
            let index = map.clumps.len();
            for m in &members {
                map.by_obstacle.insert(*m, index);
            }
            map.clumps.push(SuperClump::new(members, obstacles));
        }
        map
    }

    pub fn super_clumps(&self) -> &[SuperClump] {
        &self.clumps
    }

    pub fn of(&self, id: ObstacleId) -> Option<&SuperClump> {
        self.by_obstacle.get(&id).map(|i| &self.clumps[*i])
    }
}

/// `inner` crosses the border of `group` (partly inside, partly outside).
fn straddles(group: &Rect, inner: &Rect) -> bool {
    group.interiors_intersect(inner) && !group.contains_rect_inclusive(inner)
}
