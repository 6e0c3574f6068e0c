//! Overlap accretion: merges spatially intersecting obstacles so the visibility graph routes
//! around their union.
//!
//! 1. Rectangular non-group obstacles that touch are merged into [`Clump`]s. A clump is
//!    routed around as the bounding box of its members; a non-member inside that box keeps its
//!    own region and is reached through the clump's barrier.
//! 2. Remaining intersections (anything involving a non-rectangular shape or an existing hull)
//!    merge into [`OverlapConvexHull`]s, absorbing clumps, until no two regions intersect.
//! 3. Groups whose border is crossed by a non-rectangular region are grown into single-member
//!    hulls around that region.

mod clump;
mod convex_hull;
mod super_clump;

pub use clump::Clump;
pub use convex_hull::OverlapConvexHull;
pub use super_clump::{SuperClump, SuperClumpMap};

use std::collections::BTreeMap;

use narwhal_geometry::epsilon::INTERSECTION_EPSILON;
use narwhal_geometry::{Point, Polyline, Rect, RectExt, RectangleNode};

use crate::disjoint_set::DisjointSet;
use crate::obstacle::{ClumpId, HullId, Obstacle, ObstacleId, obstacles_intersect, polylines_intersect};

/// Upper bound on group-growth sweeps; each sweep grows at least one group.
const MAX_GROUP_GROWTH_PASSES: usize = 64;

#[derive(Debug, Default)]
pub struct Accretion {
    pub clumps: Vec<Clump>,
    pub hulls: Vec<OverlapConvexHull>,
}

pub fn accrete(obstacles: &mut [Obstacle]) -> Accretion {
    for o in obstacles.iter_mut() {
        o.reset_overlap();
    }
    let mut ds = DisjointSet::new(obstacles.len());
    let mut is_hull = vec![false; obstacles.len()];

    accrete_clumps(obstacles, &mut ds);
    accrete_hulls(obstacles, &mut ds, &mut is_hull);

    let mut out = Accretion::default();
    for set in ds.sets(2) {
        let members: Vec<ObstacleId> = set.into_iter().map(ObstacleId).collect();
        let root = ds.find(members[0].0);
        if is_hull[root] {
            let id = HullId(out.hulls.len());
            let hull = OverlapConvexHull::around(id, members, obstacles);
            for (i, m) in hull.members().iter().enumerate() {
                obstacles[m.0].set_convex_hull(id, hull.polyline(), i == 0);
            }
            out.hulls.push(hull);
        } else {
            let id = ClumpId(out.clumps.len());
            let clump = Clump::new(id, members, obstacles);
            for (i, m) in clump.members().iter().enumerate() {
                obstacles[m.0].set_clump(id, clump.polyline(), i == 0);
            }
            out.clumps.push(clump);
        }
    }

    grow_groups(obstacles, &mut out);
    tracing::debug!(
        clumps = out.clumps.len(),
        hulls = out.hulls.len(),
        "overlap accretion finished"
    );
    out
}

/// Unions rectangles whose own padded boxes touch. Membership is pairwise and transitive
/// only; a rectangle inside a clump's bounding box that touches no member stays on its own.
fn accrete_clumps(obstacles: &[Obstacle], ds: &mut DisjointSet) {
    let Some(tree) = RectangleNode::build(
        obstacles
            .iter()
            .filter(|o| o.is_rectangle() && !o.is_group())
            .map(|o| (o.id().0, o.padded_box()))
            .collect(),
    ) else {
        return;
    };
    let mut candidates = Vec::new();
    tree.cross_self(&mut |a: &usize, b: &usize| candidates.push((*a, *b)));
    for (a, b) in candidates {
        if obstacles_intersect(&obstacles[a], &obstacles[b]) {
            ds.union(a, b);
        }
    }
}

/// Non-group obstacles keyed by their current set representative.
fn regions(obstacles: &[Obstacle], ds: &mut DisjointSet) -> BTreeMap<usize, Vec<usize>> {
    let mut out: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for o in obstacles.iter().filter(|o| !o.is_group()) {
        out.entry(ds.find(o.id().0)).or_default().push(o.id().0);
    }
    out
}

/// Polygon standing for a region: a singleton's padded polygon, a clump's box, or the hull of
/// all members.
fn region_polygon(obstacles: &[Obstacle], members: &[usize], hull: bool) -> Polyline {
    if members.len() == 1 {
        return obstacles[members[0]].padded_polyline().clone();
    }
    if hull {
        return Polyline::convex_hull(
            members
                .iter()
                .flat_map(|m| obstacles[*m].padded_polyline().points().iter().copied()),
        );
    }
    let rect = members
        .iter()
        .map(|m| obstacles[*m].padded_box())
        .reduce(|a, b| a.union(&b))
        .unwrap_or_else(Rect::zero);
    Polyline::from_rect(&rect)
}

fn accrete_hulls(obstacles: &[Obstacle], ds: &mut DisjointSet, is_hull: &mut [bool]) {
    loop {
        let polygons: Vec<(usize, bool, Polyline)> = regions(obstacles, ds)
            .into_iter()
            .map(|(root, members)| {
                let rect_like = !is_hull[root] && obstacles[members[0]].is_rectangle();
                (root, rect_like, region_polygon(obstacles, &members, is_hull[root]))
            })
            .collect();
        let Some(tree) = RectangleNode::build(
            polygons
                .iter()
                .enumerate()
                .map(|(i, (_, _, p))| (i, p.bounding_box()))
                .collect(),
        ) else {
            return;
        };
        let mut candidates = Vec::new();
        tree.cross_self(&mut |a: &usize, b: &usize| candidates.push((*a, *b)));

        let mut changed = false;
        for (a, b) in candidates {
            let (ra, rect_a, pa) = &polygons[a];
            let (rb, rect_b, pb) = &polygons[b];
            if (*rect_a && *rect_b) || ds.same_set(*ra, *rb) {
                continue;
            }
            let loose_a = pa.pad_convex(INTERSECTION_EPSILON * 10.0);
            let loose_b = pb.pad_convex(INTERSECTION_EPSILON * 10.0);
            if !polylines_intersect(&loose_a, &loose_b) {
                continue;
            }
            ds.union(*ra, *rb);
            let root = ds.find(*ra);
            is_hull[root] = true;
            changed = true;
        }
        if !changed {
            return;
        }
    }
}

/// Grows groups whose border is crossed by a non-rectangular region into single-member hulls.
fn grow_groups(obstacles: &mut [Obstacle], out: &mut Accretion) {
    let groups: Vec<ObstacleId> = obstacles
        .iter()
        .filter(|o| o.is_group())
        .map(|o| o.id())
        .collect();
    if groups.is_empty() {
        return;
    }
    let mut grown: Vec<Option<Polyline>> = vec![None; obstacles.len()];
    for _ in 0..MAX_GROUP_GROWTH_PASSES {
        let mut changed = false;
        for &g in &groups {
            let group_poly = grown[g.0]
                .clone()
                .unwrap_or_else(|| obstacles[g.0].visibility_polyline().clone());
            let group_rect_like = grown[g.0].is_none() && obstacles[g.0].is_rectangle();
            let group_box = group_poly.bounding_box();
            let mut points: Vec<Point> = group_poly.points().to_vec();
            let mut grew = false;
            for o in obstacles.iter() {
                if o.id() == g || !o.is_primary() {
                    continue;
                }
                let other_poly = grown[o.id().0]
                    .as_ref()
                    .unwrap_or_else(|| o.visibility_polyline());
                if !group_box.intersects_inclusive(&other_poly.bounding_box()) {
                    continue;
                }
                let other_rect_like = grown[o.id().0].is_none()
                    && o.is_rectangle()
                    && !o.is_in_convex_hull();
                if group_rect_like && other_rect_like {
                    continue;
                }
                if !group_poly.boundary_intersects(other_poly) {
                    continue;
                }
                if o.is_group() {
                    // The larger group grows around the smaller one.
                    let other_area = other_poly.signed_area().abs();
                    if group_poly.signed_area().abs() < other_area {
                        continue;
                    }
                }
                let loose = other_poly.pad_convex(INTERSECTION_EPSILON * 10.0);
                points.extend_from_slice(loose.points());
                grew = true;
            }
            if grew {
                let hull = Polyline::convex_hull(points).rounded_and_simplified();
                if grown[g.0].as_ref() != Some(&hull) {
                    grown[g.0] = Some(hull);
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    for (i, poly) in grown.into_iter().enumerate() {
        if let Some(poly) = poly {
            let id = HullId(out.hulls.len());
            let hull = OverlapConvexHull::with_polyline(id, ObstacleId(i), poly);
            obstacles[i].set_convex_hull(id, hull.polyline(), true);
            out.hulls.push(hull);
        }
    }
}
