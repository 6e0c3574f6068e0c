//! Separates path segments that share a corridor.
//!
//! Only interior segments move: the first and last segment of every path and any segment
//! touching a waypoint keep their coordinate, so path end points never move. Movable segments
//! on the same line with overlapping extents form a cluster; the cluster is spread by multiples
//! of the edge separation in a stable order and then shifted (or squeezed) into the band left
//! free by the neighbouring obstacles. A cluster holding a fixed segment keeps that line for
//! the fixed segment alone and places the movable ones on either side of it.

use std::collections::BTreeMap;

use narwhal_geometry::epsilon::{self, DISTANCE_EPSILON};
use narwhal_geometry::{Point, RectExt};

use crate::model::{EdgeId, PortId};
use crate::obstacle_tree::ObstacleTree;
use crate::scan_segment::ScanDirection;

/// A routed path as the nudger sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct NudgePath {
    pub edge: EdgeId,
    pub source_port: PortId,
    pub target_port: PortId,
    pub points: Vec<Point>,
    /// Indices into `points` of waypoints.
    pub fixed: Vec<usize>,
}

#[derive(Debug, Clone)]
struct PathSegment {
    path: usize,
    index: usize,
    direction: ScanDirection,
    coordinate: f64,
    lo: f64,
    hi: f64,
    movable: bool,
}

/// Removes repeated points and interior points that lie on a straight run, keeping waypoints.
pub fn normalize(points: &[Point], fixed: &[usize]) -> (Vec<Point>, Vec<usize>) {
    let mut pts: Vec<(Point, bool)> = Vec::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        let is_fixed = fixed.contains(&i);
        match pts.last_mut() {
            Some((last, last_fixed)) if epsilon::points_close(*last, *p) => {
                *last_fixed |= is_fixed;
            }
            _ => pts.push((*p, is_fixed)),
        }
    }
    let mut i = 1;
    while i + 1 < pts.len() {
        let (a, (b, b_fixed), c) = (pts[i - 1].0, pts[i], pts[i + 1].0);
        let straight = (epsilon::close(a.x, b.x) && epsilon::close(b.x, c.x))
            || (epsilon::close(a.y, b.y) && epsilon::close(b.y, c.y));
        if straight && !b_fixed {
            pts.remove(i);
        } else {
            i += 1;
        }
    }
    let fixed = pts
        .iter()
        .enumerate()
        .filter(|(_, (_, f))| *f)
        .map(|(i, _)| i)
        .collect();
    (pts.into_iter().map(|(p, _)| p).collect(), fixed)
}

pub fn nudge(paths: &mut [NudgePath], tree: &ObstacleTree, separation: f64) {
    for path in paths.iter_mut() {
        let (points, fixed) = normalize(&path.points, &path.fixed);
        path.points = points;
        path.fixed = fixed;
    }

    let mut segments: Vec<PathSegment> = Vec::new();
    for (pi, path) in paths.iter().enumerate() {
        let n = path.points.len();
        for (si, w) in path.points.windows(2).enumerate() {
            let Some(direction) = ScanDirection::of(w[0], w[1]) else {
                continue;
            };
            let (a, b) = (direction.along(w[0]), direction.along(w[1]));
            let touches_waypoint = path.fixed.contains(&si) || path.fixed.contains(&(si + 1));
            segments.push(PathSegment {
                path: pi,
                index: si,
                direction,
                coordinate: direction.coordinate(w[0]),
                lo: a.min(b),
                hi: a.max(b),
                movable: si != 0 && si + 2 != n && !touches_waypoint,
            });
        }
    }

    let mut corridors: BTreeMap<(ScanDirection, i64), Vec<usize>> = BTreeMap::new();
    for (i, s) in segments.iter().enumerate() {
        let key = epsilon::point_key(s.direction.point(0.0, s.coordinate));
        let c = match s.direction {
            ScanDirection::Horizontal => key.1,
            ScanDirection::Vertical => key.0,
        };
        corridors.entry((s.direction, c)).or_default().push(i);
    }

    let mut moved: BTreeMap<usize, f64> = BTreeMap::new();
    for members in corridors.values() {
        let mut members = members.clone();
        members.sort_by(|a, b| segments[*a].lo.total_cmp(&segments[*b].lo));
        let mut cluster: Vec<usize> = Vec::new();
        let mut reach = f64::NEG_INFINITY;
        for m in members {
            if !cluster.is_empty() && segments[m].lo >= reach - DISTANCE_EPSILON {
                spread(&cluster, &segments, paths, tree, separation, &mut moved);
                cluster.clear();
                reach = f64::NEG_INFINITY;
            }
            reach = reach.max(segments[m].hi);
            cluster.push(m);
        }
        spread(&cluster, &segments, paths, tree, separation, &mut moved);
    }

    for (pi, path) in paths.iter_mut().enumerate() {
        let coords: Vec<(ScanDirection, f64)> = segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.path == pi)
            .map(|(i, s)| (s.direction, moved.get(&i).copied().unwrap_or(s.coordinate)))
            .collect();
        if coords.len() + 1 != path.points.len() {
            continue;
        }
        let last = path.points.len() - 1;
        for k in 1..last {
            let (da, ca) = coords[k - 1];
            let (_, cb) = coords[k];
            path.points[k] = match da {
                ScanDirection::Horizontal => epsilon::round_point(Point::new(cb, ca)),
                ScanDirection::Vertical => epsilon::round_point(Point::new(ca, cb)),
            };
        }
        let (points, fixed) = normalize(&path.points, &path.fixed);
        path.points = points;
        path.fixed = fixed;
    }
}

fn spread(
    cluster: &[usize],
    segments: &[PathSegment],
    paths: &[NudgePath],
    tree: &ObstacleTree,
    separation: f64,
    moved: &mut BTreeMap<usize, f64>,
) {
    let anchored = cluster.iter().any(|i| !segments[*i].movable);
    let mut movable: Vec<usize> = cluster
        .iter()
        .copied()
        .filter(|i| segments[*i].movable)
        .collect();
    if movable.is_empty() || (movable.len() == 1 && !anchored) {
        return;
    }
    movable.sort_by_key(|i| {
        let s = &segments[*i];
        let p = &paths[s.path];
        (p.source_port, p.target_port, p.edge, s.index)
    });

    let first = &segments[movable[0]];
    let c = first.coordinate;
    let lo = movable.iter().map(|i| segments[*i].lo).fold(f64::INFINITY, f64::min);
    let hi = movable.iter().map(|i| segments[*i].hi).fold(f64::NEG_INFINITY, f64::max);
    let (lower, upper) = free_band(tree, first.direction, c, lo, hi);
    if upper - lower <= DISTANCE_EPSILON {
        return;
    }

    let inside = c >= lower - DISTANCE_EPSILON && c <= upper + DISTANCE_EPSILON;
    let targets = if anchored && inside {
        slots_around(c, movable.len(), lower, upper, separation)
    } else {
        centered_slots(c, movable.len(), lower, upper, separation)
    };
    for (i, target) in movable.iter().zip(targets) {
        moved.insert(*i, epsilon::round(target));
    }
}

/// `k` distinct coordinates in `[lower, upper]` centred on `c`, shifted into the band and
/// squeezed evenly across it when `k` separations do not fit.
fn centered_slots(c: f64, k: usize, lower: f64, upper: f64, separation: f64) -> Vec<f64> {
    let span = (k as f64 - 1.0) * separation;
    if span > upper - lower {
        let step = (upper - lower) / (k as f64 - 1.0);
        return (0..k).map(|i| lower + step * i as f64).collect();
    }
    let start = (c - span / 2.0).clamp(lower, upper - span);
    (0..k).map(|i| start + separation * i as f64).collect()
}

/// `k` distinct coordinates in `[lower, upper]` next to an anchored segment on `c`, none of
/// them on `c`. Slots alternate above and below `c` one separation apart while the band has
/// room; otherwise each side's share is spread evenly over its open interval.
fn slots_around(c: f64, k: usize, lower: f64, upper: f64, separation: f64) -> Vec<f64> {
    let above = (upper - c).max(0.0);
    let below = (c - lower).max(0.0);
    let fits = |room: f64| ((room + DISTANCE_EPSILON) / separation).floor() as usize;
    let (cap_above, cap_below) = (fits(above), fits(below));

    let mut out = Vec::with_capacity(k);
    if cap_above + cap_below >= k {
        let (mut n_above, mut n_below) = (0, 0);
        while out.len() < k {
            if n_above < cap_above && (n_above <= n_below || n_below >= cap_below) {
                n_above += 1;
                out.push(c + separation * n_above as f64);
            } else {
                n_below += 1;
                out.push(c - separation * n_below as f64);
            }
        }
        return out;
    }

    let n_above = if below <= DISTANCE_EPSILON {
        k
    } else if above <= DISTANCE_EPSILON {
        0
    } else if k == 1 {
        usize::from(above >= below)
    } else {
        ((k as f64 * above / (above + below)).round() as usize).clamp(1, k - 1)
    };
    let n_below = k - n_above;
    let step_above = above / (n_above as f64 + 1.0);
    let step_below = below / (n_below as f64 + 1.0);
    out.extend((1..=n_above).map(|i| c + step_above * i as f64));
    out.extend((1..=n_below).map(|i| c - step_below * i as f64));
    out
}

/// Coordinates a segment on `coordinate` spanning `[lo, hi]` may move between without entering
/// an obstacle's padded box. Groups containing the segment bound it from the inside.
fn free_band(tree: &ObstacleTree, direction: ScanDirection, coordinate: f64, lo: f64, hi: f64) -> (f64, f64) {
    let graph_box = tree.graph_box();
    let (mut lower, mut upper) = match direction {
        ScanDirection::Horizontal => (graph_box.bottom(), graph_box.top()),
        ScanDirection::Vertical => (graph_box.left(), graph_box.right()),
    };
    for o in tree.obstacles() {
        let b = o.padded_box();
        let (b_lo, b_hi) = (direction.along(b.min), direction.along(b.max));
        let (b_below, b_above) = (direction.coordinate(b.min), direction.coordinate(b.max));
        if b_lo >= hi - DISTANCE_EPSILON || b_hi <= lo + DISTANCE_EPSILON {
            continue;
        }
        if o.is_group() {
            let contains = b_below < coordinate - DISTANCE_EPSILON
                && b_above > coordinate + DISTANCE_EPSILON
                && b_lo <= lo + DISTANCE_EPSILON
                && b_hi >= hi - DISTANCE_EPSILON;
            if contains {
                lower = lower.max(b_below);
                upper = upper.min(b_above);
            }
            continue;
        }
        if b_above <= coordinate + DISTANCE_EPSILON {
            lower = lower.max(b_above);
        } else if b_below >= coordinate - DISTANCE_EPSILON {
            upper = upper.min(b_below);
        }
    }
    (lower, upper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use narwhal_geometry::point;

    #[test]
    fn normalize_drops_collinear_points_but_keeps_waypoints() {
        let points = [
            point(0.0, 0.0),
            point(5.0, 0.0),
            point(5.0, 0.0),
            point(10.0, 0.0),
            point(10.0, 10.0),
        ];
        let (out, fixed) = normalize(&points, &[]);
        assert_eq!(out, vec![point(0.0, 0.0), point(10.0, 0.0), point(10.0, 10.0)]);
        assert!(fixed.is_empty());

        let (out, fixed) = normalize(&points, &[1]);
        assert_eq!(out.len(), 4);
        assert_eq!(fixed, vec![1]);
    }

    #[test]
    fn anchored_slots_skip_the_anchor_and_a_closed_side() {
        assert_eq!(slots_around(10.0, 3, 0.0, 20.0, 1.0), vec![11.0, 9.0, 12.0]);
        assert_eq!(slots_around(10.0, 2, 10.0, 20.0, 1.0), vec![11.0, 12.0]);
        assert_eq!(slots_around(10.0, 2, 5.0, 10.0, 1.0), vec![9.0, 8.0]);
    }

    #[test]
    fn anchored_slots_squeeze_into_a_narrow_band() {
        let slots = slots_around(10.0, 3, 10.0, 11.5, 1.0);
        assert_eq!(slots, vec![10.375, 10.75, 11.125]);

        let slots = slots_around(10.0, 1, 9.5, 10.25, 1.0);
        assert_eq!(slots, vec![9.75]);
    }

    #[test]
    fn centered_slots_shift_and_squeeze() {
        assert_eq!(centered_slots(10.0, 3, 0.0, 20.0, 1.0), vec![9.0, 10.0, 11.0]);
        assert_eq!(centered_slots(10.0, 3, 10.0, 20.0, 1.0), vec![10.0, 11.0, 12.0]);
        assert_eq!(centered_slots(10.0, 3, 10.0, 11.5, 1.0), vec![10.0, 10.75, 11.5]);
    }
}
