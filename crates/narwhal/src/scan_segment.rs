//! Maximal horizontal and vertical runs of free space between obstacle boundary crossings.

use std::collections::BTreeMap;

use narwhal_geometry::epsilon::{self, DISTANCE_EPSILON};
use narwhal_geometry::{Point, Polyline, Rect, RectExt, point};
use serde::Serialize;

use crate::obstacle_tree::ObstacleTree;
use crate::visibility_graph::{NORMAL_WEIGHT, OVERLAPPED_WEIGHT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ScanDirection {
    Horizontal,
    Vertical,
}

impl ScanDirection {
    /// Orientation of an axis-aligned segment; `None` for diagonal or degenerate ones.
    pub fn of(a: Point, b: Point) -> Option<Self> {
        let same_x = epsilon::close(a.x, b.x);
        let same_y = epsilon::close(a.y, b.y);
        match (same_x, same_y) {
            (false, true) => Some(Self::Horizontal),
            (true, false) => Some(Self::Vertical),
            _ => None,
        }
    }

    pub fn perpendicular(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }

    /// The fixed coordinate of a segment in this direction (`y` for horizontal runs).
    pub fn coordinate(self, p: Point) -> f64 {
        match self {
            Self::Horizontal => p.y,
            Self::Vertical => p.x,
        }
    }

    /// The coordinate that varies along a segment in this direction.
    pub fn along(self, p: Point) -> f64 {
        match self {
            Self::Horizontal => p.x,
            Self::Vertical => p.y,
        }
    }

    pub fn point(self, along: f64, coordinate: f64) -> Point {
        match self {
            Self::Horizontal => point(along, coordinate),
            Self::Vertical => point(coordinate, along),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanSegment {
    /// Lower end (smaller `x` or `y`).
    pub start: Point,
    pub end: Point,
    /// Runs inside an accreted obstacle's padded polygon.
    pub overlapped: bool,
    pub direction: ScanDirection,
}

impl ScanSegment {
    pub fn coordinate(&self) -> f64 {
        self.direction.coordinate(self.start)
    }

    pub fn low(&self) -> f64 {
        self.direction.along(self.start)
    }

    pub fn high(&self) -> f64 {
        self.direction.along(self.end)
    }

    pub fn weight(&self) -> f64 {
        if self.overlapped {
            OVERLAPPED_WEIGHT
        } else {
            NORMAL_WEIGHT
        }
    }

    /// Whether `p` lies on the segment, end points included.
    pub fn contains_point(&self, p: Point) -> bool {
        let along = self.direction.along(p);
        epsilon::close(self.direction.coordinate(p), self.coordinate())
            && along >= self.low() - DISTANCE_EPSILON
            && along <= self.high() + DISTANCE_EPSILON
    }
}

/// Scan segments of both orientations, each sorted by coordinate and then by start.
#[derive(Debug, Clone, Default)]
pub struct ScanSegmentSet {
    horizontal: Vec<ScanSegment>,
    vertical: Vec<ScanSegment>,
}

impl ScanSegmentSet {
    pub fn build(tree: &ObstacleTree) -> Self {
        let set = Self {
            horizontal: sweep(tree, ScanDirection::Horizontal),
            vertical: sweep(tree, ScanDirection::Vertical),
        };
        tracing::debug!(
            horizontal = set.horizontal.len(),
            vertical = set.vertical.len(),
            "scan segments built"
        );
        set
    }

    pub fn horizontal(&self) -> &[ScanSegment] {
        &self.horizontal
    }

    pub fn vertical(&self) -> &[ScanSegment] {
        &self.vertical
    }

    pub fn segments(&self, direction: ScanDirection) -> &[ScanSegment] {
        match direction {
            ScanDirection::Horizontal => &self.horizontal,
            ScanDirection::Vertical => &self.vertical,
        }
    }

    pub fn len(&self) -> usize {
        self.horizontal.len() + self.vertical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Segments of `direction` whose coordinate lies in `[lo, hi]`.
    pub fn in_coordinate_range(&self, direction: ScanDirection, lo: f64, hi: f64) -> &[ScanSegment] {
        let segments = self.segments(direction);
        let from = segments.partition_point(|s| s.coordinate() < lo - DISTANCE_EPSILON);
        let to = segments.partition_point(|s| s.coordinate() <= hi + DISTANCE_EPSILON);
        &segments[from..to.max(from)]
    }

    /// The segment of `direction` that `p` lies on, if any.
    pub fn find(&self, direction: ScanDirection, p: Point) -> Option<&ScanSegment> {
        let c = direction.coordinate(p);
        self.in_coordinate_range(direction, c, c)
            .iter()
            .find(|s| s.contains_point(p))
    }
}

/// Sweep lines of one orientation across the graph box, split at every boundary crossing.
fn sweep(tree: &ObstacleTree, direction: ScanDirection) -> Vec<ScanSegment> {
    let graph_box = tree.graph_box();
    let (low, high) = match direction {
        ScanDirection::Horizontal => (graph_box.left(), graph_box.right()),
        ScanDirection::Vertical => (graph_box.bottom(), graph_box.top()),
    };

    let mut coordinates: BTreeMap<i64, f64> = BTreeMap::new();
    let mut add_coordinate = |value: f64| {
        let value = epsilon::round(value);
        coordinates.insert(coordinate_key(value), value);
    };
    for corner in [graph_box.min, graph_box.max] {
        add_coordinate(direction.coordinate(corner));
    }
    for o in tree.obstacles() {
        if o.is_primary() {
            for p in o.visibility_polyline().points() {
                add_coordinate(direction.coordinate(*p));
            }
        }
        if o.is_accreted() {
            for p in o.padded_polyline().points() {
                add_coordinate(direction.coordinate(*p));
            }
        }
    }

    let mut out = Vec::new();
    for c in coordinates.into_values() {
        let a = direction.point(low, c);
        let b = direction.point(high, c);
        let line_box = Rect::from_corners(a, b);

        let mut cuts = vec![low, high];
        let mut add_cuts = |poly: &Polyline| {
            for x in poly.intersect_segment(a, b) {
                cuts.push(epsilon::round(direction.along(x.point)));
            }
        };
        for o in tree.query_padded(line_box, |_| true) {
            add_cuts(o.padded_polyline());
        }
        for o in tree.query(line_box, |o| o.is_accreted()) {
            add_cuts(o.visibility_polyline());
        }
        cuts.sort_by(|x, y| x.total_cmp(y));
        cuts.dedup_by(|x, y| epsilon::close(*x, *y));

        for w in cuts.windows(2) {
            if w[1] - w[0] <= DISTANCE_EPSILON {
                continue;
            }
            let mid = direction.point((w[0] + w[1]) / 2.0, c);
            let probe = Rect::new(mid, mid);
            let blocked = tree
                .query(probe, |o| !o.is_group() && !o.is_accreted())
                .any(|o| o.padded_polyline().contains_strictly(mid));
            if blocked {
                continue;
            }
            let overlapped = tree
                .query_padded(probe, |o| !o.is_group() && o.is_accreted())
                .any(|o| o.padded_polyline().contains_strictly(mid));
            out.push(ScanSegment {
                start: direction.point(w[0], c),
                end: direction.point(w[1], c),
                overlapped,
                direction,
            });
        }
    }
    out
}

fn coordinate_key(value: f64) -> i64 {
    (value * 10f64.powi(epsilon::DISTANCE_EPSILON_PRECISION)).round() as i64
}
