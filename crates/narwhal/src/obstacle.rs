use narwhal_geometry::epsilon::INTERSECTION_EPSILON;
use narwhal_geometry::{Point, Polyline, Rect, RectExt};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{Shape, ShapeId};
use crate::options::RouterOptions;

/// Dense index of an obstacle inside one [`crate::ObstacleTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ObstacleId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClumpId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct HullId(pub usize);

/// Overlap accretion state. Clump and convex hull membership cannot coexist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapMembership {
    #[default]
    None,
    Clump(ClumpId),
    ConvexHull(HullId),
}

/// Router-side wrapper around a [`Shape`].
#[derive(Debug, Clone)]
pub struct Obstacle {
    id: ObstacleId,
    shape: ShapeId,
    is_group: bool,
    is_rectangle: bool,
    boundary: Polyline,
    padded: Polyline,
    padded_box: Rect,
    loose: Polyline,
    membership: OverlapMembership,
    is_primary: bool,
    visibility: Polyline,
    visibility_box: Rect,
}

impl Obstacle {
    pub fn new(
        id: ObstacleId,
        shape_id: ShapeId,
        shape: &Shape,
        options: &RouterOptions,
    ) -> Result<Self> {
        let bbox = shape.boundary.bounding_box();
        if !(bbox.width() > 0.0 && bbox.height() > 0.0) {
            return Err(Error::DegenerateBoundary { shape: shape_id });
        }
        let segments = options.curve_segments;
        let (padded, is_rectangle) = if options.use_obstacle_rectangles {
            let p = Polyline::from_rect(&bbox.padded(options.padding)).rounded_and_simplified();
            (p, true)
        } else {
            let p = shape.boundary.padded_polyline(options.padding, segments);
            let is_rect = p.is_axis_aligned_rectangle();
            (p, is_rect)
        };
        if padded.len() < 3 {
            return Err(Error::DegenerateBoundary { shape: shape_id });
        }
        let padded_box = padded.bounding_box();
        let loose = if is_rectangle {
            Polyline::from_rect(&padded_box.padded(INTERSECTION_EPSILON * 10.0))
        } else {
            padded.pad_convex(INTERSECTION_EPSILON * 10.0)
        };
        Ok(Self {
            id,
            shape: shape_id,
            is_group: shape.is_group,
            is_rectangle,
            boundary: shape.boundary.approximate(segments),
            visibility: padded.clone(),
            visibility_box: padded_box,
            padded,
            padded_box,
            loose,
            membership: OverlapMembership::None,
            is_primary: true,
        })
    }

    pub fn id(&self) -> ObstacleId {
        self.id
    }

    pub fn shape(&self) -> ShapeId {
        self.shape
    }

    pub fn is_group(&self) -> bool {
        self.is_group
    }

    pub fn is_rectangle(&self) -> bool {
        self.is_rectangle
    }

    /// Polygonal approximation of the unpadded boundary.
    pub fn boundary(&self) -> &Polyline {
        &self.boundary
    }

    pub fn padded_polyline(&self) -> &Polyline {
        &self.padded
    }

    pub fn padded_box(&self) -> Rect {
        self.padded_box
    }

    pub fn visibility_polyline(&self) -> &Polyline {
        &self.visibility
    }

    pub fn visibility_box(&self) -> Rect {
        self.visibility_box
    }

    pub fn membership(&self) -> OverlapMembership {
        self.membership
    }

    pub fn clump(&self) -> Option<ClumpId> {
        match self.membership {
            OverlapMembership::Clump(c) => Some(c),
            _ => None,
        }
    }

    pub fn convex_hull(&self) -> Option<HullId> {
        match self.membership {
            OverlapMembership::ConvexHull(h) => Some(h),
            _ => None,
        }
    }

    /// Member of a clump.
    pub fn is_overlapped(&self) -> bool {
        self.clump().is_some()
    }

    pub fn is_in_convex_hull(&self) -> bool {
        self.convex_hull().is_some()
    }

    pub fn is_accreted(&self) -> bool {
        self.membership != OverlapMembership::None
    }

    /// Represents its clump or hull in the primary hierarchy (or belongs to neither).
    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    pub fn center(&self) -> Point {
        self.padded_box.center()
    }

    pub(crate) fn reset_overlap(&mut self) {
        self.membership = OverlapMembership::None;
        self.is_primary = true;
        self.visibility = self.padded.clone();
        self.visibility_box = self.padded_box;
    }

    pub(crate) fn set_clump(&mut self, clump: ClumpId, polygon: &Polyline, primary: bool) {
        self.membership = OverlapMembership::Clump(clump);
        self.set_visibility(polygon, primary);
    }

    pub(crate) fn set_convex_hull(&mut self, hull: HullId, polygon: &Polyline, primary: bool) {
        self.membership = OverlapMembership::ConvexHull(hull);
        self.is_rectangle = false;
        self.set_visibility(polygon, primary);
    }

    fn set_visibility(&mut self, polygon: &Polyline, primary: bool) {
        self.visibility = polygon.clone();
        self.visibility_box = polygon.bounding_box();
        self.is_primary = primary;
    }
}

/// Touching or crossing boundaries, or one polygon inside the other.
pub fn polylines_intersect(a: &Polyline, b: &Polyline) -> bool {
    if !a.bounding_box().intersects_inclusive(&b.bounding_box()) {
        return false;
    }
    if a.boundary_intersects(b) {
        return true;
    }
    match (a.start(), b.start()) {
        (Some(pa), Some(pb)) => b.contains_inclusive(pa) || a.contains_inclusive(pb),
        _ => false,
    }
}

/// Overlap test used by accretion; curved shapes use their loose polygons so that shapes
/// separated only by rounding noise still count as touching.
pub(crate) fn obstacles_intersect(a: &Obstacle, b: &Obstacle) -> bool {
    if a.is_rectangle && b.is_rectangle {
        return a.padded_box.intersects_inclusive(&b.padded_box);
    }
    polylines_intersect(&a.loose, &b.loose)
}
