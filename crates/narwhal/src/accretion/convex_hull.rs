use narwhal_geometry::Polyline;

use crate::obstacle::{HullId, Obstacle, ObstacleId};

/// Convex polygon enclosing overlapping non-rectangular obstacles, or one grown group.
#[derive(Debug, Clone)]
pub struct OverlapConvexHull {
    id: HullId,
    members: Vec<ObstacleId>,
    polyline: Polyline,
}

impl OverlapConvexHull {
    /// Hull around the padded polygons of `members`.
    pub(crate) fn around(id: HullId, members: Vec<ObstacleId>, obstacles: &[Obstacle]) -> Self {
        let polyline = Polyline::convex_hull(
            members
                .iter()
                .flat_map(|m| obstacles[m.0].padded_polyline().points().iter().copied()),
        )
        .rounded_and_simplified();
        Self {
            id,
            members,
            polyline,
        }
    }

    /// Hull with an explicit polygon; used for groups grown around their overlaps.
    pub(crate) fn with_polyline(id: HullId, member: ObstacleId, polyline: Polyline) -> Self {
        Self {
            id,
            members: vec![member],
            polyline,
        }
    }

    pub fn id(&self) -> HullId {
        self.id
    }

    /// Sorted ascending.
    pub fn members(&self) -> &[ObstacleId] {
        &self.members
    }

    pub fn contains(&self, id: ObstacleId) -> bool {
        self.members.binary_search(&id).is_ok()
    }

    /// Lowest member id; the only member placed in the primary hierarchy.
    pub fn primary(&self) -> ObstacleId {
        self.members[0]
    }

    pub fn polyline(&self) -> &Polyline {
        &self.polyline
    }
}
