use narwhal_geometry::{Polyline, Rect};

use crate::obstacle::{ClumpId, Obstacle, ObstacleId};

/// Mutually overlapping rectangular non-group obstacles, routed around as one rectangle.
#[derive(Debug, Clone)]
pub struct Clump {
    id: ClumpId,
    members: Vec<ObstacleId>,
    polyline: Polyline,
}

impl Clump {
    pub(crate) fn new(id: ClumpId, members: Vec<ObstacleId>, obstacles: &[Obstacle]) -> Self {
        let rect = members
            .iter()
            .map(|m| obstacles[m.0].padded_box())
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(Rect::zero);
        Self {
            id,
            members,
            polyline: Polyline::from_rect(&rect),
        }
    }

    pub fn id(&self) -> ClumpId {
        self.id
    }

    /// Sorted ascending.
    pub fn members(&self) -> &[ObstacleId] {
        &self.members
    }

    pub fn contains(&self, id: ObstacleId) -> bool {
        self.members.binary_search(&id).is_ok()
    }

    pub fn polyline(&self) -> &Polyline {
        &self.polyline
    }

    pub fn rect(&self) -> Rect {
        self.polyline.bounding_box()
    }

    pub fn primary(&self) -> ObstacleId {
        self.members[0]
    }
}
