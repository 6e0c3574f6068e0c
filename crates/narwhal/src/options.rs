use serde::{Deserialize, Serialize};

pub const DEFAULT_PADDING: f64 = 1.0;
pub const DEFAULT_EDGE_SEPARATION: f64 = 1.0;
pub const DEFAULT_BEND_PENALTY_PERCENT: f64 = 4.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouterOptions {
    /// Distance kept between paths and the obstacles they avoid.
    pub padding: f64,
    /// Lateral spacing between nudged paths sharing a corridor.
    pub edge_separation: f64,
    /// Cost of one bend, as a percentage of the manhattan distance between the endpoints.
    pub bend_penalty_percent: f64,
    /// Keep the portion of a path inside its endpoint shapes instead of trimming at the border.
    pub route_to_center: bool,
    /// Cut port splice rays at the bounding box of the two endpoint obstacles.
    pub limit_port_splice_to_endpoint_box: bool,
    /// Pad bounding boxes instead of the boundary curves.
    pub use_obstacle_rectangles: bool,
    /// Run the nudging pass after routing.
    pub nudge: bool,
    /// Polygon segments used to approximate ellipses and rounded corners.
    pub curve_segments: usize,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            padding: DEFAULT_PADDING,
            edge_separation: DEFAULT_EDGE_SEPARATION,
            bend_penalty_percent: DEFAULT_BEND_PENALTY_PERCENT,
            route_to_center: false,
            limit_port_splice_to_endpoint_box: false,
            use_obstacle_rectangles: false,
            nudge: true,
            curve_segments: 8,
        }
    }
}
