//! Serializable view of a routing session, for regression comparison by callers.

use narwhal_geometry::{Point, Polyline};
use serde::Serialize;

use crate::model::{EdgeGeometry, EdgeId, ShapeId};
use crate::obstacle::ObstacleId;
use crate::router::RoutingIndex;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObstacleSnapshot {
    pub shape: ShapeId,
    pub is_group: bool,
    pub padded: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSnapshot {
    pub members: Vec<ShapeId>,
    pub polygon: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSegmentSnapshot {
    pub start: [f64; 2],
    pub end: [f64; 2],
    pub overlapped: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdgeSnapshot {
    pub source: [f64; 2],
    pub target: [f64; 2],
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathSnapshot {
    pub edge: EdgeId,
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterSnapshot {
    pub obstacles: Vec<ObstacleSnapshot>,
    pub clumps: Vec<RegionSnapshot>,
    pub convex_hulls: Vec<RegionSnapshot>,
    pub scan_segments: Vec<ScanSegmentSnapshot>,
    pub vertices: Vec<[f64; 2]>,
    pub edges: Vec<GraphEdgeSnapshot>,
    pub paths: Vec<PathSnapshot>,
}

fn xy(p: Point) -> [f64; 2] {
    [p.x, p.y]
}

fn polygon(poly: &Polyline) -> Vec<[f64; 2]> {
    poly.points().iter().copied().map(xy).collect()
}

impl RouterSnapshot {
    pub(crate) fn capture<'a>(
        index: &RoutingIndex,
        edges: impl Iterator<Item = (EdgeId, &'a EdgeGeometry)>,
    ) -> Self {
        let tree = &index.tree;
        let shape_of = |id: &ObstacleId| tree.obstacle(*id).shape();

        let obstacles = tree
            .obstacles()
            .iter()
            .map(|o| ObstacleSnapshot {
                shape: o.shape(),
                is_group: o.is_group(),
                padded: polygon(o.padded_polyline()),
            })
            .collect();
        let clumps = tree
            .clumps()
            .iter()
            .map(|c| RegionSnapshot {
                members: c.members().iter().map(shape_of).collect(),
                polygon: polygon(c.polyline()),
            })
            .collect();
        let convex_hulls = tree
            .convex_hulls()
            .iter()
            .map(|h| RegionSnapshot {
                members: h.members().iter().map(shape_of).collect(),
                polygon: polygon(h.polyline()),
            })
            .collect();
        let scan_segments = index
            .segments
            .horizontal()
            .iter()
            .chain(index.segments.vertical())
            .map(|s| ScanSegmentSnapshot {
                start: xy(s.start),
                end: xy(s.end),
                overlapped: s.overlapped,
            })
            .collect();
        let vertices = index.graph.vertices().map(|(_, v)| xy(v.point)).collect();
        let graph_edges = index
            .graph
            .edges()
            .map(|(_, e)| GraphEdgeSnapshot {
                source: xy(index.graph.point(e.source)),
                target: xy(index.graph.point(e.target)),
                weight: e.weight,
            })
            .collect();
        let paths = edges
            .filter_map(|(id, e)| {
                e.curve.as_ref().map(|c| PathSnapshot {
                    edge: id,
                    points: polygon(c),
                })
            })
            .collect();

        Self {
            obstacles,
            clumps,
            convex_hulls,
            scan_segments,
            vertices,
            edges: graph_edges,
            paths,
        }
    }
}
