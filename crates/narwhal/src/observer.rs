//! Callbacks injected into the router at construction. Every method defaults to a no-op.

use narwhal_geometry::Point;

use crate::model::EdgeId;
use crate::obstacle_tree::ObstacleTree;
use crate::visibility_graph::VisibilityGraph;

pub trait RouterObserver {
    fn obstacle_tree_built(&mut self, _tree: &ObstacleTree) {}

    fn visibility_graph_built(&mut self, _graph: &VisibilityGraph) {}

    /// Ports of `edge` have been spliced; the graph holds its transient vertices.
    fn ports_spliced(&mut self, _edge: EdgeId, _graph: &VisibilityGraph) {}

    fn path_routed(&mut self, _edge: EdgeId, _points: &[Point]) {}

    /// Transient state of `edge` has been removed.
    fn visibility_graph_restored(&mut self, _edge: EdgeId, _graph: &VisibilityGraph) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RouterObserver for NoopObserver {}
