use std::fmt;

use narwhal_geometry::Point;

use crate::model::{EdgeId, PortId, ShapeId};

/// Source or target of an edge, as reported in errors and verification failures.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointDescription {
    /// `None` for a waypoint.
    pub port: Option<PortId>,
    pub shape: Option<ShapeId>,
    pub location: Point,
}

impl fmt::Display for EndpointDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{port}")?,
            None => write!(f, "waypoint")?,
        }
        write!(f, " at ({}, {})", self.location.x, self.location.y)?;
        if let Some(shape) = self.shape {
            write!(f, " on {shape}")?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown shape: {0}")]
    UnknownShape(ShapeId),
    #[error("unknown port: {0}")]
    UnknownPort(PortId),
    #[error("unknown edge geometry: {0}")]
    UnknownEdge(EdgeId),
    #[error("{port} is bound to {shape}, which is not a registered obstacle")]
    DanglingPort { port: PortId, shape: ShapeId },
    #[error("{port} has no location (a relative port needs its shape)")]
    PortWithoutLocation { port: PortId },
    #[error("invalid hierarchy at {group}: {reason}")]
    InvalidHierarchy { group: ShapeId, reason: String },
    #[error("{shape} has a degenerate boundary")]
    DegenerateBoundary { shape: ShapeId },
    #[error("no path for {edge} from {from} to {to} after enabling every group")]
    NoPath {
        edge: EdgeId,
        from: EndpointDescription,
        to: EndpointDescription,
    },
    #[error(
        "visibility graph not restored after routing {edge}: \
         vertices {vertices_before} -> {vertices_after}, edges {edges_before} -> {edges_after}"
    )]
    GraphNotRestored {
        edge: EdgeId,
        vertices_before: usize,
        vertices_after: usize,
        edges_before: usize,
        edges_after: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
