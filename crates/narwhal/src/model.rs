//! Caller-facing data model: shapes, ports and edge geometries, addressed by integer handles
//! into the arena owned by a [`crate::RectilinearRouter`].

use std::fmt;

use narwhal_geometry::{Curve, Point, Polyline, Vector};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShapeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub usize);

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shape#{}", self.0)
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "port#{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edge#{}", self.0)
    }
}

/// An obstacle or routable node.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub boundary: Curve,
    pub children: Vec<ShapeId>,
    /// Ports attached to this shape; changing only these never rebuilds the routing index.
    pub ports: Vec<PortId>,
    pub is_group: bool,
}

impl Shape {
    pub fn new(boundary: Curve) -> Self {
        Self {
            boundary,
            children: Vec::new(),
            ports: Vec::new(),
            is_group: false,
        }
    }

    pub fn group(boundary: Curve, children: impl IntoIterator<Item = ShapeId>) -> Self {
        Self {
            boundary,
            children: children.into_iter().collect(),
            ports: Vec::new(),
            is_group: true,
        }
    }

    pub fn with_ports(mut self, ports: impl IntoIterator<Item = PortId>) -> Self {
        self.ports = ports.into_iter().collect();
        self
    }

    /// Same obstacle geometry and hierarchy; only the attached ports may differ.
    pub fn same_geometry(&self, other: &Shape) -> bool {
        self.boundary == other.boundary
            && self.children == other.children
            && self.is_group == other.is_group
    }
}

/// Where a port sits.
#[derive(Debug, Clone, PartialEq)]
pub enum PortKind {
    /// An absolute location.
    Floating { location: Point },
    /// An offset from the owning shape's center, re-evaluated whenever the shape moves.
    RelativeFloating { offset: Vector },
    /// Candidate offsets from the owning shape's center; the router picks one per route.
    MultiLocationFloating { offsets: Vec<Vector> },
}

/// Parametric spans of the owning shape's boundary where a path may enter.
///
/// Parameters are normalized to `[0, 1)` clockwise along the boundary, as produced by
/// [`Curve::parameter_of`]. A span with `start > end` wraps past `1`.
#[derive(Debug, Clone, PartialEq)]
pub struct PortEntry {
    pub spans: Vec<(f64, f64)>,
}

impl PortEntry {
    pub fn new(spans: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Self {
            spans: spans.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    pub kind: PortKind,
    pub shape: Option<ShapeId>,
    pub entry: Option<PortEntry>,
    /// Index into the offsets of a multi-location port, chosen by the last route.
    pub active_offset: Option<usize>,
}

impl Port {
    /// A free point not attached to any shape.
    pub fn free(location: Point) -> Self {
        Self {
            kind: PortKind::Floating { location },
            shape: None,
            entry: None,
            active_offset: None,
        }
    }

    /// An absolute point that belongs to `shape` (typically its center or a point on it).
    pub fn floating(shape: ShapeId, location: Point) -> Self {
        Self {
            kind: PortKind::Floating { location },
            shape: Some(shape),
            entry: None,
            active_offset: None,
        }
    }

    pub fn relative(shape: ShapeId, offset: Vector) -> Self {
        Self {
            kind: PortKind::RelativeFloating { offset },
            shape: Some(shape),
            entry: None,
            active_offset: None,
        }
    }

    pub fn multi_location(shape: ShapeId, offsets: impl IntoIterator<Item = Vector>) -> Self {
        Self {
            kind: PortKind::MultiLocationFloating {
                offsets: offsets.into_iter().collect(),
            },
            shape: Some(shape),
            entry: None,
            active_offset: None,
        }
    }

    pub fn with_entry(mut self, entry: PortEntry) -> Self {
        self.entry = Some(entry);
        self
    }

    /// Candidate locations given the owning shape's center (if any).
    pub fn locations(&self, center: Option<Point>) -> Vec<Point> {
        match (&self.kind, center) {
            (PortKind::Floating { location }, _) => vec![*location],
            (PortKind::RelativeFloating { offset }, Some(c)) => vec![c + *offset],
            (PortKind::MultiLocationFloating { offsets }, Some(c)) => {
                offsets.iter().map(|o| c + *o).collect()
            }
            (_, None) => Vec::new(),
        }
    }
}

/// Arrowhead drawn at one end of a routed edge.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Arrowhead {
    pub length: f64,
    /// Tip of the arrow, filled in when the edge is finalized.
    pub tip: Option<Point>,
}

impl Arrowhead {
    pub fn new(length: f64) -> Self {
        Self { length, tip: None }
    }
}

/// A request to route one connector.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeGeometry {
    pub source: PortId,
    pub target: PortId,
    pub source_arrowhead: Option<Arrowhead>,
    pub target_arrowhead: Option<Arrowhead>,
    pub line_width: f64,
    pub waypoints: Vec<Point>,
    /// The routed polyline, present after a successful route.
    pub curve: Option<Polyline>,
}

impl EdgeGeometry {
    pub fn new(source: PortId, target: PortId) -> Self {
        Self {
            source,
            target,
            source_arrowhead: None,
            target_arrowhead: None,
            line_width: 1.0,
            waypoints: Vec::new(),
            curve: None,
        }
    }

    pub fn with_waypoints(mut self, waypoints: impl IntoIterator<Item = Point>) -> Self {
        self.waypoints = waypoints.into_iter().collect();
        self
    }

    pub fn with_source_arrowhead(mut self, length: f64) -> Self {
        self.source_arrowhead = Some(Arrowhead::new(length));
        self
    }

    pub fn with_target_arrowhead(mut self, length: f64) -> Self {
        self.target_arrowhead = Some(Arrowhead::new(length));
        self
    }
}
