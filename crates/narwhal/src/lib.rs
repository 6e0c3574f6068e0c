#![forbid(unsafe_code)]

//! Rectilinear edge routing around obstacles.
//!
//! Shapes become padded obstacles; touching obstacles are accreted into clumps and convex
//! hulls. Scan segments swept through the free space form an orthogonal visibility graph, and
//! each edge is routed by splicing its ports into that graph, running a bend-penalized A*
//! search, and unsplicing again. Paths sharing a corridor are nudged apart at the end.
//!
//! ```no_run
//! use narwhal::{Curve, EdgeGeometry, Port, RectilinearRouter, RouterOptions, Shape, point};
//!
//! let mut router = RectilinearRouter::new(RouterOptions::default());
//! let a = router.add_shape(Shape::new(Curve::rectangle_centered(point(0.0, 0.0), 20.0, 20.0)));
//! let b = router.add_shape(Shape::new(Curve::rectangle_centered(point(100.0, 0.0), 20.0, 20.0)));
//! let pa = router.add_port(Port::relative(a, narwhal::vector(0.0, 0.0)));
//! let pb = router.add_port(Port::relative(b, narwhal::vector(0.0, 0.0)));
//! let edge = router.add_edge_geometry(EdgeGeometry::new(pa, pb));
//! router.run()?;
//! let curve = router.edge_geometry(edge).and_then(|e| e.curve.as_ref());
//! # let _ = curve;
//! # Ok::<(), narwhal::Error>(())
//! ```

pub use narwhal_geometry as geometry;
pub use narwhal_geometry::{Curve, Directions, Point, Polyline, Rect, Vector, point, vector};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod accretion;
mod disjoint_set;
pub mod error;
pub mod model;
pub mod nudger;
pub mod observer;
pub mod obstacle;
pub mod obstacle_tree;
pub mod options;
pub mod path_search;
pub mod port_manager;
pub mod router;
pub mod scan_segment;
pub mod snapshot;
pub mod verifier;
pub mod visibility_graph;

pub use accretion::{Clump, OverlapConvexHull, SuperClump, SuperClumpMap};
pub use error::{EndpointDescription, Error, Result};
pub use model::{Arrowhead, EdgeGeometry, EdgeId, Port, PortEntry, PortId, PortKind, Shape, ShapeId};
pub use observer::{NoopObserver, RouterObserver};
pub use obstacle::{ClumpId, HullId, Obstacle, ObstacleId, OverlapMembership};
pub use obstacle_tree::{Barrier, ObstacleTree};
pub use options::RouterOptions;
pub use router::RectilinearRouter;
pub use scan_segment::{ScanDirection, ScanSegment, ScanSegmentSet};
pub use snapshot::RouterSnapshot;
pub use verifier::{VerificationFailure, verify};
pub use visibility_graph::{EdgeIndex, VertexIndex, VisibilityEdge, VisibilityGraph, VisibilityVertex};
