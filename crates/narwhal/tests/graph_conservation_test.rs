use std::cell::RefCell;
use std::rc::Rc;

use narwhal::{
    Curve, EdgeGeometry, EdgeId, ObstacleTree, Port, RectilinearRouter, RouterObserver,
    RouterOptions, Shape, VisibilityGraph, point, vector,
};

#[derive(Debug, Default)]
struct Counts {
    built: Option<(usize, usize)>,
    spliced: Vec<(EdgeId, usize, usize)>,
    restored: Vec<(EdgeId, usize, usize)>,
    obstacles: usize,
}

#[derive(Clone, Default)]
struct CountingObserver(Rc<RefCell<Counts>>);

impl RouterObserver for CountingObserver {
    fn obstacle_tree_built(&mut self, tree: &ObstacleTree) {
        self.0.borrow_mut().obstacles = tree.obstacles().len();
    }

    fn visibility_graph_built(&mut self, graph: &VisibilityGraph) {
        self.0.borrow_mut().built = Some((graph.vertex_count(), graph.edge_count()));
    }

    fn ports_spliced(&mut self, edge: EdgeId, graph: &VisibilityGraph) {
        self.0
            .borrow_mut()
            .spliced
            .push((edge, graph.transient_vertex_count(), graph.transient_edge_count()));
    }

    fn visibility_graph_restored(&mut self, edge: EdgeId, graph: &VisibilityGraph) {
        self.0
            .borrow_mut()
            .restored
            .push((edge, graph.vertex_count(), graph.edge_count()));
    }
}

fn grid_router(observer: CountingObserver) -> RectilinearRouter {
    let mut router = RectilinearRouter::with_observer(RouterOptions::default(), observer);
    let mut ports = Vec::new();
    for i in 0..3 {
        for j in 0..3 {
            let s = router.add_shape(Shape::new(Curve::rectangle_centered(
                point(i as f64 * 60.0, j as f64 * 50.0),
                20.0,
                16.0,
            )));
            ports.push(router.add_port(Port::relative(s, vector(0.0, 0.0))));
        }
    }
    for (a, b) in [(0, 8), (2, 6), (1, 7), (3, 5), (0, 4)] {
        router.add_edge_geometry(EdgeGeometry::new(ports[a], ports[b]));
    }
    router
}

#[test]
fn graph_conservation_every_route_restores_the_base_graph() {
    let observer = CountingObserver::default();
    let counts = observer.0.clone();
    let mut router = grid_router(observer);

    router.run().unwrap();

    let counts = counts.borrow();
    assert_eq!(counts.obstacles, 9);
    let (vertices, edges) = counts.built.unwrap();
    assert!(vertices > 0 && edges > 0);
    assert_eq!(counts.spliced.len(), 5);
    assert!(counts.spliced.iter().all(|(_, v, _)| *v > 0));
    assert_eq!(counts.restored.len(), 5);
    for (_, v, e) in &counts.restored {
        assert_eq!((*v, *e), (vertices, edges));
    }

    let graph = router.visibility_graph().unwrap();
    assert_eq!(graph.transient_vertex_count(), 0);
    assert_eq!(graph.transient_edge_count(), 0);
    assert_eq!((graph.vertex_count(), graph.edge_count()), (vertices, edges));
}

#[test]
fn graph_conservation_holds_across_repeated_runs() {
    let mut router = grid_router(CountingObserver::default());
    router.run().unwrap();
    let first: Vec<_> = router
        .edge_geometries()
        .map(|(id, e)| (id, e.curve.clone()))
        .collect();
    router.run().unwrap();
    let second: Vec<_> = router
        .edge_geometries()
        .map(|(id, e)| (id, e.curve.clone()))
        .collect();
    assert_eq!(first, second);
    assert_eq!(router.index_builds(), 1);
    assert!(narwhal::verify(&router).is_empty());
}

#[test]
fn graph_conservation_edges_connect_distinct_aligned_vertices() {
    let mut router = grid_router(CountingObserver::default());
    router.run().unwrap();
    let graph = router.visibility_graph().unwrap();
    for (_, e) in graph.edges() {
        let (a, b) = (graph.point(e.source), graph.point(e.target));
        assert_ne!(a, b);
        assert!(a.x == b.x || a.y == b.y);
        assert!(a.x < b.x || a.y < b.y, "edge runs west or south");
    }
    for (v, vertex) in graph.vertices() {
        assert_eq!(graph.vertex_at(vertex.point), Some(v));
        assert!(vertex.degree() <= 4);
    }
}
