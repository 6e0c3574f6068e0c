use narwhal::{
    Curve, EdgeGeometry, Error, Point, Port, RectilinearRouter, RouterOptions, Shape, point,
    vector, verify,
};

fn rect_shape(x: f64, y: f64, w: f64, h: f64) -> Shape {
    Shape::new(Curve::rectangle_centered(point(x, y), w, h))
}

fn curve_points(router: &RectilinearRouter, edge: narwhal::EdgeId) -> Vec<Point> {
    router
        .edge_geometry(edge)
        .and_then(|e| e.curve.as_ref())
        .map(|c| c.points().to_vec())
        .unwrap()
}

fn assert_rectilinear(points: &[Point]) {
    for w in points.windows(2) {
        let (a, b) = (w[0], w[1]);
        assert!(
            (a.x - b.x).abs() < 1e-6 || (a.y - b.y).abs() < 1e-6,
            "diagonal segment {a:?} -> {b:?}"
        );
    }
}

#[test]
fn routing_between_two_boxes_is_a_straight_line_trimmed_to_the_borders() {
    let mut router = RectilinearRouter::default();
    let a = router.add_shape(rect_shape(0.0, 0.0, 20.0, 20.0));
    let b = router.add_shape(rect_shape(100.0, 0.0, 20.0, 20.0));
    let pa = router.add_port(Port::relative(a, vector(0.0, 0.0)));
    let pb = router.add_port(Port::relative(b, vector(0.0, 0.0)));
    let edge = router.add_edge_geometry(EdgeGeometry::new(pa, pb));

    router.run().unwrap();

    assert_eq!(curve_points(&router, edge), vec![point(10.0, 0.0), point(90.0, 0.0)]);
    assert!(verify(&router).is_empty());
}

#[test]
fn routing_to_center_keeps_the_inner_part() {
    let mut router = RectilinearRouter::new(RouterOptions {
        route_to_center: true,
        ..Default::default()
    });
    let a = router.add_shape(rect_shape(0.0, 0.0, 20.0, 20.0));
    let b = router.add_shape(rect_shape(100.0, 0.0, 20.0, 20.0));
    let pa = router.add_port(Port::relative(a, vector(0.0, 0.0)));
    let pb = router.add_port(Port::relative(b, vector(0.0, 0.0)));
    let edge = router.add_edge_geometry(EdgeGeometry::new(pa, pb));

    router.run().unwrap();

    assert_eq!(curve_points(&router, edge), vec![point(0.0, 0.0), point(100.0, 0.0)]);
}

#[test]
fn routing_goes_around_a_blocking_obstacle() {
    let mut router = RectilinearRouter::default();
    let a = router.add_shape(rect_shape(0.0, 0.0, 20.0, 20.0));
    router.add_shape(rect_shape(50.0, 0.0, 20.0, 40.0));
    let b = router.add_shape(rect_shape(100.0, 0.0, 20.0, 20.0));
    let pa = router.add_port(Port::relative(a, vector(0.0, 0.0)));
    let pb = router.add_port(Port::relative(b, vector(0.0, 0.0)));
    let edge = router.add_edge_geometry(EdgeGeometry::new(pa, pb));

    router.run().unwrap();

    let points = curve_points(&router, edge);
    assert_rectilinear(&points);
    assert!(points.len() >= 4);
    assert!(points.iter().any(|p| p.y.abs() >= 21.0 - 1e-6));
    assert!(verify(&router).is_empty(), "{:?}", verify(&router));
}

#[test]
fn routing_out_of_a_clump_avoids_the_sibling() {
    let mut router = RectilinearRouter::default();
    let a = router.add_shape(rect_shape(0.0, 0.0, 20.0, 20.0));
    router.add_shape(rect_shape(15.0, 0.0, 20.0, 20.0));
    let c = router.add_shape(rect_shape(100.0, 0.0, 20.0, 20.0));
    let pa = router.add_port(Port::relative(a, vector(0.0, 0.0)));
    let pc = router.add_port(Port::relative(c, vector(0.0, 0.0)));
    let edge = router.add_edge_geometry(EdgeGeometry::new(pa, pc));

    router.run().unwrap();

    let tree = router.obstacle_tree().unwrap();
    assert_eq!(tree.clumps().len(), 1);
    let points = curve_points(&router, edge);
    assert_rectilinear(&points);
    let end = points.last().copied().unwrap();
    assert!(end.x >= 90.0 - 1e-6 && end.x <= 110.0 + 1e-6);
    assert!(end.y.abs() <= 10.0 + 1e-6);
    assert!(verify(&router).is_empty(), "{:?}", verify(&router));
}

#[test]
fn routing_from_a_nested_child_leaves_its_group() {
    let mut router = RectilinearRouter::default();
    let child = router.add_shape(rect_shape(50.0, 50.0, 20.0, 20.0));
    router.add_shape(Shape::group(
        Curve::rectangle_centered(point(50.0, 50.0), 100.0, 100.0),
        [child],
    ));
    let ps = router.add_port(Port::relative(child, vector(0.0, 0.0)));
    let pt = router.add_port(Port::free(point(200.0, 50.0)));
    let edge = router.add_edge_geometry(EdgeGeometry::new(ps, pt));

    router.run().unwrap();

    let points = curve_points(&router, edge);
    assert_rectilinear(&points);
    assert_eq!(points.first(), Some(&point(60.0, 50.0)));
    assert_eq!(points.last(), Some(&point(200.0, 50.0)));
    assert!(verify(&router).is_empty(), "{:?}", verify(&router));
}

#[test]
fn routing_through_waypoints_keeps_them() {
    let mut router = RectilinearRouter::default();
    let a = router.add_shape(rect_shape(0.0, 0.0, 20.0, 20.0));
    let b = router.add_shape(rect_shape(100.0, 0.0, 20.0, 20.0));
    let pa = router.add_port(Port::relative(a, vector(0.0, 0.0)));
    let pb = router.add_port(Port::relative(b, vector(0.0, 0.0)));
    let waypoint = point(50.0, 40.0);
    let edge = router.add_edge_geometry(EdgeGeometry::new(pa, pb).with_waypoints([waypoint]));

    router.run().unwrap();

    let points = curve_points(&router, edge);
    assert_rectilinear(&points);
    assert!(points.contains(&waypoint));
}

#[test]
fn routing_picks_the_closest_offset_of_a_multi_location_port() {
    let mut router = RectilinearRouter::default();
    let a = router.add_shape(rect_shape(0.0, 0.0, 20.0, 20.0));
    let b = router.add_shape(rect_shape(100.0, 0.0, 20.0, 20.0));
    let pa = router.add_port(Port::multi_location(
        a,
        [vector(-10.0, 0.0), vector(10.0, 0.0)],
    ));
    let pb = router.add_port(Port::relative(b, vector(0.0, 0.0)));
    router.add_edge_geometry(EdgeGeometry::new(pa, pb));

    router.run().unwrap();

    assert_eq!(router.port(pa).unwrap().active_offset, Some(1));
}

#[test]
fn routing_a_self_edge_draws_a_loop_around_the_shape() {
    let mut router = RectilinearRouter::default();
    let a = router.add_shape(rect_shape(0.0, 0.0, 20.0, 20.0));
    let pa = router.add_port(Port::relative(a, vector(0.0, 0.0)));
    let edge = router.add_edge_geometry(EdgeGeometry::new(pa, pa));

    router.run().unwrap();

    assert_eq!(
        curve_points(&router, edge),
        vec![
            point(0.0, 10.0),
            point(0.0, 11.0),
            point(11.0, 11.0),
            point(11.0, 0.0),
            point(10.0, 0.0),
        ]
    );
}

#[test]
fn routing_arrowheads_pull_the_curve_back() {
    let mut router = RectilinearRouter::default();
    let a = router.add_shape(rect_shape(0.0, 0.0, 20.0, 20.0));
    let b = router.add_shape(rect_shape(100.0, 0.0, 20.0, 20.0));
    let pa = router.add_port(Port::relative(a, vector(0.0, 0.0)));
    let pb = router.add_port(Port::relative(b, vector(0.0, 0.0)));
    let edge = router.add_edge_geometry(EdgeGeometry::new(pa, pb).with_target_arrowhead(5.0));

    router.run().unwrap();

    let geometry = router.edge_geometry(edge).unwrap();
    assert_eq!(geometry.target_arrowhead.unwrap().tip, Some(point(90.0, 0.0)));
    assert_eq!(curve_points(&router, edge).last(), Some(&point(85.0, 0.0)));
}

#[test]
fn routing_a_port_on_a_removed_shape_is_dangling() {
    let mut router = RectilinearRouter::default();
    let a = router.add_shape(rect_shape(0.0, 0.0, 20.0, 20.0));
    let b = router.add_shape(rect_shape(100.0, 0.0, 20.0, 20.0));
    let pa = router.add_port(Port::relative(a, vector(0.0, 0.0)));
    let pb = router.add_port(Port::relative(b, vector(0.0, 0.0)));
    router.add_edge_geometry(EdgeGeometry::new(pa, pb));
    router.remove_shape(b).unwrap();

    let err = router.run().unwrap_err();
    assert!(matches!(err, Error::DanglingPort { port, shape } if port == pb && shape == b));
}

#[test]
fn routing_unknown_ids_are_errors() {
    let mut router = RectilinearRouter::default();
    assert!(matches!(
        router.route_edge(narwhal::EdgeId(7)),
        Err(Error::UnknownEdge(_))
    ));
    assert!(matches!(
        router.update_shape(narwhal::ShapeId(3), rect_shape(0.0, 0.0, 1.0, 1.0)),
        Err(Error::UnknownShape(_))
    ));
}

#[test]
fn routing_index_is_rebuilt_only_for_geometry_changes() {
    let mut router = RectilinearRouter::default();
    let a = router.add_shape(rect_shape(0.0, 0.0, 20.0, 20.0));
    let b = router.add_shape(rect_shape(100.0, 0.0, 20.0, 20.0));
    let pa = router.add_port(Port::relative(a, vector(0.0, 0.0)));
    let pb = router.add_port(Port::relative(b, vector(0.0, 0.0)));
    router.add_edge_geometry(EdgeGeometry::new(pa, pb));
    router.run().unwrap();
    assert_eq!(router.index_builds(), 1);

    // Same boundary, different port list.
    let same = router.shape(a).unwrap().clone().with_ports([pa]);
    router.update_shape(a, same).unwrap();
    router.run().unwrap();
    assert_eq!(router.index_builds(), 1);

    router.update_shape(a, rect_shape(0.0, 0.0, 30.0, 30.0)).unwrap();
    router.run().unwrap();
    assert_eq!(router.index_builds(), 2);
}

#[test]
fn routing_single_edge_matches_the_full_run_without_neighbours() {
    let mut router = RectilinearRouter::default();
    let a = router.add_shape(rect_shape(0.0, 0.0, 20.0, 20.0));
    let b = router.add_shape(rect_shape(100.0, 0.0, 20.0, 20.0));
    let pa = router.add_port(Port::relative(a, vector(0.0, 0.0)));
    let pb = router.add_port(Port::relative(b, vector(0.0, 0.0)));
    let edge = router.add_edge_geometry(EdgeGeometry::new(pa, pb));

    let routed = router.route_edge(edge).unwrap().curve.clone().unwrap();
    assert_eq!(routed.points(), &[point(10.0, 0.0), point(90.0, 0.0)]);
}

#[test]
fn routing_leaves_a_box_inside_the_extent_of_a_clump_it_does_not_touch() {
    let mut router = RectilinearRouter::default();
    router.add_shape(rect_shape(50.0, 10.0, 100.0, 20.0));
    router.add_shape(rect_shape(10.0, 50.0, 20.0, 100.0));
    let c = router.add_shape(rect_shape(75.0, 75.0, 30.0, 30.0));
    let far = router.add_shape(rect_shape(200.0, 75.0, 20.0, 20.0));
    let pc = router.add_port(Port::relative(c, vector(0.0, 0.0)));
    let pf = router.add_port(Port::relative(far, vector(0.0, 0.0)));
    let edge = router.add_edge_geometry(EdgeGeometry::new(pc, pf));

    router.run().unwrap();

    assert_eq!(curve_points(&router, edge), vec![point(90.0, 75.0), point(190.0, 75.0)]);
    assert!(verify(&router).is_empty(), "{:?}", verify(&router));
}
