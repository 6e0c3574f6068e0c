use narwhal::nudger::{NudgePath, nudge};
use narwhal::{
    Curve, EdgeGeometry, EdgeId, ObstacleTree, Point, Port, PortEntry, PortId, RectilinearRouter,
    RouterOptions, Shape, ShapeId, point, verify,
};

/// Two boxes whose ports force a Z-shaped route: out of the east side of the lower box and
/// into the west side of the upper one.
fn z_router(options: RouterOptions, edges: usize) -> (RectilinearRouter, Vec<EdgeId>) {
    let mut router = RectilinearRouter::new(options);
    let a = router.add_shape(Shape::new(Curve::rectangle_centered(point(0.0, 0.0), 20.0, 20.0)));
    let b = router.add_shape(Shape::new(Curve::rectangle_centered(point(100.0, 50.0), 20.0, 20.0)));
    let pa = router.add_port(
        Port::floating(a, point(10.0, 0.0)).with_entry(PortEntry::new([(0.55, 0.7)])),
    );
    let pb = router.add_port(
        Port::floating(b, point(90.0, 50.0)).with_entry(PortEntry::new([(0.05, 0.2)])),
    );
    let ids = (0..edges)
        .map(|_| router.add_edge_geometry(EdgeGeometry::new(pa, pb)))
        .collect();
    (router, ids)
}

fn vertical_middle(points: &[Point]) -> f64 {
    assert_eq!(points.len(), 4, "expected a Z route, got {points:?}");
    assert!((points[1].x - points[2].x).abs() < 1e-9);
    points[1].x
}

fn curve(router: &RectilinearRouter, id: EdgeId) -> Vec<Point> {
    router.edge_geometry(id).unwrap().curve.as_ref().unwrap().points().to_vec()
}

#[test]
fn nudging_separates_parallel_segments_by_the_edge_separation() {
    let (mut router, ids) = z_router(RouterOptions::default(), 2);
    router.run().unwrap();

    let x0 = vertical_middle(&curve(&router, ids[0]));
    let x1 = vertical_middle(&curve(&router, ids[1]));
    assert!(((x0 - x1).abs() - 1.0).abs() < 1e-6, "{x0} vs {x1}");
    for x in [x0, x1] {
        assert!((11.0 - 1e-6..=89.0 + 1e-6).contains(&x));
    }

    for id in &ids {
        let points = curve(&router, *id);
        assert_eq!(points.first(), Some(&point(10.0, 0.0)));
        assert_eq!(points.last(), Some(&point(90.0, 50.0)));
    }
    assert!(verify(&router).is_empty(), "{:?}", verify(&router));
}

#[test]
fn nudging_disabled_leaves_shared_corridors_alone() {
    let (mut router, ids) = z_router(
        RouterOptions {
            nudge: false,
            ..Default::default()
        },
        2,
    );
    router.run().unwrap();
    assert_eq!(curve(&router, ids[0]), curve(&router, ids[1]));
}

#[test]
fn nudging_is_deterministic() {
    let snapshot = || {
        let (mut router, _) = z_router(RouterOptions::default(), 3);
        router.run().unwrap();
        serde_json::to_string(&router.snapshot().unwrap()).unwrap()
    };
    assert_eq!(snapshot(), snapshot());
}

#[test]
fn nudging_never_moves_path_end_points() {
    let (mut router, ids) = z_router(RouterOptions::default(), 4);
    router.run().unwrap();
    let mut xs: Vec<f64> = ids
        .iter()
        .map(|id| {
            let points = curve(&router, *id);
            assert_eq!(points.first(), Some(&point(10.0, 0.0)));
            assert_eq!(points.last(), Some(&point(90.0, 50.0)));
            vertical_middle(&points)
        })
        .collect();
    xs.sort_by(f64::total_cmp);
    for w in xs.windows(2) {
        assert!(w[1] - w[0] >= 1.0 - 1e-6);
    }
}

/// Obstacle tree over axis-aligned boxes given as `(x0, y0, x1, y1)`; the corner points widen
/// the graph box.
fn box_tree(boxes: &[(f64, f64, f64, f64)], corners: &[Point]) -> ObstacleTree {
    let shapes: Vec<Shape> = boxes
        .iter()
        .map(|&(x0, y0, x1, y1)| {
            Shape::new(Curve::rectangle_centered(
                point((x0 + x1) / 2.0, (y0 + y1) / 2.0),
                x1 - x0,
                y1 - y0,
            ))
        })
        .collect();
    let pairs: Vec<(ShapeId, &Shape)> = shapes.iter().enumerate().map(|(i, s)| (ShapeId(i), s)).collect();
    ObstacleTree::build(&pairs, corners, &RouterOptions::default()).unwrap()
}

fn path(edge: usize, points: &[(f64, f64)]) -> NudgePath {
    NudgePath {
        edge: EdgeId(edge),
        source_port: PortId(2 * edge),
        target_port: PortId(2 * edge + 1),
        points: points.iter().map(|&(x, y)| point(x, y)).collect(),
        fixed: Vec::new(),
    }
}

/// Fails when segments of two different paths lie on one line with overlapping extents.
fn assert_no_shared_lines(paths: &[NudgePath]) {
    let mut runs: Vec<(usize, bool, f64, f64, f64)> = Vec::new();
    for (i, p) in paths.iter().enumerate() {
        for w in p.points.windows(2) {
            let horizontal = (w[0].y - w[1].y).abs() < 1e-9;
            let (c, a, b) = if horizontal {
                (w[0].y, w[0].x, w[1].x)
            } else {
                (w[0].x, w[0].y, w[1].y)
            };
            runs.push((i, horizontal, c, a.min(b), a.max(b)));
        }
    }
    for (n, r) in runs.iter().enumerate() {
        for s in &runs[n + 1..] {
            let same_line = r.1 == s.1 && (r.2 - s.2).abs() < 1e-6;
            let overlap = r.4.min(s.4) - r.3.max(s.3) > 1e-6;
            assert!(
                r.0 == s.0 || !(same_line && overlap),
                "paths {} and {} share the line {}",
                r.0,
                s.0,
                r.2
            );
        }
    }
}

fn middle_y(p: &NudgePath) -> f64 {
    assert_eq!(p.points.len(), 4, "{:?}", p.points);
    assert!((p.points[1].y - p.points[2].y).abs() < 1e-9);
    p.points[1].y
}

#[test]
fn nudging_keeps_movable_segments_off_an_end_segment_line() {
    // Padded top of the box sits on y = 10, so nothing may move below that line.
    let tree = box_tree(&[(10.0, 0.0, 40.0, 9.0)], &[point(0.0, 40.0), point(50.0, 40.0)]);
    let mut paths = vec![
        path(0, &[(0.0, 10.0), (50.0, 10.0), (50.0, 30.0)]),
        path(1, &[(5.0, 30.0), (5.0, 10.0), (45.0, 10.0), (45.0, 30.0)]),
        path(2, &[(8.0, 30.0), (8.0, 10.0), (42.0, 10.0), (42.0, 30.0)]),
    ];
    nudge(&mut paths, &tree, 1.0);

    assert_eq!(
        paths[0].points,
        vec![point(0.0, 10.0), point(50.0, 10.0), point(50.0, 30.0)]
    );
    assert_eq!(middle_y(&paths[1]), 11.0);
    assert_eq!(middle_y(&paths[2]), 12.0);
    assert_eq!(paths[1].points[0], point(5.0, 30.0));
    assert_eq!(paths[2].points[3], point(42.0, 30.0));
    assert_no_shared_lines(&paths);
}

#[test]
fn nudging_squeezes_into_a_band_narrower_than_the_separation() {
    // Padded boxes bound the corridor to 10 <= y <= 11.5.
    let tree = box_tree(
        &[(10.0, 0.0, 40.0, 9.0), (10.0, 12.5, 40.0, 20.0)],
        &[point(0.0, 40.0), point(50.0, 40.0)],
    );
    let mut paths = vec![
        path(0, &[(0.0, 10.0), (50.0, 10.0), (50.0, 30.0)]),
        path(1, &[(2.0, 30.0), (2.0, 10.0), (48.0, 10.0), (48.0, 30.0)]),
        path(2, &[(4.0, 30.0), (4.0, 10.0), (46.0, 10.0), (46.0, 30.0)]),
        path(3, &[(6.0, 30.0), (6.0, 10.0), (44.0, 10.0), (44.0, 30.0)]),
    ];
    nudge(&mut paths, &tree, 1.0);

    let mut ys: Vec<f64> = paths[1..].iter().map(middle_y).collect();
    ys.sort_by(f64::total_cmp);
    assert_eq!(ys, vec![10.375, 10.75, 11.125]);
    assert_no_shared_lines(&paths);
}

#[test]
fn nudging_spreads_a_free_cluster_across_a_narrow_band() {
    let tree = box_tree(
        &[(10.0, 0.0, 40.0, 9.0), (10.0, 12.5, 40.0, 20.0)],
        &[point(0.0, 40.0), point(50.0, 40.0)],
    );
    let mut paths = vec![
        path(0, &[(2.0, 30.0), (2.0, 10.0), (48.0, 10.0), (48.0, 30.0)]),
        path(1, &[(4.0, 30.0), (4.0, 10.0), (46.0, 10.0), (46.0, 30.0)]),
        path(2, &[(6.0, 30.0), (6.0, 10.0), (44.0, 10.0), (44.0, 30.0)]),
    ];
    nudge(&mut paths, &tree, 1.0);

    let ys: Vec<f64> = paths.iter().map(middle_y).collect();
    assert_eq!(ys, vec![10.0, 10.75, 11.5]);
    assert_no_shared_lines(&paths);
}
