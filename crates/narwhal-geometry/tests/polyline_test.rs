use narwhal_geometry::{Curve, PointLocation, Polyline, Rect, RectExt, point};

fn square(min: f64, max: f64) -> Polyline {
    Polyline::from_rect(&Rect::new(point(min, min), point(max, max)))
}

#[test]
fn polyline_from_rect_is_clockwise_from_left_bottom() {
    let p = square(0.0, 10.0);
    assert!(p.is_clockwise());
    assert_eq!(p.points()[0], point(0.0, 0.0));
    assert_eq!(p.points()[1], point(0.0, 10.0));
}

#[test]
fn polyline_locations_use_shrink_and_grow_policies() {
    let p = square(0.0, 10.0);
    assert_eq!(p.location(point(5.0, 5.0)), PointLocation::Inside);
    assert_eq!(p.location(point(10.0, 5.0)), PointLocation::Boundary);
    assert_eq!(p.location(point(10.5, 5.0)), PointLocation::Outside);

    assert!(p.contains_strictly(point(5.0, 5.0)));
    assert!(!p.contains_strictly(point(0.0, 5.0)));
    assert!(p.contains_inclusive(point(0.0, 5.0)));
    assert!(!p.contains_inclusive(point(-1.0, 5.0)));
}

#[test]
fn polyline_intersect_segment_is_sorted_along_the_segment() {
    let p = square(0.0, 10.0);
    let hits = p.intersect_segment(point(20.0, 5.0), point(-20.0, 5.0));
    assert_eq!(hits.len(), 2);
    assert!((hits[0].point.x - 10.0).abs() < 1e-9);
    assert!((hits[1].point.x - 0.0).abs() < 1e-9);
    assert!(hits[0].segment_param < hits[1].segment_param);
}

#[test]
fn polyline_intersect_segment_reports_collinear_overlap_ends() {
    let p = square(0.0, 10.0);
    let hits = p.intersect_segment(point(-5.0, 10.0), point(5.0, 10.0));
    let xs: Vec<f64> = hits.iter().map(|h| h.point.x).collect();
    assert!(xs.iter().any(|x| x.abs() < 1e-6));
    assert!(xs.iter().any(|x| (x - 5.0).abs() < 1e-6));
}

#[test]
fn polyline_segment_missing_the_polygon_has_no_hits() {
    let p = square(0.0, 10.0);
    assert!(p.intersect_segment(point(20.0, 0.0), point(20.0, 10.0)).is_empty());
}

#[test]
fn polyline_convex_hull_is_clockwise_and_drops_interior_points() {
    let hull = Polyline::convex_hull([
        point(0.0, 0.0),
        point(10.0, 0.0),
        point(5.0, 5.0),
        point(10.0, 10.0),
        point(0.0, 10.0),
        point(5.0, 0.0),
    ]);
    assert_eq!(hull.len(), 4);
    assert!(hull.is_clockwise());
    assert!(hull.is_convex());
}

#[test]
fn polyline_padded_diamond_contains_the_original() {
    let diamond = Curve::polygon(vec![
        point(0.0, 10.0),
        point(10.0, 0.0),
        point(0.0, -10.0),
        point(-10.0, 0.0),
    ]);
    let padded = diamond.padded_polyline(2.0, 8);
    assert!(padded.is_clockwise());
    for p in diamond.approximate(8).points() {
        assert!(padded.contains_strictly(*p));
    }
    let b = padded.bounding_box();
    assert!(b.right() >= 12.0 - 1e-6);
    assert!(b.right() <= 10.0 + 2.0 * std::f64::consts::SQRT_2 + 1e-6);
}

#[test]
fn polyline_boundary_intersection_of_touching_squares() {
    let a = square(0.0, 10.0);
    let b = Polyline::from_rect(&Rect::new(point(10.0, 0.0), point(20.0, 10.0)));
    let c = Polyline::from_rect(&Rect::new(point(30.0, 0.0), point(40.0, 10.0)));
    assert!(a.boundary_intersects(&b));
    assert!(!a.boundary_intersects(&c));
}
