use narwhal::geometry::RectExt;
use narwhal::{Curve, ObstacleTree, OverlapMembership, RouterOptions, Shape, ShapeId, point};

fn build(shapes: &[Shape]) -> ObstacleTree {
    let pairs: Vec<(ShapeId, &Shape)> = shapes
        .iter()
        .enumerate()
        .map(|(i, s)| (ShapeId(i), s))
        .collect();
    ObstacleTree::build(&pairs, &[], &RouterOptions::default()).unwrap()
}

fn rect(x: f64, y: f64, w: f64, h: f64) -> Shape {
    Shape::new(Curve::rectangle_centered(point(x, y), w, h))
}

fn assert_partition(tree: &ObstacleTree) {
    for o in tree.obstacles() {
        assert!(!(o.clump().is_some() && o.convex_hull().is_some()));
        match o.membership() {
            OverlapMembership::None => {
                assert!(tree.clumps().iter().all(|c| !c.contains(o.id())));
                assert!(tree.convex_hulls().iter().all(|h| !h.contains(o.id())));
            }
            OverlapMembership::Clump(c) => assert!(tree.clump(c).contains(o.id())),
            OverlapMembership::ConvexHull(h) => assert!(tree.convex_hull(h).contains(o.id())),
        }
    }
}

#[test]
fn accretion_merges_rectangles_whose_padding_touches() {
    let tree = build(&[
        rect(0.0, 0.0, 20.0, 20.0),
        rect(21.5, 0.0, 20.0, 20.0),
        rect(100.0, 0.0, 20.0, 20.0),
    ]);
    assert_eq!(tree.clumps().len(), 1);
    assert!(tree.convex_hulls().is_empty());
    let clump = &tree.clumps()[0];
    assert_eq!(clump.members().len(), 2);
    let far = tree.obstacle_of(ShapeId(2)).unwrap();
    assert_eq!(tree.obstacle(far).membership(), OverlapMembership::None);
    assert!(clump.rect().left() <= -11.0 + 1e-9 && clump.rect().right() >= 32.5 - 1e-9);
    assert_partition(&tree);
}

#[test]
fn accretion_leaves_a_rectangle_in_the_corner_of_an_l_shaped_clump_alone() {
    // A and B overlap in an L; C sits inside their combined box but touches neither.
    let tree = build(&[
        rect(50.0, 10.0, 100.0, 20.0),
        rect(10.0, 50.0, 20.0, 100.0),
        rect(75.0, 75.0, 30.0, 30.0),
    ]);
    assert_eq!(tree.clumps().len(), 1);
    let a = tree.obstacle_of(ShapeId(0)).unwrap();
    let b = tree.obstacle_of(ShapeId(1)).unwrap();
    let c = tree.obstacle_of(ShapeId(2)).unwrap();
    assert_eq!(tree.clumps()[0].members(), &[a, b]);
    assert_eq!(tree.obstacle(c).membership(), OverlapMembership::None);
    assert!(tree.obstacle(c).is_primary());
    assert!(tree.clumps()[0].rect().contains_rect_inclusive(&tree.obstacle(c).padded_box()));
    assert_partition(&tree);
}

#[test]
fn accretion_chains_touching_rectangles_into_one_clump() {
    let tree = build(&[
        rect(0.0, 0.0, 20.0, 20.0),
        rect(21.0, 0.0, 20.0, 20.0),
        rect(42.0, 0.0, 20.0, 20.0),
    ]);
    assert_eq!(tree.clumps().len(), 1);
    assert_eq!(tree.clumps()[0].members().len(), 3);
    assert_partition(&tree);
}

#[test]
fn accretion_keeps_separated_rectangles_apart() {
    let tree = build(&[rect(0.0, 0.0, 20.0, 20.0), rect(23.0, 0.0, 20.0, 20.0)]);
    assert!(tree.clumps().is_empty());
    assert!(tree.convex_hulls().is_empty());
    assert!(tree.obstacles().iter().all(|o| !o.is_overlapped()));
}

#[test]
fn accretion_wraps_a_rectangle_and_an_ellipse_in_a_convex_hull() {
    let tree = build(&[
        rect(0.0, 0.0, 20.0, 20.0),
        Shape::new(Curve::ellipse(point(14.0, 0.0), 6.0, 6.0)),
    ]);
    assert!(tree.clumps().is_empty());
    assert_eq!(tree.convex_hulls().len(), 1);
    let hull = &tree.convex_hulls()[0];
    assert_eq!(hull.members().len(), 2);
    assert!(hull.polyline().is_clockwise());
    for o in tree.obstacles() {
        for p in o.padded_polyline().points() {
            assert!(hull.polyline().contains_inclusive(*p));
        }
    }
    assert_partition(&tree);
}

#[test]
fn accretion_hull_absorbs_a_touching_clump() {
    let tree = build(&[
        rect(0.0, 0.0, 20.0, 20.0),
        rect(15.0, 0.0, 20.0, 20.0),
        Shape::new(Curve::ellipse(point(29.0, 0.0), 6.0, 6.0)),
    ]);
    assert!(tree.clumps().is_empty());
    assert_eq!(tree.convex_hulls().len(), 1);
    assert_eq!(tree.convex_hulls()[0].members().len(), 3);
    assert_eq!(
        tree.obstacles().iter().filter(|o| o.is_primary()).count(),
        1
    );
    assert_partition(&tree);
}

#[test]
fn accretion_super_clump_landlocks_the_group_interior() {
    let group = Shape::group(Curve::rectangle_centered(point(50.0, 50.0), 100.0, 100.0), Vec::new());
    let tree = build(&[
        group,
        rect(0.0, 50.0, 10.0, 120.0),
        rect(100.0, 50.0, 10.0, 120.0),
        rect(50.0, 0.0, 120.0, 10.0),
        rect(50.0, 100.0, 120.0, 10.0),
    ]);
    let group = tree.obstacle_of(ShapeId(0)).unwrap();
    let sc = tree.super_clumps().of(group).unwrap();
    assert_eq!(sc.members().len(), 5);
    assert!(!sc.landlocks_point(point(200.0, 200.0)));
    assert_eq!(sc.ray_cast_count(), 0);

    assert!(sc.landlocks_point(point(50.0, 50.0)));
    assert_eq!(sc.ray_cast_count(), 4);
}
