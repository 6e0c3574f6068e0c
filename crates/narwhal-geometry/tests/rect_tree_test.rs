use std::collections::BTreeSet;

use narwhal_geometry::{HitTestBehavior, Rect, RectExt, RectangleNode, cross_rectangle_nodes, point};

fn grid(n: usize, size: f64, step: f64) -> Vec<(usize, Rect)> {
    let mut out = Vec::new();
    for i in 0..n {
        for j in 0..n {
            let min = point(i as f64 * step, j as f64 * step);
            out.push((i * n + j, Rect::new(min, point(min.x + size, min.y + size))));
        }
    }
    out
}

#[test]
fn rect_tree_build_of_nothing_is_none() {
    assert!(RectangleNode::<usize>::build(Vec::new()).is_none());
}

#[test]
fn rect_tree_root_box_covers_every_leaf() {
    let items = grid(5, 10.0, 15.0);
    let tree = RectangleNode::build(items.clone()).unwrap();
    assert_eq!(tree.len(), 25);
    for (_, r) in &items {
        assert!(tree.rect().contains_rect_inclusive(r));
    }
    let leaves: BTreeSet<usize> = tree.leaves().copied().collect();
    assert_eq!(leaves.len(), 25);
}

#[test]
fn rect_tree_query_matches_brute_force() {
    let items = grid(6, 10.0, 12.0);
    let tree = RectangleNode::build(items.clone()).unwrap();
    let queries = [
        Rect::new(point(0.0, 0.0), point(5.0, 5.0)),
        Rect::new(point(10.0, 10.0), point(12.0, 12.0)),
        Rect::new(point(30.0, -5.0), point(31.0, 100.0)),
        Rect::new(point(200.0, 200.0), point(210.0, 210.0)),
    ];
    for q in queries {
        let expected: BTreeSet<usize> = items
            .iter()
            .filter(|(_, r)| r.intersects_inclusive(&q))
            .map(|(i, _)| *i)
            .collect();
        let actual: BTreeSet<usize> = tree.query(q, |_| true).copied().collect();
        assert_eq!(actual, expected, "query {q:?}");
    }
}

#[test]
fn rect_tree_query_applies_predicate() {
    let tree = RectangleNode::build(grid(4, 10.0, 12.0)).unwrap();
    let all = tree.rect();
    let even: Vec<usize> = tree.query(all, |i| i % 2 == 0).copied().collect();
    assert_eq!(even.len(), 8);
    assert!(even.iter().all(|i| i % 2 == 0));
}

#[test]
fn rect_tree_first_hit_stops_on_request() {
    let tree = RectangleNode::build(vec![
        ("outer", Rect::new(point(0.0, 0.0), point(100.0, 100.0))),
        ("inner", Rect::new(point(40.0, 40.0), point(60.0, 60.0))),
        ("far", Rect::new(point(200.0, 0.0), point(210.0, 10.0))),
    ])
    .unwrap();
    let hit = tree.first_hit(point(50.0, 50.0), |_, name| {
        if *name == "inner" {
            HitTestBehavior::Stop
        } else {
            HitTestBehavior::Continue
        }
    });
    assert_eq!(hit, Some(&"inner"));
    assert_eq!(tree.first_hit(point(150.0, 50.0), |_, _| HitTestBehavior::Stop), None);
}

#[test]
fn rect_tree_cross_self_reports_each_touching_pair_once() {
    // Step equal to size: neighbours touch along a side or at a corner.
    let items = grid(3, 10.0, 10.0);
    let tree = RectangleNode::build(items.clone()).unwrap();
    let mut pairs = BTreeSet::new();
    tree.cross_self(&mut |a: &usize, b: &usize| {
        assert!(pairs.insert((*a.min(b), *a.max(b))), "pair reported twice");
    });
    let mut expected = BTreeSet::new();
    for (i, a) in &items {
        for (j, b) in &items {
            if i < j && a.intersects_inclusive(b) {
                expected.insert((*i, *j));
            }
        }
    }
    assert_eq!(pairs, expected);
}

#[test]
fn rect_tree_cross_two_hierarchies() {
    let left = RectangleNode::build(grid(2, 10.0, 20.0)).unwrap();
    let right = RectangleNode::build(vec![(100usize, Rect::new(point(5.0, 5.0), point(25.0, 8.0)))]).unwrap();
    let mut hits = Vec::new();
    cross_rectangle_nodes(&left, &right, &mut |a: &usize, b: &usize| hits.push((*a, *b)));
    hits.sort();
    assert_eq!(hits, vec![(0, 100), (2, 100)]);
}
