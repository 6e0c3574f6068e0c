//! Bounding-box hierarchy (an R-tree variant with binary nodes).
//!
//! Construction picks two seeds that maximize the area of their united boxes and then
//! distributes the remaining boxes by least area growth, while keeping the two halves within
//! a size ratio of [`GROUP_SPLIT_THRESHOLD`].

use crate::{Point, Rect, RectExt};

const GROUP_SPLIT_THRESHOLD: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTestBehavior {
    Continue,
    Stop,
}

#[derive(Debug, Clone)]
pub struct RectangleNode<T> {
    rect: Rect,
    count: usize,
    kind: NodeKind<T>,
}

#[derive(Debug, Clone)]
enum NodeKind<T> {
    Leaf(T),
    Internal(Box<RectangleNode<T>>, Box<RectangleNode<T>>),
}

impl<T> RectangleNode<T> {
    pub fn leaf(item: T, rect: Rect) -> Self {
        Self {
            rect,
            count: 1,
            kind: NodeKind::Leaf(item),
        }
    }

    /// Builds a hierarchy over `items`; `None` when there is nothing to index.
    pub fn build(items: Vec<(T, Rect)>) -> Option<Self> {
        let nodes: Vec<RectangleNode<T>> = items
            .into_iter()
            .map(|(item, rect)| RectangleNode::leaf(item, rect))
            .collect();
        Self::build_on_nodes(nodes)
    }

    fn build_on_nodes(mut nodes: Vec<RectangleNode<T>>) -> Option<Self> {
        match nodes.len() {
            0 => return None,
            1 => return nodes.pop(),
            _ => {}
        }

        let b0 = nodes[0].rect;
        let mut seed0 = 1;
        let mut area = b0.union(&nodes[seed0].rect).area();
        for (i, n) in nodes.iter().enumerate().skip(2) {
            let a = b0.union(&n.rect).area();
            if a > area {
                seed0 = i;
                area = a;
            }
        }

        let mut seed1 = if seed0 == 0 { 1 } else { 0 };
        let mut area = f64::NEG_INFINITY;
        let seed_rect = nodes[seed0].rect;
        for (i, n) in nodes.iter().enumerate() {
            if i == seed0 {
                continue;
            }
            let a = seed_rect.union(&n.rect).area();
            if a > area {
                seed1 = i;
                area = a;
            }
        }

        let mut in_first = vec![false; nodes.len()];
        in_first[seed0] = true;
        let (mut count0, mut count1) = (1usize, 1usize);
        let mut box0 = nodes[seed0].rect;
        let mut box1 = nodes[seed1].rect;
        for (i, n) in nodes.iter().enumerate() {
            if i == seed0 || i == seed1 {
                continue;
            }
            let grown0 = box0.union(&n.rect);
            let grown1 = box1.union(&n.rect);
            let delta0 = grown0.area() - box0.area();
            let delta1 = grown1.area() - box1.area();
            let to_first = if count0 * GROUP_SPLIT_THRESHOLD < count1 {
                true
            } else if count1 * GROUP_SPLIT_THRESHOLD < count0 {
                false
            } else if delta0 != delta1 {
                delta0 < delta1
            } else {
                box0.area() < box1.area()
            };
            if to_first {
                in_first[i] = true;
                count0 += 1;
                box0 = grown0;
            } else {
                count1 += 1;
                box1 = grown1;
            }
        }

        let mut first = Vec::with_capacity(count0);
        let mut second = Vec::with_capacity(count1);
        for (node, flag) in nodes.into_iter().zip(in_first) {
            if flag {
                first.push(node);
            } else {
                second.push(node);
            }
        }
        let left = Self::build_on_nodes(first)?;
        let right = Self::build_on_nodes(second)?;
        Some(Self {
            rect: left.rect.union(&right.rect),
            count: left.count + right.count,
            kind: NodeKind::Internal(Box::new(left), Box::new(right)),
        })
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Number of leaves under this node.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    pub fn item(&self) -> Option<&T> {
        match &self.kind {
            NodeKind::Leaf(item) => Some(item),
            NodeKind::Internal(..) => None,
        }
    }

    pub fn children(&self) -> Option<(&RectangleNode<T>, &RectangleNode<T>)> {
        match &self.kind {
            NodeKind::Leaf(_) => None,
            NodeKind::Internal(l, r) => Some((&**l, &**r)),
        }
    }

    pub fn leaves(&self) -> impl Iterator<Item = &T> + '_ {
        self.query(self.rect, |_: &T| true)
    }

    /// Lazily yields the leaves whose box intersects `rect` (touching counts) and that satisfy
    /// `predicate`, left subtree first.
    pub fn query<'a, F>(&'a self, rect: Rect, predicate: F) -> Query<'a, T, F>
    where
        F: FnMut(&T) -> bool,
    {
        Query {
            stack: vec![self],
            rect,
            predicate,
        }
    }

    pub fn leaves_with_rects(&self) -> Vec<(&T, Rect)> {
        let mut out = Vec::with_capacity(self.count);
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match &node.kind {
                NodeKind::Leaf(item) => out.push((item, node.rect)),
                NodeKind::Internal(l, r) => {
                    stack.push(&**r);
                    stack.push(&**l);
                }
            }
        }
        out
    }

    /// First leaf whose box contains `p` and for which `hit` answers [`HitTestBehavior::Stop`].
    pub fn first_hit<F>(&self, p: Point, mut hit: F) -> Option<&T>
    where
        F: FnMut(Point, &T) -> HitTestBehavior,
    {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if !node.rect.contains_point_inclusive(p) {
                continue;
            }
            match &node.kind {
                NodeKind::Leaf(item) => {
                    if hit(p, item) == HitTestBehavior::Stop {
                        return Some(item);
                    }
                }
                NodeKind::Internal(l, r) => {
                    stack.push(&**r);
                    stack.push(&**l);
                }
            }
        }
        None
    }

    /// Calls `f` once for every unordered pair of distinct leaves whose boxes intersect.
    pub fn cross_self<F>(&self, f: &mut F)
    where
        F: FnMut(&T, &T),
    {
        if let NodeKind::Internal(l, r) = &self.kind {
            l.cross_self(f);
            r.cross_self(f);
            cross_rectangle_nodes(&**l, &**r, f);
        }
    }
}

/// Calls `f` for every pair of leaves, one from each hierarchy, whose boxes intersect.
pub fn cross_rectangle_nodes<T, U, F>(a: &RectangleNode<T>, b: &RectangleNode<U>, f: &mut F)
where
    F: FnMut(&T, &U),
{
    if !a.rect.intersects_inclusive(&b.rect) {
        return;
    }
    match (&a.kind, &b.kind) {
        (NodeKind::Leaf(x), NodeKind::Leaf(y)) => f(x, y),
        (NodeKind::Internal(l, r), NodeKind::Leaf(_)) => {
            cross_rectangle_nodes(&**l, b, f);
            cross_rectangle_nodes(&**r, b, f);
        }
        (NodeKind::Leaf(_), NodeKind::Internal(l, r)) => {
            cross_rectangle_nodes(a, &**l, f);
            cross_rectangle_nodes(a, &**r, f);
        }
        (NodeKind::Internal(al, ar), NodeKind::Internal(..)) => {
            // Descend into the larger side first to keep the recursion shallow.
            if a.count >= b.count {
                cross_rectangle_nodes(&**al, b, f);
                cross_rectangle_nodes(&**ar, b, f);
            } else if let NodeKind::Internal(bl, br) = &b.kind {
                cross_rectangle_nodes(a, &**bl, f);
                cross_rectangle_nodes(a, &**br, f);
            }
        }
    }
}

pub struct Query<'a, T, F> {
    stack: Vec<&'a RectangleNode<T>>,
    rect: Rect,
    predicate: F,
}

impl<'a, T, F> Iterator for Query<'a, T, F>
where
    F: FnMut(&T) -> bool,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        while let Some(node) = self.stack.pop() {
            if !node.rect.intersects_inclusive(&self.rect) {
                continue;
            }
            match &node.kind {
                NodeKind::Leaf(item) => {
                    if (self.predicate)(item) {
                        return Some(item);
                    }
                }
                NodeKind::Internal(l, r) => {
                    self.stack.push(&**r);
                    self.stack.push(&**l);
                }
            }
        }
        None
    }
}
