//! A* over (vertex, incoming direction) states with a bend penalty.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use narwhal_geometry::{Directions, Point, manhattan_distance};

use crate::visibility_graph::{VertexIndex, VisibilityEdge, VisibilityGraph};

/// Lower bound on the cost of one bend.
const MIN_BEND_IMPORTANCE: f64 = 0.001;

/// "No incoming direction" slot of a search state.
const NO_DIRECTION: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchEndpoint {
    pub vertex: VertexIndex,
    /// At a source: directions the path may leave in. At a target: directions the path may
    /// arrive from, seen from the target (an east-only target is entered moving west).
    pub directions: Directions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub vertices: Vec<VertexIndex>,
    /// Index into the sources the path starts from.
    pub source: usize,
    /// Index into the targets the path ends at.
    pub target: usize,
    pub cost: f64,
}

/// Cost of one bend for a route between the given endpoints.
pub fn bend_importance(sources: &[Point], targets: &[Point], bend_penalty_percent: f64) -> f64 {
    let distance = sources
        .iter()
        .flat_map(|s| targets.iter().map(move |t| manhattan_distance(*s, *t)))
        .fold(f64::INFINITY, f64::min);
    let distance = if distance.is_finite() { distance } else { 0.0 };
    (distance * bend_penalty_percent / 100.0).max(MIN_BEND_IMPORTANCE)
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    estimate: f64,
    seq: u64,
    state: usize,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Reversed: `BinaryHeap` is a max-heap and the cheapest, oldest entry must pop first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .total_cmp(&self.estimate)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

pub struct PathSearch<'a, F> {
    graph: &'a VisibilityGraph,
    passable: F,
    bend_importance: f64,
}

impl<'a, F> PathSearch<'a, F>
where
    F: Fn(&VisibilityEdge) -> bool,
{
    pub fn new(graph: &'a VisibilityGraph, bend_importance: f64, passable: F) -> Self {
        Self {
            graph,
            passable,
            bend_importance,
        }
    }

    /// Cheapest path from any source to any target, or `None` when the passable edges do not
    /// connect them.
    pub fn run(&self, sources: &[SearchEndpoint], targets: &[SearchEndpoint]) -> Option<SearchResult> {
        let capacity = self.graph.vertex_capacity() * 5;
        let mut cost = vec![f64::INFINITY; capacity];
        let mut parent: Vec<Option<usize>> = vec![None; capacity];
        let mut origin: Vec<usize> = vec![0; capacity];
        let mut closed = vec![false; capacity];
        let mut heap = BinaryHeap::new();
        let mut seq = 0u64;
        let target_points: Vec<Point> = targets.iter().map(|t| self.graph.point(t.vertex)).collect();

        for (i, s) in sources.iter().enumerate() {
            let state = s.vertex.0 * 5 + NO_DIRECTION;
            if cost[state] <= 0.0 {
                continue;
            }
            cost[state] = 0.0;
            origin[state] = i;
            heap.push(Entry {
                estimate: self.heuristic(self.graph.point(s.vertex), None, &target_points),
                seq,
                state,
            });
            seq += 1;
        }

        while let Some(Entry { state, .. }) = heap.pop() {
            if closed[state] {
                continue;
            }
            closed[state] = true;
            let v = VertexIndex(state / 5);
            let incoming = direction_of_slot(state % 5);

            if let Some(t) = targets.iter().position(|t| t.vertex == v && arrives(t, incoming)) {
                return Some(SearchResult {
                    vertices: self.unwind(state, &parent),
                    source: origin[state],
                    target: t,
                    cost: cost[state],
                });
            }

            let allowed = match incoming {
                None => sources
                    .iter()
                    .filter(|s| s.vertex == v)
                    .fold(Directions::NONE, |acc, s| acc | s.directions),
                Some(d) => d | d.rotate_right() | d.rotate_left(),
            };
            let order = match incoming {
                None => Directions::PURE,
                Some(d) => [d, d.rotate_right(), d.rotate_left(), Directions::NONE],
            };
            let here = self.graph.point(v);
            for dir in order {
                if dir.is_none() || !allowed.contains(dir) {
                    continue;
                }
                let Some((e, next)) = self.graph.neighbor(v, dir) else {
                    continue;
                };
                let edge = self.graph.edge(e);
                if !(self.passable)(edge) {
                    continue;
                }
                let Some(slot) = dir.index() else {
                    continue;
                };
                let next_state = next.0 * 5 + slot;
                if closed[next_state] {
                    continue;
                }
                let there = self.graph.point(next);
                let bend = match incoming {
                    Some(d) if d != dir => self.bend_importance,
                    _ => 0.0,
                };
                let g = cost[state] + (there - here).length() * edge.weight + bend;
                if g < cost[next_state] {
                    cost[next_state] = g;
                    parent[next_state] = Some(state);
                    origin[next_state] = origin[state];
                    heap.push(Entry {
                        estimate: g + self.heuristic(there, Some(dir), &target_points),
                        seq,
                        state: next_state,
                    });
                    seq += 1;
                }
            }
        }
        None
    }

    fn unwind(&self, mut state: usize, parent: &[Option<usize>]) -> Vec<VertexIndex> {
        let mut out = vec![VertexIndex(state / 5)];
        while let Some(p) = parent[state] {
            out.push(VertexIndex(p / 5));
            state = p;
        }
        out.reverse();
        out
    }

    /// Manhattan distance plus the bends still needed, to the nearest target.
    fn heuristic(&self, p: Point, incoming: Option<Directions>, targets: &[Point]) -> f64 {
        targets
            .iter()
            .map(|t| manhattan_distance(p, *t) + self.bend_importance * remaining_bends(p, incoming, *t))
            .fold(f64::INFINITY, f64::min)
    }
}

fn direction_of_slot(slot: usize) -> Option<Directions> {
    Directions::PURE.get(slot).copied()
}

fn arrives(target: &SearchEndpoint, incoming: Option<Directions>) -> bool {
    match incoming {
        None => true,
        Some(d) => target.directions.contains(d.opposite()),
    }
}

/// Minimal number of bends from `p`, moving toward `incoming`, to reach `t`.
fn remaining_bends(p: Point, incoming: Option<Directions>, t: Point) -> f64 {
    let needed = Directions::between(p, t);
    let Some(d) = incoming else {
        return if needed.is_pure() || needed.is_none() { 0.0 } else { 1.0 };
    };
    if needed.is_none() {
        return 0.0;
    }
    if needed == d {
        0.0
    } else if needed.contains(d.opposite()) {
        2.0
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visibility_graph::NORMAL_WEIGHT;
    use narwhal_geometry::point;

    /// 3x3 lattice with unit spacing.
    fn lattice() -> (VisibilityGraph, Vec<VertexIndex>) {
        let mut g = VisibilityGraph::default();
        let mut v = Vec::new();
        for y in 0..3 {
            for x in 0..3 {
                v.push(g.add_vertex(point(x as f64, y as f64), false));
            }
        }
        for y in 0..3 {
            for x in 0..3 {
                let i = y * 3 + x;
                if x < 2 {
                    g.add_edge(v[i], v[i + 1], NORMAL_WEIGHT, Vec::new(), false);
                }
                if y < 2 {
                    g.add_edge(v[i], v[i + 3], NORMAL_WEIGHT, Vec::new(), false);
                }
            }
        }
        (g, v)
    }

    #[test]
    fn prefers_fewer_bends_at_equal_length() {
        let (g, v) = lattice();
        let search = PathSearch::new(&g, 0.5, |_| true);
        let result = search
            .run(
                &[SearchEndpoint { vertex: v[0], directions: Directions::ALL }],
                &[SearchEndpoint { vertex: v[8], directions: Directions::ALL }],
            )
            .unwrap();
        let points: Vec<Point> = result.vertices.iter().map(|x| g.point(*x)).collect();
        let bends = points
            .windows(3)
            .filter(|w| Directions::between(w[0], w[1]) != Directions::between(w[1], w[2]))
            .count();
        assert_eq!(bends, 1);
        assert!((result.cost - 4.5).abs() < 1e-9);
    }

    #[test]
    fn respects_source_directions_and_passability() {
        let (g, v) = lattice();
        let search = PathSearch::new(&g, 0.5, |e: &VisibilityEdge| e.source != v[1] || e.target != v[2]);
        let result = search
            .run(
                &[SearchEndpoint { vertex: v[0], directions: Directions::EAST }],
                &[SearchEndpoint { vertex: v[2], directions: Directions::ALL }],
            )
            .unwrap();
        assert_eq!(result.vertices.first(), Some(&v[0]));
        assert_eq!(result.vertices.get(1), Some(&v[1]));
        assert_eq!(result.vertices.last(), Some(&v[2]));
        assert!(result.vertices.contains(&v[4]));
    }
}
