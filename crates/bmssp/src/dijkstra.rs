use std::cmp::Ordering;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::graph::Graph;

#[derive(Clone, Copy, PartialEq)]
struct QueueEntry {
    dist: f64,
    vertex: usize,
}

impl Eq for QueueEntry {}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .total_cmp(&other.dist)
            .then_with(|| self.vertex.cmp(&other.vertex))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Binary-heap Dijkstra with stale-entry skipping and early stop at `goal`.
///
/// Returns `(f64::INFINITY, None)` when `goal` is unreachable; otherwise the
/// path starts at `source` and ends at `goal`. Serves as the small-graph
/// fast path and the correctness oracle for the batched solver.
pub fn dijkstra(graph: &Graph, source: usize, goal: usize) -> (f64, Option<Vec<usize>>) {
    let n = graph.vertex_count();
    let mut dist = vec![f64::INFINITY; n];
    let mut prev: Vec<Option<usize>> = vec![None; n];
    dist[source] = 0.0;

    let mut heap = BinaryHeap::new();
    heap.push(Reverse(QueueEntry {
        dist: 0.0,
        vertex: source,
    }));

    while let Some(Reverse(entry)) = heap.pop() {
        let u = entry.vertex;
        if entry.dist > dist[u] {
            continue;
        }
        if u == goal {
            break;
        }

        for edge in graph.out_edges(u) {
            let v = edge.to as usize;
            let cand = dist[u] + edge.weight;
            if cand < dist[v] {
                dist[v] = cand;
                prev[v] = Some(u);
                heap.push(Reverse(QueueEntry {
                    dist: cand,
                    vertex: v,
                }));
            }
        }
    }

    if dist[goal].is_infinite() {
        return (f64::INFINITY, None);
    }

    let mut path = Vec::with_capacity(16);
    let mut curr = goal;
    loop {
        path.push(curr);
        if curr == source {
            break;
        }
        match prev[curr] {
            Some(p) => curr = p,
            None => break,
        }
    }
    path.reverse();
    (dist[goal], Some(path))
}

#[cfg(test)]
mod tests {
    use super::dijkstra;
    use crate::graph::Graph;

    #[test]
    fn finds_shortest_chain() {
        let g = Graph::from_edges(
            5,
            &[
                (0, 1, 4.0),
                (0, 2, 2.0),
                (1, 2, 5.0),
                (1, 3, 10.0),
                (2, 3, 3.0),
                (3, 4, 1.0),
            ],
        );
        let (dist, path) = dijkstra(&g, 0, 4);
        assert_eq!(dist, 6.0);
        assert_eq!(path, Some(vec![0, 2, 3, 4]));
    }

    #[test]
    fn reports_unreachable_goal() {
        let g = Graph::from_edges(3, &[(0, 1, 1.0)]);
        let (dist, path) = dijkstra(&g, 0, 2);
        assert!(dist.is_infinite());
        assert_eq!(path, None);
    }

    #[test]
    fn source_equals_goal() {
        let g = Graph::new(1);
        let (dist, path) = dijkstra(&g, 0, 0);
        assert_eq!(dist, 0.0);
        assert_eq!(path, Some(vec![0]));
    }
}
