use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::graph::Graph;

/// Constant-degree rewrite of an arbitrary directed graph.
///
/// Every original vertex becomes a directed zero-weight cycle with one slot
/// per undirected neighbor (a single slot for isolated vertices), and every
/// surviving directed edge `u -> v` runs from `u`'s slot-for-`v` to `v`'s
/// slot-for-`u`. Each transformed vertex then has in-degree and out-degree
/// at most two (one cycle successor plus at most one inter-vertex edge),
/// and shortest-path distances between canonical slots match the original
/// graph.
#[derive(Debug)]
pub struct ConstantDegreeTransform {
    graph: Graph,
    orig_to_new: Vec<usize>,
    new_to_orig: Vec<usize>,
}

impl ConstantDegreeTransform {
    pub fn new(original: &Graph) -> Self {
        let n = original.vertex_count();
        if n == 0 {
            return Self {
                graph: Graph::new(0),
                orig_to_new: Vec::new(),
                new_to_orig: Vec::new(),
            };
        }

        // Keep only the minimum weight among parallel edges; heavier copies
        // can never lie on a shortest path. Self-loops are dropped for the
        // same reason.
        let mut weights: Vec<BTreeMap<u32, f64>> = vec![BTreeMap::new(); n];
        let mut neighbors: Vec<BTreeSet<u32>> = vec![BTreeSet::new(); n];
        for u in 0..n {
            for edge in original.out_edges(u) {
                let v = edge.to as usize;
                if v == u {
                    continue;
                }
                weights[u]
                    .entry(edge.to)
                    .and_modify(|w| {
                        if edge.weight < *w {
                            *w = edge.weight;
                        }
                    })
                    .or_insert(edge.weight);
                neighbors[u].insert(edge.to);
                neighbors[v].insert(u as u32);
            }
        }

        // One slot per neighbor, in ascending neighbor order; the first slot
        // is the canonical representative. Isolated vertices get a single
        // slot keyed by themselves.
        let mut slot_of: Vec<BTreeMap<u32, usize>> = vec![BTreeMap::new(); n];
        let mut orig_to_new = vec![0_usize; n];
        let mut new_to_orig = Vec::with_capacity(n);
        let mut next = 0_usize;
        for v in 0..n {
            if neighbors[v].is_empty() {
                slot_of[v].insert(v as u32, next);
                orig_to_new[v] = next;
                new_to_orig.push(v);
                next += 1;
                continue;
            }
            for (i, &w) in neighbors[v].iter().enumerate() {
                slot_of[v].insert(w, next);
                if i == 0 {
                    orig_to_new[v] = next;
                }
                new_to_orig.push(v);
                next += 1;
            }
        }

        let mut graph = Graph::new(next);

        // Zero-weight directed cycle over each vertex's slots. A single slot
        // would only yield a no-op self-loop, so it is skipped.
        for v in 0..n {
            let count = neighbors[v].len();
            if count <= 1 {
                continue;
            }
            let slots: Vec<usize> = slot_of[v].values().copied().collect();
            for i in 0..count {
                graph.add_edge(slots[i], slots[(i + 1) % count], 0.0);
            }
        }

        for u in 0..n {
            for (&to, &weight) in &weights[u] {
                let v = to as usize;
                let Some(&tail) = slot_of[u].get(&to) else {
                    continue;
                };
                let Some(&head) = slot_of[v].get(&(u as u32)) else {
                    continue;
                };
                graph.add_edge(tail, head, weight);
            }
        }

        Self {
            graph,
            orig_to_new,
            new_to_orig,
        }
    }

    #[inline]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    #[inline]
    pub fn orig_to_new(&self, v: usize) -> usize {
        self.orig_to_new[v]
    }

    /// Projects a path in the transformed graph back to original vertex
    /// indices, collapsing the runs produced by intra-vertex cycle hops.
    pub fn map_path(&self, path: &[usize]) -> Vec<usize> {
        let mut out = Vec::with_capacity(path.len());
        for &node in path {
            if node >= self.new_to_orig.len() {
                continue;
            }
            let orig = self.new_to_orig[node];
            if out.last() != Some(&orig) {
                out.push(orig);
            }
        }
        out
    }
}
