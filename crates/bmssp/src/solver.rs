use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::collections::HashMap;
use std::collections::HashSet;

use crate::dijkstra::dijkstra;
use crate::frontier::Frontier;
use crate::frontier::FrontierItem;
use crate::graph::Graph;
use crate::label::Label;
use crate::transform::ConstantDegreeTransform;

const K_EXPONENT: f64 = 1.0 / 3.0;
const T_EXPONENT: f64 = 2.0 / 3.0;

/// Below this vertex count `solve` delegates to plain Dijkstra unless
/// `force_bmssp` is set. Not part of the observable contract.
const SMALL_GRAPH_THRESHOLD: usize = 1000;

/// Single-pair shortest-path solver running the bounded multi-source
/// recursion of Duan et al. (arXiv:2504.17033) over a constant-degree
/// rewrite of the input graph.
///
/// A solver owns its per-solve buffers and must not be shared across
/// threads; several solvers may read the same `Graph` concurrently.
pub struct Solver<'a> {
    graph: &'a Graph,
    n: usize,
    k: usize,
    t: usize,
    levels: usize,
    distances: Vec<f64>,
    hops: Vec<u32>,
    predecessors: Vec<Option<u32>>,
    /// Run the batched recursion even under the small-graph threshold.
    pub force_bmssp: bool,
}

impl<'a> Solver<'a> {
    pub fn new(graph: &'a Graph) -> Self {
        let n = graph.vertex_count();
        let (k, t) = compute_parameters(n);
        let levels = compute_levels(n, t);
        Self {
            graph,
            n,
            k,
            t,
            levels,
            distances: vec![f64::INFINITY; n],
            hops: vec![u32::MAX; n],
            predecessors: vec![None; n],
            force_bmssp: false,
        }
    }

    /// Shortest distance and one concrete path from `source` to `goal`.
    ///
    /// `(f64::INFINITY, None)` when no path exists or either endpoint is out
    /// of range; `(0.0, [source])` when the endpoints coincide.
    pub fn solve(&mut self, source: usize, goal: usize) -> (f64, Option<Vec<usize>>) {
        if source >= self.n || goal >= self.n {
            return (f64::INFINITY, None);
        }

        if self.n < SMALL_GRAPH_THRESHOLD && !self.force_bmssp {
            return dijkstra(self.graph, source, goal);
        }

        let transform = ConstantDegreeTransform::new(self.graph);
        let mut inner = Solver::new(transform.graph());
        let (dist, path) = inner.solve_bmssp(
            transform.orig_to_new(source),
            transform.orig_to_new(goal),
        );
        let Some(path) = path else {
            return (f64::INFINITY, None);
        };
        let mapped = transform.map_path(&path);
        if mapped.is_empty() {
            return (f64::INFINITY, None);
        }
        (dist, Some(mapped))
    }

    fn solve_bmssp(&mut self, source: usize, goal: usize) -> (f64, Option<Vec<usize>>) {
        self.reset_state();
        self.distances[source] = 0.0;
        self.hops[source] = 0;

        self.bmssp(self.levels, Label::INFINITY, &[source]);

        if self.distances[goal].is_infinite() {
            return (f64::INFINITY, None);
        }
        (self.distances[goal], self.reconstruct_path(source, goal))
    }

    fn reset_state(&mut self) {
        self.distances.fill(f64::INFINITY);
        self.hops.fill(u32::MAX);
        self.predecessors.fill(None);
    }

    #[inline]
    fn label(&self, v: usize) -> Label {
        Label::new(self.distances[v], self.hops[v], v as u32)
    }

    /// One level of the bounded recursion (Alg. 3): pivots seed a
    /// sub-frontier that is pulled in batches, each batch solved one level
    /// down, its relaxations fed back as inserts or prepends.
    fn bmssp(&mut self, level: usize, bound: Label, frontier: &[usize]) -> (Label, Vec<usize>) {
        if frontier.is_empty() {
            return (bound, Vec::new());
        }
        if level == 0 {
            return self.base_case(bound, frontier);
        }

        let (pivots, working_set) = self.find_pivots(bound, frontier);

        let mut ds = Frontier::new(self.block_size(level - 1), bound);
        for &pivot in &pivots {
            ds.insert(pivot, self.label(pivot));
        }

        let limit = self.threshold(level);
        let mut settled_set = HashSet::new();
        let mut settled = Vec::with_capacity(working_set.len());
        let mut last_bound = bound;
        let graph = self.graph;

        while settled.len() < limit && !ds.is_empty() {
            let (sub_bound, subset) = ds.pull();
            if subset.is_empty() {
                continue;
            }

            let (sub_prime, sub_settled) = self.bmssp(level - 1, sub_bound, &subset);
            last_bound = sub_prime;
            add_unique(&mut settled_set, &mut settled, &sub_settled);

            let mut batch = Vec::new();
            for &u in &sub_settled {
                for edge in graph.out_edges(u) {
                    let v = edge.to as usize;
                    if !self.relax_edge(u, v, edge.weight) {
                        continue;
                    }
                    let label = self.label(v);
                    if label_in_range(label, sub_bound, bound) {
                        ds.insert(v, label);
                    } else if label_in_range(label, sub_prime, sub_bound) {
                        batch.push(FrontierItem { vertex: v, label });
                    }
                }
            }

            // Pulled vertices not settled below the sub-recursion's tight
            // bound go back in front of everything still queued.
            for &v in &subset {
                let label = self.label(v);
                if label_in_range(label, sub_prime, sub_bound) {
                    batch.push(FrontierItem { vertex: v, label });
                }
            }

            if !batch.is_empty() {
                ds.batch_prepend(&batch);
            }
        }

        let partial = !ds.is_empty() && settled.len() >= limit;
        let mut result_bound = bound;
        if partial {
            result_bound = last_bound;
            // A raw tight bound at or past the caller's bound collapses
            // back to the caller's bound.
            if result_bound >= bound {
                result_bound = bound;
            }
        }

        for &v in &working_set {
            if self.label(v) < result_bound && settled_set.insert(v) {
                settled.push(v);
            }
        }

        (result_bound, settled)
    }

    /// Bounded-scope Dijkstra (Alg. 2) seeded from every frontier vertex
    /// below `bound`, capped at `k + 1` settled vertices. An overfull run
    /// trims away the max-label vertices and tightens the bound to that
    /// label.
    fn base_case(&mut self, bound: Label, sources: &[usize]) -> (Label, Vec<usize>) {
        if sources.is_empty() {
            return (bound, Vec::new());
        }

        let mut heap = BinaryHeap::new();
        for &start in sources {
            let label = self.label(start);
            if label < bound {
                heap.push(Reverse((label, start)));
            }
        }

        let mut visited_set = HashSet::new();
        let mut visited = Vec::with_capacity(self.k + 1);
        let graph = self.graph;

        while visited.len() < self.k + 1 {
            let Some(Reverse((label, u))) = heap.pop() else {
                break;
            };
            if label != self.label(u) {
                continue;
            }
            if !visited_set.insert(u) {
                continue;
            }
            visited.push(u);

            for edge in graph.out_edges(u) {
                let v = edge.to as usize;
                if !self.relax_edge(u, v, edge.weight) {
                    continue;
                }
                let label = self.label(v);
                if label < bound {
                    heap.push(Reverse((label, v)));
                }
            }
        }

        if visited.len() <= self.k {
            return (bound, visited);
        }

        let max_label = visited
            .iter()
            .map(|&v| self.label(v))
            .max()
            .expect("visited set is non-empty");
        let result = visited
            .iter()
            .copied()
            .filter(|&v| self.label(v) < max_label)
            .collect();
        (max_label, result)
    }

    /// K rounds of bounded relaxation from `frontier` (Alg. 1). A frontier
    /// vertex is a pivot iff its subtree in the predecessor forest
    /// restricted to the reached set has at least `k` vertices; a reached
    /// set larger than `k * |frontier|` short-circuits with every frontier
    /// vertex as a pivot.
    fn find_pivots(&mut self, bound: Label, frontier: &[usize]) -> (Vec<usize>, Vec<usize>) {
        if frontier.is_empty() {
            return (Vec::new(), Vec::new());
        }

        let mut working_set = HashSet::with_capacity(frontier.len() * 2);
        let mut working = Vec::with_capacity(frontier.len() * 2);
        for &v in frontier {
            if working_set.insert(v) {
                working.push(v);
            }
        }

        let mut current: Vec<usize> = frontier
            .iter()
            .copied()
            .filter(|&v| self.label(v) < bound)
            .collect();
        let limit = self.k.saturating_mul(frontier.len());
        let graph = self.graph;

        for _ in 0..self.k {
            if current.is_empty() {
                break;
            }
            let mut next = Vec::new();
            for &u in &current {
                if self.label(u) >= bound {
                    continue;
                }
                for edge in graph.out_edges(u) {
                    let v = edge.to as usize;
                    if !self.relax_edge(u, v, edge.weight) {
                        continue;
                    }
                    if self.label(v) < bound && working_set.insert(v) {
                        working.push(v);
                        next.push(v);
                    }
                }
            }
            if working.len() > limit {
                return (frontier.to_vec(), working);
            }
            current = next;
        }

        // Predecessor forest restricted to the reached set, sized bottom-up.
        let mut parent = HashMap::with_capacity(working.len());
        let mut child_count: HashMap<usize, usize> = HashMap::new();
        for &v in &working {
            let Some(p) = self.predecessors[v].map(|p| p as usize) else {
                continue;
            };
            if working_set.contains(&p) {
                parent.insert(v, p);
                *child_count.entry(p).or_insert(0) += 1;
            }
        }

        let mut sizes: HashMap<usize, usize> = working.iter().map(|&v| (v, 1)).collect();
        let mut stack: Vec<usize> = working
            .iter()
            .copied()
            .filter(|v| !child_count.contains_key(v))
            .collect();
        let mut processed = 0;
        while let Some(v) = stack.pop() {
            processed += 1;
            if let Some(&p) = parent.get(&v) {
                let grown = sizes[&v];
                *sizes.get_mut(&p).expect("parent is in the reached set") += grown;
                let pending = child_count.get_mut(&p).expect("counted parent");
                *pending -= 1;
                if *pending == 0 {
                    stack.push(p);
                }
            }
        }

        let mut pivots = Vec::with_capacity(frontier.len());
        if processed != working.len() {
            // Predecessor labels strictly decrease toward the root, so the
            // forest cannot cycle; an incomplete sweep falls back to every
            // frontier vertex.
            pivots.extend_from_slice(frontier);
        } else {
            for &root in frontier {
                if working_set.contains(&root) && sizes.get(&root).copied().unwrap_or(0) >= self.k {
                    pivots.push(root);
                }
            }
        }

        (pivots, working)
    }

    /// Relaxes `u -> v` under the lexicographic `(dist, hops, predecessor)`
    /// policy. An equal label reached through the same predecessor counts
    /// as success without mutation, so repeated traversals do not
    /// re-propagate.
    fn relax_edge(&mut self, u: usize, v: usize, weight: f64) -> bool {
        if self.distances[u].is_infinite() {
            return false;
        }

        let new_dist = self.distances[u] + weight;
        let new_hops = self.hops[u].saturating_add(1);

        if new_dist < self.distances[v] {
            self.distances[v] = new_dist;
            self.hops[v] = new_hops;
            self.predecessors[v] = Some(u as u32);
            return true;
        }
        if new_dist > self.distances[v] {
            return false;
        }

        if new_hops < self.hops[v] {
            self.distances[v] = new_dist;
            self.hops[v] = new_hops;
            self.predecessors[v] = Some(u as u32);
            return true;
        }
        if new_hops > self.hops[v] {
            return false;
        }

        match self.predecessors[v] {
            None => {
                self.distances[v] = new_dist;
                self.hops[v] = new_hops;
                self.predecessors[v] = Some(u as u32);
                true
            }
            Some(p) if (u as u32) < p => {
                self.distances[v] = new_dist;
                self.hops[v] = new_hops;
                self.predecessors[v] = Some(u as u32);
                true
            }
            Some(p) => p == u as u32,
        }
    }

    fn block_size(&self, level: usize) -> usize {
        if level == 0 {
            return 1;
        }
        pow2_saturating(level.saturating_mul(self.t))
    }

    fn threshold(&self, level: usize) -> usize {
        if level == 0 {
            return self.k;
        }
        self.k
            .saturating_mul(pow2_saturating(level.saturating_mul(self.t)))
    }

    fn reconstruct_path(&self, source: usize, goal: usize) -> Option<Vec<usize>> {
        let mut path = Vec::with_capacity(16);
        let mut curr = goal;
        loop {
            path.push(curr);
            if curr == source {
                break;
            }
            match self.predecessors[curr] {
                Some(p) => curr = p as usize,
                None => break,
            }
        }
        if path.last() != Some(&source) {
            return None;
        }
        path.reverse();
        Some(path)
    }
}

fn compute_parameters(n: usize) -> (usize, usize) {
    if n <= 1 {
        return (1, 1);
    }
    let logn = (n as f64).log2();
    let k = logn.powf(K_EXPONENT).floor() as usize;
    let t = logn.powf(T_EXPONENT).floor() as usize;
    (k.max(1), t.max(1))
}

fn compute_levels(n: usize, t: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    ((n as f64).log2() / t.max(1) as f64).ceil() as usize
}

#[inline]
fn pow2_saturating(exp: usize) -> usize {
    if exp >= usize::BITS as usize {
        usize::MAX
    } else {
        1_usize << exp
    }
}

#[inline]
fn label_in_range(label: Label, low: Label, high: Label) -> bool {
    label >= low && label < high
}

fn add_unique(set: &mut HashSet<usize>, list: &mut Vec<usize>, vertices: &[usize]) {
    for &v in vertices {
        if set.insert(v) {
            list.push(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Solver;
    use super::compute_levels;
    use super::compute_parameters;
    use super::pow2_saturating;
    use crate::graph::Graph;

    #[test]
    fn parameters_grow_with_vertex_count() {
        assert_eq!(compute_parameters(0), (1, 1));
        assert_eq!(compute_parameters(1), (1, 1));

        let (k_small, t_small) = compute_parameters(1 << 10);
        let (k_big, t_big) = compute_parameters(1 << 30);
        assert!(k_small >= 1 && t_small >= k_small);
        assert!(k_big >= k_small && t_big >= t_small);

        assert_eq!(compute_levels(1, 1), 0);
        assert!(compute_levels(1 << 10, t_small) >= 1);
    }

    #[test]
    fn pow2_saturates_instead_of_overflowing() {
        assert_eq!(pow2_saturating(0), 1);
        assert_eq!(pow2_saturating(4), 16);
        assert_eq!(pow2_saturating(usize::BITS as usize), usize::MAX);
        assert_eq!(pow2_saturating(10_000), usize::MAX);
    }

    #[test]
    fn relaxation_prefers_smaller_dist_then_hops_then_predecessor() {
        let mut g = Graph::new(4);
        g.add_edge(0, 3, 2.0);
        let mut solver = Solver::new(&g);
        solver.reset_state();
        solver.distances[0] = 1.0;
        solver.hops[0] = 1;
        solver.distances[1] = 1.0;
        solver.hops[1] = 1;
        solver.distances[2] = 1.0;
        solver.hops[2] = 2;

        // Strictly smaller distance wins.
        assert!(solver.relax_edge(0, 3, 2.0));
        assert_eq!(solver.distances[3], 3.0);
        assert_eq!(solver.predecessors[3], Some(0));

        // Larger distance is rejected.
        assert!(!solver.relax_edge(0, 3, 5.0));

        // Equal distance, more hops is rejected.
        assert!(!solver.relax_edge(2, 3, 2.0));

        // Equal distance and hops: a larger predecessor index is rejected,
        // the same predecessor reports success without mutation.
        assert!(!solver.relax_edge(1, 3, 2.0));
        assert!(solver.relax_edge(0, 3, 2.0));
        assert_eq!(solver.predecessors[3], Some(0));
    }

    #[test]
    fn relaxation_from_unreached_vertex_is_rejected() {
        let g = Graph::new(2);
        let mut solver = Solver::new(&g);
        solver.reset_state();
        assert!(!solver.relax_edge(0, 1, 1.0));
    }
}
