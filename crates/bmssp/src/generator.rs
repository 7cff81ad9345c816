use std::collections::HashSet;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::graph::Graph;

const W_MAX: f64 = 1_000.0;

/// Input families for tests and benchmarks.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum GraphCase {
    SparseRandom,
    DenseRandom,
    ZeroClusters,
    ChainShortcuts,
    ParallelHeavy,
}

impl GraphCase {
    pub fn label(self) -> &'static str {
        match self {
            Self::SparseRandom => "sparse_random",
            Self::DenseRandom => "dense_random",
            Self::ZeroClusters => "zero_clusters",
            Self::ChainShortcuts => "chain_shortcuts",
            Self::ParallelHeavy => "parallel_heavy",
        }
    }
}

#[derive(Clone, Debug)]
pub struct GeneratedGraph {
    pub graph: Graph,
    pub source: usize,
    pub target: usize,
}

pub fn generate_case(case: GraphCase, size: usize, seed: u64) -> GeneratedGraph {
    match case {
        GraphCase::SparseRandom => sparse_random_case(size.max(16), seed, 4),
        GraphCase::DenseRandom => dense_random_case(size.max(64), seed),
        GraphCase::ZeroClusters => zero_clusters_case(size.max(32), seed),
        GraphCase::ChainShortcuts => chain_shortcuts_case(size.max(16), seed),
        GraphCase::ParallelHeavy => parallel_heavy_case(size.max(16), seed),
    }
}

fn endpoints(rng: &mut StdRng, n: usize) -> (usize, usize) {
    let source = rng.random_range(0..n);
    let mut target = rng.random_range(0..n);
    if source == target {
        target = (target + 1) % n;
    }
    (source, target)
}

fn sparse_random_case(size: usize, seed: u64, edge_factor: usize) -> GeneratedGraph {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = size.max(2);
    let m_target = n.saturating_mul(edge_factor).min(n * (n - 1));
    let mut edges = Vec::with_capacity(m_target);
    let mut used = HashSet::with_capacity(m_target * 2 + 1);

    while edges.len() < m_target {
        let u = rng.random_range(0..n);
        let v = rng.random_range(0..n);
        if u == v {
            continue;
        }
        let key = ((u as u64) << 32) | v as u64;
        if used.insert(key) {
            edges.push((u as u32, v as u32, rng.random_range(0.0..=W_MAX)));
        }
    }

    let (source, target) = endpoints(&mut rng, n);
    GeneratedGraph {
        graph: Graph::from_edges(n, &edges),
        source,
        target,
    }
}

fn dense_random_case(size: usize, seed: u64) -> GeneratedGraph {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = (size as f64).sqrt().floor() as usize;
    let n = n.max(8);
    let mut edges = Vec::with_capacity(n * (n - 1));

    for u in 0..n {
        for v in 0..n {
            if u != v {
                edges.push((u as u32, v as u32, rng.random_range(0.0..=W_MAX)));
            }
        }
    }

    let (source, target) = endpoints(&mut rng, n);
    GeneratedGraph {
        graph: Graph::from_edges(n, &edges),
        source,
        target,
    }
}

/// Clusters of zero-weight cycles joined by weighted bridges; exercises
/// equal-distance tie-breaking and zero-cost reachability.
fn zero_clusters_case(size: usize, seed: u64) -> GeneratedGraph {
    let mut rng = StdRng::seed_from_u64(seed);
    let cluster = 4_usize;
    let n = size.max(2 * cluster) / cluster * cluster;
    let mut edges = Vec::with_capacity(2 * n);

    for start in (0..n).step_by(cluster) {
        for i in 0..cluster {
            let from = start + i;
            let to = start + (i + 1) % cluster;
            edges.push((from as u32, to as u32, 0.0));
        }
        if start + cluster < n {
            let from = start + rng.random_range(0..cluster);
            let to = start + cluster + rng.random_range(0..cluster);
            edges.push((from as u32, to as u32, rng.random_range(0.0..=W_MAX)));
        }
    }

    GeneratedGraph {
        graph: Graph::from_edges(n, &edges),
        source: 0,
        target: n - 1,
    }
}

/// A long chain with a few random long-range shortcuts, so the shortest
/// path mixes many short hops with occasional jumps.
fn chain_shortcuts_case(size: usize, seed: u64) -> GeneratedGraph {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = size.max(4);
    let mut edges = Vec::with_capacity(n + n / 4);

    for u in 0..n - 1 {
        edges.push((u as u32, (u + 1) as u32, 1.0 + rng.random_range(0.0..4.0)));
    }
    for _ in 0..n / 4 {
        let u = rng.random_range(0..n - 2);
        let v = rng.random_range(u + 1..n);
        edges.push((u as u32, v as u32, (v - u) as f64 * rng.random_range(0.5..2.0)));
    }

    GeneratedGraph {
        graph: Graph::from_edges(n, &edges),
        source: 0,
        target: n - 1,
    }
}

/// Sparse random graph where every edge is duplicated with heavier copies;
/// only the lightest copy may influence the answer.
fn parallel_heavy_case(size: usize, seed: u64) -> GeneratedGraph {
    let mut rng = StdRng::seed_from_u64(seed);
    let base = sparse_random_case(size, seed ^ 0x00A1_11E1, 3);
    let n = base.graph.vertex_count();
    let mut edges = Vec::with_capacity(base.graph.edge_count() * 2);

    for u in 0..n {
        for edge in base.graph.out_edges(u) {
            edges.push((u as u32, edge.to, edge.weight));
            edges.push((u as u32, edge.to, edge.weight + rng.random_range(1.0..=W_MAX)));
        }
    }

    GeneratedGraph {
        graph: Graph::from_edges(n, &edges),
        source: base.source,
        target: base.target,
    }
}
