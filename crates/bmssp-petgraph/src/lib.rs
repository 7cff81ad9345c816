//! petgraph adapter for the bmssp engine.
//!
//! Node payloads act as the caller's native identifiers. They are sorted to
//! build a deterministic dense index map, edges are copied into the engine's
//! graph, and solve results are mapped back to identifiers. Missing
//! endpoints are errors; an unreachable goal stays a value, as in the core.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use bmssp::Graph;
use bmssp::Solver;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use petgraph::visit::IntoEdgeReferences;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError<Id: Debug> {
    #[error("endpoint {0:?} is not present in the input graph")]
    MissingEndpoint(Id),
}

/// Identifier-keyed view of a petgraph graph over the engine's `Graph`.
pub struct GraphAdapter<Id> {
    ids: Vec<Id>,
    indices: HashMap<Id, usize>,
    graph: Graph,
}

impl<Id: Copy + Ord + Hash + Debug> GraphAdapter<Id> {
    pub fn new(source: &StableDiGraph<Id, f64>) -> Self {
        let mut ids: Vec<Id> = source.node_weights().copied().collect();
        ids.sort_unstable();
        let mut indices = HashMap::with_capacity(ids.len());
        for (i, &id) in ids.iter().enumerate() {
            let prev = indices.insert(id, i);
            assert!(prev.is_none(), "duplicate node identifier: {id:?}");
        }

        let mut graph = Graph::new(ids.len());
        for edge in source.edge_references() {
            let u = indices[&source[edge.source()]];
            let v = indices[&source[edge.target()]];
            graph.add_edge(u, v, *edge.weight());
        }

        Self { ids, indices, graph }
    }

    #[inline]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Shortest distance and path keyed by native identifiers.
    pub fn solve(&self, source: Id, goal: Id) -> Result<(f64, Option<Vec<Id>>), AdapterError<Id>> {
        let &s = self
            .indices
            .get(&source)
            .ok_or(AdapterError::MissingEndpoint(source))?;
        let &g = self
            .indices
            .get(&goal)
            .ok_or(AdapterError::MissingEndpoint(goal))?;

        let mut solver = Solver::new(&self.graph);
        let (dist, path) = solver.solve(s, g);
        let path = path.map(|p| p.into_iter().map(|i| self.ids[i]).collect());
        Ok((dist, path))
    }
}

/// One-shot convenience over [`GraphAdapter`].
pub fn solve<Id: Copy + Ord + Hash + Debug>(
    graph: &StableDiGraph<Id, f64>,
    source: Id,
    goal: Id,
) -> Result<(f64, Option<Vec<Id>>), AdapterError<Id>> {
    GraphAdapter::new(graph).solve(source, goal)
}
