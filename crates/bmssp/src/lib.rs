//! Single-pair shortest paths on nonnegative weighted directed graphs via
//! the bounded multi-source recursion of Duan et al. (arXiv:2504.17033):
//! label-bounded batches pulled from a block-structured frontier, with a
//! bounded Dijkstra base case and a constant-degree input rewrite.
//!
//! Small graphs fall back to plain Dijkstra; `Solver::force_bmssp` runs the
//! batched recursion unconditionally.

mod block_index;
mod dijkstra;
mod frontier;
mod graph;
mod label;
mod solver;
mod transform;

pub mod generator;

pub use dijkstra::dijkstra;
pub use graph::Edge;
pub use graph::Graph;
pub use solver::Solver;
