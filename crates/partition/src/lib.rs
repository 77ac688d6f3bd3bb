//! Spatial partition: an N×N-branching bounding-box tree over static positions.
//!
//! # Invariants
//! - The tree is built once; positions never move afterwards.
//! - Every inserted position lives in exactly one leaf.
//! - Range queries return exactly the positions inside the query rectangle.
//!
//! Nodes live in a flat arena and refer to their children by index, so
//! teardown is a single `Vec` drop and traversal never recurses.

mod error;
mod tree;

pub use error::PartitionError;
pub use tree::{NodeId, PartitionTree, TreeConfig};

/// The 4-way split (16 children per node) used by the lattice.
pub type QuadSplitTree = PartitionTree<4>;

pub fn crate_info() -> &'static str {
    "latticeflow-partition v0.1.0"
}
