//! Developer Tooling: lattice inspector and step profiling.
//!
//! # Invariants
//! - Tools only read lattice state; nothing here can advance or modify it.

mod inspector;
mod profiling;

pub use inspector::{CellInfo, LatticeInspector, LatticeSummary};
pub use profiling::StepTimer;

pub fn crate_info() -> &'static str {
    "latticeflow-tools v0.1.0"
}
