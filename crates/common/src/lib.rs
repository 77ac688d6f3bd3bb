//! Shared geometry for the latticeflow workspace.
//!
//! # Invariants
//! - Vectors are plain values; nothing here holds references into solver state.
//! - `Bounds` containment and intersection are inclusive on every edge.

mod types;

pub use glam::Vec2;
pub use types::Bounds;
