//! Lattice Kernel: D2Q9 cells, the collision-streaming step, obstacle flags.
//!
//! # Invariants
//! - Cells form a fixed row-major `width * height` array; index is `y * width + x`.
//! - A step runs collision, streaming, then the macroscopic update, in that order.
//! - Streaming reads a frozen buffer and writes a separate one; nothing is
//!   updated in place.
//! - Obstacle flags are derived from the obstacle registry and never set directly.
//! - Fluid cell density stays within `[DENSITY_MIN, DENSITY_MAX]` after every step.
//! - Fluid distributions are finite after every step; a cell that overflows is
//!   reset to rest equilibrium at its last density.

pub mod cell;
pub mod config;
pub mod d2q9;
pub mod error;
pub mod lattice;

pub use cell::Cell;
pub use config::{STABILITY_MARGIN, SimConfig};
pub use d2q9::BounceBack;
pub use error::{ConfigError, LatticeError};
pub use lattice::{DENSITY_MAX, DENSITY_MIN, Lattice, SPEED_LIMIT};
