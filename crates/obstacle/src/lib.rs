//! Obstacles: closed polygons that block flow.
//!
//! # Invariants
//! - The registry is append-only; a rejected addition leaves it untouched.
//! - Every stored polygon is closed and has at least three distinct input vertices.
//! - Containment is the even-odd rule, OR-ed across all polygons.

mod error;
mod polygon;
mod registry;
mod source;

pub use error::ObstacleError;
pub use polygon::{MIN_VERTICES, Polygon};
pub use registry::ObstacleRegistry;
pub use source::parse_vertices;

pub fn crate_info() -> &'static str {
    "latticeflow-obstacle v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("obstacle"));
    }
}
