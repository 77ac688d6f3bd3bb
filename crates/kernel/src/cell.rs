use latticeflow_common::Vec2;

use crate::d2q9::{self, Q};

/// One lattice site.
///
/// Fields are read-only outside the kernel. The obstacle flag in particular
/// is derived from the obstacle registry by the lattice and has no setter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub(crate) position: Vec2,
    pub(crate) density: f32,
    pub(crate) distribution: [f32; Q],
    pub(crate) is_obstacle: bool,
}

impl Cell {
    /// Cold-start cell: density 1.0 with an empty distribution.
    pub(crate) fn new(position: Vec2) -> Self {
        Self {
            position,
            density: 1.0,
            distribution: [0.0; Q],
            is_obstacle: false,
        }
    }

    /// World-space position, `(x, y) * cell_size`.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Macroscopic density as of the last completed step.
    pub fn density(&self) -> f32 {
        self.density
    }

    pub fn distribution(&self) -> &[f32; Q] {
        &self.distribution
    }

    pub fn is_obstacle(&self) -> bool {
        self.is_obstacle
    }

    /// Sum of the distribution components.
    pub fn mass(&self) -> f32 {
        self.distribution.iter().sum()
    }

    /// Macroscopic velocity `sum_i c_i f_i / density`, zero for obstacles.
    pub fn velocity(&self) -> Vec2 {
        if self.is_obstacle {
            return Vec2::ZERO;
        }
        let (mx, my) = d2q9::momentum(&self.distribution);
        let rho = guarded_density(self.density);
        Vec2::new(mx / rho, my / rho)
    }
}

/// Densities this close to zero are treated as 1.0 before dividing.
pub(crate) const DENSITY_EPSILON: f32 = 1e-6;

pub(crate) fn guarded_density(density: f32) -> f32 {
    if density.abs() < DENSITY_EPSILON {
        1.0
    } else {
        density
    }
}
