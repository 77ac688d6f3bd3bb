use std::fmt;

use latticeflow_common::Vec2;
use latticeflow_kernel::Lattice;

/// Read-only queries against lattice state for debugging and reporting.
pub struct LatticeInspector;

impl LatticeInspector {
    /// Aggregate statistics over the whole lattice.
    ///
    /// Density and speed extremes cover finite fluid cells only; with none
    /// they are zero. Fluid cells with a non-finite density, mass or speed are
    /// counted in `non_finite_cells` instead.
    pub fn summary(lattice: &Lattice) -> LatticeSummary {
        let mut stats = FluidStats::default();
        for cell in lattice.cells().iter().filter(|c| !c.is_obstacle()) {
            stats.add(cell.density(), cell.mass(), cell.velocity().length());
        }

        LatticeSummary {
            tick: lattice.tick(),
            width: lattice.width(),
            height: lattice.height(),
            obstacles: lattice.obstacle_count(),
            obstacle_cells: lattice.cells().len() - stats.fluid,
            total_mass: lattice.total_mass(),
            total_density: lattice.total_density(),
            min_density: stats.min_density.unwrap_or(0.0),
            max_density: stats.max_density.unwrap_or(0.0),
            max_speed: stats.max_speed,
            non_finite_cells: stats.non_finite,
            reset_cells: lattice.reset_cells(),
        }
    }

    /// Snapshot of the cell at grid coordinate `(x, y)`.
    pub fn inspect_cell(lattice: &Lattice, x: usize, y: usize) -> Option<CellInfo> {
        let index = lattice.index(x, y)?;
        let cell = lattice.cells().get(index)?;
        Some(CellInfo {
            index,
            x,
            y,
            position: cell.position(),
            density: cell.density(),
            mass: cell.mass(),
            velocity: cell.velocity(),
            is_obstacle: cell.is_obstacle(),
        })
    }
}

/// Running extremes over fluid cells.
#[derive(Debug, Default)]
struct FluidStats {
    fluid: usize,
    non_finite: usize,
    min_density: Option<f32>,
    max_density: Option<f32>,
    max_speed: f32,
}

impl FluidStats {
    fn add(&mut self, density: f32, mass: f32, speed: f32) {
        self.fluid += 1;
        if !(density.is_finite() && mass.is_finite() && speed.is_finite()) {
            self.non_finite += 1;
            return;
        }
        self.min_density = Some(self.min_density.map_or(density, |d| d.min(density)));
        self.max_density = Some(self.max_density.map_or(density, |d| d.max(density)));
        self.max_speed = self.max_speed.max(speed);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LatticeSummary {
    pub tick: u64,
    pub width: usize,
    pub height: usize,
    /// Registered obstacle polygons.
    pub obstacles: usize,
    /// Cells flagged as obstacles.
    pub obstacle_cells: usize,
    pub total_mass: f64,
    pub total_density: f64,
    pub min_density: f32,
    pub max_density: f32,
    pub max_speed: f32,
    /// Fluid cells whose density, mass or speed is NaN or infinite.
    pub non_finite_cells: usize,
    /// Cells the solver has reset after overflow, over the whole run.
    pub reset_cells: u64,
}

impl fmt::Display for LatticeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lattice: tick={} grid={}x{} obstacles={} ({} cells) mass={:.4} density={:.4} \
             range=[{:.4}, {:.4}] max_speed={:.6} non_finite={} resets={}",
            self.tick,
            self.width,
            self.height,
            self.obstacles,
            self.obstacle_cells,
            self.total_mass,
            self.total_density,
            self.min_density,
            self.max_density,
            self.max_speed,
            self.non_finite_cells,
            self.reset_cells,
        )
    }
}

/// One cell's macroscopic state.
#[derive(Debug, Clone, PartialEq)]
pub struct CellInfo {
    pub index: usize,
    pub x: usize,
    pub y: usize,
    pub position: Vec2,
    pub density: f32,
    pub mass: f32,
    pub velocity: Vec2,
    pub is_obstacle: bool,
}

impl fmt::Display for CellInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cell #{} ({}, {}) pos=({:.2}, {:.2}) density={:.4} mass={:.4} u=({:.5}, {:.5}){}",
            self.index,
            self.x,
            self.y,
            self.position.x,
            self.position.y,
            self.density,
            self.mass,
            self.velocity.x,
            self.velocity.y,
            if self.is_obstacle { " obstacle" } else { "" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use latticeflow_kernel::SimConfig;

    fn lattice() -> Lattice {
        Lattice::new(SimConfig::new(6, 5, 2.0, 0.5, -0.01)).unwrap()
    }

    fn block(x0: f32, y0: f32, x1: f32, y1: f32) -> Vec<Vec2> {
        vec![
            Vec2::new(x0, y0),
            Vec2::new(x1, y0),
            Vec2::new(x1, y1),
            Vec2::new(x0, y1),
        ]
    }

    #[test]
    fn summary_of_cold_lattice() {
        let lat = lattice();
        let s = LatticeInspector::summary(&lat);
        assert_eq!(s.tick, 0);
        assert_eq!((s.width, s.height), (6, 5));
        assert_eq!(s.obstacles, 0);
        assert_eq!(s.obstacle_cells, 0);
        assert_eq!(s.total_mass, 0.0);
        assert_eq!(s.total_density, 30.0);
        assert_eq!((s.min_density, s.max_density), (1.0, 1.0));
        assert_eq!(s.max_speed, 0.0);
        assert_eq!(s.non_finite_cells, 0);
        assert_eq!(s.reset_cells, 0);
    }

    #[test]
    fn summary_tracks_steps_and_obstacles() {
        let mut lat = lattice();
        // world x in 3..5 and y in 3..5 covers grid (2, 2) only
        lat.add_obstacle(&block(3.0, 3.0, 5.0, 5.0)).unwrap();
        lat.step();
        lat.step();
        let s = LatticeInspector::summary(&lat);
        assert_eq!(s.tick, 2);
        assert_eq!(s.obstacles, 1);
        assert_eq!(s.obstacle_cells, 1);
        assert!(s.total_mass > 0.0);
        assert!(s.min_density <= s.max_density);
        assert!(s.max_speed > 0.0);
    }

    #[test]
    fn summary_with_every_cell_blocked() {
        let mut lat = lattice();
        lat.add_obstacle(&block(-1.0, -1.0, 20.0, 20.0)).unwrap();
        let s = LatticeInspector::summary(&lat);
        assert_eq!(s.obstacle_cells, 30);
        assert_eq!((s.min_density, s.max_density), (0.0, 0.0));
    }

    #[test]
    fn stats_count_non_finite_cells_separately() {
        let mut stats = FluidStats::default();
        stats.add(0.9, 0.9, 0.01);
        stats.add(f32::NAN, f32::NAN, f32::NAN);
        stats.add(1.1, f32::INFINITY, 0.02);
        stats.add(1.2, 1.2, 0.05);
        assert_eq!(stats.fluid, 4);
        assert_eq!(stats.non_finite, 2);
        assert_eq!(stats.min_density, Some(0.9));
        assert_eq!(stats.max_density, Some(1.2));
        assert_eq!(stats.max_speed, 0.05);
    }

    #[test]
    fn stats_with_only_non_finite_cells_have_no_range() {
        let mut stats = FluidStats::default();
        stats.add(f32::NAN, f32::NAN, f32::NAN);
        stats.add(1.0, 1.0, f32::INFINITY);
        assert_eq!(stats.non_finite, 2);
        assert_eq!(stats.min_density, None);
        assert_eq!(stats.max_density, None);
        assert_eq!(stats.max_speed, 0.0);
    }

    #[test]
    fn summary_display() {
        let s = LatticeInspector::summary(&lattice());
        let text = format!("{s}");
        assert!(text.contains("tick=0"));
        assert!(text.contains("grid=6x5"));
        assert!(text.contains("non_finite=0"));
    }

    #[test]
    fn inspect_cell_found() {
        let lat = lattice();
        let info = LatticeInspector::inspect_cell(&lat, 3, 2).unwrap();
        assert_eq!(info.index, 15);
        assert_eq!(info.position, Vec2::new(6.0, 4.0));
        assert_eq!(info.density, 1.0);
        assert!(!info.is_obstacle);
        assert!(format!("{info}").starts_with("Cell #15 (3, 2)"));
    }

    #[test]
    fn inspect_cell_out_of_range() {
        let lat = lattice();
        assert!(LatticeInspector::inspect_cell(&lat, 6, 0).is_none());
        assert!(LatticeInspector::inspect_cell(&lat, 0, 5).is_none());
    }
}
