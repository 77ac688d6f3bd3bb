use std::path::Path;

use latticeflow_common::{Bounds, Vec2};
use latticeflow_obstacle::ObstacleRegistry;
use latticeflow_partition::{QuadSplitTree, TreeConfig};

use crate::cell::{Cell, guarded_density};
use crate::config::SimConfig;
use crate::d2q9::{self, Q, VELOCITIES};
use crate::error::LatticeError;

/// Lower clamp applied to fluid density after every step.
pub const DENSITY_MIN: f32 = 0.5;
/// Upper clamp applied to fluid density after every step.
pub const DENSITY_MAX: f32 = 1.5;

/// Largest velocity magnitude fed into the equilibrium distribution.
///
/// Keeps every equilibrium component positive and bounded for densities in
/// `[DENSITY_MIN, DENSITY_MAX]`.
pub const SPEED_LIMIT: f32 = 0.3;

/// The D2Q9 lattice: cells, obstacles, and the spatial index over cell positions.
///
/// The lattice owns all three exclusively. Callers get read-only views; the
/// only mutations are [`Lattice::step`] and the obstacle loaders.
///
/// Cells start cold: density 1.0 with every distribution component at zero,
/// so the first steps ramp mass up from nothing instead of starting in
/// equilibrium.
#[derive(Debug, Clone)]
pub struct Lattice {
    config: SimConfig,
    dt: f32,
    tau: f32,
    omega: f32,
    cells: Vec<Cell>,
    /// Streaming target. Reset at the start of every streaming pass and
    /// swapped with `cells` at its end.
    next: Vec<Cell>,
    obstacles: ObstacleRegistry,
    /// Built once over the fixed cell positions. `step` does not read it.
    tree: QuadSplitTree,
    tick: u64,
    /// Fluid cells reset after their distribution stopped being finite.
    resets: u64,
}

impl Lattice {
    /// Build a cold-start lattice from validated parameters.
    pub fn new(config: SimConfig) -> Result<Self, LatticeError> {
        config.validate()?;
        let (width, height, cell_size) = (config.width, config.height, config.cell_size);

        let obstacles = ObstacleRegistry::new();
        let mut cells = Vec::with_capacity(config.cell_count());
        for y in 0..height {
            for x in 0..width {
                let mut cell = Cell::new(Vec2::new(x as f32, y as f32) * cell_size);
                cell.is_obstacle = obstacles.contains(cell.position);
                cells.push(cell);
            }
        }

        let positions: Vec<Vec2> = cells.iter().map(Cell::position).collect();
        let world = Bounds::from_size(width as f32 * cell_size, height as f32 * cell_size);
        let tree_config = TreeConfig {
            leaf_size: 2.0 * cell_size,
            min_node_size: cell_size,
        };
        let tree = QuadSplitTree::build(world, tree_config, &positions)?;

        let (dt, tau, omega) = (config.dt(), config.tau(), config.omega());
        if config.near_stability_limit() {
            tracing::warn!(
                tau,
                omega,
                viscosity = config.viscosity,
                cell_size,
                "tau is at the BGK stability limit (omega near 2); velocities will be \
                 capped and cells that overflow reset, so results are not physical"
            );
        }
        tracing::debug!(
            width,
            height,
            cell_size,
            dt,
            tau,
            omega,
            bounce_back = ?config.bounce_back,
            tree_nodes = tree.node_count(),
            "lattice created"
        );

        Ok(Self {
            config,
            dt,
            tau,
            omega,
            next: cells.clone(),
            cells,
            obstacles,
            tree,
            tick: 0,
            resets: 0,
        })
    }

    /// Advance the simulation by one tick: collision, streaming, then density update.
    pub fn step(&mut self) {
        let _span = tracing::info_span!("lattice_step", tick = self.tick + 1).entered();
        self.collide();
        self.stream();
        self.update_density();
        self.tick += 1;
        tracing::trace!(tick = self.tick, mass = self.total_mass(), "step complete");
    }

    /// BGK relaxation of every fluid cell towards its local equilibrium.
    /// Purely per-cell; obstacle cells keep their distribution. The velocity
    /// used for the equilibrium is capped at [`SPEED_LIMIT`].
    fn collide(&mut self) {
        let omega = self.omega;
        let gravity_offset = self.config.gravity * self.dt;
        for cell in self.cells.iter_mut().filter(|c| !c.is_obstacle) {
            let rho = guarded_density(cell.density);
            let (mx, my) = d2q9::momentum(&cell.distribution);
            let (ux, uy) = d2q9::limit_speed(mx / rho, my / rho + gravity_offset, SPEED_LIMIT);
            let feq = d2q9::equilibrium(rho, ux, uy);
            for (f, eq) in cell.distribution.iter_mut().zip(feq) {
                *f = (1.0 - omega) * *f + omega * eq;
            }
        }
    }

    /// Scatter every fluid cell's distribution to its neighbors.
    ///
    /// Reads only `cells` and writes only `next`, so the order cells are
    /// visited in cannot matter. Mass aimed outside the grid or into an
    /// obstacle stays in the source cell, in the slot chosen by the
    /// bounce-back policy.
    fn stream(&mut self) {
        let (width, height) = (self.config.width, self.config.height);
        let bounce = self.config.bounce_back;

        for (next, cell) in self.next.iter_mut().zip(&self.cells) {
            *next = *cell;
            if !cell.is_obstacle {
                next.distribution = [0.0; Q];
            }
        }

        for y in 0..height {
            for x in 0..width {
                let idx = y * width + x;
                let src = &self.cells[idx];
                if src.is_obstacle {
                    continue;
                }
                for (i, &(cx, cy)) in VELOCITIES.iter().enumerate() {
                    let out = src.distribution[i];
                    match neighbor(width, height, x, y, cx, cy) {
                        Some(n) if !self.cells[n].is_obstacle => {
                            self.next[n].distribution[i] += out;
                        }
                        _ => self.next[idx].distribution[bounce.reflect(i)] += out,
                    }
                }
            }
        }

        std::mem::swap(&mut self.cells, &mut self.next);
    }

    /// Recompute fluid density from the streamed distribution.
    ///
    /// A cell whose distribution or mass is no longer finite keeps its last
    /// density and restarts from rest equilibrium, `w_i * density`, so the
    /// overflow does not stream into its neighbors. This does not conserve
    /// mass.
    fn update_density(&mut self) {
        let mut reset = 0u64;
        for cell in self.cells.iter_mut().filter(|c| !c.is_obstacle) {
            let mass = cell.mass();
            if !mass.is_finite() || cell.distribution.iter().any(|f| !f.is_finite()) {
                cell.distribution = d2q9::equilibrium(cell.density, 0.0, 0.0);
                reset += 1;
                continue;
            }
            cell.density = mass.clamp(DENSITY_MIN, DENSITY_MAX);
        }
        if reset > 0 {
            self.resets += reset;
            tracing::warn!(
                tick = self.tick + 1,
                cells = reset,
                total = self.resets,
                "reset non-finite cells to rest equilibrium"
            );
        }
    }

    /// Add a polygon obstacle. Returns the new obstacle count.
    ///
    /// On success every cell's obstacle flag is recomputed from the full
    /// registry. On failure nothing changes.
    pub fn add_obstacle(&mut self, vertices: &[Vec2]) -> Result<usize, LatticeError> {
        let count = self.obstacles.add(vertices)?;
        self.refresh_obstacle_flags();
        Ok(count)
    }

    /// Add an obstacle from obstacle text (one `x y` vertex per line).
    pub fn add_obstacle_from_source(&mut self, source: &str) -> Result<usize, LatticeError> {
        let count = self.obstacles.add_from_source(source)?;
        self.refresh_obstacle_flags();
        Ok(count)
    }

    /// Add an obstacle from an obstacle text file.
    pub fn add_obstacle_from_file(&mut self, path: impl AsRef<Path>) -> Result<usize, LatticeError> {
        let count = self.obstacles.add_from_file(path)?;
        self.refresh_obstacle_flags();
        Ok(count)
    }

    /// Full rescan: O(cells * obstacles). Only runs when an obstacle is added.
    fn refresh_obstacle_flags(&mut self) {
        for cell in &mut self.cells {
            cell.is_obstacle = self.obstacles.contains(cell.position);
        }
        tracing::debug!(
            obstacles = self.obstacles.len(),
            obstacle_cells = self.obstacle_cell_count(),
            "obstacle flags refreshed"
        );
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Row-major index of grid coordinate `(x, y)`, if it is on the grid.
    pub fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.config.width && y < self.config.height).then(|| y * self.config.width + x)
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn width(&self) -> usize {
        self.config.width
    }

    pub fn height(&self) -> usize {
        self.config.height
    }

    pub fn cell_size(&self) -> f32 {
        self.config.cell_size
    }

    pub fn viscosity(&self) -> f32 {
        self.config.viscosity
    }

    pub fn gravity(&self) -> f32 {
        self.config.gravity
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn tau(&self) -> f32 {
        self.tau
    }

    pub fn omega(&self) -> f32 {
        self.omega
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Number of steps taken since construction.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Total fluid-cell resets after non-finite distributions since construction.
    pub fn reset_cells(&self) -> u64 {
        self.resets
    }

    /// Number of registered obstacle polygons.
    pub fn obstacle_count(&self) -> usize {
        self.obstacles.len()
    }

    pub fn obstacles(&self) -> &ObstacleRegistry {
        &self.obstacles
    }

    /// Number of cells currently flagged as obstacles.
    pub fn obstacle_cell_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_obstacle).count()
    }

    /// Spatial index over cell positions.
    pub fn tree(&self) -> &QuadSplitTree {
        &self.tree
    }

    /// Indices of cells whose positions lie in `[min, max]`, via the spatial index.
    pub fn cells_in_range(&self, min: Vec2, max: Vec2) -> Vec<usize> {
        self.tree.query_range(min, max)
    }

    /// Macroscopic velocity of the cell at `index`.
    pub fn velocity(&self, index: usize) -> Option<Vec2> {
        self.cells.get(index).map(Cell::velocity)
    }

    /// Sum of every distribution component on the grid.
    pub fn total_mass(&self) -> f64 {
        self.cells.iter().map(|c| f64::from(c.mass())).sum()
    }

    /// Sum of every cell's density.
    pub fn total_density(&self) -> f64 {
        self.cells.iter().map(|c| f64::from(c.density)).sum()
    }

    /// Deterministic hash of the tick and full cell state.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&mut h, &self.tick.to_le_bytes());
        for cell in &self.cells {
            mix(&mut h, &[cell.is_obstacle as u8]);
            mix(&mut h, &cell.density.to_le_bytes());
            for f in &cell.distribution {
                mix(&mut h, &f.to_le_bytes());
            }
        }
        h
    }
}

/// Index of the neighbor at offset `(cx, cy)`, or `None` off the grid.
fn neighbor(width: usize, height: usize, x: usize, y: usize, cx: i32, cy: i32) -> Option<usize> {
    let nx = x.checked_add_signed(cx as isize)?;
    let ny = y.checked_add_signed(cy as isize)?;
    (nx < width && ny < height).then_some(ny * width + nx)
}
