use std::path::PathBuf;

use latticeflow_obstacle::ObstacleError;
use latticeflow_partition::PartitionError;

/// Invalid simulation parameters or an unreadable config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("grid must have at least one cell in each direction, got {width}x{height}")]
    EmptyGrid { width: usize, height: usize },
    #[error("cell_size must be positive and finite, got {0}")]
    CellSize(f32),
    #[error("viscosity must be non-negative and finite, got {0}")]
    Viscosity(f32),
    #[error("gravity must be finite, got {0}")]
    Gravity(f32),
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from building or configuring a lattice.
#[derive(Debug, thiserror::Error)]
pub enum LatticeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("spatial index: {0}")]
    Partition(#[from] PartitionError),
    #[error("obstacle rejected: {0}")]
    Obstacle(#[from] ObstacleError),
}
