/// Construction-time failures. These indicate a caller or configuration bug.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PartitionError {
    #[error("invalid world bounds: min ({min_x}, {min_y}) must be strictly below max ({max_x}, {max_y})")]
    InvalidBounds {
        min_x: f32,
        min_y: f32,
        max_x: f32,
        max_y: f32,
    },
    #[error("invalid tree config: {0}")]
    InvalidConfig(String),
    #[error("position {index} at ({x}, {y}) lies outside the world bounds")]
    OutOfBounds { index: usize, x: f32, y: f32 },
}
