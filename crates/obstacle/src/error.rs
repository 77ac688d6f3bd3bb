use std::path::PathBuf;

/// Reasons an obstacle is rejected. The registry is never modified on error.
#[derive(Debug, thiserror::Error)]
pub enum ObstacleError {
    #[error("insufficient vertices: got {count}, need at least 3")]
    InsufficientVertices { count: usize },
    #[error("failed to read obstacle file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
