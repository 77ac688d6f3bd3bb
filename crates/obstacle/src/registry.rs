use std::path::Path;

use latticeflow_common::Vec2;

use crate::error::ObstacleError;
use crate::polygon::Polygon;
use crate::source::parse_vertices;

/// Append-only set of polygon obstacles.
///
/// A point is obstructed when any polygon contains it. Overlapping polygons
/// need no resolution since the answer is a plain OR.
#[derive(Debug, Clone, Default)]
pub struct ObstacleRegistry {
    polygons: Vec<Polygon>,
}

impl ObstacleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a polygon from a vertex list. Returns the new obstacle count.
    pub fn add(&mut self, vertices: &[Vec2]) -> Result<usize, ObstacleError> {
        let polygon = Polygon::new(vertices.to_vec())?;
        Ok(self.push(polygon))
    }

    /// Add a polygon parsed from obstacle text.
    pub fn add_from_source(&mut self, source: &str) -> Result<usize, ObstacleError> {
        let vertices = parse_vertices(source)?;
        let polygon = Polygon::new(vertices)?;
        Ok(self.push(polygon))
    }

    /// Read an obstacle file and add the polygon it describes.
    pub fn add_from_file(&mut self, path: impl AsRef<Path>) -> Result<usize, ObstacleError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ObstacleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let count = self.add_from_source(&source)?;
        tracing::debug!(path = %path.display(), count, "loaded obstacle file");
        Ok(count)
    }

    fn push(&mut self, polygon: Polygon) -> usize {
        tracing::debug!(
            vertices = polygon.ring().len(),
            min = ?polygon.bounds().min,
            max = ?polygon.bounds().max,
            "obstacle registered"
        );
        self.polygons.push(polygon);
        self.polygons.len()
    }

    /// True if any registered polygon contains the point.
    pub fn contains(&self, p: Vec2) -> bool {
        self.polygons.iter().any(|poly| poly.contains(p))
    }

    /// Number of registered polygons.
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Polygon> {
        self.polygons.iter()
    }
}
