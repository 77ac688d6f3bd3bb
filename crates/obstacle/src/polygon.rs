use latticeflow_common::{Bounds, Vec2};

use crate::error::ObstacleError;

/// Fewest vertices a polygon may be built from, before closing.
pub const MIN_VERTICES: usize = 3;

/// A closed polygon obstacle.
///
/// The vertex loop always ends on its first vertex. Polygons are immutable
/// once built; there is no way to add or remove a vertex afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vec2>,
    bounds: Bounds,
}

impl Polygon {
    /// Build a polygon, closing the loop if the last vertex differs from the first.
    pub fn new(mut vertices: Vec<Vec2>) -> Result<Self, ObstacleError> {
        if vertices.len() < MIN_VERTICES {
            return Err(ObstacleError::InsufficientVertices {
                count: vertices.len(),
            });
        }
        let first = vertices[0];
        if vertices.last() != Some(&first) {
            vertices.push(first);
        }
        // Non-empty by the length check above.
        let bounds = Bounds::enclosing(&vertices).unwrap_or(Bounds::new(first, first));
        Ok(Self { vertices, bounds })
    }

    /// The closed vertex loop (first vertex repeated at the end).
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// Distinct vertices, without the closing duplicate.
    pub fn ring(&self) -> &[Vec2] {
        &self.vertices[..self.vertices.len() - 1]
    }

    /// Axis-aligned box around the polygon. May be degenerate.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Even-odd ray-casting test.
    ///
    /// Casts a ray towards +x and toggles parity for every edge that straddles
    /// the point's y with its crossing strictly to the right of the point. An
    /// edge straddles when exactly one endpoint lies above `p.y`, so horizontal
    /// edges never count. For an axis-aligned square this puts points on the
    /// left and bottom edges inside and points on the right and top edges
    /// outside.
    pub fn contains(&self, p: Vec2) -> bool {
        if !self.bounds.contains(p) {
            return false;
        }
        let ring = self.ring();
        let mut inside = false;
        let mut j = ring.len() - 1;
        for (i, vi) in ring.iter().enumerate() {
            let vj = ring[j];
            if (vi.y > p.y) != (vj.y > p.y) {
                let crossing = (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x;
                if p.x < crossing {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}
