//! Obstacle text format.
//!
//! ```text
//! # comment lines start with '#'
//! 10.0 10.0
//! 40.0 10.0
//! 25.0 35.5
//! ```
//!
//! One `x y` vertex per line, whitespace separated. Blank lines and comments
//! are ignored, malformed lines are skipped with a warning. Tokens after the
//! first two on a line are ignored.

use latticeflow_common::Vec2;

use crate::error::ObstacleError;
use crate::polygon::MIN_VERTICES;

/// Parse vertices from obstacle text. Fails when fewer than three survive.
pub fn parse_vertices(source: &str) -> Result<Vec<Vec2>, ObstacleError> {
    let mut vertices = Vec::new();
    for (line_no, line) in source.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match parse_line(trimmed) {
            Some(v) => vertices.push(v),
            None => {
                tracing::warn!(
                    line = line_no + 1,
                    content = trimmed,
                    "skipping malformed vertex line"
                );
            }
        }
    }
    if vertices.len() < MIN_VERTICES {
        return Err(ObstacleError::InsufficientVertices {
            count: vertices.len(),
        });
    }
    Ok(vertices)
}

fn parse_line(line: &str) -> Option<Vec2> {
    let mut tokens = line.split_whitespace();
    let x = tokens.next()?.parse::<f32>().ok()?;
    let y = tokens.next()?.parse::<f32>().ok()?;
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    Some(Vec2::new(x, y))
}
