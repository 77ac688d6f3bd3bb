use std::fmt::Write as _;

use latticeflow_kernel::Lattice;

/// Density window used to normalize cell colors and shades.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    /// Density drawn fully blue.
    pub density_low: f32,
    /// Density drawn fully red.
    pub density_high: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            density_low: 0.8,
            density_high: 1.2,
        }
    }
}

impl RenderView {
    fn midpoint(&self) -> f32 {
        0.5 * (self.density_low + self.density_high)
    }

    /// Position of `density` inside the window, clamped to `[0, 1]`.
    fn normalize(&self, density: f32) -> f32 {
        let span = self.density_high - self.density_low;
        if !(span > 0.0) {
            return 0.5;
        }
        ((density - self.density_low) / span).clamp(0.0, 1.0)
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer reads the lattice and a view, then produces output. The lattice
/// is borrowed immutably; solver state is kernel-owned.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render the current lattice state.
    fn render(&self, lattice: &Lattice, view: &RenderView) -> Self::Output;
}

/// Blue to green to red ramp over the view's density window, as RGB in `[0, 1]`.
///
/// Low densities are blue, the midpoint is mostly green, high densities are
/// red. Densities outside the window are clamped to its ends.
pub fn density_color(density: f32, view: &RenderView) -> [f32; 3] {
    let span = view.density_high - view.density_low;
    if !(span > 0.0) {
        return [0.0, 0.8, 0.0];
    }
    // Reciprocal of the half-width: 5 for the default 0.8..1.2 window.
    let k = 2.0 / span;
    let d = density.clamp(view.density_low, view.density_high);
    let r = ((d - view.density_low) * k).min(1.0);
    let b = ((view.density_high - d) * k).min(1.0);
    let g = 0.2 + 0.6 * (1.0 - (d - view.midpoint()).abs() * k);
    [r, g, b]
}

/// One-line parameter summary: tick, grid size, viscosity, obstacle count.
pub fn status_line(lattice: &Lattice) -> String {
    format!(
        "tick={} | Grid: {}x{} | Viscosity: {} | Obstacles: {}",
        lattice.tick(),
        lattice.width(),
        lattice.height(),
        lattice.viscosity(),
        lattice.obstacle_count()
    )
}

/// Character map of the lattice, one character per cell.
///
/// Obstacles are `#`; fluid cells use a ten-step shade ramp from `' '`
/// (at or below `density_low`) to `'@'` (at or above `density_high`).
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

const SHADES: &[u8] = b" .:-=+*%#@";
const OBSTACLE: char = '#';

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }

    fn shade(view: &RenderView, density: f32) -> char {
        let t = view.normalize(density);
        let i = (t * (SHADES.len() - 1) as f32).round() as usize;
        // '#' in the ramp would read as an obstacle
        match SHADES[i.min(SHADES.len() - 1)] as char {
            OBSTACLE => '&',
            c => c,
        }
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, lattice: &Lattice, view: &RenderView) -> String {
        let (width, height) = (lattice.width(), lattice.height());
        let mut out = String::with_capacity((width + 1) * (height + 1) + 64);
        let _ = writeln!(out, "{}", status_line(lattice));
        for row in lattice.cells().chunks(width).rev() {
            for cell in row {
                out.push(if cell.is_obstacle() {
                    OBSTACLE
                } else {
                    Self::shade(view, cell.density())
                });
            }
            out.push('\n');
        }
        out
    }
}

/// Binary PPM (P6) image of the density field. Obstacles are black.
///
/// Every cell becomes a `scale` x `scale` block of pixels.
#[derive(Debug, Clone, Copy)]
pub struct PpmRenderer {
    scale: usize,
}

impl Default for PpmRenderer {
    fn default() -> Self {
        Self { scale: 1 }
    }
}

impl PpmRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pixels per cell edge. Values below 1 are raised to 1.
    pub fn with_scale(scale: usize) -> Self {
        Self {
            scale: scale.max(1),
        }
    }

    pub fn scale(&self) -> usize {
        self.scale
    }
}

fn to_byte(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl Renderer for PpmRenderer {
    type Output = Vec<u8>;

    fn render(&self, lattice: &Lattice, view: &RenderView) -> Vec<u8> {
        let (width, height, s) = (lattice.width(), lattice.height(), self.scale);
        let header = format!("P6\n{} {}\n255\n", width * s, height * s);
        let mut out = Vec::with_capacity(header.len() + width * height * s * s * 3);
        out.extend_from_slice(header.as_bytes());

        let mut line = Vec::with_capacity(width * s * 3);
        for row in lattice.cells().chunks(width).rev() {
            line.clear();
            for cell in row {
                let rgb = if cell.is_obstacle() {
                    [0, 0, 0]
                } else {
                    density_color(cell.density(), view).map(to_byte)
                };
                for _ in 0..s {
                    line.extend_from_slice(&rgb);
                }
            }
            for _ in 0..s {
                out.extend_from_slice(&line);
            }
        }
        tracing::trace!(bytes = out.len(), scale = s, "ppm frame rendered");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use latticeflow_common::Vec2;
    use latticeflow_kernel::SimConfig;

    const EPS: f32 = 1e-6;

    fn small_lattice() -> Lattice {
        let mut lat = Lattice::new(SimConfig::new(4, 3, 1.0, 0.1, 0.0)).unwrap();
        // covers the single cell (3, 2), top-right corner
        lat.add_obstacle(&[
            Vec2::new(2.5, 1.5),
            Vec2::new(3.5, 1.5),
            Vec2::new(3.5, 2.5),
            Vec2::new(2.5, 2.5),
        ])
        .unwrap();
        lat
    }

    #[test]
    fn color_ramp_endpoints() {
        let view = RenderView::default();
        let low = density_color(0.8, &view);
        assert!((low[0] - 0.0).abs() < EPS);
        assert!((low[1] - 0.2).abs() < 1e-5);
        assert!((low[2] - 1.0).abs() < EPS);

        let mid = density_color(1.0, &view);
        assert!((mid[0] - 1.0).abs() < 1e-5);
        assert!((mid[1] - 0.8).abs() < 1e-5);
        assert!((mid[2] - 1.0).abs() < 1e-5);

        let high = density_color(1.2, &view);
        assert!((high[0] - 1.0).abs() < EPS);
        assert!((high[2] - 0.0).abs() < 1e-5);
    }

    #[test]
    fn color_ramp_clamps_outside_window() {
        let view = RenderView::default();
        assert_eq!(density_color(0.1, &view), density_color(0.8, &view));
        assert_eq!(density_color(9.0, &view), density_color(1.2, &view));
    }

    #[test]
    fn degenerate_view_does_not_divide_by_zero() {
        let view = RenderView {
            density_low: 1.0,
            density_high: 1.0,
        };
        let c = density_color(1.0, &view);
        assert!(c.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn status_line_reports_parameters() {
        let lat = small_lattice();
        let line = status_line(&lat);
        assert!(line.contains("tick=0"));
        assert!(line.contains("Grid: 4x3"));
        assert!(line.contains("Viscosity: 0.1"));
        assert!(line.contains("Obstacles: 1"));
    }

    #[test]
    fn text_renderer_draws_top_row_first() {
        let lat = small_lattice();
        let out = DebugTextRenderer::new().render(&lat, &RenderView::default());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("tick=0"));
        let fluid = DebugTextRenderer::shade(&RenderView::default(), 1.0);
        assert_ne!(fluid, OBSTACLE);
        let row: String = std::iter::repeat_n(fluid, 4).collect();
        assert_eq!(lines[1], format!("{}#", &row[..3]));
        assert_eq!(lines[2], row);
        assert_eq!(lines[3], row);
    }

    #[test]
    fn text_renderer_shades_track_density() {
        let view = RenderView::default();
        assert_eq!(DebugTextRenderer::shade(&view, 0.0), ' ');
        assert_eq!(DebugTextRenderer::shade(&view, 2.0), '@');
        // the ramp's own '#' is swapped out
        assert_eq!(DebugTextRenderer::shade(&view, 1.15), '&');
    }

    #[test]
    fn ppm_header_and_size() {
        let lat = small_lattice();
        let img = PpmRenderer::new().render(&lat, &RenderView::default());
        let header = b"P6\n4 3\n255\n";
        assert!(img.starts_with(header));
        assert_eq!(img.len(), header.len() + 4 * 3 * 3);
        // top-right pixel is the obstacle
        let last_in_first_row = header.len() + 3 * 3;
        assert_eq!(&img[last_in_first_row..last_in_first_row + 3], &[0, 0, 0]);
        // fluid at density 1.0
        assert_eq!(&img[header.len()..header.len() + 3], &[255, 204, 255]);
    }

    #[test]
    fn ppm_scale_repeats_pixels() {
        let lat = small_lattice();
        let img = PpmRenderer::with_scale(2).render(&lat, &RenderView::default());
        let header = b"P6\n8 6\n255\n";
        assert!(img.starts_with(header));
        assert_eq!(img.len(), header.len() + 8 * 6 * 3);
        assert_eq!(PpmRenderer::with_scale(0).scale(), 1);
    }

    #[test]
    fn rendering_leaves_lattice_unchanged() {
        let lat = small_lattice();
        let before = lat.state_hash();
        let view = RenderView::default();
        let _ = DebugTextRenderer::new().render(&lat, &view);
        let _ = PpmRenderer::new().render(&lat, &view);
        assert_eq!(lat.state_hash(), before);
    }
}
