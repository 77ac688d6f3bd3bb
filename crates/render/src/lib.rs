//! Rendering Adapter: renderer-agnostic interface over lattice state.
//!
//! # Invariants
//! - Renderers take `&Lattice` and cannot mutate solver state.
//! - Output derives only from lattice state and the view.
//! - Grid row `height - 1` is drawn first, so +y points up in every output.

mod renderer;

pub use renderer::{
    DebugTextRenderer, PpmRenderer, RenderView, Renderer, density_color, status_line,
};

pub fn crate_info() -> &'static str {
    "latticeflow-render v0.1.0"
}
