use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use latticeflow_common::Vec2;
use latticeflow_kernel::{BounceBack, Lattice, SimConfig};
use latticeflow_render::{DebugTextRenderer, PpmRenderer, RenderView, Renderer};
use latticeflow_tools::{LatticeInspector, StepTimer};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

const DEFAULT_STEPS: u64 = 100;
const TIMER_WINDOW: usize = 64;

#[derive(Parser)]
#[command(name = "latticeflow-cli", about = "Run and inspect D2Q9 lattice-Boltzmann scenarios")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, crate info and the default configuration
    Info,
    /// Step a lattice and report on it
    Run {
        #[command(flatten)]
        sim: SimArgs,
        /// Number of steps (overrides the scenario file)
        #[arg(short, long)]
        steps: Option<u64>,
        /// Log a summary every N steps (0 disables)
        #[arg(long, default_value = "10")]
        report_every: u64,
        /// Print the ASCII density map after the last step
        #[arg(long)]
        ascii: bool,
        /// Write a PPM image of the final state
        #[arg(long)]
        ppm: Option<PathBuf>,
        /// Pixels per cell edge in the PPM image
        #[arg(long, default_value = "1")]
        ppm_scale: usize,
    },
    /// List cells whose positions fall in a world-space rectangle
    Query {
        #[command(flatten)]
        sim: SimArgs,
        #[arg(long)]
        min_x: f32,
        #[arg(long)]
        min_y: f32,
        #[arg(long)]
        max_x: f32,
        #[arg(long)]
        max_y: f32,
    },
}

/// Lattice parameters shared by every subcommand that builds one.
#[derive(Args)]
struct SimArgs {
    /// Scenario JSON: config fields plus optional `obstacles` and `steps`
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long)]
    width: Option<usize>,
    #[arg(long)]
    height: Option<usize>,
    #[arg(long)]
    cell_size: Option<f32>,
    #[arg(long)]
    viscosity: Option<f32>,
    #[arg(long, allow_hyphen_values = true)]
    gravity: Option<f32>,
    #[arg(long, value_enum)]
    bounce: Option<BounceArg>,
    /// Obstacle vertex file; may be repeated
    #[arg(short, long)]
    obstacle: Vec<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum BounceArg {
    Opposite,
    Legacy,
}

impl From<BounceArg> for BounceBack {
    fn from(arg: BounceArg) -> Self {
        match arg {
            BounceArg::Opposite => BounceBack::Opposite,
            BounceArg::Legacy => BounceBack::Legacy,
        }
    }
}

/// Scenario file layout: a flattened `SimConfig` plus run settings.
#[derive(Debug, Default, Deserialize)]
struct Scenario {
    #[serde(flatten)]
    config: SimConfig,
    /// Paths relative to the scenario file.
    #[serde(default)]
    obstacles: Vec<PathBuf>,
    #[serde(default)]
    steps: Option<u64>,
}

impl Scenario {
    fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        let mut scenario: Scenario = serde_json::from_str(&text)
            .with_context(|| format!("parsing scenario {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for obstacle in &mut scenario.obstacles {
            if obstacle.is_relative() {
                *obstacle = base.join(&*obstacle);
            }
        }
        Ok(scenario)
    }
}

impl SimArgs {
    /// Defaults, then the scenario file, then command-line overrides.
    fn scenario(&self) -> anyhow::Result<Scenario> {
        let mut scenario = match &self.config {
            Some(path) => Scenario::load(path)?,
            None => Scenario::default(),
        };
        let c = &mut scenario.config;
        if let Some(v) = self.width {
            c.width = v;
        }
        if let Some(v) = self.height {
            c.height = v;
        }
        if let Some(v) = self.cell_size {
            c.cell_size = v;
        }
        if let Some(v) = self.viscosity {
            c.viscosity = v;
        }
        if let Some(v) = self.gravity {
            c.gravity = v;
        }
        if let Some(v) = self.bounce {
            c.bounce_back = v.into();
        }
        scenario.obstacles.extend(self.obstacle.iter().cloned());
        Ok(scenario)
    }

    /// Build the lattice and load obstacles. A rejected obstacle is logged and skipped.
    fn build(&self) -> anyhow::Result<(Lattice, Option<u64>)> {
        let scenario = self.scenario()?;
        let mut lattice =
            Lattice::new(scenario.config).context("invalid simulation parameters")?;
        for path in &scenario.obstacles {
            match lattice.add_obstacle_from_file(path) {
                Ok(count) => tracing::info!(path = %path.display(), count, "obstacle loaded"),
                Err(err) => tracing::warn!(path = %path.display(), %err, "obstacle rejected"),
            }
        }
        Ok((lattice, scenario.steps))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("latticeflow-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("obstacle: {}", latticeflow_obstacle::crate_info());
            println!("partition: {}", latticeflow_partition::crate_info());
            println!("render: {}", latticeflow_render::crate_info());
            println!("tools: {}", latticeflow_tools::crate_info());
            let config = SimConfig::default();
            println!(
                "kernel: dt={} tau={} omega={} near_stability_limit={}",
                config.dt(),
                config.tau(),
                config.omega(),
                config.near_stability_limit()
            );
            println!("default config:");
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Run {
            sim,
            steps,
            report_every,
            ascii,
            ppm,
            ppm_scale,
        } => {
            let (mut lattice, scenario_steps) = sim.build()?;
            let steps = steps.or(scenario_steps).unwrap_or(DEFAULT_STEPS);
            println!("{}", latticeflow_render::status_line(&lattice));
            tracing::info!(
                steps,
                tau = lattice.tau(),
                omega = lattice.omega(),
                obstacle_cells = lattice.obstacle_cell_count(),
                "starting run"
            );

            let mut timer = StepTimer::new(TIMER_WINDOW);
            for _ in 0..steps {
                timer.time(|| lattice.step());
                if report_every > 0 && lattice.tick() % report_every == 0 {
                    tracing::info!("{}", LatticeInspector::summary(&lattice));
                }
            }

            println!("{}", LatticeInspector::summary(&lattice));
            println!("Timing: {timer}");
            println!("State hash: {:#018x}", lattice.state_hash());

            let view = RenderView::default();
            if ascii {
                print!("{}", DebugTextRenderer::new().render(&lattice, &view));
            }
            if let Some(path) = ppm {
                let image = PpmRenderer::with_scale(ppm_scale).render(&lattice, &view);
                std::fs::write(&path, image)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("Wrote {}", path.display());
            }
        }
        Commands::Query {
            sim,
            min_x,
            min_y,
            max_x,
            max_y,
        } => {
            let (lattice, _) = sim.build()?;
            let tree = lattice.tree();
            println!(
                "Tree: {} entries, {} nodes, {} leaves, depth {}",
                tree.len(),
                tree.node_count(),
                tree.leaf_count(),
                tree.depth()
            );
            let mut hits = lattice.cells_in_range(Vec2::new(min_x, min_y), Vec2::new(max_x, max_y));
            hits.sort_unstable();
            println!("{} cells in [{min_x}, {min_y}] x [{max_x}, {max_y}]", hits.len());
            for index in hits {
                let cell = &lattice.cells()[index];
                let p = cell.position();
                println!(
                    "  #{index} pos=({:.2}, {:.2}){}",
                    p.x,
                    p.y,
                    if cell.is_obstacle() { " obstacle" } else { "" }
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(config: Option<PathBuf>) -> SimArgs {
        SimArgs {
            config,
            width: None,
            height: None,
            cell_size: None,
            viscosity: None,
            gravity: None,
            bounce: None,
            obstacle: Vec::new(),
        }
    }

    #[test]
    fn cli_parses_run_overrides() {
        let cli = Cli::try_parse_from([
            "latticeflow-cli",
            "run",
            "--width",
            "32",
            "--gravity",
            "-0.01",
            "--bounce",
            "legacy",
            "-o",
            "a.txt",
            "-o",
            "b.txt",
            "--steps",
            "5",
        ])
        .unwrap();
        let Commands::Run { sim, steps, .. } = cli.command else {
            panic!("expected run");
        };
        assert_eq!(steps, Some(5));
        assert_eq!(sim.obstacle.len(), 2);
        let c = sim.scenario().unwrap().config;
        assert_eq!(c.width, 32);
        assert_eq!(c.height, 128);
        assert_eq!(c.gravity, -0.01);
        assert_eq!(c.bounce_back, BounceBack::Legacy);
    }

    #[test]
    fn scenario_file_resolves_obstacles_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("wall.txt"), "1 1\n3 1\n3 3\n1 3\n").unwrap();
        std::fs::write(dir.path().join("line.txt"), "0 0\n1 1\n").unwrap();
        let path = dir.path().join("scene.json");
        std::fs::write(
            &path,
            r#"{ "width": 8, "height": 6, "cell_size": 1.0, "obstacles": ["wall.txt", "line.txt"], "steps": 7 }"#,
        )
        .unwrap();

        let mut sim = args(Some(path));
        sim.height = Some(5);
        let (lattice, steps) = sim.build().unwrap();
        assert_eq!(steps, Some(7));
        assert_eq!((lattice.width(), lattice.height()), (8, 5));
        // the two-vertex obstacle is rejected without aborting the build
        assert_eq!(lattice.obstacle_count(), 1);
        assert!(lattice.cell(2, 2).unwrap().is_obstacle());
    }

    #[test]
    fn invalid_parameters_fail_the_build() {
        let mut sim = args(None);
        sim.width = Some(0);
        assert!(sim.build().is_err());
    }
}
