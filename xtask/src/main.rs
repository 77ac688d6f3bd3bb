use std::process::Command;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for latticeflow")]
struct Cli {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand, Clone, Copy)]
enum Task {
    /// fmt, clippy, test, then a scenario smoke run
    Check,
    /// cargo fmt --check
    Fmt,
    /// cargo clippy with warnings denied
    Clippy,
    /// cargo test for the whole workspace
    Test,
    /// Run the partition tree benchmark in release mode
    Bench,
    /// Step the bundled default scenario through the CLI for its full step count
    Smoke,
    /// Build rustdoc for the workspace
    Doc,
}

impl Task {
    fn cargo_args(self) -> &'static [&'static str] {
        match self {
            Task::Check => &[],
            Task::Fmt => &["fmt", "--all", "--", "--check"],
            Task::Clippy => &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
            Task::Test => &["test", "--workspace"],
            Task::Bench => &[
                "bench",
                "-p",
                "latticeflow-partition",
                "--bench",
                "bench_partition_tree",
            ],
            Task::Smoke => &[
                "run",
                "--release",
                "-p",
                "latticeflow-cli",
                "--",
                "run",
                "--config",
                "scenarios/default.json",
                "--report-every",
                "50",
            ],
            Task::Doc => &["doc", "--workspace", "--no-deps"],
        }
    }
}

fn cargo(task: Task) -> Result<()> {
    let args = task.cargo_args();
    println!("==> cargo {}", args.join(" "));
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        bail!("`cargo {}` failed with {status}", args[0]);
    }
    Ok(())
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Task::Check => {
            for task in [Task::Fmt, Task::Clippy, Task::Test, Task::Smoke] {
                cargo(task)?;
            }
        }
        task => cargo(task)?,
    }
    Ok(())
}
