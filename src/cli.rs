// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `dagbuild`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dagbuild",
    version,
    about = "Build a task dependency graph, skipping tasks whose output already exists.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Dagbuild.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Root task to build. Repeat to build several roots.
    ///
    /// Default: `WorkflowWrapper`.
    #[arg(long = "task", value_name = "NAME")]
    pub tasks: Vec<String>,

    /// Maximum number of tasks evaluated concurrently (overrides config).
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Stop dispatching new tasks after the first failure.
    #[arg(long)]
    pub fail_fast: bool,

    /// Mark tasks running longer than this as failed, e.g. `30s` (overrides config).
    #[arg(long, value_name = "DURATION")]
    pub task_timeout: Option<String>,

    /// Directory the workflow writes its outputs into (overrides config).
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DAGBUILD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve the graph and print it, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
