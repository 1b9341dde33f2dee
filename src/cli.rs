// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `simherd`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "simherd",
    version,
    about = "Supervise external FEM/CFD solver jobs from a declarative config.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Simherd.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Simherd.toml")]
    pub config: String,

    /// Number of jobs to drain from the local sequential queue.
    ///
    /// Overrides `[settings].jobs` from the config when given.
    #[arg(long, value_name = "N")]
    pub jobs: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SIMHERD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the resolved job plan, but don't launch anything.
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
