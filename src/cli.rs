// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `deploydag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "deploydag",
    version,
    about = "Deploy workspace artifacts in dependency order, only what changed since the last deployment.",
    long_about = None
)]
pub struct CliArgs {
    /// Target environment (must be listed in `[config].environments`).
    #[arg(value_name = "ENVIRONMENT")]
    pub environment: String,

    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Deploydag.toml")]
    pub config: String,

    /// Deployment root. Defaults to the directory containing the config file.
    #[arg(long, value_name = "DIR")]
    pub root: Option<String>,

    /// Deploy every artifact, bypassing change detection.
    #[arg(long, conflicts_with = "artifacts")]
    pub force_all: bool,

    /// Deploy only these artifacts (comma-separated names or ids).
    ///
    /// Bypasses change detection and dependency closure; dependencies outside
    /// the list are assumed to be deployed already.
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub artifacts: Option<Vec<String>>,

    /// Compute and print the plan without deploying anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DEPLOYDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
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
