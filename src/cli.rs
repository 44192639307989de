//! Command-line interface for the module test harness.
use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;

/// Command-line interface for `modtest`.
#[derive(Parser)]
#[command(name = "modtest", version, author)]
#[command(
    about = "Runs the `unit_tests` entry point exported by shared modules",
    long_about = None
)]
pub struct Cli {
    /// Override the logging verbosity for this invocation only.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<LevelFilter>,

    /// Shared modules to load and run, in order.
    #[arg(value_name = "MODULE")]
    pub modules: Vec<PathBuf>,
}

/// Parses command-line arguments and returns a `Cli` struct.
pub fn parse_args() -> Cli {
    Cli::parse()
}
