//! CLI command definitions.

pub mod classify;
pub mod simulate;

use clap::{Parser, Subcommand, ValueEnum};

/// Diagnose component stacks and replay render stages.
#[derive(Debug, Parser)]
#[command(name = "rendergate")]
#[command(version, about = "Diagnose component stacks and replay render stages", long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(long, env = "RENDERGATE_FORMAT", default_value = "pretty")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Raw JSON output.
    Json,
    /// Indented, human-readable output.
    #[default]
    Pretty,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Classify a dynamic access by the component stack it happened under.
    Classify(classify::ClassifyCommand),
    /// Replay stage transitions against a fresh staged render.
    Simulate(simulate::SimulateCommand),
}
