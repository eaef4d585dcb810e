//! Classify CLI command.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use rendergate_core::{PreludeState, ShellKind};

/// Read a component stack and fold it into a fresh validation state.
#[derive(Debug, Parser)]
pub struct ClassifyCommand {
    /// Route the access belongs to.
    #[arg(long, default_value = "/")]
    pub route: String,

    /// Which pass classifies the access.
    #[arg(long, default_value = "allowed")]
    pub shell: Shell,

    /// Also judge the static shell, assuming this prelude outcome.
    #[arg(long)]
    pub prelude: Option<Prelude>,

    /// Message of a synchronous dynamic access seen by the client render.
    #[arg(long)]
    pub sync_error: Option<String>,

    /// File holding the component stack. Reads stdin when omitted.
    pub file: Option<PathBuf>,
}

/// CLI shell kind (with clap ValueEnum).
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    /// Final render: dynamic holes are allowed inside Suspense.
    Allowed,
    /// Runtime prefetch shell.
    Runtime,
    /// Static shell.
    Static,
}

impl From<Shell> for ShellKind {
    fn from(shell: Shell) -> Self {
        match shell {
            Shell::Allowed => ShellKind::Allowed,
            Shell::Runtime => ShellKind::Runtime,
            Shell::Static => ShellKind::Static,
        }
    }
}

/// CLI prelude outcome (with clap ValueEnum).
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Prelude {
    Full,
    Empty,
    Errored,
}

impl From<Prelude> for PreludeState {
    fn from(prelude: Prelude) -> Self {
        match prelude {
            Prelude::Full => PreludeState::Full,
            Prelude::Empty => PreludeState::Empty,
            Prelude::Errored => PreludeState::Errored,
        }
    }
}
