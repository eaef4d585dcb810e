//! CLI error types.

use rendergate_core::{ConfigError, InvariantError};
use thiserror::Error;

/// Result type alias for the CLI library.
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur while running a command.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid step `{0}`, expected static, runtime, dynamic, interrupt:<reason>, abandon or abort")]
    InvalidStep(String),

    #[error("Step `abort` needs a render built with --abortable")]
    NotAbortable,

    #[error("Empty component stack")]
    EmptyStack,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Invariant(#[from] InvariantError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
