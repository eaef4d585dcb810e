//! rendergate_cli - command line driver for the render staging crates.

pub mod cli;
pub mod driver;
pub mod error;
pub mod output;

pub use error::{CliError, Result};
