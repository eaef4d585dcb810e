//! Command implementations, kept apart from argument parsing and output.

pub mod classify;
pub mod simulate;

use rendergate_core::RenderConfig;

use crate::error::Result;

pub use classify::{classify, ClassifyReport};
pub use simulate::{simulate, SimulationReport, Step, WaiterOutcome};

/// Load the render configuration from `RENDERGATE_*` variables.
pub fn load_config() -> Result<RenderConfig> {
    Ok(RenderConfig::from_env()?)
}
