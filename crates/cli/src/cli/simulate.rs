//! Simulate CLI command.

use clap::Parser;

use crate::driver::simulate::Step;

/// Replay steps against a fresh staged render.
#[derive(Debug, Parser)]
pub struct SimulateCommand {
    /// Allow synchronous IO to interrupt the runtime stage. Also enabled by
    /// RENDERGATE_RUNTIME_PREFETCH.
    #[arg(long)]
    pub runtime_prefetch: bool,

    /// Build the render with an abort signal, making it abandonable.
    #[arg(long)]
    pub abortable: bool,

    /// Steps: static, runtime, dynamic, interrupt:<reason>, abandon, abort.
    #[arg(required = true, num_args = 1..)]
    pub steps: Vec<Step>,
}
