//! Stack capture for dynamic access diagnostics.

use std::backtrace::{Backtrace, BacktraceStatus};

/// Capture the current stack regardless of `RUST_BACKTRACE`.
pub(crate) fn force_capture() -> Option<String> {
    Some(Backtrace::force_capture().to_string())
}

/// Capture the current stack if backtraces are enabled for the process.
pub(crate) fn capture() -> Option<String> {
    let backtrace = Backtrace::capture();
    match backtrace.status() {
        BacktraceStatus::Captured => Some(backtrace.to_string()),
        _ => None,
    }
}
