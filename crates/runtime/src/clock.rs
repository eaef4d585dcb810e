//! Telemetry timestamps: monotonic for ordering, epoch-anchored for display.

use std::sync::OnceLock;
use std::time::Instant;

use chrono::Utc;

struct Origin {
    instant: Instant,
    epoch_ms: f64,
}

fn origin() -> &'static Origin {
    static ORIGIN: OnceLock<Origin> = OnceLock::new();
    ORIGIN.get_or_init(|| Origin {
        instant: Instant::now(),
        epoch_ms: Utc::now().timestamp_micros() as f64 / 1000.0,
    })
}

/// Milliseconds since the Unix epoch, advanced by a monotonic clock from a
/// process-wide origin. Only meant for instrumentation.
pub fn now_ms() -> f64 {
    let origin = origin();
    origin.epoch_ms + origin.instant.elapsed().as_secs_f64() * 1000.0
}
