//! Output formatting functions.

pub mod pretty;

use serde::Serialize;

/// Format a report as a single line of JSON.
pub fn format_json<T: Serialize>(value: &T) -> crate::Result<String> {
    Ok(serde_json::to_string(value)?)
}
