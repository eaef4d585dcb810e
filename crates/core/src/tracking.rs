//! Per-render record of dynamic API accesses.

use serde::{Deserialize, Serialize};

use crate::config::RenderConfig;
use crate::error::DiagnosticError;

/// Stack frames that belong to the tracking machinery itself.
const INTERNAL_FRAME_MARKERS: &[&str] = &[
    "std::backtrace",
    "rendergate_runtime::",
    "rendergate_core::",
    " (<anonymous>)",
];

/// One observed dynamic API access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicAccess {
    /// What was accessed, e.g. `` `cookies()` ``.
    pub expression: String,
    /// Captured only when debug tracking is on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Every dynamic access observed during one render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicTrackingState {
    /// Capture a stack per access (expensive, dev only).
    pub is_debug_dynamic_accesses: bool,
    pub dynamic_accesses: Vec<DynamicAccess>,
    /// First synchronous (not awaited) dynamic access, if any.
    pub sync_dynamic_error_with_stack: Option<DiagnosticError>,
}

impl DynamicTrackingState {
    pub fn new(is_debug_dynamic_accesses: bool) -> Self {
        Self {
            is_debug_dynamic_accesses,
            ..Self::default()
        }
    }

    /// Tracking for a render under `config`. Stacks are captured per access
    /// when `debug_dynamic_accesses` is set (`RENDERGATE_DEBUG_PRERENDER`).
    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(config.debug_dynamic_accesses)
    }

    pub fn record_access(&mut self, expression: impl Into<String>, stack: Option<String>) {
        self.dynamic_accesses.push(DynamicAccess {
            expression: expression.into(),
            stack,
        });
    }

    /// Store `error` as the synchronous access error unless one is already
    /// recorded. Returns whether it was stored.
    pub fn record_sync_error(&mut self, error: DiagnosticError) -> bool {
        if self.sync_dynamic_error_with_stack.is_some() {
            return false;
        }
        self.sync_dynamic_error_with_stack = Some(error);
        true
    }

    pub fn accessed_dynamic_data(&self) -> bool {
        !self.dynamic_accesses.is_empty()
    }

    pub fn first_dynamic_reason(&self) -> Option<&str> {
        self.dynamic_accesses
            .first()
            .map(|access| access.expression.as_str())
    }

    /// Fold the accesses observed by a client render into this server record.
    pub fn consume(&mut self, client: DynamicTrackingState) -> &[DynamicAccess] {
        self.dynamic_accesses.extend(client.dynamic_accesses);
        &self.dynamic_accesses
    }
}

/// Render the accesses that carry a stack as debug reports.
pub fn format_dynamic_api_accesses(accesses: &[DynamicAccess]) -> Vec<String> {
    accesses
        .iter()
        .filter_map(|access| {
            let stack = access.stack.as_deref().filter(|s| !s.is_empty())?;
            let frames: Vec<&str> = stack
                .lines()
                .filter(|line| {
                    !INTERNAL_FRAME_MARKERS
                        .iter()
                        .any(|marker| line.contains(marker))
                })
                .collect();
            Some(format!(
                "Dynamic API Usage Debug - {}:\n{}",
                access.expression,
                frames.join("\n")
            ))
        })
        .collect()
}
