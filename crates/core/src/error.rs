//! Render error taxonomy (pure - no I/O variants).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::postpone::DynamicPostpone;

/// Digest carried by legacy-mode dynamic usage errors.
pub const DYNAMIC_SERVER_USAGE: &str = "DYNAMIC_SERVER_USAGE";
/// Digest carried by errors that unwind an aborted prerender.
pub const PRERENDER_INTERRUPTED: &str = "NEXT_PRERENDER_INTERRUPTED";
/// Digest carried by client-rendering bailouts.
pub const BAILOUT_TO_CLIENT_SIDE_RENDERING: &str = "BAILOUT_TO_CLIENT_SIDE_RENDERING";
/// Digest carried by `dynamic = "error"` bailouts.
pub const STATIC_GEN_BAILOUT: &str = "NEXT_STATIC_GEN_BAILOUT";
/// Digest carried by hanging promises rejected at the end of a prerender.
pub const HANGING_PROMISE_REJECTION: &str = "HANGING_PROMISE_REJECTION";

/// A should-never-happen condition inside the render orchestration layer.
///
/// Never recovered from. Seeing one means the caller misused an API (for
/// example abandoning a controller that was built without an abort signal)
/// or reached a work unit branch that cannot legally occur.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invariant: {message} This is a bug.")]
pub struct InvariantError {
    message: String,
}

impl InvariantError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors raised while coordinating a render attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The route opted into `dynamic = "error"` (or failed shell validation).
    #[error("{message}")]
    StaticGenBailout { message: String },

    /// Legacy prerender touched dynamic data; the route must render dynamically.
    #[error("{description}")]
    DynamicServerUsage {
        description: String,
        stack: Option<String>,
    },

    /// Unwinds a prerender whose abort controller already fired.
    #[error("{message}")]
    PrerenderInterrupted { message: String },

    /// A client hook needs request data while prerendering.
    #[error("Bail out to client-side rendering: {reason}")]
    BailoutToClientRendering { reason: String },

    #[error(
        "During prerendering, {expression} rejects when the prerender is complete. \
         Typically these errors are handled by the renderer but if you move {expression} \
         to a different context you may observe this error and you should handle it in \
         that context. This occurred at route \"{route}\"."
    )]
    HangingPromiseRejection { route: String, expression: String },

    /// Cooperative suspension of the current subtree.
    #[error(transparent)]
    Postpone(#[from] DynamicPostpone),

    #[error(transparent)]
    Invariant(#[from] InvariantError),

    /// Caller-supplied abort reason with no more specific kind.
    #[error("Render aborted: {reason}")]
    Aborted { reason: String },
}

impl RenderError {
    pub fn static_gen_bailout(message: impl Into<String>) -> Self {
        Self::StaticGenBailout {
            message: message.into(),
        }
    }

    pub fn prerender_interrupted(message: impl Into<String>) -> Self {
        Self::PrerenderInterrupted {
            message: message.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(InvariantError::new(message))
    }

    /// Stable machine-readable tag for the kinds downstream code matches on.
    pub fn digest(&self) -> Option<&'static str> {
        match self {
            Self::StaticGenBailout { .. } => Some(STATIC_GEN_BAILOUT),
            Self::DynamicServerUsage { .. } => Some(DYNAMIC_SERVER_USAGE),
            Self::PrerenderInterrupted { .. } => Some(PRERENDER_INTERRUPTED),
            Self::BailoutToClientRendering { .. } => Some(BAILOUT_TO_CLIENT_SIDE_RENDERING),
            Self::HangingPromiseRejection { .. } => Some(HANGING_PROMISE_REJECTION),
            Self::Postpone(_) | Self::Invariant(_) | Self::Aborted { .. } => None,
        }
    }

    pub fn is_prerender_interrupted(&self) -> bool {
        matches!(self, Self::PrerenderInterrupted { .. })
    }

    pub fn is_dynamic_server_usage(&self) -> bool {
        matches!(self, Self::DynamicServerUsage { .. })
    }

    pub fn is_dynamic_postpone(&self) -> bool {
        matches!(self, Self::Postpone(_))
    }

    pub fn is_hanging_promise_rejection(&self) -> bool {
        matches!(self, Self::HangingPromiseRejection { .. })
    }

    pub fn is_invariant(&self) -> bool {
        matches!(self, Self::Invariant(_))
    }
}

/// A user-facing diagnostic collected for the end-of-render report.
///
/// These are aggregated, logged and used to accept or reject a static
/// shell. They are never thrown.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct DiagnosticError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl DiagnosticError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
        }
    }

    /// Attach the component stack that was active when the access happened.
    pub fn with_component_stack(message: impl Into<String>, component_stack: &str) -> Self {
        let message = message.into();
        let stack = format!("Error: {message}{component_stack}");
        Self {
            message,
            stack: Some(stack),
        }
    }
}

/// Configuration validation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Hanging input ticks must be at least 1")]
    InvalidHangingInputTicks,

    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },
}

pub type Result<T> = std::result::Result<T, RenderError>;
