//! Pure render-stage policy - no I/O, no async, no side effects.
//!
//! This crate provides:
//! - Render stages and prerender outcomes
//! - The error taxonomy shared by the render shell
//! - Dynamic access tracking and component stack classification
//! - The static shell verdict
//! - Postpone reasons and the typed postpone signal
//! - Configuration types with validation
//!
//! # Example
//!
//! ```
//! use rendergate_core::{
//!     get_static_shell_disallowed_dynamic_reasons, track_allowed_dynamic_access,
//!     DynamicTrackingState, DynamicValidationState, PreludeState,
//! };
//!
//! let mut validation = DynamicValidationState::new();
//! let client = DynamicTrackingState::new(false);
//!
//! // A dynamic access under an ordinary Suspense boundary is allowed.
//! track_allowed_dynamic_access(
//!     "/shop",
//!     "\n    at Cart (<anonymous>)\n    at Suspense (<anonymous>)\n    at body (<anonymous>)",
//!     &mut validation,
//!     &client,
//! );
//! assert!(validation.has_allowed_dynamic);
//!
//! let reasons = get_static_shell_disallowed_dynamic_reasons("/shop", PreludeState::Full, &validation);
//! assert!(reasons.is_empty());
//! ```

mod component_stack;
mod config;
mod error;
mod postpone;
mod stage;
mod tracking;
mod validation;

pub use component_stack::{
    Boundary, ComponentStack, Frame, METADATA_BOUNDARY_NAME, OUTLET_BOUNDARY_NAME,
    ROOT_LAYOUT_BOUNDARY_NAME, VIEWPORT_BOUNDARY_NAME,
};
pub use config::RenderConfig;
pub use error::{
    ConfigError, DiagnosticError, InvariantError, RenderError, Result,
    BAILOUT_TO_CLIENT_SIDE_RENDERING, DYNAMIC_SERVER_USAGE, HANGING_PROMISE_REJECTION,
    PRERENDER_INTERRUPTED, STATIC_GEN_BAILOUT,
};
pub use postpone::{
    create_postpone_reason, is_dynamic_postpone_reason, verify_postpone_classifier,
    DynamicPostpone,
};
pub use stage::{PreludeState, RenderStage};
pub use tracking::{format_dynamic_api_accesses, DynamicAccess, DynamicTrackingState};
pub use validation::{
    get_static_shell_disallowed_dynamic_reasons, static_shell_verdict,
    track_allowed_dynamic_access, track_dynamic_access, track_dynamic_hole_in_runtime_shell,
    track_dynamic_hole_in_static_shell, DynamicValidationState, RejectReason, ShellKind,
    ShellVerdict,
};
