//! Render staging shell.
//!
//! This crate drives renders using the pure policy in `rendergate_core`:
//! staged rendering with awaitable stage gates, abort signals, hanging
//! promises and the dynamic-access policy functions invoked from data
//! access points.
//!
//! # Architecture
//!
//! - **Functional Core** (`rendergate_core`): stages, errors, tracking, shell validation
//! - **Imperative Shell** (this crate): async gates, abort propagation, work units, logging
//!
//! # Example
//!
//! ```
//! use rendergate_runtime::{RenderStage, StagedRenderingController};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut staged = StagedRenderingController::new(None, false);
//! let value = staged.delay_until_stage(RenderStage::Runtime, "cookies", 42).unwrap();
//!
//! staged.advance_stage(RenderStage::Static);
//! staged.advance_stage(RenderStage::Runtime);
//! assert_eq!(value.await.unwrap(), 42);
//! # }
//! ```

mod abort;
mod cache_signal;
mod clock;
mod dynamic;
mod gate;
mod hanging;
mod shell;
mod stack;
mod staged;
mod work;

// Re-export core types for convenience
pub use rendergate_core::{
    DiagnosticError, DynamicPostpone, DynamicTrackingState, DynamicValidationState,
    InvariantError, PreludeState, RenderConfig, RenderError, RenderStage, Result, ShellKind,
    ShellVerdict,
};

// Export shell types
pub use abort::{AbortController, AbortSignal};
pub use cache_signal::CacheSignal;
pub use clock::now_ms;
pub use dynamic::{
    abort_and_throw_on_synchronous_request_data_access, abort_on_synchronous_dynamic_data_access,
    abort_on_synchronous_platform_io_access, annotate_dynamic_access,
    create_hanging_input_abort_signal, delay_until_runtime_stage, mark_current_scope_as_dynamic,
    postpone_with_tracking, throw_to_interrupt_static_generation,
    track_dynamic_data_in_dynamic_render, track_synchronous_platform_io_access_in_dev,
    track_synchronous_request_data_access_in_dev, use_dynamic_route_params,
    use_dynamic_search_params, DynamicHookOutcome,
};
pub use gate::{Deferred, GateState};
pub use hanging::{make_hanging_promise, HangingPromise};
pub use shell::{log_disallowed_dynamic_error, throw_if_disallowed_dynamic};
pub use staged::StagedRenderingController;
pub use work::{
    FallbackRouteParams, PrerenderLegacyStore, PrerenderPprStore, PrerenderStore, RequestStore,
    WorkStore, WorkUnit, WorkUnitKind,
};
