//! Static shell enforcement at the end of a prerender.

use rendergate_core::{
    static_shell_verdict, DiagnosticError, DynamicTrackingState, DynamicValidationState,
    PreludeState, RenderError, Result, ShellVerdict,
};

use crate::work::WorkStore;

/// Fail the prerender if its static shell is not acceptable.
///
/// Every diagnostic behind a rejection is logged before the
/// `StaticGenBailout` is returned, so the error itself stays short.
pub fn throw_if_disallowed_dynamic(
    store: &WorkStore,
    prelude: PreludeState,
    validation: &DynamicValidationState,
    server_dynamic: &DynamicTrackingState,
) -> Result<()> {
    let verdict = static_shell_verdict(
        &store.route,
        prelude,
        validation,
        server_dynamic.sync_dynamic_error_with_stack.as_ref(),
    );

    match verdict {
        ShellVerdict::Accept => Ok(()),
        ShellVerdict::Reject { reason, errors } => {
            for error in &errors {
                log_disallowed_dynamic_error(store, error);
            }
            Err(RenderError::static_gen_bailout(format!(
                "Route \"{}\" could not be prerendered ({reason}).",
                store.route
            )))
        }
    }
}

/// Log one disallowed dynamic access. Outside dev mode, point at the ways
/// to get a better stack trace.
pub fn log_disallowed_dynamic_error(store: &WorkStore, error: &DiagnosticError) {
    match &error.stack {
        Some(stack) => tracing::error!(route = %store.route, stack = %stack, "{}", error.message),
        None => tracing::error!(route = %store.route, "{}", error.message),
    }

    if !store.config.dev_mode {
        tracing::error!(
            route = %store.route,
            "To get a more detailed stack trace and pinpoint the issue, start the app in \
             development mode, or rerun the production build with RENDERGATE_DEBUG_PRERENDER=1."
        );
    }
}
