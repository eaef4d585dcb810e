//! Dynamic-access policy.
//!
//! Code that touches request-specific or otherwise uncacheable data calls
//! into these functions with the active [`WorkStore`] and [`WorkUnit`] and a
//! human-readable expression naming what it touched (`` `cookies()` ``,
//! `` `headers()` ``, ...). Depending on the work unit the access is
//! permitted, recorded, turned into a postpone, turned into an error that
//! unwinds static generation, or the whole prerender is aborted.
//!
//! Functions documented as "always unwinds" return the error to propagate
//! instead of a `Result`.

use std::fmt;

use futures_util::future::{self, BoxFuture};
use rendergate_core::{
    verify_postpone_classifier, DiagnosticError, DynamicPostpone, DynamicTrackingState,
    RenderConfig, RenderError, Result,
};

use crate::abort::{AbortController, AbortSignal};
use crate::hanging::{make_hanging_promise, HangingPromise};
use crate::stack;
use crate::work::{
    has_params, PrerenderLegacyStore, PrerenderStore, RequestStore, WorkStore, WorkUnit,
};

fn track_access(tracking: &mut DynamicTrackingState, expression: &str) {
    let stack = if tracking.is_debug_dynamic_accesses {
        stack::force_capture()
    } else {
        None
    };
    tracking.record_access(expression, stack);
}

fn interrupted_message(route: &str, expression: &str) -> String {
    format!("Route {route} needs to bail out of prerendering at this point because it used {expression}.")
}

/// Record that the current scope used `expression`.
///
/// Routes forced static or dynamic have already decided and are left alone.
/// `dynamic = "error"` bails out regardless of the work unit. Otherwise
/// cache scopes ignore the mark, a partial prerender postpones, a legacy
/// prerender unwinds with `DynamicServerUsage` and a request render just
/// remembers that it went dynamic. Cache-components prerenders ignore it
/// too; they react to dynamic data through their abort controller.
pub fn mark_current_scope_as_dynamic(
    store: &mut WorkStore,
    unit: Option<&mut WorkUnit>,
    expression: &str,
) -> Result<()> {
    if store.force_dynamic || store.force_static {
        return Ok(());
    }

    if store.dynamic_should_error {
        return Err(RenderError::static_gen_bailout(format!(
            "Route {} with `dynamic = \"error\"` couldn't be rendered statically because it used {expression}.",
            store.route
        )));
    }

    let Some(unit) = unit else {
        return Ok(());
    };
    let kind = unit.kind();

    match unit {
        WorkUnit::Cache | WorkUnit::PrivateCache | WorkUnit::UnstableCache => Ok(()),
        WorkUnit::PrerenderPpr(ppr) => Err(postpone_with_tracking(
            store,
            expression,
            ppr.dynamic_tracking.as_mut(),
        )),
        WorkUnit::PrerenderLegacy(legacy) => {
            legacy.revalidate = Some(0);
            let description = format!(
                "Route {} couldn't be rendered statically because it used {expression}.",
                store.route
            );
            let stack = stack::capture();
            store.dynamic_usage_description = Some(expression.to_string());
            store.dynamic_usage_stack = stack.clone();
            Err(RenderError::DynamicServerUsage { description, stack })
        }
        WorkUnit::Request(request) => {
            request.used_dynamic = true;
            Ok(())
        }
        WorkUnit::Prerender(_) | WorkUnit::PrerenderClient(_) | WorkUnit::PrerenderRuntime(_) => {
            tracing::trace!(%kind, expression, "dynamic mark ignored");
            Ok(())
        }
    }
}

/// Unwind a legacy prerender because `expression` was used. Always unwinds.
pub fn throw_to_interrupt_static_generation(
    expression: &str,
    store: &mut WorkStore,
    prerender: &mut PrerenderLegacyStore,
) -> RenderError {
    let description = format!(
        "Route {} couldn't be rendered statically because it used `{expression}`.",
        store.route
    );
    let stack = stack::capture();
    prerender.revalidate = Some(0);
    store.dynamic_usage_description = Some(expression.to_string());
    store.dynamic_usage_stack = stack.clone();
    RenderError::DynamicServerUsage { description, stack }
}

/// Record dynamic usage in a render that is already known to be dynamic.
/// Never fails and never postpones.
pub fn track_dynamic_data_in_dynamic_render(unit: &mut WorkUnit) {
    match unit {
        WorkUnit::Request(request) => request.used_dynamic = true,
        WorkUnit::Cache | WorkUnit::PrivateCache | WorkUnit::UnstableCache => {}
        WorkUnit::Prerender(_)
        | WorkUnit::PrerenderClient(_)
        | WorkUnit::PrerenderRuntime(_)
        | WorkUnit::PrerenderPpr(_)
        | WorkUnit::PrerenderLegacy(_) => {}
    }
}

/// Abort the prerender, then record the access.
///
/// The abort comes first: abort listeners run synchronously and must
/// observe the prerender as aborted before any tracking state changes.
pub fn abort_on_synchronous_dynamic_data_access(
    route: &str,
    expression: &str,
    prerender: &mut PrerenderStore,
) {
    let error = RenderError::prerender_interrupted(interrupted_message(route, expression));
    prerender.controller.abort(error);

    if let Some(tracking) = prerender.dynamic_tracking.as_mut() {
        track_access(tracking, expression);
    }
}

/// Abort the prerender because synchronous platform IO (clocks, randomness)
/// was used, and keep `error_with_stack` as the first synchronous access.
pub fn abort_on_synchronous_platform_io_access(
    route: &str,
    expression: &str,
    error_with_stack: DiagnosticError,
    prerender: &mut PrerenderStore,
) {
    tracing::warn!(route, expression, "aborting prerender on synchronous platform IO");
    abort_on_synchronous_dynamic_data_access(route, expression, prerender);

    if let Some(tracking) = prerender.dynamic_tracking.as_mut() {
        tracking.record_sync_error(error_with_stack);
    }
}

/// Abort the prerender because request data was read synchronously. Always
/// unwinds, whether or not this call was the one that aborted.
pub fn abort_and_throw_on_synchronous_request_data_access(
    route: &str,
    expression: &str,
    error_with_stack: DiagnosticError,
    prerender: &mut PrerenderStore,
) -> RenderError {
    if !prerender.controller.signal().is_aborted() {
        tracing::warn!(route, expression, "aborting prerender on synchronous request data");
        abort_on_synchronous_dynamic_data_access(route, expression, prerender);

        if let Some(tracking) = prerender.dynamic_tracking.as_mut() {
            tracking.record_sync_error(error_with_stack);
        }
    }

    RenderError::prerender_interrupted(interrupted_message(route, expression))
}

/// Record a dynamic access without aborting anything.
pub fn annotate_dynamic_access(expression: &str, prerender: &mut PrerenderStore) {
    if let Some(tracking) = prerender.dynamic_tracking.as_mut() {
        track_access(tracking, expression);
    }
}

/// Synchronous platform IO during a staged request render pushes the render
/// past the current stage.
pub fn track_synchronous_platform_io_access_in_dev(request: &mut RequestStore, expression: &str) {
    if let Some(staged) = request.staged_rendering.as_mut() {
        if staged.can_sync_interrupt() {
            staged.sync_interrupt_current_stage_with_reason(expression);
        }
    }
}

/// Synchronous request data access during a staged request render marks the
/// request dynamic and pushes the render past the current stage.
pub fn track_synchronous_request_data_access_in_dev(request: &mut RequestStore, expression: &str) {
    request.used_dynamic = true;
    track_synchronous_platform_io_access_in_dev(request, expression);
}

/// Suspend the current subtree because of `expression`. Always unwinds.
///
/// Fails with an invariant error instead when the host renderer has no
/// postpone primitive.
pub fn postpone_with_tracking(
    store: &WorkStore,
    expression: &str,
    tracking: Option<&mut DynamicTrackingState>,
) -> RenderError {
    if !store.config.supports_postpone {
        return RenderError::invariant(
            "The host renderer does not provide a postpone primitive. The renderer and \
             rendergate versions are likely mismatched.",
        );
    }
    if let Err(error) = verify_postpone_classifier() {
        return error.into();
    }

    if let Some(tracking) = tracking {
        track_access(tracking, expression);
    }

    tracing::debug!(route = %store.route, expression, "postponing dynamic subtree");
    RenderError::Postpone(DynamicPostpone::new(&store.route, expression))
}

/// What a client hook guard asks its caller to do.
pub enum DynamicHookOutcome {
    Proceed,
    /// Suspend on this value; it only settles when the render is aborted.
    Hang(HangingPromise<()>),
}

impl DynamicHookOutcome {
    pub fn is_proceed(&self) -> bool {
        matches!(self, Self::Proceed)
    }
}

impl fmt::Debug for DynamicHookOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proceed => f.write_str("Proceed"),
            Self::Hang(_) => f.write_str("Hang(..)"),
        }
    }
}

/// Guard for reading route params from a client hook while params may be
/// unknown (fallback params in static generation).
pub fn use_dynamic_route_params(
    expression: &str,
    store: &WorkStore,
    unit: Option<&mut WorkUnit>,
) -> Result<DynamicHookOutcome> {
    if !store.is_static_generation || !store.has_fallback_params() {
        return Ok(DynamicHookOutcome::Proceed);
    }
    let Some(unit) = unit else {
        return Ok(DynamicHookOutcome::Proceed);
    };

    match unit {
        WorkUnit::Prerender(prerender) | WorkUnit::PrerenderClient(prerender) => {
            if has_params(prerender.fallback_route_params.as_ref()) {
                return Ok(DynamicHookOutcome::Hang(make_hanging_promise(
                    &prerender.render_signal,
                    &store.route,
                    expression,
                )));
            }
            Ok(DynamicHookOutcome::Proceed)
        }
        WorkUnit::PrerenderPpr(ppr) => {
            if has_params(ppr.fallback_route_params.as_ref()) {
                return Err(postpone_with_tracking(
                    store,
                    expression,
                    ppr.dynamic_tracking.as_mut(),
                ));
            }
            Ok(DynamicHookOutcome::Proceed)
        }
        WorkUnit::PrerenderRuntime(_) => Err(RenderError::invariant(format!(
            "`{expression}` was called during a runtime prerender. It should have been excluded \
             from server components statically, but was not."
        ))),
        WorkUnit::Cache | WorkUnit::PrivateCache => Err(RenderError::invariant(format!(
            "`{expression}` was called inside a cache scope. It should have been excluded from \
             server components statically, but was not."
        ))),
        WorkUnit::PrerenderLegacy(_) | WorkUnit::Request(_) | WorkUnit::UnstableCache => {
            Ok(DynamicHookOutcome::Proceed)
        }
    }
}

/// Guard for reading search params from a client hook.
pub fn use_dynamic_search_params(
    expression: &str,
    store: &WorkStore,
    unit: Option<&WorkUnit>,
) -> Result<DynamicHookOutcome> {
    let Some(unit) = unit else {
        return Ok(DynamicHookOutcome::Proceed);
    };

    match unit {
        WorkUnit::PrerenderClient(prerender) => Ok(DynamicHookOutcome::Hang(
            make_hanging_promise(&prerender.render_signal, &store.route, expression),
        )),
        WorkUnit::PrerenderLegacy(_) | WorkUnit::PrerenderPpr(_) => {
            if store.force_static {
                return Ok(DynamicHookOutcome::Proceed);
            }
            Err(RenderError::BailoutToClientRendering {
                reason: expression.to_string(),
            })
        }
        WorkUnit::Prerender(_) | WorkUnit::PrerenderRuntime(_) => {
            Err(RenderError::invariant(format!(
                "`{expression}` was called from a server component. It should have been excluded \
                 from server components statically, but was not."
            )))
        }
        WorkUnit::Cache | WorkUnit::PrivateCache | WorkUnit::UnstableCache => {
            Err(RenderError::invariant(format!(
                "`{expression}` was called inside a cache scope. It should have been excluded \
                 from server components statically, but was not."
            )))
        }
        WorkUnit::Request(_) => Ok(DynamicHookOutcome::Proceed),
    }
}

/// Signal that fires once the prerender's inputs can be considered hung.
///
/// With a cache signal it fires when every pending cache read is done.
/// Otherwise it fires a tick after the runtime stage is reached (runtime
/// prerenders), or after `hanging_input_ticks` scheduler ticks.
///
/// The spawned task holds receivers only. Once every handle to the cache
/// signal or runtime gate is dropped, the task ends without firing.
///
/// Must be called from within a Tokio runtime.
pub fn create_hanging_input_abort_signal(
    prerender: &PrerenderStore,
    config: &RenderConfig,
) -> AbortSignal {
    let controller = AbortController::new();
    let signal = controller.signal();
    let ticks = config.hanging_input_ticks;

    if let Some(cache_signal) = prerender.cache_signal.as_ref() {
        let ready = cache_signal.inputs_ready();
        tokio::spawn(async move {
            if ready.await {
                controller.abort(inputs_settled());
            } else {
                tracing::trace!("cache signal dropped before inputs settled");
            }
        });
    } else if let Some(runtime_stage) = prerender.runtime_stage.as_ref() {
        let reached = runtime_stage.settled();
        tokio::spawn(async move {
            if let Some(Ok(())) = reached.await {
                yield_ticks(1).await;
                controller.abort(inputs_settled());
            }
        });
    } else {
        tokio::spawn(async move {
            yield_ticks(ticks).await;
            controller.abort(inputs_settled());
        });
    }

    signal
}

fn inputs_settled() -> RenderError {
    RenderError::Aborted {
        reason: "prerender inputs settled".to_string(),
    }
}

async fn yield_ticks(ticks: u32) {
    for _ in 0..ticks {
        tokio::task::yield_now().await;
    }
}

/// Release `value` once a runtime prerender reaches its runtime stage.
/// Other prerenders release it immediately.
pub fn delay_until_runtime_stage<T: Send + 'static>(
    prerender: &PrerenderStore,
    value: T,
) -> BoxFuture<'static, Result<T>> {
    match prerender.runtime_stage.as_ref() {
        Some(runtime_stage) => {
            let reached = runtime_stage.wait();
            Box::pin(async move {
                reached.await?;
                Ok(value)
            })
        }
        None => Box::pin(future::ready(Ok(value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache_signal::CacheSignal;
    use crate::staged::StagedRenderingController;
    use crate::work::{FallbackRouteParams, PrerenderPprStore};
    use rendergate_core::{is_dynamic_postpone_reason, RenderStage};
    use std::time::Duration;

    fn store(route: &str) -> WorkStore {
        WorkStore::new(route, RenderConfig::default())
    }

    fn prerender() -> PrerenderStore {
        let controller = AbortController::new();
        let render_signal = AbortController::new().signal();
        PrerenderStore::new(controller, render_signal).with_tracking(DynamicTrackingState::new(false))
    }

    fn params(names: &[&str]) -> FallbackRouteParams {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_mark_dynamic_forced_routes_are_noop() {
        let mut work = store("/");
        work.force_static = true;
        work.dynamic_should_error = true;
        let mut unit = WorkUnit::PrerenderLegacy(PrerenderLegacyStore::default());
        assert!(mark_current_scope_as_dynamic(&mut work, Some(&mut unit), "`cookies()`").is_ok());
        assert!(matches!(
            unit,
            WorkUnit::PrerenderLegacy(PrerenderLegacyStore { revalidate: None })
        ));
    }

    #[test]
    fn test_mark_dynamic_error_mode_bails_out_everywhere() {
        let mut work = store("/blog");
        work.dynamic_should_error = true;
        for mut unit in [WorkUnit::Cache, WorkUnit::Request(RequestStore::default())] {
            let error =
                mark_current_scope_as_dynamic(&mut work, Some(&mut unit), "`headers()`").unwrap_err();
            assert_eq!(error.digest(), Some("NEXT_STATIC_GEN_BAILOUT"));
            assert!(error.to_string().contains("`dynamic = \"error\"`"));
        }
    }

    #[test]
    fn test_mark_dynamic_cache_scopes_are_noop() {
        let mut work = store("/");
        for mut unit in [WorkUnit::Cache, WorkUnit::PrivateCache, WorkUnit::UnstableCache] {
            assert!(mark_current_scope_as_dynamic(&mut work, Some(&mut unit), "`cookies()`").is_ok());
        }
        assert!(work.dynamic_usage_description.is_none());
    }

    #[test]
    fn test_mark_dynamic_ppr_postpones() {
        let mut work = store("/shop");
        let mut unit = WorkUnit::PrerenderPpr(PrerenderPprStore {
            dynamic_tracking: Some(DynamicTrackingState::new(false)),
            ..Default::default()
        });
        let error = mark_current_scope_as_dynamic(&mut work, Some(&mut unit), "`cookies()`").unwrap_err();
        match &error {
            RenderError::Postpone(postpone) => {
                assert_eq!(postpone.route, "/shop");
                assert!(is_dynamic_postpone_reason(&postpone.reason()));
            }
            other => panic!("expected postpone, got {other:?}"),
        }
        let WorkUnit::PrerenderPpr(ppr) = unit else {
            unreachable!()
        };
        assert_eq!(
            ppr.dynamic_tracking.unwrap().first_dynamic_reason(),
            Some("`cookies()`")
        );
    }

    #[test]
    fn test_mark_dynamic_legacy_unwinds() {
        let mut work = store("/legacy");
        let mut unit = WorkUnit::PrerenderLegacy(PrerenderLegacyStore::default());
        let error = mark_current_scope_as_dynamic(&mut work, Some(&mut unit), "`cookies()`").unwrap_err();
        assert!(error.is_dynamic_server_usage());
        assert_eq!(work.dynamic_usage_description.as_deref(), Some("`cookies()`"));
        assert!(matches!(
            unit,
            WorkUnit::PrerenderLegacy(PrerenderLegacyStore { revalidate: Some(0) })
        ));
    }

    #[test]
    fn test_mark_dynamic_request_sets_flag() {
        let mut work = store("/");
        let mut unit = WorkUnit::Request(RequestStore::default());
        mark_current_scope_as_dynamic(&mut work, Some(&mut unit), "`cookies()`").unwrap();
        assert!(matches!(unit, WorkUnit::Request(RequestStore { used_dynamic: true, .. })));
    }

    #[test]
    fn test_mark_dynamic_cache_components_prerender_is_noop() {
        let mut work = store("/");
        for mut unit in [
            WorkUnit::Prerender(prerender()),
            WorkUnit::PrerenderClient(prerender()),
            WorkUnit::PrerenderRuntime(prerender()),
        ] {
            assert!(
                mark_current_scope_as_dynamic(&mut work, Some(&mut unit), "unstable_noStore()").is_ok()
            );
            let (WorkUnit::Prerender(inner)
            | WorkUnit::PrerenderClient(inner)
            | WorkUnit::PrerenderRuntime(inner)) = unit
            else {
                unreachable!()
            };
            assert!(!inner.controller.signal().is_aborted());
            assert!(!inner.dynamic_tracking.unwrap().accessed_dynamic_data());
        }
        assert!(work.dynamic_usage_description.is_none());
    }

    #[test]
    fn test_postpone_requires_host_support() {
        let mut work = store("/");
        work.config.supports_postpone = false;
        let mut tracking = DynamicTrackingState::new(false);
        let error = postpone_with_tracking(&work, "`cookies()`", Some(&mut tracking));
        assert!(error.is_invariant());
        assert!(!tracking.accessed_dynamic_data());
    }

    #[test]
    fn test_throw_to_interrupt_static_generation() {
        let mut work = store("/legacy");
        let mut legacy = PrerenderLegacyStore::default();
        let error = throw_to_interrupt_static_generation("cookies", &mut work, &mut legacy);
        assert_eq!(
            error.to_string(),
            "Route /legacy couldn't be rendered statically because it used `cookies`."
        );
        assert_eq!(legacy.revalidate, Some(0));
        assert_eq!(work.dynamic_usage_description.as_deref(), Some("cookies"));
    }

    #[test]
    fn test_track_in_dynamic_render() {
        let mut request = WorkUnit::Request(RequestStore::default());
        track_dynamic_data_in_dynamic_render(&mut request);
        assert!(matches!(request, WorkUnit::Request(RequestStore { used_dynamic: true, .. })));

        let mut cache = WorkUnit::Cache;
        track_dynamic_data_in_dynamic_render(&mut cache);
    }

    #[test]
    fn test_abort_happens_before_tracking() {
        let mut store = prerender();
        let signal = store.controller.signal();
        let observed = std::sync::Arc::new(std::sync::Mutex::new(None));
        let seen = std::sync::Arc::clone(&observed);
        signal.on_abort(move |reason| *seen.lock().unwrap() = Some(reason.clone()));

        abort_on_synchronous_platform_io_access(
            "/clock",
            "`Date.now()`",
            DiagnosticError::new("Date.now() was used synchronously"),
            &mut store,
        );

        let reason = observed.lock().unwrap().clone().unwrap();
        assert!(reason.is_prerender_interrupted());
        assert_eq!(reason.digest(), Some("NEXT_PRERENDER_INTERRUPTED"));
        assert!(!is_dynamic_postpone_reason(&reason.to_string()));

        let tracking = store.dynamic_tracking.unwrap();
        assert_eq!(tracking.first_dynamic_reason(), Some("`Date.now()`"));
        assert_eq!(
            tracking.sync_dynamic_error_with_stack.unwrap().message,
            "Date.now() was used synchronously"
        );
    }

    #[test]
    fn test_sync_error_first_violation_wins() {
        let mut store = prerender();
        abort_on_synchronous_platform_io_access(
            "/",
            "`Math.random()`",
            DiagnosticError::new("first"),
            &mut store,
        );
        abort_on_synchronous_platform_io_access(
            "/",
            "`Date.now()`",
            DiagnosticError::new("second"),
            &mut store,
        );
        let tracking = store.dynamic_tracking.unwrap();
        assert_eq!(tracking.dynamic_accesses.len(), 2);
        assert_eq!(tracking.sync_dynamic_error_with_stack.unwrap().message, "first");
    }

    #[test]
    fn test_abort_and_throw_is_idempotent() {
        let mut store = prerender();
        let first = abort_and_throw_on_synchronous_request_data_access(
            "/",
            "`cookies()`",
            DiagnosticError::new("first"),
            &mut store,
        );
        let second = abort_and_throw_on_synchronous_request_data_access(
            "/",
            "`headers()`",
            DiagnosticError::new("second"),
            &mut store,
        );

        assert!(first.is_prerender_interrupted());
        assert!(second.is_prerender_interrupted());
        assert!(second.to_string().contains("`headers()`"));

        let reason = store.controller.signal().reason().unwrap();
        assert!(reason.to_string().contains("`cookies()`"));
        let tracking = store.dynamic_tracking.unwrap();
        assert_eq!(tracking.dynamic_accesses.len(), 1);
        assert_eq!(tracking.sync_dynamic_error_with_stack.unwrap().message, "first");
    }

    #[test]
    fn test_annotate_captures_stack_in_debug() {
        let controller = AbortController::new();
        let signal = controller.signal();
        let mut store =
            PrerenderStore::new(controller, signal).with_tracking(DynamicTrackingState::new(true));
        annotate_dynamic_access("`connection()`", &mut store);

        assert!(!store.controller.signal().is_aborted());
        let tracking = store.dynamic_tracking.unwrap();
        assert!(tracking.dynamic_accesses[0].stack.is_some());
    }

    #[test]
    fn test_debug_prerender_config_captures_stacks() {
        let mut work = store("/debug");
        work.config.debug_dynamic_accesses = true;

        let controller = AbortController::new();
        let signal = controller.signal();
        let mut prerender = PrerenderStore::new(controller, signal).with_tracking_for(&work.config);
        annotate_dynamic_access("`connection()`", &mut prerender);
        let tracking = prerender.dynamic_tracking.unwrap();
        assert!(tracking.dynamic_accesses[0].stack.is_some());

        let mut unit = WorkUnit::PrerenderPpr(PrerenderPprStore::new(&work.config));
        let error = mark_current_scope_as_dynamic(&mut work, Some(&mut unit), "`cookies()`").unwrap_err();
        assert!(error.is_dynamic_postpone());
        let WorkUnit::PrerenderPpr(ppr) = unit else {
            unreachable!()
        };
        assert!(ppr.dynamic_tracking.unwrap().dynamic_accesses[0].stack.is_some());
    }

    #[test]
    fn test_default_config_skips_stacks() {
        let work = store("/");
        let controller = AbortController::new();
        let signal = controller.signal();
        let mut prerender = PrerenderStore::new(controller, signal).with_tracking_for(&work.config);
        annotate_dynamic_access("`connection()`", &mut prerender);
        assert!(prerender.dynamic_tracking.unwrap().dynamic_accesses[0].stack.is_none());
    }

    #[test]
    fn test_sync_io_in_dev_interrupts_stage() {
        let mut staged = StagedRenderingController::new(None, false);
        staged.advance_stage(RenderStage::Static);
        let mut request = RequestStore {
            used_dynamic: false,
            staged_rendering: Some(staged),
        };
        track_synchronous_platform_io_access_in_dev(&mut request, "`Date.now()`");

        let staged = request.staged_rendering.as_ref().unwrap();
        assert_eq!(staged.current_stage(), RenderStage::Dynamic);
        assert_eq!(staged.static_interrupt_reason(), Some("`Date.now()`"));
        assert!(!request.used_dynamic);
    }

    #[test]
    fn test_sync_request_data_in_dev_past_boundary() {
        let mut staged = StagedRenderingController::new(None, false);
        staged.advance_stage(RenderStage::Runtime);
        let mut request = RequestStore {
            used_dynamic: false,
            staged_rendering: Some(staged),
        };
        track_synchronous_request_data_access_in_dev(&mut request, "`cookies()`");

        assert!(request.used_dynamic);
        let staged = request.staged_rendering.as_ref().unwrap();
        assert_eq!(staged.current_stage(), RenderStage::Runtime);
    }

    #[tokio::test]
    async fn test_route_params_hang_in_prerender() {
        let mut work = store("/[slug]");
        work.is_static_generation = true;
        work.fallback_route_params = Some(params(&["slug"]));

        let render = AbortController::new();
        let mut unit = WorkUnit::Prerender(
            PrerenderStore::new(AbortController::new(), render.signal())
                .with_fallback_params(params(&["slug"])),
        );

        let outcome = use_dynamic_route_params("useParams()", &work, Some(&mut unit)).unwrap();
        let DynamicHookOutcome::Hang(promise) = outcome else {
            panic!("expected the hook to hang");
        };
        render.abort(RenderError::prerender_interrupted("render complete"));
        assert!(promise.await.unwrap_err().is_hanging_promise_rejection());
    }

    #[test]
    fn test_route_params_ppr_postpones() {
        let mut work = store("/[slug]");
        work.is_static_generation = true;
        work.fallback_route_params = Some(params(&["slug"]));
        let mut unit = WorkUnit::PrerenderPpr(PrerenderPprStore {
            fallback_route_params: Some(params(&["slug"])),
            ..Default::default()
        });

        let error = use_dynamic_route_params("useParams()", &work, Some(&mut unit)).unwrap_err();
        assert!(error.is_dynamic_postpone());
    }

    #[test]
    fn test_route_params_without_fallback_proceed() {
        let work = store("/static");
        let mut unit = WorkUnit::PrerenderRuntime(prerender());
        let outcome = use_dynamic_route_params("useParams()", &work, Some(&mut unit)).unwrap();
        assert!(outcome.is_proceed());
    }

    #[test]
    fn test_route_params_invalid_scopes() {
        let mut work = store("/[slug]");
        work.is_static_generation = true;
        work.fallback_route_params = Some(params(&["slug"]));

        let mut runtime = WorkUnit::PrerenderRuntime(prerender());
        assert!(use_dynamic_route_params("useParams()", &work, Some(&mut runtime))
            .unwrap_err()
            .is_invariant());

        let mut cache = WorkUnit::Cache;
        assert!(use_dynamic_route_params("useParams()", &work, Some(&mut cache))
            .unwrap_err()
            .is_invariant());

        let mut unstable = WorkUnit::UnstableCache;
        assert!(use_dynamic_route_params("useParams()", &work, Some(&mut unstable))
            .unwrap()
            .is_proceed());
    }

    #[test]
    fn test_search_params_per_work_unit() {
        let mut work = store("/search");

        let legacy = WorkUnit::PrerenderLegacy(PrerenderLegacyStore::default());
        let error = use_dynamic_search_params("useSearchParams()", &work, Some(&legacy)).unwrap_err();
        assert_eq!(error.digest(), Some("BAILOUT_TO_CLIENT_SIDE_RENDERING"));

        work.force_static = true;
        assert!(use_dynamic_search_params("useSearchParams()", &work, Some(&legacy))
            .unwrap()
            .is_proceed());

        let server = WorkUnit::Prerender(prerender());
        assert!(use_dynamic_search_params("useSearchParams()", &work, Some(&server))
            .unwrap_err()
            .is_invariant());

        let request = WorkUnit::Request(RequestStore::default());
        assert!(use_dynamic_search_params("useSearchParams()", &work, Some(&request))
            .unwrap()
            .is_proceed());

        let client = WorkUnit::PrerenderClient(prerender());
        assert!(matches!(
            use_dynamic_search_params("useSearchParams()", &work, Some(&client)).unwrap(),
            DynamicHookOutcome::Hang(_)
        ));
    }

    #[tokio::test]
    async fn test_hanging_input_signal_after_ticks() {
        let store = prerender();
        let signal = create_hanging_input_abort_signal(&store, &RenderConfig::default());
        let reason = tokio::time::timeout(Duration::from_secs(1), signal.aborted())
            .await
            .unwrap();
        assert!(matches!(reason, RenderError::Aborted { .. }));
    }

    #[tokio::test]
    async fn test_hanging_input_signal_waits_for_cache_reads() {
        let cache = CacheSignal::new();
        cache.begin_read();
        let store = prerender().with_cache_signal(cache.clone());
        let signal = create_hanging_input_abort_signal(&store, &RenderConfig::default());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!signal.is_aborted());

        cache.end_read();
        tokio::time::timeout(Duration::from_secs(1), signal.aborted())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_hanging_input_signal_waits_for_runtime_stage() {
        let mut staged = StagedRenderingController::new(None, false);
        let store = prerender().with_runtime_stage(&staged);
        let signal = create_hanging_input_abort_signal(&store, &RenderConfig::default());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!signal.is_aborted());

        staged.advance_stage(RenderStage::Runtime);
        tokio::time::timeout(Duration::from_secs(1), signal.aborted())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_hanging_input_signal_released_with_render() {
        let cache = CacheSignal::new();
        cache.begin_read();
        let cached = prerender().with_cache_signal(cache);
        let cache_hung = create_hanging_input_abort_signal(&cached, &RenderConfig::default());

        let staged = StagedRenderingController::new(None, false);
        let runtime = prerender().with_runtime_stage(&staged);
        let runtime_hung = create_hanging_input_abort_signal(&runtime, &RenderConfig::default());

        drop(cached);
        drop(runtime);
        drop(staged);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!cache_hung.is_aborted());
        assert!(!runtime_hung.is_aborted());
    }

    #[tokio::test]
    async fn test_delay_until_runtime_stage() {
        let immediate = delay_until_runtime_stage(&prerender(), "now").await;
        assert_eq!(immediate, Ok("now"));

        let mut staged = StagedRenderingController::new(None, false);
        let store = prerender().with_runtime_stage(&staged);
        let delayed = tokio::spawn(delay_until_runtime_stage(&store, "later"));
        tokio::task::yield_now().await;
        assert!(!delayed.is_finished());

        staged.advance_stage(RenderStage::Runtime);
        assert_eq!(delayed.await.unwrap(), Ok("later"));
    }
}
