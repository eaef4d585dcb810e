//! Work store and work units: the explicit render context.
//!
//! A [`WorkStore`] describes the route being rendered. A [`WorkUnit`]
//! describes the phase of work currently running within it, and decides how
//! a dynamic data access is handled. Both are passed explicitly to every
//! policy function.

use std::collections::BTreeSet;
use std::fmt;

use rendergate_core::{DynamicTrackingState, RenderConfig, RenderStage};

use crate::abort::{AbortController, AbortSignal};
use crate::cache_signal::CacheSignal;
use crate::gate::Deferred;
use crate::staged::StagedRenderingController;

/// Names of route params that are not known while prerendering.
pub type FallbackRouteParams = BTreeSet<String>;

/// Route-level state for one render.
#[derive(Debug, Clone)]
pub struct WorkStore {
    pub route: String,
    pub config: RenderConfig,
    /// `dynamic = "force-static"`.
    pub force_static: bool,
    /// `dynamic = "force-dynamic"`.
    pub force_dynamic: bool,
    /// `dynamic = "error"`.
    pub dynamic_should_error: bool,
    pub is_static_generation: bool,
    pub fallback_route_params: Option<FallbackRouteParams>,
    /// Expression that forced the route to render dynamically.
    pub dynamic_usage_description: Option<String>,
    pub dynamic_usage_stack: Option<String>,
}

impl WorkStore {
    pub fn new(route: impl Into<String>, config: RenderConfig) -> Self {
        Self {
            route: route.into(),
            config,
            force_static: false,
            force_dynamic: false,
            dynamic_should_error: false,
            is_static_generation: false,
            fallback_route_params: None,
            dynamic_usage_description: None,
            dynamic_usage_stack: None,
        }
    }

    pub fn has_fallback_params(&self) -> bool {
        has_params(self.fallback_route_params.as_ref())
    }
}

pub(crate) fn has_params(params: Option<&FallbackRouteParams>) -> bool {
    params.is_some_and(|params| !params.is_empty())
}

/// State of a cache-components prerender (`prerender`, `prerender-client`,
/// `prerender-runtime`).
#[derive(Debug)]
pub struct PrerenderStore {
    /// Aborting this cancels the whole prerender.
    pub controller: AbortController,
    /// Fires when the render itself is done.
    pub render_signal: AbortSignal,
    pub cache_signal: Option<CacheSignal>,
    pub dynamic_tracking: Option<DynamicTrackingState>,
    pub fallback_route_params: Option<FallbackRouteParams>,
    /// Runtime stage gate of a runtime prerender.
    pub runtime_stage: Option<Deferred<()>>,
}

impl PrerenderStore {
    pub fn new(controller: AbortController, render_signal: AbortSignal) -> Self {
        Self {
            controller,
            render_signal,
            cache_signal: None,
            dynamic_tracking: None,
            fallback_route_params: None,
            runtime_stage: None,
        }
    }

    pub fn with_tracking(mut self, tracking: DynamicTrackingState) -> Self {
        self.dynamic_tracking = Some(tracking);
        self
    }

    /// Track dynamic accesses the way `config` asks for.
    pub fn with_tracking_for(self, config: &RenderConfig) -> Self {
        self.with_tracking(DynamicTrackingState::from_config(config))
    }

    pub fn with_cache_signal(mut self, cache_signal: CacheSignal) -> Self {
        self.cache_signal = Some(cache_signal);
        self
    }

    pub fn with_fallback_params(mut self, params: FallbackRouteParams) -> Self {
        self.fallback_route_params = Some(params);
        self
    }

    /// Gate delayed values on the runtime stage of `staged`.
    pub fn with_runtime_stage(mut self, staged: &StagedRenderingController) -> Self {
        self.runtime_stage = staged.stage_gate(RenderStage::Runtime).ok();
        self
    }
}

/// State of a partial prerender.
#[derive(Debug, Default)]
pub struct PrerenderPprStore {
    pub dynamic_tracking: Option<DynamicTrackingState>,
    pub fallback_route_params: Option<FallbackRouteParams>,
    /// Seconds until revalidation; `Some(0)` means render dynamically.
    pub revalidate: Option<u32>,
}

impl PrerenderPprStore {
    /// A partial prerender that tracks dynamic accesses the way `config`
    /// asks for.
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            dynamic_tracking: Some(DynamicTrackingState::from_config(config)),
            ..Self::default()
        }
    }
}

/// State of a legacy (all-or-nothing) prerender.
#[derive(Debug, Default)]
pub struct PrerenderLegacyStore {
    /// Seconds until revalidation; `Some(0)` means render dynamically.
    pub revalidate: Option<u32>,
}

/// State of a request-time render.
#[derive(Debug, Default)]
pub struct RequestStore {
    pub used_dynamic: bool,
    /// Present when the request render runs in stages.
    pub staged_rendering: Option<StagedRenderingController>,
}

/// The phase of work that is currently running.
#[derive(Debug)]
pub enum WorkUnit {
    Prerender(PrerenderStore),
    PrerenderClient(PrerenderStore),
    PrerenderRuntime(PrerenderStore),
    PrerenderPpr(PrerenderPprStore),
    PrerenderLegacy(PrerenderLegacyStore),
    Request(RequestStore),
    Cache,
    PrivateCache,
    UnstableCache,
}

impl WorkUnit {
    pub fn kind(&self) -> WorkUnitKind {
        match self {
            Self::Prerender(_) => WorkUnitKind::Prerender,
            Self::PrerenderClient(_) => WorkUnitKind::PrerenderClient,
            Self::PrerenderRuntime(_) => WorkUnitKind::PrerenderRuntime,
            Self::PrerenderPpr(_) => WorkUnitKind::PrerenderPpr,
            Self::PrerenderLegacy(_) => WorkUnitKind::PrerenderLegacy,
            Self::Request(_) => WorkUnitKind::Request,
            Self::Cache => WorkUnitKind::Cache,
            Self::PrivateCache => WorkUnitKind::PrivateCache,
            Self::UnstableCache => WorkUnitKind::UnstableCache,
        }
    }

    pub fn is_cache_scope(&self) -> bool {
        matches!(self, Self::Cache | Self::PrivateCache | Self::UnstableCache)
    }
}

/// Discriminant of a [`WorkUnit`], for logs and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkUnitKind {
    Prerender,
    PrerenderClient,
    PrerenderRuntime,
    PrerenderPpr,
    PrerenderLegacy,
    Request,
    Cache,
    PrivateCache,
    UnstableCache,
}

impl WorkUnitKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prerender => "prerender",
            Self::PrerenderClient => "prerender-client",
            Self::PrerenderRuntime => "prerender-runtime",
            Self::PrerenderPpr => "prerender-ppr",
            Self::PrerenderLegacy => "prerender-legacy",
            Self::Request => "request",
            Self::Cache => "cache",
            Self::PrivateCache => "private-cache",
            Self::UnstableCache => "unstable-cache",
        }
    }
}

impl fmt::Display for WorkUnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
