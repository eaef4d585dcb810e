//! Stage coordination for a single render attempt.
//!
//! A render attempt moves through `Before -> Static -> Runtime -> Dynamic`.
//! Code can block until the runtime or dynamic stage is reached, register
//! listeners that fire when it is, force the render past a stage when
//! synchronous IO is detected, or abandon an attempt that has not committed
//! to any output yet so the caller can retry it.
//!
//! One controller belongs to exactly one render attempt. A retried attempt
//! gets a new controller.

use std::cmp::Ordering;
use std::future::Future;

use futures_util::future::BoxFuture;
use rendergate_core::{InvariantError, RenderError, RenderStage};
use tracing::Instrument;

use crate::abort::AbortSignal;
use crate::clock;
use crate::gate::{Deferred, GateState};

type StageListener = Box<dyn FnOnce() + Send>;

fn invalid_stage(stage: RenderStage) -> InvariantError {
    InvariantError::new(format!("Invalid render stage: {stage}."))
}

pub struct StagedRenderingController {
    current_stage: RenderStage,
    has_runtime_prefetch: bool,
    may_abandon: bool,
    static_interrupt_reason: Option<String>,
    runtime_interrupt_reason: Option<String>,
    static_stage_end_time: f64,
    runtime_stage_end_time: f64,
    runtime_stage: Deferred<()>,
    dynamic_stage: Deferred<()>,
    runtime_stage_listeners: Vec<StageListener>,
    dynamic_stage_listeners: Vec<StageListener>,
}

impl StagedRenderingController {
    /// Create a controller in the `Before` stage.
    ///
    /// With an `abort_signal` the attempt may be abandoned, and aborting
    /// rejects whichever stage gates have not been reached yet.
    pub fn new(abort_signal: Option<&AbortSignal>, has_runtime_prefetch: bool) -> Self {
        let runtime_stage = Deferred::new();
        let dynamic_stage = Deferred::new();

        if let Some(signal) = abort_signal {
            let runtime = runtime_stage.clone();
            let dynamic = dynamic_stage.clone();
            // Reached gates are already resolved and ignore the rejection.
            signal.on_abort(move |reason| {
                runtime.reject(reason.clone());
                dynamic.reject(reason.clone());
            });
        }

        Self {
            current_stage: RenderStage::Before,
            has_runtime_prefetch,
            may_abandon: abort_signal.is_some(),
            static_interrupt_reason: None,
            runtime_interrupt_reason: None,
            static_stage_end_time: f64::INFINITY,
            runtime_stage_end_time: f64::INFINITY,
            runtime_stage,
            dynamic_stage,
            runtime_stage_listeners: Vec::new(),
            dynamic_stage_listeners: Vec::new(),
        }
    }

    pub fn current_stage(&self) -> RenderStage {
        self.current_stage
    }

    pub fn may_abandon(&self) -> bool {
        self.may_abandon
    }

    /// Run `callback` once `stage` is reached, immediately if it already is.
    ///
    /// Listeners fire in registration order.
    pub fn on_stage(
        &mut self,
        stage: RenderStage,
        callback: impl FnOnce() + Send + 'static,
    ) -> Result<(), InvariantError> {
        if self.has_reached(stage)? {
            callback();
            return Ok(());
        }
        self.listeners_mut(stage)?.push(Box::new(callback));
        Ok(())
    }

    /// Whether synchronous IO can still interrupt the current stage.
    pub fn can_sync_interrupt(&self) -> bool {
        if self.current_stage == RenderStage::Before {
            return false;
        }
        let boundary = if self.has_runtime_prefetch {
            RenderStage::Dynamic
        } else {
            RenderStage::Runtime
        };
        self.current_stage < boundary
    }

    /// React to synchronous IO detected during the current stage.
    ///
    /// An abandonable attempt is abandoned so the caller can retry it. The
    /// final attempt instead skips straight to `Dynamic`: always from
    /// `Static`, and from `Runtime` only with runtime prefetching enabled.
    pub fn sync_interrupt_current_stage_with_reason(&mut self, reason: impl Into<String>) {
        match self.current_stage {
            RenderStage::Before => {}
            _ if self.may_abandon => self.abandon_render_impl(),
            RenderStage::Static => {
                let reason = self.static_interrupt_reason.get_or_insert(reason.into());
                tracing::debug!(reason = %reason, "static stage interrupted");
                self.advance_stage(RenderStage::Dynamic);
            }
            RenderStage::Runtime => {
                if self.has_runtime_prefetch {
                    let reason = self.runtime_interrupt_reason.get_or_insert(reason.into());
                    tracing::debug!(reason = %reason, "runtime stage interrupted");
                    self.advance_stage(RenderStage::Dynamic);
                }
            }
            RenderStage::Dynamic | RenderStage::Abandoned => {}
        }
    }

    /// Scrap this attempt so it can be retried.
    ///
    /// Only legal on controllers built with an abort signal.
    pub fn abandon_render(&mut self) -> Result<(), InvariantError> {
        if !self.may_abandon {
            return Err(InvariantError::new(
                "`abandon_render` called on a render attempt that cannot be abandoned.",
            ));
        }
        self.abandon_render_impl();
        Ok(())
    }

    /// Abandoning from `Static` resolves the runtime gate so its waiters
    /// can move on to the retry. Abandoning from `Runtime` settles neither
    /// gate: waiters on the dynamic gate hang until the abort signal
    /// rejects it. Whether they should be released earlier is undecided.
    fn abandon_render_impl(&mut self) {
        match self.current_stage {
            RenderStage::Static => {
                self.current_stage = RenderStage::Abandoned;
                tracing::debug!(from = %RenderStage::Static, "render attempt abandoned");
                self.resolve_runtime_stage();
            }
            RenderStage::Runtime => {
                self.current_stage = RenderStage::Abandoned;
                tracing::debug!(from = %RenderStage::Runtime, "render attempt abandoned");
            }
            RenderStage::Before | RenderStage::Dynamic | RenderStage::Abandoned => {}
        }
    }

    pub fn static_interrupt_reason(&self) -> Option<&str> {
        self.static_interrupt_reason.as_deref()
    }

    pub fn runtime_interrupt_reason(&self) -> Option<&str> {
        self.runtime_interrupt_reason.as_deref()
    }

    /// When the static stage ended, or infinity if it has not.
    pub fn static_stage_end_time(&self) -> f64 {
        self.static_stage_end_time
    }

    /// When the runtime stage ended, or infinity if it has not.
    pub fn runtime_stage_end_time(&self) -> f64 {
        self.runtime_stage_end_time
    }

    /// Move forward to `stage`. Stages never move backwards; advancing to a
    /// stage that is not ahead of the current one does nothing.
    pub fn advance_stage(&mut self, stage: RenderStage) {
        if self.current_stage.partial_cmp(&stage) != Some(Ordering::Less) {
            return;
        }

        let previous = self.current_stage;
        self.current_stage = stage;
        tracing::debug!(from = %previous, to = %stage, "render stage advanced");

        if previous < RenderStage::Runtime && stage >= RenderStage::Runtime {
            self.static_stage_end_time = clock::now_ms();
            self.resolve_runtime_stage();
        }
        if previous < RenderStage::Dynamic && stage >= RenderStage::Dynamic {
            self.runtime_stage_end_time = clock::now_ms();
            self.resolve_dynamic_stage();
        }
    }

    /// The gate for `stage`, which must be `Runtime` or `Dynamic`.
    pub fn stage_gate(&self, stage: RenderStage) -> Result<Deferred<()>, InvariantError> {
        self.gate(stage).cloned()
    }

    pub fn gate_state(&self, stage: RenderStage) -> Result<GateState, InvariantError> {
        Ok(self.gate(stage)?.state())
    }

    /// Wait until `stage` is reached. Rejects with the abort reason if the
    /// render is aborted first.
    pub fn wait_for_stage(
        &self,
        stage: RenderStage,
    ) -> Result<impl Future<Output = Result<(), RenderError>> + Send + 'static, InvariantError>
    {
        Ok(self.gate(stage)?.wait())
    }

    /// Resolve to `value` once `stage` is reached.
    ///
    /// `label` names the delayed value in traces. Dropping the future
    /// without awaiting it is silent, even if the render is aborted.
    pub fn delay_until_stage<T: Send + 'static>(
        &self,
        stage: RenderStage,
        label: &str,
        value: T,
    ) -> Result<BoxFuture<'static, Result<T, RenderError>>, InvariantError> {
        let reached = self.gate(stage)?.wait();
        let span = tracing::debug_span!("delay_until_stage", %stage, label = %label);
        Ok(Box::pin(
            async move {
                reached.await?;
                tracing::trace!("stage reached, releasing value");
                Ok(value)
            }
            .instrument(span),
        ))
    }

    fn has_reached(&self, stage: RenderStage) -> Result<bool, InvariantError> {
        let gate = self.gate(stage)?;
        Ok(match self.current_stage {
            RenderStage::Abandoned => gate.state() == GateState::Resolved,
            current => current >= stage,
        })
    }

    fn gate(&self, stage: RenderStage) -> Result<&Deferred<()>, InvariantError> {
        match stage {
            RenderStage::Runtime => Ok(&self.runtime_stage),
            RenderStage::Dynamic => Ok(&self.dynamic_stage),
            other => Err(invalid_stage(other)),
        }
    }

    fn listeners_mut(
        &mut self,
        stage: RenderStage,
    ) -> Result<&mut Vec<StageListener>, InvariantError> {
        match stage {
            RenderStage::Runtime => Ok(&mut self.runtime_stage_listeners),
            RenderStage::Dynamic => Ok(&mut self.dynamic_stage_listeners),
            other => Err(invalid_stage(other)),
        }
    }

    fn resolve_runtime_stage(&mut self) {
        for listener in std::mem::take(&mut self.runtime_stage_listeners) {
            listener();
        }
        self.runtime_stage.resolve(());
    }

    fn resolve_dynamic_stage(&mut self) {
        for listener in std::mem::take(&mut self.dynamic_stage_listeners) {
            listener();
        }
        self.dynamic_stage.resolve(());
    }
}

impl std::fmt::Debug for StagedRenderingController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagedRenderingController")
            .field("current_stage", &self.current_stage)
            .field("has_runtime_prefetch", &self.has_runtime_prefetch)
            .field("may_abandon", &self.may_abandon)
            .field("static_interrupt_reason", &self.static_interrupt_reason)
            .field("runtime_interrupt_reason", &self.runtime_interrupt_reason)
            .finish_non_exhaustive()
    }
}
