//! Replay of stage transitions against a staged render.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rendergate_runtime::{
    AbortController, GateState, RenderError, RenderStage, StagedRenderingController,
};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::error::{CliError, Result};

/// How long a stage waiter gets to observe a settled gate.
const WAITER_GRACE: Duration = Duration::from_millis(50);

/// One simulated event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Advance(RenderStage),
    Interrupt(String),
    Abandon,
    Abort,
}

impl FromStr for Step {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "static" => Ok(Self::Advance(RenderStage::Static)),
            "runtime" => Ok(Self::Advance(RenderStage::Runtime)),
            "dynamic" => Ok(Self::Advance(RenderStage::Dynamic)),
            "abandon" => Ok(Self::Abandon),
            "abort" => Ok(Self::Abort),
            _ => match s.strip_prefix("interrupt:") {
                Some(reason) if !reason.is_empty() => Ok(Self::Interrupt(reason.to_string())),
                _ => Err(CliError::InvalidStep(s.to_string())),
            },
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Advance(stage) => write!(f, "{stage}"),
            Self::Interrupt(reason) => write!(f, "interrupt:{reason}"),
            Self::Abandon => f.write_str("abandon"),
            Self::Abort => f.write_str("abort"),
        }
    }
}

/// What a task awaiting a stage observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum WaiterOutcome {
    Released,
    Rejected { reason: String },
    Waiting,
}

/// State of the render after the last step.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub final_stage: RenderStage,
    pub may_abandon: bool,
    pub aborted: bool,
    pub static_interrupt_reason: Option<String>,
    pub runtime_interrupt_reason: Option<String>,
    pub static_stage_ended: bool,
    pub runtime_stage_ended: bool,
    pub runtime_gate: GateState,
    pub dynamic_gate: GateState,
    /// Stage listeners in the order they fired.
    pub listeners_fired: Vec<RenderStage>,
    pub runtime_waiter: WaiterOutcome,
    pub dynamic_waiter: WaiterOutcome,
}

/// Replay `steps` against a fresh staged render.
///
/// A listener and a waiting task are attached to both awaitable stages
/// before the first step, so the report shows who was released.
pub async fn simulate(
    steps: &[Step],
    runtime_prefetch: bool,
    abortable: bool,
) -> Result<SimulationReport> {
    let controller = abortable.then(AbortController::new);
    let signal = controller.as_ref().map(AbortController::signal);
    let mut staged = StagedRenderingController::new(signal.as_ref(), runtime_prefetch);

    let fired = Arc::new(Mutex::new(Vec::new()));
    for stage in [RenderStage::Runtime, RenderStage::Dynamic] {
        let fired = Arc::clone(&fired);
        staged.on_stage(stage, move || {
            fired
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(stage);
        })?;
    }

    let runtime_waiter = tokio::spawn(staged.wait_for_stage(RenderStage::Runtime)?);
    let dynamic_waiter = tokio::spawn(staged.wait_for_stage(RenderStage::Dynamic)?);

    for step in steps {
        match step {
            Step::Advance(stage) => staged.advance_stage(*stage),
            Step::Interrupt(reason) => staged.sync_interrupt_current_stage_with_reason(reason.as_str()),
            Step::Abandon => staged.abandon_render()?,
            Step::Abort => {
                let controller = controller.as_ref().ok_or(CliError::NotAbortable)?;
                controller.abort(RenderError::Aborted {
                    reason: "aborted by simulation".to_string(),
                });
            }
        }
        tracing::info!(%step, stage = %staged.current_stage(), "step applied");
    }

    let (runtime_waiter, dynamic_waiter) =
        tokio::join!(settle(runtime_waiter), settle(dynamic_waiter));
    let listeners_fired = fired
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();

    Ok(SimulationReport {
        final_stage: staged.current_stage(),
        may_abandon: staged.may_abandon(),
        aborted: signal.as_ref().is_some_and(|signal| signal.is_aborted()),
        static_interrupt_reason: staged.static_interrupt_reason().map(str::to_string),
        runtime_interrupt_reason: staged.runtime_interrupt_reason().map(str::to_string),
        static_stage_ended: staged.static_stage_end_time().is_finite(),
        runtime_stage_ended: staged.runtime_stage_end_time().is_finite(),
        runtime_gate: staged.gate_state(RenderStage::Runtime)?,
        dynamic_gate: staged.gate_state(RenderStage::Dynamic)?,
        listeners_fired,
        runtime_waiter,
        dynamic_waiter,
    })
}

async fn settle(mut waiter: JoinHandle<std::result::Result<(), RenderError>>) -> WaiterOutcome {
    match tokio::time::timeout(WAITER_GRACE, &mut waiter).await {
        Ok(Ok(Ok(()))) => WaiterOutcome::Released,
        Ok(Ok(Err(reason))) => WaiterOutcome::Rejected {
            reason: reason.to_string(),
        },
        Ok(Err(join)) => WaiterOutcome::Rejected {
            reason: join.to_string(),
        },
        Err(_) => {
            waiter.abort();
            WaiterOutcome::Waiting
        }
    }
}
