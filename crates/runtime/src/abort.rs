//! Abort controller and signal for cancelling a render.
//!
//! Listeners registered with [`AbortSignal::on_abort`] run synchronously
//! inside [`AbortController::abort`], before it returns, so code that
//! inspects render state right after an abort sees every listener's effect.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use rendergate_core::RenderError;
use tokio::sync::watch;

type AbortListener = Box<dyn FnOnce(&RenderError) + Send>;

#[derive(Default)]
struct AbortState {
    reason: Option<RenderError>,
    listeners: Vec<AbortListener>,
}

struct Inner {
    state: Mutex<AbortState>,
    aborted: watch::Sender<bool>,
}

/// Read side of an abort controller. Cheap to clone.
#[derive(Clone)]
pub struct AbortSignal {
    inner: Arc<Inner>,
}

impl AbortSignal {
    fn new() -> Self {
        let (aborted, _rx) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(AbortState::default()),
                aborted,
            }),
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.lock().reason.is_some()
    }

    pub fn reason(&self) -> Option<RenderError> {
        self.lock().reason.clone()
    }

    /// Run `listener` once when the signal aborts, or right away if it
    /// already has.
    pub fn on_abort(&self, listener: impl FnOnce(&RenderError) + Send + 'static) {
        let mut state = self.lock();
        match state.reason.clone() {
            Some(reason) => {
                drop(state);
                listener(&reason);
            }
            None => state.listeners.push(Box::new(listener)),
        }
    }

    /// Wait until the signal aborts and return the reason.
    pub async fn aborted(&self) -> RenderError {
        let mut rx = self.inner.aborted.subscribe();
        // The sender is owned by `self`, so this cannot observe a closed channel.
        let _ = rx.wait_for(|aborted| *aborted).await;
        match self.reason() {
            Some(reason) => reason,
            None => std::future::pending().await,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AbortState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for AbortSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbortSignal")
            .field("reason", &self.reason())
            .finish()
    }
}

/// Owner of an abort signal.
#[derive(Debug, Clone)]
pub struct AbortController {
    signal: AbortSignal,
}

impl AbortController {
    pub fn new() -> Self {
        Self {
            signal: AbortSignal::new(),
        }
    }

    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    /// Abort with `reason`. The first reason wins; returns `false` if the
    /// signal was already aborted.
    pub fn abort(&self, reason: RenderError) -> bool {
        let listeners = {
            let mut state = self.signal.lock();
            if state.reason.is_some() {
                return false;
            }
            state.reason = Some(reason.clone());
            std::mem::take(&mut state.listeners)
        };

        for listener in listeners {
            listener(&reason);
        }
        self.signal.inner.aborted.send_replace(true);
        true
    }
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}
