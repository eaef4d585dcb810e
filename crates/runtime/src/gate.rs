//! Manually settled one-shot gates.
//!
//! A [`Deferred`] is settled at most once, by whoever holds it, and can be
//! awaited from any number of places. Every waiter observes the same outcome.

use std::future::{pending, Future};
use std::sync::Arc;

use rendergate_core::RenderError;
use serde::Serialize;
use tokio::sync::watch;

type Outcome<T> = Option<Result<T, RenderError>>;

/// Observable state of a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GateState {
    Pending,
    Resolved,
    Rejected,
}

/// A resolvable/rejectable gate other code awaits.
#[derive(Debug)]
pub struct Deferred<T> {
    tx: Arc<watch::Sender<Outcome<T>>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Deferred<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Resolve the gate. Returns `false` if it was already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Reject the gate. Returns `false` if it was already settled.
    pub fn reject(&self, reason: RenderError) -> bool {
        self.settle(Err(reason))
    }

    fn settle(&self, outcome: Result<T, RenderError>) -> bool {
        let mut outcome = Some(outcome);
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = outcome.take();
            true
        })
    }

    pub fn is_settled(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn state(&self) -> GateState {
        match &*self.tx.borrow() {
            None => GateState::Pending,
            Some(Ok(_)) => GateState::Resolved,
            Some(Err(_)) => GateState::Rejected,
        }
    }

    /// Wait for the gate to settle.
    ///
    /// The returned future owns a subscription, so it can outlive this
    /// handle. If every handle is dropped before the gate settles, the
    /// future never completes.
    pub fn wait(&self) -> impl Future<Output = Result<T, RenderError>> + Send + 'static {
        let settled = self.settled();
        async move {
            match settled.await {
                Some(outcome) => outcome,
                None => pending().await,
            }
        }
    }

    /// Like [`Deferred::wait`], but yields `None` once every handle is
    /// dropped without settling the gate.
    ///
    /// The future holds a receiver only, so it does not keep the gate alive.
    pub fn settled(&self) -> impl Future<Output = Option<Result<T, RenderError>>> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            match rx.wait_for(Option::is_some).await {
                Ok(slot) => slot.clone(),
                Err(_) => None,
            }
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}
