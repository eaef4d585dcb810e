//! Tracks cache reads that a prerender is still waiting on.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

/// Counter of in-flight cache reads for one prerender.
#[derive(Debug, Clone)]
pub struct CacheSignal {
    pending: Arc<watch::Sender<usize>>,
}

impl CacheSignal {
    pub fn new() -> Self {
        let (pending, _rx) = watch::channel(0);
        Self {
            pending: Arc::new(pending),
        }
    }

    pub fn begin_read(&self) {
        self.pending.send_modify(|count| *count += 1);
    }

    pub fn end_read(&self) {
        self.pending
            .send_modify(|count| *count = count.saturating_sub(1));
    }

    pub fn pending_reads(&self) -> usize {
        *self.pending.borrow()
    }

    /// Resolves once no reads are pending and none started during the
    /// following scheduler tick.
    pub async fn input_ready(&self) {
        // `self` keeps the sender alive, so this always reports ready.
        self.inputs_ready().await;
    }

    /// Like [`CacheSignal::input_ready`], but the future holds a receiver
    /// only. Resolves to `false` if every handle is dropped while reads are
    /// still pending.
    pub fn inputs_ready(&self) -> impl Future<Output = bool> + Send + 'static {
        let mut rx = self.pending.subscribe();
        async move {
            loop {
                if rx.wait_for(|count| *count == 0).await.is_err() {
                    return false;
                }
                tokio::task::yield_now().await;
                if *rx.borrow() == 0 {
                    return true;
                }
            }
        }
    }
}

impl Default for CacheSignal {
    fn default() -> Self {
        Self::new()
    }
}
