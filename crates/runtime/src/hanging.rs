//! Promises that only ever settle by rejecting when a render is abandoned.

use futures_util::future::BoxFuture;
use rendergate_core::RenderError;

use crate::abort::AbortSignal;

/// A value that hangs until the render it belongs to is aborted.
pub type HangingPromise<T> = BoxFuture<'static, Result<T, RenderError>>;

/// Create a future that never resolves on its own. When `signal` aborts it
/// yields a `HangingPromiseRejection` naming `route` and `expression`. An
/// already aborted signal rejects on first poll.
///
/// Dropping the future without awaiting it is silent.
pub fn make_hanging_promise<T: Send + 'static>(
    signal: &AbortSignal,
    route: &str,
    expression: &str,
) -> HangingPromise<T> {
    let signal = signal.clone();
    let route = route.to_owned();
    let expression = expression.to_owned();

    Box::pin(async move {
        signal.aborted().await;
        Err(RenderError::HangingPromiseRejection { route, expression })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abort::AbortController;
    use std::time::Duration;

    #[tokio::test]
    async fn test_hangs_until_abort() {
        let controller = AbortController::new();
        let mut promise = make_hanging_promise::<u32>(&controller.signal(), "/", "`cookies()`");

        let early = tokio::time::timeout(Duration::from_millis(20), &mut promise).await;
        assert!(early.is_err());

        controller.abort(RenderError::prerender_interrupted("done"));
        let result = promise.await;
        assert!(matches!(
            result,
            Err(RenderError::HangingPromiseRejection { ref route, ref expression })
                if route == "/" && expression == "`cookies()`"
        ));
    }

    #[tokio::test]
    async fn test_already_aborted_rejects() {
        let controller = AbortController::new();
        controller.abort(RenderError::prerender_interrupted("done"));
        let result = make_hanging_promise::<()>(&controller.signal(), "/a", "params").await;
        assert!(result.unwrap_err().is_hanging_promise_rejection());
    }
}
