use crate::error::Result;
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;

/// An API call that has been built and is waiting to be sent.
///
/// Await it directly, or hand it a completion callback with
/// [`PendingRequest::spawn`].
#[must_use = "requests do nothing unless awaited or spawned"]
pub struct PendingRequest<T> {
    future: BoxFuture<'static, Result<T>>,
}

impl<T> PendingRequest<T> {
    pub(crate) fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        PendingRequest {
            future: future.boxed(),
        }
    }
}

impl<T: Send + 'static> PendingRequest<T> {
    /// Run the request on the tokio runtime and deliver the result to
    /// `on_complete`. Must be called from within a runtime.
    pub fn spawn<F>(self, on_complete: F) -> RequestTask
    where
        F: FnOnce(Result<T>) + Send + 'static,
    {
        let state = Arc::new(AtomicU8::new(PENDING));
        let task_state = state.clone();

        let handle = tokio::spawn(async move {
            let result = self.await;
            if task_state
                .compare_exchange(PENDING, COMPLETED, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                on_complete(result);
            }
        });

        RequestTask { handle, state }
    }
}

impl<T> Future for PendingRequest<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.future.poll_unpin(cx)
    }
}

const PENDING: u8 = 0;
const COMPLETED: u8 = 1;
const CANCELLED: u8 = 2;

/// Handle to a spawned request
#[derive(Debug)]
pub struct RequestTask {
    handle: JoinHandle<()>,
    state: Arc<AtomicU8>,
}

impl RequestTask {
    /// Cancel the request.
    ///
    /// Returns `true` if the completion callback was prevented from running,
    /// `false` if it already started. A token refresh shared with other
    /// requests keeps running for them.
    pub fn cancel(&self) -> bool {
        let prevented = self
            .state
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if prevented {
            self.handle.abort();
        }
        prevented
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELLED
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
