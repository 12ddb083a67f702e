//! crates/doc_analysis_core/src/task.rs
//!
//! Simulated processing latency that can be cancelled, and a spawned task
//! handle that cancels its work when dropped.

use crate::error::{CoreError, CoreResult};
use crate::ports::PortError;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Waits for `delay`, or returns `CoreError::Cancelled` as soon as `token` fires.
///
/// A token that is already cancelled wins even when `delay` is zero.
pub async fn simulate_latency(delay: Duration, token: &CancellationToken) -> CoreResult<()> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(CoreError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}

/// Drives `work` to completion unless `token` is cancelled first.
pub async fn run_cancellable<T, F>(token: &CancellationToken, work: F) -> CoreResult<T>
where
    F: Future<Output = CoreResult<T>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(CoreError::Cancelled),
        result = work => result,
    }
}

/// Work running on its own tokio task under a child cancellation token.
///
/// The work always runs to an exit path of its own, so it can release any
/// session flags it set. Dropping the handle (for example when an HTTP client
/// disconnects) cancels the token rather than aborting the task.
pub struct CancellableTask<T> {
    handle: JoinHandle<CoreResult<T>>,
    token: CancellationToken,
    _guard: DropGuard,
}

impl<T: Send + 'static> CancellableTask<T> {
    pub fn spawn<F, Fut>(parent: &CancellationToken, work: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = CoreResult<T>> + Send + 'static,
    {
        let token = parent.child_token();
        let handle = tokio::spawn(work(token.clone()));
        Self {
            handle,
            _guard: token.clone().drop_guard(),
            token,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub async fn join(self) -> CoreResult<T> {
        let Self { handle, _guard, .. } = self;
        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(CoreError::Cancelled),
            Err(e) => Err(PortError::Unexpected(format!("Task failed: {}", e)).into()),
        }
    }
}
