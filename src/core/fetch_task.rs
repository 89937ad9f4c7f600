//! Cancellable, deadline-bounded remote calls
//!
//! A [`FetchTask`] is one outstanding remote call: it pairs a cancellation
//! handle with a deadline and wraps the underlying client future so that the
//! two ways a call can die — superseded and timed out — settle as the two
//! distinct error kinds the rest of the engine branches on.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::types::{SyncError, SyncResult};

/// Logical class of an outstanding remote call
///
/// At most one task per `(session, class)` is alive at any instant; the
/// single-flight guard enforces this for every class except `Mutation`,
/// which is never deduplicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceClass {
    /// The blocking initial fetch group
    Critical,
    /// The non-blocking follow-up fetch group
    Secondary,
    /// Background poll ticks and user/mutation-triggered refreshes
    Poll,
    /// One-shot state-changing calls
    Mutation,
}

/// One outstanding remote call
///
/// Created at call time, settled on success, error, or cancellation. The
/// cancellation handle is idempotent: cancelling twice, or cancelling after
/// the task has settled, is a no-op.
#[derive(Debug)]
pub struct FetchTask {
    class: ResourceClass,
    cancel: CancellationToken,
    deadline: Duration,
}

impl FetchTask {
    /// Create a task wired to an external cancellation handle
    pub fn new(class: ResourceClass, cancel: CancellationToken, deadline: Duration) -> Self {
        FetchTask {
            class,
            cancel,
            deadline,
        }
    }

    /// Create a task that no external event can cancel
    ///
    /// Used for the one fetch that must run to completion even if the screen
    /// is spuriously re-initialized: the initial critical load. Only the
    /// deadline bounds it.
    pub fn detached(class: ResourceClass, deadline: Duration) -> Self {
        Self::new(class, CancellationToken::new(), deadline)
    }

    pub fn class(&self) -> ResourceClass {
        self.class
    }

    /// A clone of this task's cancellation handle
    pub fn cancellation_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel the task; safe to call at any time, any number of times
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Drive a client future to settlement under this task's deadline
    ///
    /// Cancellation is checked first so that a task superseded while queued
    /// settles as `Cancelled` rather than racing its response. May be called
    /// for each individual remote call in a fetch group; every call gets the
    /// full deadline, mirroring the per-request timeout at the transport.
    pub async fn run<T>(
        &self,
        operation: &str,
        fut: impl Future<Output = SyncResult<T>>,
    ) -> SyncResult<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(SyncError::Cancelled),
            outcome = tokio::time::timeout(self.deadline, fut) => match outcome {
                Ok(settled) => settled,
                Err(_) => Err(SyncError::timeout(operation)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn never<T>() -> SyncResult<T> {
        futures::future::pending().await
    }

    #[tokio::test]
    async fn test_completed_future_settles_with_its_value() {
        let task = FetchTask::detached(ResourceClass::Critical, Duration::from_secs(30));
        let result = task.run("get-balance", async { Ok(41) }).await;
        assert_eq!(result, Ok(41));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expiry_is_a_timeout_not_a_cancellation() {
        let task = FetchTask::detached(ResourceClass::Poll, Duration::from_secs(30));
        let result: SyncResult<()> = task.run("get-pending-reviews", never()).await;
        assert_eq!(result, Err(SyncError::timeout("get-pending-reviews")));
    }

    #[tokio::test]
    async fn test_pre_cancelled_task_settles_cancelled_before_polling_the_future() {
        let task = FetchTask::detached(ResourceClass::Poll, Duration::from_secs(30));
        task.cancel();
        let result = task.run("get-balance", async { Ok(1) }).await;
        assert_eq!(result, Err(SyncError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_cancellation_mid_flight() {
        let cancel = CancellationToken::new();
        let task = FetchTask::new(ResourceClass::Poll, cancel.clone(), Duration::from_secs(30));

        let handle = tokio::spawn(async move { task.run("get-rules", never::<()>()).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();

        assert_eq!(handle.await.unwrap(), Err(SyncError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancellation_is_idempotent() {
        let task = FetchTask::detached(ResourceClass::Mutation, Duration::from_secs(30));
        let result = task.run("submit-transfer", async { Ok("done") }).await;
        assert_eq!(result, Ok("done"));

        // Cancelling a settled task, twice, is a no-op.
        task.cancel();
        task.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_run_gets_the_full_deadline() {
        let task = FetchTask::detached(ResourceClass::Critical, Duration::from_millis(100));
        let quick = task
            .run("get-balance", async {
                tokio::time::sleep(Duration::from_millis(60)).await;
                Ok(1)
            })
            .await;
        assert_eq!(quick, Ok(1));

        let second = task
            .run("get-transactions", async {
                tokio::time::sleep(Duration::from_millis(60)).await;
                Ok(2)
            })
            .await;
        assert_eq!(second, Ok(2));
    }
}
