//! One-shot state-changing calls
//!
//! Mutations are user-intentional, so they bypass the single-flight guard —
//! two distinct mutations submitted back to back both run. What they share
//! with fetches is the deadline and the session-scoped cancellation handle.
//!
//! A successful mutation triggers the narrowest refresh that covers its
//! effect (forced, so it wins over any in-flight poll tick), optionally plus
//! a wider background refresh that never blocks the caller. A failed
//! mutation leaves shared state untouched and hands the classified error
//! back for display.

use std::future::Future;

use crate::core::fetch_task::{FetchTask, ResourceClass};
use crate::core::loader::{FetchPlan, RefreshKind, RefreshScope, StagedLoader};
use crate::core::session::SyncSession;
use crate::types::SyncResult;

/// Which scopes to refresh after a mutation succeeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationSpec {
    /// Narrowest affected scope; refreshed before `submit` returns
    pub refresh: Option<RefreshScope>,
    /// Wider scope refreshed in the background, fire-and-forget
    pub background: Option<RefreshScope>,
}

impl MutationSpec {
    /// Refresh one scope synchronously, nothing in the background
    pub fn narrow(scope: RefreshScope) -> Self {
        MutationSpec {
            refresh: Some(scope),
            background: None,
        }
    }

    /// Refresh one scope synchronously and another in the background
    pub fn narrow_with_background(scope: RefreshScope, background: RefreshScope) -> Self {
        MutationSpec {
            refresh: Some(scope),
            background: Some(background),
        }
    }
}

/// Executes mutations and their scoped follow-up refreshes
pub struct MutationCoordinator<P: FetchPlan> {
    loader: StagedLoader<P>,
}

impl<P: FetchPlan> MutationCoordinator<P> {
    pub fn new(loader: StagedLoader<P>) -> Self {
        MutationCoordinator { loader }
    }

    /// Execute one remote state-changing call
    ///
    /// `fut` is the raw backend call; it runs under the session's
    /// cancellation tree with its own deadline. On success the follow-up
    /// refreshes from `spec` run (narrow one awaited, background one
    /// spawned) before the outcome is returned.
    pub async fn submit<T, F>(
        &self,
        session: &SyncSession,
        operation: &str,
        timeout: std::time::Duration,
        spec: MutationSpec,
        fut: F,
    ) -> SyncResult<T>
    where
        F: Future<Output = SyncResult<T>> + Send,
    {
        let task = FetchTask::new(
            ResourceClass::Mutation,
            session.child_cancellation(),
            timeout,
        );
        let value = task.run(operation, fut).await?;

        if let Some(scope) = spec.refresh {
            self.loader
                .run_refresh(session, scope, RefreshKind::PostMutation)
                .await;
        }
        if let Some(scope) = spec.background {
            self.loader
                .spawn_refresh(session, scope, RefreshKind::Background);
        }

        Ok(value)
    }
}
