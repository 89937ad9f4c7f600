//! Staged loading and scoped refresh
//!
//! The loader orchestrates the two-stage population of a screen's shared
//! state: the **critical** group (the minimum data a usable screen needs)
//! settles first and resolves the loading indicator; the **secondary** group
//! follows in the background and can never re-raise it. Every later refresh —
//! poll tick, manual, post-mutation — re-issues exactly one named scope and
//! writes only the state fields that scope owns.
//!
//! Screens plug in via [`FetchPlan`]: the plan knows which remote calls make
//! up each scope and returns a merge closure; the loader owns admission,
//! cancellation, liveness gating, and the status flags.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::SyncConfig;
use crate::core::fetch_task::{FetchTask, ResourceClass};
use crate::core::poll::PollSchedule;
use crate::core::session::SyncSession;
use crate::core::single_flight::EntryMode;
use crate::types::{BearerToken, SharedState, SyncError, SyncResult};

/// Which fetch group a refresh re-issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshScope {
    /// The screen's full critical group
    Critical,
    /// The screen's full secondary group
    Secondary,
    /// The admin review queue only
    PendingQueue,
    /// Fraud-rule definitions only
    Rules,
    /// Enforcement-process status only
    Toggle,
    /// The all-transactions listing only
    AllTransactions,
}

/// What triggered a refresh
///
/// The trigger decides the single-flight class, the admission mode, and
/// whether the refreshing indicator is raised. Errors are absorbed on every
/// refresh path; only the initial load and mutations surface them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshKind {
    /// Background poll tick: skipped when the class is busy
    Poll,
    /// User-triggered refresh: cancels an in-flight poll of the same class
    Manual,
    /// Post-mutation refresh: forced, like a manual refresh, but silent
    PostMutation,
    /// Secondary-group load: non-forced and invisible to the indicators
    Background,
}

impl RefreshKind {
    fn admission(self) -> (ResourceClass, EntryMode) {
        match self {
            RefreshKind::Poll => (ResourceClass::Poll, EntryMode::SkipIfBusy),
            RefreshKind::Manual => (ResourceClass::Poll, EntryMode::Force),
            RefreshKind::PostMutation => (ResourceClass::Poll, EntryMode::Force),
            RefreshKind::Background => (ResourceClass::Secondary, EntryMode::SkipIfBusy),
        }
    }

    fn shows_refreshing(self) -> bool {
        matches!(self, RefreshKind::Poll | RefreshKind::Manual)
    }
}

/// How a refresh settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Fetched and merged
    Completed,
    /// Never dispatched: class busy or no live session
    Skipped,
    /// Superseded or torn down mid-flight
    Cancelled,
    /// Fetched, but the session died before the merge; nothing written
    Discarded,
    /// The fetch failed; prior state retained
    Failed(SyncError),
}

/// Everything a plan needs to execute one scope's remote calls
pub struct FetchContext<'a> {
    /// Credential of the owning session
    pub auth: &'a BearerToken,
    /// The task bounding every call in this group
    pub task: &'a FetchTask,
}

/// A deferred write into a screen's state, produced by a settled fetch
pub type StateMerge<S> = Box<dyn FnOnce(&mut S) + Send>;

/// Build a [`StateMerge`] from a closure
pub fn merge_fn<S>(f: impl FnOnce(&mut S) + Send + 'static) -> StateMerge<S> {
    Box::new(f)
}

/// A screen's fetch groups
///
/// Implementations perform the remote calls for a scope (each wrapped in
/// `ctx.task.run(...)`) and return a merge that writes only the fields that
/// scope owns — so a failed or skipped scope leaves unrelated fields exactly
/// as they were.
#[async_trait]
pub trait FetchPlan: Send + Sync + 'static {
    /// The screen's shared-state payload
    type State: Default + Clone + Send + 'static;

    /// Scope re-fetched by background poll ticks
    fn poll_scope(&self) -> RefreshScope;

    /// Scope fetched after the critical group settles, if the screen has one
    fn secondary_scope(&self) -> Option<RefreshScope> {
        None
    }

    /// Execute the remote calls for `scope`
    async fn fetch(
        &self,
        ctx: &FetchContext<'_>,
        scope: RefreshScope,
    ) -> SyncResult<StateMerge<Self::State>>;
}

/// Orchestrates staged loading for one screen
///
/// Cheap to clone; clones drive the same shared state.
pub struct StagedLoader<P: FetchPlan> {
    plan: Arc<P>,
    state: SharedState<P::State>,
    config: SyncConfig,
}

impl<P: FetchPlan> Clone for StagedLoader<P> {
    fn clone(&self) -> Self {
        StagedLoader {
            plan: Arc::clone(&self.plan),
            state: self.state.clone(),
            config: self.config.clone(),
        }
    }
}

impl<P: FetchPlan> StagedLoader<P> {
    pub fn new(plan: Arc<P>, state: SharedState<P::State>, config: SyncConfig) -> Self {
        StagedLoader {
            plan,
            state,
            config,
        }
    }

    /// The state this loader populates
    pub fn state(&self) -> &SharedState<P::State> {
        &self.state
    }

    /// Run the one-time initial load for a fresh session
    ///
    /// Invoked exactly once per session no matter how often it is called:
    /// the session's claim flag absorbs duplicate invocations from spurious
    /// re-activation.
    ///
    /// The critical fetch runs on a detached cancellation handle — nothing
    /// but its own deadline can kill it, because losing the only initial
    /// fetch would leave the screen permanently blank. Whether its *result*
    /// is still wanted is decided at merge time via the liveness flag.
    pub async fn run_initial(&self, session: &SyncSession) {
        if !session.try_claim_initial() {
            return;
        }
        self.state.set_loading(true);

        let task = FetchTask::detached(ResourceClass::Critical, self.config.request_timeout);
        // The slot is occupied so the class reads as busy, but the handle
        // registered there is not the task's: neither teardown's cancel-all
        // nor any forced entry can reach the initial fetch.
        let _permit = session.flights().try_enter(
            ResourceClass::Critical,
            EntryMode::SkipIfBusy,
            tokio_util::sync::CancellationToken::new(),
        );

        let ctx = FetchContext {
            auth: session.token(),
            task: &task,
        };
        let result = self.plan.fetch(&ctx, RefreshScope::Critical).await;

        // Settle: the loading indicator resolves and the poll loop arms
        // whether or not the fetch succeeded — a later tick can recover
        // from a failed first load.
        session.mark_initial_complete();

        match result {
            Ok(merge) => {
                if session.is_live() {
                    self.state.merge(merge);
                    self.state.set_error(None);
                }
                if let Some(scope) = self.plan.secondary_scope() {
                    self.spawn_refresh(session, scope, RefreshKind::Background);
                }
            }
            Err(error) => {
                if session.is_live() {
                    self.state.set_error(error.user_message());
                }
                tracing::debug!(%error, "initial critical load failed");
            }
        }

        if session.is_live() {
            self.state.set_loading(false);
            self.arm_poll(session);
        }
    }

    /// Re-issue one named fetch group
    ///
    /// Admission depends on `kind` (see [`RefreshKind`]); errors are absorbed
    /// here — prior state values stay in place and the worst case is that
    /// data silently does not refresh.
    pub async fn run_refresh(
        &self,
        session: &SyncSession,
        scope: RefreshScope,
        kind: RefreshKind,
    ) -> RefreshOutcome {
        // Refreshes only make sense once the initial load has settled; a
        // session torn down mid-flight is caught again at merge time.
        if !session.is_live() || !session.initial_load_complete() {
            return RefreshOutcome::Skipped;
        }

        let (class, mode) = kind.admission();
        let cancel = session.child_cancellation();
        let Some(_permit) = session.flights().try_enter(class, mode, cancel.clone()) else {
            tracing::debug!(?scope, ?class, "refresh skipped, class busy");
            return RefreshOutcome::Skipped;
        };

        if kind.shows_refreshing() {
            self.state.set_refreshing(true);
        }

        let task = FetchTask::new(class, cancel, self.config.request_timeout);
        let ctx = FetchContext {
            auth: session.token(),
            task: &task,
        };
        let result = self.plan.fetch(&ctx, scope).await;

        let outcome = match result {
            // Liveness is re-checked here, after the task resumed: a late
            // response for a torn-down session must not touch state.
            Ok(merge) => {
                if session.is_live() {
                    self.state.merge(merge);
                    if kind.shows_refreshing() {
                        self.state.set_error(None);
                    }
                    RefreshOutcome::Completed
                } else {
                    RefreshOutcome::Discarded
                }
            }
            Err(error) if error.is_cancelled() => {
                tracing::debug!(?scope, "refresh superseded");
                RefreshOutcome::Cancelled
            }
            Err(error) => {
                tracing::debug!(?scope, %error, "refresh failed, retaining prior state");
                RefreshOutcome::Failed(error)
            }
        };

        if kind.shows_refreshing() && session.is_live() {
            self.state.set_refreshing(false);
        }
        outcome
    }

    /// Fire a refresh without waiting for it
    pub fn spawn_refresh(&self, session: &SyncSession, scope: RefreshScope, kind: RefreshKind) {
        let loader = self.clone();
        let session = session.clone();
        tokio::spawn(async move {
            loader.run_refresh(&session, scope, kind).await;
        });
    }

    /// Arm the session's poll loop with this loader's poll scope
    fn arm_poll(&self, session: &SyncSession) {
        let schedule = PollSchedule::from(&self.config);
        let loader = self.clone();
        let tick_session = session.clone();
        session.poll().arm(session.cancel_root(), schedule, move || {
            let loader = loader.clone();
            let session = tick_session.clone();
            async move {
                let scope = loader.plan.poll_scope();
                loader.run_refresh(&session, scope, RefreshKind::Poll).await;
            }
        });
    }
}
