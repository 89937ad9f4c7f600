//! Sync-engine orchestration for one screen
//!
//! `SyncEngine` wires the components together: the session binding decides
//! *whether* work runs, the staged loader decides *what* runs and how results
//! land, the mutation coordinator handles one-shot writes. Screens wrap an
//! engine and add their domain methods on top.
//!
//! All identity handling funnels through [`activate`](SyncEngine::activate):
//! the host application calls it with whatever token it currently has —
//! every time its lifecycle feels like it, as often as it likes — and the
//! binding's idempotency turns that into exactly one initial load per real
//! identity change.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::SyncConfig;
use crate::core::loader::{FetchPlan, RefreshKind, RefreshOutcome, RefreshScope, StagedLoader};
use crate::core::mutation::{MutationCoordinator, MutationSpec};
use crate::core::poll::PollPhase;
use crate::core::session::{BindOutcome, SessionBinding, SyncSession};
use crate::types::{BearerToken, SharedState, StateSnapshot, SyncError, SyncResult};

/// One screen's sync engine
pub struct SyncEngine<P: FetchPlan> {
    config: SyncConfig,
    loader: StagedLoader<P>,
    mutations: MutationCoordinator<P>,
    binding: Mutex<SessionBinding>,
}

impl<P: FetchPlan> SyncEngine<P> {
    pub fn new(plan: Arc<P>, config: SyncConfig) -> Self {
        let state = SharedState::new();
        let loader = StagedLoader::new(plan, state, config.clone());
        let mutations = MutationCoordinator::new(loader.clone());
        SyncEngine {
            config,
            loader,
            mutations,
            binding: Mutex::new(SessionBinding::new()),
        }
    }

    /// React to the current identity token
    ///
    /// Equal token: no-op. Changed token: the old session's fetches and
    /// timers are cancelled, state is reset, and the initial load for the
    /// fresh session is spawned. `None` tears everything down.
    ///
    /// Must be called from within a tokio runtime.
    pub fn activate(&self, token: Option<&BearerToken>) {
        let outcome = self.lock_binding().bind(token);
        match outcome {
            BindOutcome::Unchanged(_) => {}
            BindOutcome::Rebound(session) => {
                self.loader.state().reset_for_session();
                let loader = self.loader.clone();
                tokio::spawn(async move {
                    loader.run_initial(&session).await;
                });
            }
            BindOutcome::Cleared => self.loader.state().clear(),
        }
    }

    /// Destroy the current session (screen deactivated)
    pub fn deactivate(&self) {
        self.lock_binding().unbind();
        self.loader.state().clear();
    }

    /// User-triggered refresh of one scope; cancels a colliding poll tick
    pub async fn manual_refresh(&self, scope: RefreshScope) -> RefreshOutcome {
        let Some(session) = self.session() else {
            return RefreshOutcome::Skipped;
        };
        self.loader
            .run_refresh(&session, scope, RefreshKind::Manual)
            .await
    }

    /// Execute a mutation against the bound session
    ///
    /// `call` receives the session's credential and returns the backend
    /// future. With no live session the mutation settles as `Cancelled`,
    /// the same silent outcome as any other work outliving its identity.
    pub async fn mutate<T, F, Fut>(
        &self,
        operation: &str,
        spec: MutationSpec,
        call: F,
    ) -> SyncResult<T>
    where
        F: FnOnce(BearerToken) -> Fut,
        Fut: Future<Output = SyncResult<T>> + Send,
    {
        let Some(session) = self.session() else {
            tracing::debug!(operation, "mutation dropped, no live session");
            return Err(SyncError::Cancelled);
        };
        let fut = call(session.token().clone());
        self.mutations
            .submit(&session, operation, self.config.request_timeout, spec, fut)
            .await
    }

    /// Copy out the current state and flags for rendering
    pub fn snapshot(&self) -> StateSnapshot<P::State> {
        self.loader.state().snapshot()
    }

    /// The live session, if any
    pub fn session(&self) -> Option<SyncSession> {
        self.lock_binding().current().cloned()
    }

    /// Phase of the bound session's poll loop (`Idle` when unbound)
    pub fn poll_phase(&self) -> PollPhase {
        self.session()
            .map(|s| s.poll().phase())
            .unwrap_or(PollPhase::Idle)
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The loader driving this engine's state
    pub fn loader(&self) -> &StagedLoader<P> {
        &self.loader
    }

    fn lock_binding(&self) -> std::sync::MutexGuard<'_, SessionBinding> {
        self.binding.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
