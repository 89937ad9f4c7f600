//! Admin screen: review queue, fraud rules, enforcement toggle, listings
//!
//! The admin's critical group is pending reviews + rules + toggle status —
//! the data the reviewer needs immediately. Users and the all-transactions
//! listing are the secondary group: they load in the background after the
//! critical group settles and their failures are invisible beyond stale
//! data. Background polling re-fetches only the pending queue.
//!
//! The toggle-status endpoint is best-effort: a failed status fetch reports
//! the enforcement process as stopped instead of failing the critical group.

use std::sync::Arc;

use async_trait::async_trait;
use futures::join;

use crate::api::AdminApi;
use crate::config::SyncConfig;
use crate::core::engine::SyncEngine;
use crate::core::loader::{
    merge_fn, FetchContext, FetchPlan, RefreshOutcome, RefreshScope, StateMerge,
};
use crate::core::mutation::MutationSpec;
use crate::core::poll::PollPhase;
use crate::types::{
    normalize_transfers, with_transaction_counts, BearerToken, FraudRule, MutationOutcome,
    PendingReview, RuleUpdate, StateSnapshot, SyncResult, ToggleStatus, TransferRecord, UserRecord,
};

/// View model of the admin screen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminState {
    /// Flagged transactions awaiting review
    pub pending: Vec<PendingReview>,
    pub rules: Vec<FraudRule>,
    pub toggle: ToggleStatus,
    /// Secondary: annotated with per-user transaction counts
    pub users: Vec<UserRecord>,
    /// Secondary: newest first, statuses normalized
    pub all_transactions: Vec<TransferRecord>,
}

/// Fetch groups of the admin screen
pub struct AdminPlan<A: AdminApi> {
    api: Arc<A>,
}

impl<A: AdminApi> AdminPlan<A> {
    pub fn new(api: Arc<A>) -> Self {
        AdminPlan { api }
    }

    /// Status fetch with the stopped fallback applied
    async fn toggle_or_stopped(&self, ctx: &FetchContext<'_>) -> ToggleStatus {
        ctx.task
            .run("get-toggle-status", self.api.toggle_status(ctx.auth))
            .await
            .unwrap_or_default()
    }
}

#[async_trait]
impl<A: AdminApi> FetchPlan for AdminPlan<A> {
    type State = AdminState;

    fn poll_scope(&self) -> RefreshScope {
        RefreshScope::PendingQueue
    }

    fn secondary_scope(&self) -> Option<RefreshScope> {
        Some(RefreshScope::Secondary)
    }

    async fn fetch(
        &self,
        ctx: &FetchContext<'_>,
        scope: RefreshScope,
    ) -> SyncResult<StateMerge<AdminState>> {
        match scope {
            RefreshScope::Critical => {
                let (pending, rules, toggle) = join!(
                    ctx.task
                        .run("get-pending-reviews", self.api.pending_reviews(ctx.auth)),
                    ctx.task.run("get-rules", self.api.rules(ctx.auth)),
                    self.toggle_or_stopped(ctx),
                );
                let pending = pending?;
                let rules = rules?;

                Ok(merge_fn(move |state: &mut AdminState| {
                    state.pending = pending;
                    state.rules = rules;
                    state.toggle = toggle;
                }))
            }
            RefreshScope::Secondary => {
                let (users, transactions) = join!(
                    ctx.task.run("get-users", self.api.users(ctx.auth)),
                    ctx.task
                        .run("get-all-transactions", self.api.all_transactions(ctx.auth)),
                );

                // Partial success still merges: whichever listing arrived
                // replaces its field, the other keeps its prior value.
                if let (Err(error), Err(_)) = (&users, &transactions) {
                    return Err(error.clone());
                }
                Ok(merge_fn(move |state: &mut AdminState| {
                    if let Ok(transactions) = transactions {
                        state.all_transactions = normalize_transfers(transactions);
                    }
                    if let Ok(users) = users {
                        state.users = with_transaction_counts(users, &state.all_transactions);
                    }
                }))
            }
            RefreshScope::PendingQueue => {
                let pending = ctx
                    .task
                    .run("get-pending-reviews", self.api.pending_reviews(ctx.auth))
                    .await?;
                Ok(merge_fn(move |state: &mut AdminState| state.pending = pending))
            }
            RefreshScope::Rules => {
                let rules = ctx.task.run("get-rules", self.api.rules(ctx.auth)).await?;
                Ok(merge_fn(move |state: &mut AdminState| state.rules = rules))
            }
            RefreshScope::Toggle => {
                let toggle = self.toggle_or_stopped(ctx).await;
                Ok(merge_fn(move |state: &mut AdminState| state.toggle = toggle))
            }
            RefreshScope::AllTransactions => {
                let transactions = ctx
                    .task
                    .run("get-all-transactions", self.api.all_transactions(ctx.auth))
                    .await?;
                Ok(merge_fn(move |state: &mut AdminState| {
                    state.all_transactions = normalize_transfers(transactions)
                }))
            }
        }
    }
}

/// Controller for the admin review screen
pub struct AdminScreen<A: AdminApi> {
    api: Arc<A>,
    engine: SyncEngine<AdminPlan<A>>,
}

impl<A: AdminApi> AdminScreen<A> {
    pub fn new(api: Arc<A>, config: SyncConfig) -> Self {
        let plan = Arc::new(AdminPlan::new(Arc::clone(&api)));
        AdminScreen {
            api,
            engine: SyncEngine::new(plan, config),
        }
    }

    /// React to the current identity token; see [`SyncEngine::activate`]
    pub fn activate(&self, token: Option<&BearerToken>) {
        self.engine.activate(token);
    }

    pub fn deactivate(&self) {
        self.engine.deactivate();
    }

    /// Manual refresh of the full critical group
    pub async fn refresh(&self) -> RefreshOutcome {
        self.engine.manual_refresh(RefreshScope::Critical).await
    }

    /// Resolve one pending item
    ///
    /// The pending queue is re-fetched before this returns — the reviewed
    /// item disappears from the next snapshot — while the all-transactions
    /// listing catches up in the background without blocking anything.
    pub async fn review(&self, transaction_id: &str, approve: bool) -> SyncResult<MutationOutcome> {
        let api = Arc::clone(&self.api);
        let transaction_id = transaction_id.to_string();
        self.engine
            .mutate(
                "approve-or-reject",
                MutationSpec::narrow_with_background(
                    RefreshScope::PendingQueue,
                    RefreshScope::AllTransactions,
                ),
                move |auth| async move {
                    api.review(&auth, &transaction_id, approve).await?;
                    Ok(MutationOutcome::Applied)
                },
            )
            .await
    }

    /// Change a rule's enabled flag or typed configuration
    pub async fn update_rule(&self, update: RuleUpdate) -> SyncResult<MutationOutcome> {
        let api = Arc::clone(&self.api);
        self.engine
            .mutate(
                "update-rule",
                MutationSpec::narrow(RefreshScope::Rules),
                move |auth| async move {
                    api.update_rule(&auth, &update).await?;
                    Ok(MutationOutcome::Applied)
                },
            )
            .await
    }

    /// Toggle a rule on or off
    pub async fn set_rule_enabled(
        &self,
        rule_id: &str,
        enabled: bool,
    ) -> SyncResult<MutationOutcome> {
        self.update_rule(RuleUpdate::set_enabled(rule_id, enabled))
            .await
    }

    /// Start the background enforcement process
    pub async fn start_enforcement(&self) -> SyncResult<MutationOutcome> {
        let api = Arc::clone(&self.api);
        self.engine
            .mutate(
                "start-toggle",
                MutationSpec::narrow(RefreshScope::Toggle),
                move |auth| async move {
                    api.start_toggle(&auth).await?;
                    Ok(MutationOutcome::Applied)
                },
            )
            .await
    }

    /// Stop the background enforcement process
    pub async fn stop_enforcement(&self) -> SyncResult<MutationOutcome> {
        let api = Arc::clone(&self.api);
        self.engine
            .mutate(
                "stop-toggle",
                MutationSpec::narrow(RefreshScope::Toggle),
                move |auth| async move {
                    api.stop_toggle(&auth).await?;
                    Ok(MutationOutcome::Applied)
                },
            )
            .await
    }

    pub fn snapshot(&self) -> StateSnapshot<AdminState> {
        self.engine.snapshot()
    }

    pub fn poll_phase(&self) -> PollPhase {
        self.engine.poll_phase()
    }

    /// The underlying engine, for wiring and tests
    pub fn engine(&self) -> &SyncEngine<AdminPlan<A>> {
        &self.engine
    }
}
