//! Wallet screen: balance, transfer history, submit-transfer
//!
//! The wallet's critical group is balance + transactions, fetched in
//! parallel; there is no secondary group. A submitted transfer triggers a
//! forced refresh of the same group so the new entry (possibly pending
//! review) appears immediately.

use std::sync::Arc;

use async_trait::async_trait;
use futures::join;
use rust_decimal::Decimal;

use crate::api::{TransferRequest, WalletApi};
use crate::config::SyncConfig;
use crate::core::engine::SyncEngine;
use crate::core::loader::{
    merge_fn, FetchContext, FetchPlan, RefreshOutcome, RefreshScope, StateMerge,
};
use crate::core::mutation::MutationSpec;
use crate::core::poll::PollPhase;
use crate::types::{
    normalize_transfers, BearerToken, MutationOutcome, StateSnapshot, SyncResult, TransferRecord,
};

/// View model of the wallet screen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletState {
    pub balance: Decimal,
    /// Newest first, statuses normalized
    pub transactions: Vec<TransferRecord>,
}

/// Fetch groups of the wallet screen
pub struct WalletPlan<A: WalletApi> {
    api: Arc<A>,
}

impl<A: WalletApi> WalletPlan<A> {
    pub fn new(api: Arc<A>) -> Self {
        WalletPlan { api }
    }
}

#[async_trait]
impl<A: WalletApi> FetchPlan for WalletPlan<A> {
    type State = WalletState;

    fn poll_scope(&self) -> RefreshScope {
        RefreshScope::Critical
    }

    async fn fetch(
        &self,
        ctx: &FetchContext<'_>,
        _scope: RefreshScope,
    ) -> SyncResult<StateMerge<WalletState>> {
        // The wallet has a single fetch group; every scope resolves to it.
        let (balance, transactions) = join!(
            ctx.task.run("get-balance", self.api.balance(ctx.auth)),
            ctx.task
                .run("get-transactions", self.api.transactions(ctx.auth)),
        );
        let balance = balance?;
        let transactions = normalize_transfers(transactions?);

        Ok(merge_fn(move |state: &mut WalletState| {
            state.balance = balance;
            state.transactions = transactions;
        }))
    }
}

/// Controller for the wallet screen
pub struct WalletScreen<A: WalletApi> {
    api: Arc<A>,
    engine: SyncEngine<WalletPlan<A>>,
}

impl<A: WalletApi> WalletScreen<A> {
    pub fn new(api: Arc<A>, config: SyncConfig) -> Self {
        let plan = Arc::new(WalletPlan::new(Arc::clone(&api)));
        WalletScreen {
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

    /// Manual refresh of balance + transactions
    pub async fn refresh(&self) -> RefreshOutcome {
        self.engine.manual_refresh(RefreshScope::Critical).await
    }

    /// Submit a transfer on behalf of the signed-in user
    ///
    /// On success the wallet group is re-fetched before this returns, so the
    /// caller's next snapshot already shows the transfer. The outcome says
    /// whether the transfer completed or was held for review.
    pub async fn transfer(&self, request: TransferRequest) -> SyncResult<MutationOutcome> {
        let api = Arc::clone(&self.api);
        self.engine
            .mutate(
                "submit-transfer",
                MutationSpec::narrow(RefreshScope::Critical),
                move |auth| async move { api.submit_transfer(&auth, &request).await },
            )
            .await
    }

    pub fn snapshot(&self) -> StateSnapshot<WalletState> {
        self.engine.snapshot()
    }

    pub fn poll_phase(&self) -> PollPhase {
        self.engine.poll_phase()
    }

    /// The underlying engine, for wiring and tests
    pub fn engine(&self) -> &SyncEngine<WalletPlan<A>> {
        &self.engine
    }
}
