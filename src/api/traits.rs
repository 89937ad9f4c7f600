//! Backend client traits — the sole API boundary between the engine and the
//! remote wallet/fraud-review service
//!
//! The engine core never constructs an HTTP request; it calls these traits
//! and lets the implementation worry about transport. Every method takes the
//! bearer credential explicitly because the token belongs to the session, not
//! to the client: the same backend instance serves every session a screen
//! ever binds.
//!
//! Cancellation and deadlines are applied by the caller (the fetch-task
//! layer), so implementations only need to map transport failures onto
//! [`SyncError`](crate::types::SyncError).

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{
    BearerToken, FraudRule, MutationOutcome, PendingReview, RuleUpdate, SyncResult, ToggleStatus,
    TransferRecord, UserRecord,
};

/// A transfer to submit on behalf of the signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub recipient_email: String,
    pub amount: Decimal,
}

/// Operations backing the wallet screen
#[async_trait]
pub trait WalletApi: Send + Sync + 'static {
    /// Current numeric balance of the signed-in user
    async fn balance(&self, auth: &BearerToken) -> SyncResult<Decimal>;

    /// Transfer history of the signed-in user
    async fn transactions(&self, auth: &BearerToken) -> SyncResult<Vec<TransferRecord>>;

    /// Create a transfer; may come back flagged for review instead of
    /// completing immediately
    async fn submit_transfer(
        &self,
        auth: &BearerToken,
        request: &TransferRequest,
    ) -> SyncResult<MutationOutcome>;
}

/// Operations backing the admin review screen
#[async_trait]
pub trait AdminApi: Send + Sync + 'static {
    /// Queue of flagged transactions with their violation reasons
    async fn pending_reviews(&self, auth: &BearerToken) -> SyncResult<Vec<PendingReview>>;

    /// Fraud-rule definitions with per-type configuration
    async fn rules(&self, auth: &BearerToken) -> SyncResult<Vec<FraudRule>>;

    /// On/off status of the background enforcement process
    async fn toggle_status(&self, auth: &BearerToken) -> SyncResult<ToggleStatus>;

    /// Full user listing
    async fn users(&self, auth: &BearerToken) -> SyncResult<Vec<UserRecord>>;

    /// Full transaction listing across all users
    async fn all_transactions(&self, auth: &BearerToken) -> SyncResult<Vec<TransferRecord>>;

    /// Resolve one pending item
    async fn review(
        &self,
        auth: &BearerToken,
        transaction_id: &str,
        approve: bool,
    ) -> SyncResult<()>;

    /// Change a rule's enabled flag or its typed configuration
    async fn update_rule(&self, auth: &BearerToken, update: &RuleUpdate) -> SyncResult<()>;

    /// Start the background enforcement process
    async fn start_toggle(&self, auth: &BearerToken) -> SyncResult<()>;

    /// Stop the background enforcement process
    async fn stop_toggle(&self, auth: &BearerToken) -> SyncResult<()>;
}
