//! reqwest implementation of the backend traits
//!
//! One `HttpBackend` serves both screens. Every request carries the bearer
//! header and a transport-level timeout; the engine's fetch-task layer
//! applies its own (identical) deadline on top so that a deadline expiry is
//! reported uniformly as [`SyncError::Timeout`] whether the clock ran out in
//! the socket or in the task.
//!
//! Error bodies are expected to be JSON objects with a `detail` field; the
//! detail string is propagated verbatim into
//! [`SyncError::RemoteRejected`] when present.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::api::traits::{AdminApi, TransferRequest, WalletApi};
use crate::types::{
    BearerToken, FraudRule, MutationOutcome, PendingReview, RuleUpdate, SyncError, SyncResult,
    ToggleStatus, TransferRecord, UserRecord,
};

/// HTTP client for the wallet/fraud-review backend
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Build a backend client for the given base URL
    ///
    /// `request_timeout` should match the engine's configured deadline; it is
    /// the transport-level bound on every call issued through this client.
    pub fn new(base_url: &str, request_timeout: Duration) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| SyncError::unreachable("client-init", e.to_string()))?;

        Ok(HttpBackend {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a reqwest failure onto the engine taxonomy
    fn classify(operation: &str, error: reqwest::Error) -> SyncError {
        if error.is_timeout() {
            SyncError::timeout(operation)
        } else {
            SyncError::unreachable(operation, error.to_string())
        }
    }

    /// Turn a non-2xx response into a RemoteRejected error
    ///
    /// Reads the body looking for `{"detail": "..."}`; a missing or
    /// unparseable body degrades to a detail-less rejection.
    async fn reject(operation: &str, response: reqwest::Response) -> SyncError {
        let status = response.status().as_u16();
        let detail = response
            .json::<DetailEnvelope>()
            .await
            .ok()
            .and_then(|body| body.detail);
        SyncError::rejected(operation, status, detail)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        auth: &BearerToken,
    ) -> SyncResult<T> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(auth.as_str())
            .send()
            .await
            .map_err(|e| Self::classify(operation, e))?;

        if !response.status().is_success() {
            return Err(Self::reject(operation, response).await);
        }

        let status = response.status().as_u16();
        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                SyncError::timeout(operation)
            } else {
                SyncError::rejected(operation, status, Some("malformed response body".to_string()))
            }
        })
    }

    async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        operation: &str,
        path: &str,
        auth: &BearerToken,
        body: &B,
    ) -> SyncResult<T> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(auth.as_str())
            .json(body)
            .send()
            .await
            .map_err(|e| Self::classify(operation, e))?;

        if !response.status().is_success() {
            return Err(Self::reject(operation, response).await);
        }

        let status = response.status().as_u16();
        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                SyncError::timeout(operation)
            } else {
                SyncError::rejected(operation, status, Some("malformed response body".to_string()))
            }
        })
    }
}

// Response envelopes — the backend wraps every listing in a named field.

#[derive(Deserialize)]
struct DetailEnvelope {
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Deserialize)]
struct BalanceEnvelope {
    #[serde(default)]
    balance: Decimal,
}

#[derive(Deserialize)]
struct TransactionsEnvelope {
    #[serde(default)]
    transactions: Vec<TransferRecord>,
}

#[derive(Deserialize)]
struct PendingEnvelope {
    #[serde(default)]
    pending_transactions: Vec<PendingReview>,
}

#[derive(Deserialize)]
struct RulesEnvelope {
    #[serde(default)]
    rules: Vec<FraudRule>,
}

#[derive(Deserialize)]
struct UsersEnvelope {
    #[serde(default)]
    users: Vec<UserRecord>,
}

#[derive(Deserialize)]
struct TransferReceipt {
    #[serde(default)]
    requires_approval: bool,
}

#[derive(Serialize)]
struct ReviewBody<'a> {
    transaction_id: &'a str,
    approve: bool,
}

// Acknowledgement bodies vary across mutation endpoints; none carry data the
// engine needs.
#[derive(Deserialize)]
struct Ack {}

#[async_trait]
impl WalletApi for HttpBackend {
    async fn balance(&self, auth: &BearerToken) -> SyncResult<Decimal> {
        let envelope: BalanceEnvelope = self.get_json("get-balance", "/api/balance", auth).await?;
        Ok(envelope.balance)
    }

    async fn transactions(&self, auth: &BearerToken) -> SyncResult<Vec<TransferRecord>> {
        let envelope: TransactionsEnvelope = self
            .get_json("get-transactions", "/api/transactions", auth)
            .await?;
        Ok(envelope.transactions)
    }

    async fn submit_transfer(
        &self,
        auth: &BearerToken,
        request: &TransferRequest,
    ) -> SyncResult<MutationOutcome> {
        let receipt: TransferReceipt = self
            .post_json("submit-transfer", "/api/transfer", auth, request)
            .await?;
        Ok(MutationOutcome::from_requires_approval(
            receipt.requires_approval,
        ))
    }
}

#[async_trait]
impl AdminApi for HttpBackend {
    async fn pending_reviews(&self, auth: &BearerToken) -> SyncResult<Vec<PendingReview>> {
        let envelope: PendingEnvelope = self
            .get_json(
                "get-pending-reviews",
                "/api/admin/pending-transactions",
                auth,
            )
            .await?;
        Ok(envelope.pending_transactions)
    }

    async fn rules(&self, auth: &BearerToken) -> SyncResult<Vec<FraudRule>> {
        let envelope: RulesEnvelope = self.get_json("get-rules", "/api/admin/rules", auth).await?;
        Ok(envelope.rules)
    }

    async fn toggle_status(&self, auth: &BearerToken) -> SyncResult<ToggleStatus> {
        self.get_json(
            "get-toggle-status",
            "/api/admin/action-blocker/status",
            auth,
        )
        .await
    }

    async fn users(&self, auth: &BearerToken) -> SyncResult<Vec<UserRecord>> {
        let envelope: UsersEnvelope = self.get_json("get-users", "/api/admin/users", auth).await?;
        Ok(envelope.users)
    }

    async fn all_transactions(&self, auth: &BearerToken) -> SyncResult<Vec<TransferRecord>> {
        let envelope: TransactionsEnvelope = self
            .get_json("get-all-transactions", "/api/admin/transactions", auth)
            .await?;
        Ok(envelope.transactions)
    }

    async fn review(
        &self,
        auth: &BearerToken,
        transaction_id: &str,
        approve: bool,
    ) -> SyncResult<()> {
        let body = ReviewBody {
            transaction_id,
            approve,
        };
        let _: Ack = self
            .post_json(
                "approve-or-reject",
                "/api/admin/approve-transaction",
                auth,
                &body,
            )
            .await?;
        Ok(())
    }

    async fn update_rule(&self, auth: &BearerToken, update: &RuleUpdate) -> SyncResult<()> {
        let _: Ack = self
            .post_json("update-rule", "/api/admin/rules/update", auth, update)
            .await?;
        Ok(())
    }

    async fn start_toggle(&self, auth: &BearerToken) -> SyncResult<()> {
        let _: Ack = self
            .post_json(
                "start-toggle",
                "/api/admin/action-blocker/start",
                auth,
                &serde_json::json!({}),
            )
            .await?;
        Ok(())
    }

    async fn stop_toggle(&self, auth: &BearerToken) -> SyncResult<()> {
        let _: Ack = self
            .post_json(
                "stop-toggle",
                "/api/admin/action-blocker/stop",
                auth,
                &serde_json::json!({}),
            )
            .await?;
        Ok(())
    }
}
