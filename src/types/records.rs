//! Record types returned by the wallet/fraud-review backend
//!
//! These are the domain records the engine merges into shared state. They
//! deserialize directly from the backend's JSON payloads. Status is always an
//! explicit field on the record: the upstream convention of tagging a record
//! id with a `pending_` prefix is treated as incidental serialization and is
//! normalized away at the boundary by [`TransferRecord::normalized`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle status of a transfer record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    /// Flagged by a fraud rule, awaiting review
    Pending,
    /// Settled without review
    Completed,
    /// Reviewed and accepted
    Approved,
    /// Reviewed and declined
    Rejected,
}

/// A single transfer between two users
///
/// `status` may be absent on the wire for older records; call
/// [`normalized`](Self::normalized) after deserializing so downstream code
/// can rely on it being present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub from_user_email: Option<String>,
    #[serde(default)]
    pub to_user_email: Option<String>,
    #[serde(default)]
    pub status: Option<TransferStatus>,
}

impl TransferRecord {
    /// Fill in an explicit status when the server omitted one
    ///
    /// Records held for review arrive with a `pending_` id prefix instead of
    /// a status field. The prefix is not load-bearing anywhere else in the
    /// engine; it only seeds the explicit field here.
    pub fn normalized(mut self) -> Self {
        if self.status.is_none() {
            self.status = Some(if self.id.starts_with("pending_") {
                TransferStatus::Pending
            } else {
                TransferStatus::Completed
            });
        }
        self
    }

    /// Whether the transfer is still awaiting review
    pub fn is_pending(&self) -> bool {
        self.status == Some(TransferStatus::Pending)
    }
}

/// Normalize a freshly fetched transfer listing for display
///
/// Applies [`TransferRecord::normalized`] to every record and sorts newest
/// first, matching what every screen expects of `primaryList`.
pub fn normalize_transfers(transfers: Vec<TransferRecord>) -> Vec<TransferRecord> {
    let mut transfers: Vec<TransferRecord> = transfers
        .into_iter()
        .map(TransferRecord::normalized)
        .collect();
    transfers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    transfers
}

/// Review state of a flagged transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

/// A flagged transaction sitting in the admin review queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingReview {
    pub id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub amount: Decimal,
    pub status: ReviewStatus,
    /// Names of the fraud rules this transaction violated
    #[serde(default)]
    pub violations: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub from_user_email: Option<String>,
    #[serde(default)]
    pub to_user_email: Option<String>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reviewed_by: Option<String>,
}

/// A fraud-rule definition
///
/// The per-type configuration is opaque JSON evaluated server-side; the
/// client only round-trips it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudRule {
    pub rule_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub config: Value,
}

/// A registered user, as listed on the admin screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub balance: Option<Decimal>,
    /// Derived client-side from the all-transactions listing; never sent by
    /// the server.
    #[serde(default)]
    pub transaction_count: Option<usize>,
}

/// Annotate users with how many transfers each participated in
///
/// The backend does not provide this figure; the admin screen derives it
/// while merging the secondary (users + all-transactions) fetch group.
pub fn with_transaction_counts(
    users: Vec<UserRecord>,
    transfers: &[TransferRecord],
) -> Vec<UserRecord> {
    users
        .into_iter()
        .map(|mut user| {
            let count = transfers
                .iter()
                .filter(|tx| tx.from_user_id == user.id || tx.to_user_id == user.id)
                .count();
            user.transaction_count = Some(count);
            user
        })
        .collect()
}

/// On/off status of the background enforcement process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleStatus {
    pub status: String,
    pub running: bool,
}

impl Default for ToggleStatus {
    /// The fallback used when the status endpoint cannot be reached: the
    /// process is reported as stopped rather than surfacing an error.
    fn default() -> Self {
        ToggleStatus {
            status: "stopped".to_string(),
            running: false,
        }
    }
}

/// Result of a successfully executed mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The change took effect immediately
    Applied,
    /// The change was accepted but held for review (flagged transfers)
    PendingReview,
}

impl MutationOutcome {
    /// Build an outcome from the backend's `requires_approval` flag
    pub fn from_requires_approval(requires_approval: bool) -> Self {
        if requires_approval {
            MutationOutcome::PendingReview
        } else {
            MutationOutcome::Applied
        }
    }
}

/// Changes to apply to a fraud rule
///
/// Either field may be `None` to leave it untouched; toggling the enabled
/// flag is just an update with `config: None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleUpdate {
    pub rule_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

impl RuleUpdate {
    /// Update that only flips the enabled flag
    pub fn set_enabled(rule_id: &str, enabled: bool) -> Self {
        RuleUpdate {
            rule_id: rule_id.to_string(),
            enabled: Some(enabled),
            config: None,
        }
    }

    /// Update that replaces the typed configuration
    pub fn set_config(rule_id: &str, config: Value) -> Self {
        RuleUpdate {
            rule_id: rule_id.to_string(),
            enabled: None,
            config: Some(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use rust_decimal::Decimal;

    fn transfer(id: &str, ts: i64) -> TransferRecord {
        TransferRecord {
            id: id.to_string(),
            from_user_id: "u1".to_string(),
            to_user_id: "u2".to_string(),
            amount: Decimal::new(1000, 2),
            created_at: Utc.timestamp_opt(ts, 0).unwrap(),
            from_user_email: None,
            to_user_email: None,
            status: None,
        }
    }

    #[rstest]
    #[case::prefix_means_pending("pending_tx1", TransferStatus::Pending)]
    #[case::plain_id_means_completed("tx1", TransferStatus::Completed)]
    fn test_status_normalization(#[case] id: &str, #[case] expected: TransferStatus) {
        let normalized = transfer(id, 0).normalized();
        assert_eq!(normalized.status, Some(expected));
    }

    #[test]
    fn test_explicit_status_wins_over_prefix() {
        let mut tx = transfer("pending_tx1", 0);
        tx.status = Some(TransferStatus::Rejected);
        let normalized = tx.normalized();
        assert_eq!(normalized.status, Some(TransferStatus::Rejected));
    }

    #[test]
    fn test_normalize_transfers_sorts_newest_first() {
        let sorted = normalize_transfers(vec![
            transfer("a", 100),
            transfer("b", 300),
            transfer("c", 200),
        ]);
        let ids: Vec<&str> = sorted.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert!(sorted.iter().all(|t| t.status.is_some()));
    }

    #[test]
    fn test_transaction_counts() {
        let users = vec![
            UserRecord {
                id: "u1".to_string(),
                email: "a@example.com".to_string(),
                full_name: None,
                created_at: Utc.timestamp_opt(0, 0).unwrap(),
                balance: None,
                transaction_count: None,
            },
            UserRecord {
                id: "u3".to_string(),
                email: "b@example.com".to_string(),
                full_name: None,
                created_at: Utc.timestamp_opt(0, 0).unwrap(),
                balance: None,
                transaction_count: None,
            },
        ];
        let transfers = vec![transfer("a", 1), transfer("b", 2)];

        let counted = with_transaction_counts(users, &transfers);
        assert_eq!(counted[0].transaction_count, Some(2));
        assert_eq!(counted[1].transaction_count, Some(0));
    }

    #[test]
    fn test_toggle_status_defaults_to_stopped() {
        let status = ToggleStatus::default();
        assert_eq!(status.status, "stopped");
        assert!(!status.running);
    }

    #[rstest]
    #[case::flagged(true, MutationOutcome::PendingReview)]
    #[case::immediate(false, MutationOutcome::Applied)]
    fn test_mutation_outcome(#[case] requires_approval: bool, #[case] expected: MutationOutcome) {
        assert_eq!(
            MutationOutcome::from_requires_approval(requires_approval),
            expected
        );
    }

    #[test]
    fn test_rule_update_serialization_skips_untouched_fields() {
        let update = RuleUpdate::set_enabled("velocity", false);
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "rule_id": "velocity", "enabled": false })
        );
    }

    #[test]
    fn test_transfer_record_deserializes_without_status() {
        let json = serde_json::json!({
            "id": "pending_42",
            "from_user_id": "u1",
            "to_user_id": "u2",
            "amount": "12.50",
            "created_at": "2025-06-01T12:00:00Z"
        });
        let tx: TransferRecord = serde_json::from_value(json).unwrap();
        assert_eq!(tx.status, None);
        assert!(tx.normalized().is_pending());
    }
}
