//! Core data types for the wallet sync engine

pub mod auth;
pub mod error;
pub mod records;
pub mod state;

pub use auth::BearerToken;
pub use error::{SyncError, SyncResult};
pub use records::{
    normalize_transfers, with_transaction_counts, FraudRule, MutationOutcome, PendingReview,
    ReviewStatus, RuleUpdate, ToggleStatus, TransferRecord, TransferStatus, UserRecord,
};
pub use state::{SharedState, StateSnapshot, StatusFlags};
