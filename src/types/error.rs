//! Error types for the wallet sync engine
//!
//! This module defines the error taxonomy for everything that can go wrong at
//! the remote boundary. The taxonomy is deliberately small: the engine only
//! distinguishes outcomes that change its behavior.
//!
//! # Error Categories
//!
//! - **Cancelled**: the task was deliberately superseded or its session was
//!   torn down. Always swallowed silently, never shown to a user.
//! - **Timeout**: the per-request deadline elapsed. Surfaced on critical and
//!   mutation paths, absorbed on poll/secondary paths.
//! - **TransportUnreachable**: no response was received at all.
//! - **RemoteRejected**: a non-2xx response with an optional structured reason.

use thiserror::Error;

/// Result alias used throughout the engine.
pub type SyncResult<T> = Result<T, SyncError>;

/// Main error type for the wallet sync engine
///
/// Each variant carries the logical operation name (e.g. `"get-balance"`,
/// `"submit-transfer"`) so that swallowed errors still produce a useful
/// debug-log line and surfaced errors can fall back to a per-operation
/// message when the server did not provide one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The task was deliberately cancelled
    ///
    /// Raised when a forced entry supersedes an in-flight request or when the
    /// owning session is torn down. Never surfaced to a user and never
    /// logged outside debug level.
    #[error("request cancelled")]
    Cancelled,

    /// The request deadline elapsed before a response arrived
    ///
    /// Distinct from explicit cancellation: a timeout on a critical or
    /// mutation path is user-visible, a cancellation never is.
    #[error("{operation} timed out")]
    Timeout {
        /// Logical operation that timed out
        operation: String,
    },

    /// No response was received from the server
    ///
    /// Connection refused, DNS failure, connection reset before any status
    /// line — anything where the server never answered.
    #[error("{operation} failed: server unreachable ({message})")]
    TransportUnreachable {
        /// Logical operation that failed
        operation: String,
        /// Transport-level description of the failure
        message: String,
    },

    /// The server answered with a non-2xx status
    ///
    /// `detail` carries the server-provided reason (the `detail` field of the
    /// JSON error body) when one was present.
    #[error("{operation} rejected with HTTP {status}{}", detail.as_ref().map(|d| format!(": {}", d)).unwrap_or_default())]
    RemoteRejected {
        /// Logical operation that was rejected
        operation: String,
        /// HTTP status code
        status: u16,
        /// Server-provided reason, used verbatim when present
        detail: Option<String>,
    },
}

impl SyncError {
    /// Create a Timeout error
    pub fn timeout(operation: &str) -> Self {
        SyncError::Timeout {
            operation: operation.to_string(),
        }
    }

    /// Create a TransportUnreachable error
    pub fn unreachable(operation: &str, message: impl Into<String>) -> Self {
        SyncError::TransportUnreachable {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    /// Create a RemoteRejected error
    pub fn rejected(operation: &str, status: u16, detail: Option<String>) -> Self {
        SyncError::RemoteRejected {
            operation: operation.to_string(),
            status,
            detail,
        }
    }

    /// Whether this error is a deliberate cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SyncError::Cancelled)
    }

    /// Whether this error is a deadline expiry
    pub fn is_timeout(&self) -> bool {
        matches!(self, SyncError::Timeout { .. })
    }

    /// The message shown in a screen's error slot, if any
    ///
    /// Cancellations return `None`: a superseded request is not an error the
    /// user should ever see. Rejections use the server-provided detail
    /// verbatim when present, otherwise a generic per-operation fallback.
    pub fn user_message(&self) -> Option<String> {
        match self {
            SyncError::Cancelled => None,
            SyncError::Timeout { .. } => Some(
                "Request timed out. Please check your connection and try again.".to_string(),
            ),
            SyncError::TransportUnreachable { .. } => Some(
                "Unable to connect to server. Please check if the backend is running.".to_string(),
            ),
            SyncError::RemoteRejected {
                operation,
                status,
                detail,
            } => Some(
                detail
                    .clone()
                    .unwrap_or_else(|| format!("{} failed ({})", operation, status)),
            ),
        }
    }
}
