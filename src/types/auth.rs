//! Identity token handling
//!
//! The engine never creates or persists credentials; it only reads the token
//! the host application hands it and reacts to its changes. The newtype keeps
//! bearer material out of `Debug` output and log lines.

use std::fmt;

/// Opaque bearer credential identifying the authenticated context
///
/// Sessions are keyed by token equality: rebinding with an equal token is a
/// no-op, rebinding with a different one tears the session down.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw token string
    pub fn new(token: impl Into<String>) -> Self {
        BearerToken(token.into())
    }

    /// The raw token, for the Authorization header
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BearerToken {
    fn from(token: &str) -> Self {
        BearerToken::new(token)
    }
}

// Token material must never land in logs.
impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BearerToken(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_drives_session_identity() {
        assert_eq!(BearerToken::new("abc"), BearerToken::from("abc"));
        assert_ne!(BearerToken::new("abc"), BearerToken::new("def"));
    }

    #[test]
    fn test_debug_redacts_token_material() {
        let token = BearerToken::new("super-secret");
        let rendered = format!("{:?}", token);
        assert!(!rendered.contains("super-secret"));
        assert_eq!(rendered, "BearerToken(<redacted>)");
    }
}
