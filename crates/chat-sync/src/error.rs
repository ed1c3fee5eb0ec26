//! Error types for the chat sync core.

use thiserror::Error;

/// Result type for chat sync operations.
pub type Result<T> = std::result::Result<T, ChatError>;

/// Errors that can occur in the sync core.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ChatError {
    /// Transport failure: connection refused, DNS, timeout, broken body.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status other than 401.
    #[error("HTTP error! status: {status}")]
    Http { status: u16 },

    /// A 401 on an authenticated request. The session has already been
    /// cleared and the login-required signal emitted when this is returned.
    #[error("Unauthorized")]
    Unauthorized,

    /// The credential exchange was rejected.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// An operation that needs a token was called without one.
    #[error("Authentication required to {0}")]
    Unauthenticated(&'static str),

    /// Malformed inbound push frame.
    #[error("Frame parse error: {0}")]
    Parse(String),

    /// Rejected before any request was issued.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for ChatError {
    fn from(err: std::io::Error) -> Self {
        ChatError::Storage(err.to_string())
    }
}

impl ChatError {
    /// Whether the error is the global 401 signal.
    #[inline]
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ChatError::Unauthorized)
    }

    /// Whether the error should be shown next to the login form.
    #[inline]
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ChatError::Auth(_) | ChatError::Unauthenticated(_))
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ChatError::Http { status } => Some(*status),
            ChatError::Unauthorized => Some(401),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_is_distinct_from_http() {
        assert!(ChatError::Unauthorized.is_unauthorized());
        assert!(!ChatError::Http { status: 500 }.is_unauthorized());
        assert_eq!(ChatError::Unauthorized.status(), Some(401));
    }

    #[test]
    fn test_http_display_matches_status() {
        let err = ChatError::Http { status: 503 };
        assert_eq!(err.to_string(), "HTTP error! status: 503");
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn test_auth_failures() {
        assert!(ChatError::Auth("bad password".into()).is_auth_failure());
        assert!(ChatError::Unauthenticated("fetch user profile").is_auth_failure());
        assert!(!ChatError::Validation("empty".into()).is_auth_failure());
    }
}
