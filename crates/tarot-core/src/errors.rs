//! Relay error kinds.
//!
//! Every error is request-scoped: it is surfaced once to the caller and
//! dropped. None of them is retried server-side.

// ── Error code constants ────────────────────────────────────────────

/// No session id in the request.
pub const MISSING_SESSION_ID: &str = "MISSING_SESSION_ID";
/// Neither `text` nor `spread_html` supplied.
pub const EMPTY_FRAGMENT: &str = "EMPTY_FRAGMENT";
/// Push-only delivery found no live channel for the session.
pub const NO_ACTIVE_CLIENT: &str = "NO_ACTIVE_CLIENT";
/// The workflow engine was unreachable or the request to it failed.
pub const UPSTREAM_PROXY_FAILURE: &str = "UPSTREAM_PROXY_FAILURE";
/// The request body was not valid JSON.
pub const MALFORMED_REQUEST_BODY: &str = "MALFORMED_REQUEST_BODY";
/// Unexpected internal error.
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

/// Errors produced while relaying a fragment or serving a delivery request.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The request carried no usable session id.
    #[error("sessionId is required")]
    MissingSessionId,

    /// The fragment had neither text nor a spread.
    #[error("text or spread_html is required")]
    EmptyFragment,

    /// No live channel is registered for the session.
    #[error("No active client")]
    NoActiveClient {
        /// Session that had no subscriber.
        session_id: String,
    },

    /// Forwarding to the workflow engine failed.
    #[error("Proxy error: {message}")]
    UpstreamProxyFailure {
        /// Transport-level description.
        message: String,
    },

    /// The body could not be parsed as JSON.
    #[error("Invalid JSON: {message}")]
    MalformedRequestBody {
        /// Parser message.
        message: String,
    },

    /// Anything else.
    #[error("{message}")]
    Internal {
        /// Description (never shown to clients).
        message: String,
    },
}

impl RelayError {
    /// Machine-readable error code for this variant.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingSessionId => MISSING_SESSION_ID,
            Self::EmptyFragment => EMPTY_FRAGMENT,
            Self::NoActiveClient { .. } => NO_ACTIVE_CLIENT,
            Self::UpstreamProxyFailure { .. } => UPSTREAM_PROXY_FAILURE,
            Self::MalformedRequestBody { .. } => MALFORMED_REQUEST_BODY,
            Self::Internal { .. } => INTERNAL_ERROR,
        }
    }

    /// Message safe to return to a client.
    ///
    /// Internal errors are collapsed to a generic string so that file paths
    /// and other details stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            Self::Internal { .. } => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedRequestBody {
            message: err.to_string(),
        }
    }
}

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(RelayError::MissingSessionId.code(), "MISSING_SESSION_ID");
        assert_eq!(RelayError::EmptyFragment.code(), "EMPTY_FRAGMENT");
        assert_eq!(
            RelayError::NoActiveClient {
                session_id: "s".into()
            }
            .code(),
            "NO_ACTIVE_CLIENT"
        );
        assert_eq!(
            RelayError::UpstreamProxyFailure {
                message: "refused".into()
            }
            .code(),
            "UPSTREAM_PROXY_FAILURE"
        );
        assert_eq!(
            RelayError::MalformedRequestBody {
                message: "eof".into()
            }
            .code(),
            "MALFORMED_REQUEST_BODY"
        );
        assert_eq!(
            RelayError::Internal {
                message: "x".into()
            }
            .code(),
            "INTERNAL_ERROR"
        );
    }

    #[test]
    fn no_active_client_display() {
        let err = RelayError::NoActiveClient {
            session_id: "abc".into(),
        };
        assert_eq!(err.to_string(), "No active client");
    }

    #[test]
    fn proxy_failure_display_includes_cause() {
        let err = RelayError::UpstreamProxyFailure {
            message: "connection refused".into(),
        };
        assert_eq!(err.to_string(), "Proxy error: connection refused");
    }

    #[test]
    fn internal_error_is_sanitized() {
        let err = RelayError::Internal {
            message: "failed at /home/user/.tarot/settings.json".into(),
        };
        let msg = err.client_message();
        assert_eq!(msg, "Internal server error");
        assert!(!msg.contains("/home"));
    }

    #[test]
    fn client_errors_keep_message() {
        assert_eq!(
            RelayError::MissingSessionId.client_message(),
            "sessionId is required"
        );
    }

    #[test]
    fn json_error_converts_to_malformed_body() {
        let json_err = serde_json::from_str::<serde_json::Value>("{bad").unwrap_err();
        let err: RelayError = json_err.into();
        assert!(matches!(err, RelayError::MalformedRequestBody { .. }));
        assert!(err.to_string().starts_with("Invalid JSON"));
    }
}
