//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tarot_core::RelayError;
use tracing::{debug, error};

/// Error returned by a route handler, rendered as `{"error": message}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A relay operation failed.
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// The request was unusable for a route-specific reason.
    #[error("{0}")]
    BadRequest(String),

    /// The route is not available in the current configuration.
    #[error("{0}")]
    NotFound(String),

    /// The request could not be processed; the message is shown as-is.
    #[error("{0}")]
    Failed(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Relay(err) => match err {
                RelayError::MissingSessionId
                | RelayError::EmptyFragment
                | RelayError::MalformedRequestBody { .. } => StatusCode::BAD_REQUEST,
                RelayError::NoActiveClient { .. } => StatusCode::NOT_FOUND,
                RelayError::UpstreamProxyFailure { .. } | RelayError::Internal { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable code for logs and metric labels.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Relay(err) => err.code(),
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Failed(_) => "FAILED",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Relay(err) => err.client_message(),
            Self::BadRequest(msg) | Self::NotFound(msg) | Self::Failed(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.code(), error = %self, "request failed");
        } else {
            debug!(code = self.code(), error = %self, "request rejected");
        }
        let body = Json(serde_json::json!({ "error": self.client_message() }));
        (status, body).into_response()
    }
}
