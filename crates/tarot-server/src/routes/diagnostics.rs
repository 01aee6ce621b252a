//! Diagnostic and operational routes.

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use crate::errors::ApiError;
use crate::health::{self, HealthResponse};
use crate::server::AppState;

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(state.start_time, &state.hub))
}

/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.as_ref() {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// POST /webhook
///
/// Acknowledges any JSON body by echoing it back.
pub async fn webhook(body: Bytes) -> Result<Json<Value>, ApiError> {
    let data: Value =
        serde_json::from_slice(&body).map_err(|_| ApiError::BadRequest("Invalid request".into()))?;
    info!(bytes = body.len(), "webhook received");
    Ok(Json(json!({ "success": true, "data": data })))
}

/// POST /debug-webhook
///
/// Shows where a workflow placed the session id.
pub async fn debug_webhook(body: Bytes) -> Result<Json<Value>, ApiError> {
    let received: Value = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "debug webhook body unreadable");
        ApiError::Failed("Failed to process".into())
    })?;

    let mut extracted = Map::new();
    if let Some(id) = received.pointer("/body/sessionId") {
        let _ = extracted.insert("fromBodyBody".into(), id.clone());
    }
    if let Some(id) = received.get("sessionId") {
        let _ = extracted.insert("fromBody".into(), id.clone());
    }
    info!(
        body = %received,
        from_body_body = ?extracted.get("fromBodyBody"),
        from_body = ?extracted.get("fromBody"),
        "debug webhook"
    );

    Ok(Json(json!({ "received": received, "extracted": extracted })))
}
