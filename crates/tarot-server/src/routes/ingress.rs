//! Ingress routes: `POST /push` and `POST /webhook/tarot-chat`.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use metrics::counter;
use serde::Serialize;
use tarot_core::IngressRequest;
use tarot_runtime::{Delivery, RelayHub};

use crate::errors::ApiError;
use crate::metrics::{
    INGRESS_ERRORS_TOTAL, INGRESS_TOTAL, MESSAGES_APPENDED_TOTAL, MESSAGES_MERGED_TOTAL,
    PUSH_DELIVERED_TOTAL, PUSH_DROPPED_TOTAL,
};
use crate::server::AppState;

/// Acknowledgment body for accepted ingress.
#[derive(Debug, Serialize)]
pub struct Ack {
    /// Always `true`.
    pub success: bool,
}

impl Ack {
    fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

/// Parse a raw body and hand it to the hub, recording outcome metrics.
pub(crate) fn ingest(hub: &RelayHub, body: &[u8]) -> Result<Delivery, ApiError> {
    let result = IngressRequest::from_slice(body).and_then(|request| hub.ingest(request));
    match result {
        Ok(delivery) => {
            let mode = hub.mode();
            counter!(INGRESS_TOTAL, "mode" => mode.as_str()).increment(1);
            if delivery.pushed {
                counter!(PUSH_DELIVERED_TOTAL).increment(1);
            }
            if delivery.dropped {
                counter!(PUSH_DROPPED_TOTAL).increment(1);
            }
            match &delivery.stored {
                Some(outcome) if outcome.is_merged() => counter!(MESSAGES_MERGED_TOTAL).increment(1),
                Some(_) => counter!(MESSAGES_APPENDED_TOTAL).increment(1),
                None => {}
            }
            Ok(delivery)
        }
        Err(err) => {
            counter!(INGRESS_ERRORS_TOTAL, "code" => err.code()).increment(1);
            Err(err.into())
        }
    }
}

/// POST /push
pub async fn push(State(state): State<AppState>, body: Bytes) -> Result<Json<Ack>, ApiError> {
    let _ = ingest(&state.hub, &body)?;
    Ok(Ack::ok())
}

/// POST /webhook/tarot-chat
///
/// Forwards to the workflow engine when one is configured, otherwise
/// ingests locally like `/push`.
pub async fn tarot_chat(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let Some(proxy) = state.proxy.as_ref() else {
        let _ = ingest(&state.hub, &body)?;
        return Ok(Ack::ok().into_response());
    };

    let upstream = proxy.forward(body).await?;
    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = (status, upstream.body).into_response();
    let headers = response.headers_mut();
    let _ = headers.remove(header::CONTENT_TYPE);
    if let Some(value) = upstream
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
    {
        let _ = headers.insert(header::CONTENT_TYPE, value);
    }
    Ok(response)
}
