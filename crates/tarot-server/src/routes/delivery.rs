//! Delivery routes: mailbox polling and the per-session event stream.

use std::convert::Infallible;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use metrics::{counter, gauge, histogram};
use serde::{Deserialize, Serialize};
use tarot_core::ingress::normalize_session_id;
use tarot_core::message::CONNECTED_SENTINEL;
use tarot_core::{Message, RelayError};
use tarot_runtime::{LiveChannel, RelayHub, Subscription};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::errors::ApiError;
use crate::metrics::{
    SSE_CONNECTION_DURATION_SECONDS, SSE_CONNECTIONS_ACTIVE, SSE_CONNECTIONS_TOTAL,
    SSE_DISCONNECTIONS_TOTAL,
};
use crate::server::AppState;

/// Mailbox snapshot body.
#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    /// Stored messages, oldest first.
    pub messages: Vec<Message>,
    /// Echoed session id (query form only).
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Query string of `GET /messages`.
#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

/// GET /messages/{session_id}
pub async fn messages_by_path(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let session_id = normalize_session_id(&raw).ok_or(RelayError::MissingSessionId)?;
    Ok(Json(MessagesResponse {
        messages: state.hub.messages(&session_id),
        session_id: None,
    }))
}

/// GET /messages?sessionId=
pub async fn messages_by_query(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let session_id = query
        .session_id
        .as_deref()
        .and_then(normalize_session_id)
        .ok_or_else(|| ApiError::BadRequest("Missing sessionId".into()))?;
    Ok(Json(MessagesResponse {
        messages: state.hub.messages(&session_id),
        session_id: Some(session_id),
    }))
}

/// GET /events/{session_id}
///
/// Registers a live channel and streams its frames. The first event is the
/// connected sentinel. Unavailable in poll mode, where no frame is ever
/// pushed.
pub async fn events(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = normalize_session_id(&raw).ok_or(RelayError::MissingSessionId)?;
    if !state.hub.mode().pushes() {
        return Err(ApiError::NotFound("Event stream disabled in poll mode".into()));
    }
    let subscription = state.hub.subscribe(&session_id);

    counter!(SSE_CONNECTIONS_TOTAL).increment(1);
    gauge!(SSE_CONNECTIONS_ACTIVE).increment(1.0);
    info!(
        session_id,
        channel_id = %subscription.channel.id,
        superseded = subscription.superseded.is_some(),
        "event stream opened"
    );

    let stream = event_stream(
        Arc::clone(&state.hub),
        session_id,
        subscription,
        state.shutdown.token(),
    );
    let sse = Sse::new(stream).keep_alive(KeepAlive::new().interval(state.heartbeat));
    Ok(([(header::CACHE_CONTROL, "no-cache")], sse))
}

fn event_stream(
    hub: Arc<RelayHub>,
    session_id: String,
    subscription: Subscription,
    shutdown: CancellationToken,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let Subscription {
        channel,
        mut frames,
        ..
    } = subscription;
    let closed = channel.close_token();
    let guard = StreamGuard {
        hub,
        session_id,
        channel,
        reason: "client",
    };

    async_stream::stream! {
        // Own the whole guard so it lives exactly as long as the stream.
        let mut guard = guard;
        yield Ok(Event::default().data(CONNECTED_SENTINEL));
        loop {
            let next = tokio::select! {
                frame = frames.recv() => frame.ok_or("closed"),
                () = closed.cancelled() => Err("superseded"),
                () = shutdown.cancelled() => Err("shutdown"),
            };
            match next {
                Ok(frame) => yield Ok(Event::default().data(frame.as_str())),
                Err(reason) => {
                    guard.reason = reason;
                    break;
                }
            }
        }
    }
}

/// Unregisters the channel when its stream ends or the client goes away.
struct StreamGuard {
    hub: Arc<RelayHub>,
    session_id: String,
    channel: Arc<LiveChannel>,
    reason: &'static str,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        let removed = self.hub.unsubscribe(&self.session_id, &self.channel.id);
        self.channel.close();

        let age = self.channel.age();
        counter!(SSE_DISCONNECTIONS_TOTAL, "reason" => self.reason).increment(1);
        gauge!(SSE_CONNECTIONS_ACTIVE).decrement(1.0);
        histogram!(SSE_CONNECTION_DURATION_SECONDS).record(age.as_secs_f64());
        info!(
            session_id = %self.session_id,
            channel_id = %self.channel.id,
            reason = self.reason,
            removed,
            delivered = self.channel.delivered_count(),
            dropped = self.channel.drop_count(),
            duration_ms = u64::try_from(age.as_millis()).unwrap_or(u64::MAX),
            "event stream closed"
        );
    }
}
