//! Route handlers.

pub mod delivery;
pub mod diagnostics;
pub mod ingress;

use axum::Router;
use axum::routing::{get, post};

use crate::server::AppState;

/// Relay routes, mounted at the root and again under `/api`.
pub fn relay_routes() -> Router<AppState> {
    Router::new()
        .route("/push", post(ingress::push))
        .route("/webhook", post(diagnostics::webhook))
        .route("/webhook/tarot-chat", post(ingress::tarot_chat))
        .route("/debug-webhook", post(diagnostics::debug_webhook))
        .route("/messages", get(delivery::messages_by_query))
        .route("/messages/{session_id}", get(delivery::messages_by_path))
        .route("/events/{session_id}", get(delivery::events))
}
