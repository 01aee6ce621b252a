//! `/health` endpoint.

use std::time::Instant;

use serde::Serialize;
use tarot_core::DeliveryMode;
use tarot_runtime::RelayHub;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server is running.
    pub status: &'static str,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Active delivery mode.
    pub delivery_mode: DeliveryMode,
    /// Registered live channels.
    pub connections: usize,
    /// Sessions holding a mailbox.
    pub active_sessions: usize,
    /// Messages stored across all mailboxes.
    pub stored_messages: usize,
    /// Per-session mailbox limit.
    pub mailbox_capacity: usize,
}

/// Snapshot the hub's counters.
pub fn health_check(start_time: Instant, hub: &RelayHub) -> HealthResponse {
    let mailbox = hub.mailbox();
    HealthResponse {
        status: "ok",
        uptime_secs: start_time.elapsed().as_secs(),
        delivery_mode: hub.mode(),
        connections: hub.registry().len(),
        active_sessions: mailbox.session_count(),
        stored_messages: mailbox.message_count(),
        mailbox_capacity: mailbox.capacity(),
    }
}
