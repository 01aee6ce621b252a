//! Prometheus metrics recorder and metric names.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the handle used to render `/metrics`. Fails if a recorder is
/// already installed.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Ingress requests accepted (counter, labels: mode).
pub const INGRESS_TOTAL: &str = "relay_ingress_total";
/// Ingress requests rejected (counter, labels: code).
pub const INGRESS_ERRORS_TOTAL: &str = "relay_ingress_errors_total";
/// Frames queued on a live channel (counter).
pub const PUSH_DELIVERED_TOTAL: &str = "relay_push_delivered_total";
/// Frames a registered live channel could not accept (counter).
pub const PUSH_DROPPED_TOTAL: &str = "relay_push_dropped_total";
/// Fragments merged into the latest message (counter).
pub const MESSAGES_MERGED_TOTAL: &str = "relay_messages_merged_total";
/// Fragments stored as new messages (counter).
pub const MESSAGES_APPENDED_TOTAL: &str = "relay_messages_appended_total";
/// Event streams opened (counter).
pub const SSE_CONNECTIONS_TOTAL: &str = "relay_sse_connections_total";
/// Event streams closed (counter, labels: reason).
pub const SSE_DISCONNECTIONS_TOTAL: &str = "relay_sse_disconnections_total";
/// Open event streams (gauge).
pub const SSE_CONNECTIONS_ACTIVE: &str = "relay_sse_connections_active";
/// Event stream lifetime seconds (histogram).
pub const SSE_CONNECTION_DURATION_SECONDS: &str = "relay_sse_connection_duration_seconds";
/// Requests forwarded to the workflow engine (counter, labels: status).
pub const PROXY_REQUESTS_TOTAL: &str = "relay_proxy_requests_total";
/// Forwarding failures (counter).
pub const PROXY_FAILURES_TOTAL: &str = "relay_proxy_failures_total";
