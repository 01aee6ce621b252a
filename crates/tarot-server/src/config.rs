//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tarot_runtime::RelayConfig;
use tarot_settings::TarotSettings;

/// Configuration for the relay server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// SSE keep-alive interval in seconds.
    pub heartbeat_interval_secs: u64,
    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,
    /// Static client shell served as the fallback route.
    pub static_dir: Option<PathBuf>,
    /// Upstream workflow URL for `POST /webhook/tarot-chat`.
    pub workflow_url: Option<String>,
    /// Upstream request timeout in milliseconds.
    pub workflow_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            heartbeat_interval_secs: 15,
            max_body_bytes: 2 * 1024 * 1024,
            static_dir: None,
            workflow_url: None,
            workflow_timeout_ms: 30_000,
        }
    }
}

impl ServerConfig {
    /// Server section of loaded settings.
    pub fn from_settings(settings: &TarotSettings) -> Self {
        Self {
            host: settings.server.host.clone(),
            port: settings.server.port,
            heartbeat_interval_secs: settings.server.heartbeat_interval_secs,
            max_body_bytes: settings.server.max_body_bytes,
            static_dir: settings.server.static_dir.as_ref().map(PathBuf::from),
            workflow_url: settings.workflow.url.clone(),
            workflow_timeout_ms: settings.workflow.timeout_ms,
        }
    }

    /// Keep-alive interval.
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs.max(1))
    }

    /// Upstream request timeout.
    pub fn workflow_timeout(&self) -> Duration {
        Duration::from_millis(self.workflow_timeout_ms)
    }
}

/// Relay section of loaded settings.
pub fn relay_config(settings: &TarotSettings) -> RelayConfig {
    RelayConfig {
        mode: settings.relay.delivery_mode,
        mailbox_capacity: settings.relay.mailbox_capacity,
        channel_buffer: settings.relay.channel_buffer,
    }
}
