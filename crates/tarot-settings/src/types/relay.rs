//! Relay and workflow settings.

use serde::{Deserialize, Serialize};
use tarot_core::DeliveryMode;

/// Mailbox and live channel settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelaySettings {
    /// How fragments reach the browser.
    pub delivery_mode: DeliveryMode,
    /// Messages retained per session mailbox.
    pub mailbox_capacity: usize,
    /// Frames queued per live channel before sends are dropped.
    pub channel_buffer: usize,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            delivery_mode: DeliveryMode::Hybrid,
            mailbox_capacity: 100,
            channel_buffer: 64,
        }
    }
}

/// Upstream workflow engine settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkflowSettings {
    /// Where `POST /webhook/tarot-chat` forwards. Local ingest when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Upstream request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            url: None,
            timeout_ms: 30_000,
        }
    }
}
