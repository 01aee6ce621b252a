//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]`, so a settings
//! file may contain any subset of fields; missing ones get their default.

mod relay;
mod server;

pub use relay::*;
pub use server::*;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
///
/// ```json
/// {
///   "server": { "port": 8080 },
///   "relay": { "deliveryMode": "push" },
///   "workflow": { "url": "https://n8n.example.com/webhook/tarot-chat" }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TarotSettings {
    /// HTTP listener settings.
    pub server: ServerSettings,
    /// Mailbox and live channel settings.
    pub relay: RelaySettings,
    /// Upstream workflow engine settings.
    pub workflow: WorkflowSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
}

impl TarotSettings {
    /// Reject values that would make the relay unusable.
    pub fn validate(&self) -> Result<()> {
        if self.relay.mailbox_capacity == 0 {
            return Err(SettingsError::InvalidValue(
                "relay.mailboxCapacity must be at least 1".into(),
            ));
        }
        if self.relay.channel_buffer == 0 {
            return Err(SettingsError::InvalidValue(
                "relay.channelBuffer must be at least 1".into(),
            ));
        }
        if self.server.heartbeat_interval_secs == 0 {
            return Err(SettingsError::InvalidValue(
                "server.heartbeatIntervalSecs must be at least 1".into(),
            ));
        }
        if let Some(url) = &self.workflow.url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(SettingsError::InvalidValue(format!(
                    "workflow.url must be an http(s) URL, got '{url}'"
                )));
            }
        }
        Ok(())
    }
}
