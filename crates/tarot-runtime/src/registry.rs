//! Connection registry: at most one live channel per session.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use crate::channel::LiveChannel;

/// Maps session ids to their current live channel.
///
/// Registration is a single atomic insert, so two near-simultaneous connects
/// for the same session cannot both end up registered: the later insert wins
/// and the earlier channel is closed.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    channels: DashMap<String, Arc<LiveChannel>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `channel` the live channel for `session_id`.
    ///
    /// A superseded channel is closed and returned.
    pub fn register(&self, session_id: &str, channel: Arc<LiveChannel>) -> Option<Arc<LiveChannel>> {
        let channel_id = channel.id.clone();
        let previous = self.channels.insert(session_id.to_string(), channel)?;
        if previous.id == channel_id {
            return None;
        }
        previous.close();
        info!(
            session_id,
            channel_id,
            superseded = %previous.id,
            "live channel superseded"
        );
        Some(previous)
    }

    /// Remove whatever channel is registered for `session_id`.
    pub fn unregister(&self, session_id: &str) -> Option<Arc<LiveChannel>> {
        let removed = self.channels.remove(session_id).map(|(_, c)| c);
        if let Some(ref chan) = removed {
            debug!(session_id, channel_id = %chan.id, "live channel unregistered");
        }
        removed
    }

    /// Remove the channel for `session_id` only if it is `channel_id`.
    ///
    /// Used on disconnect, so a superseded stream ending late cannot remove
    /// its replacement.
    pub fn unregister_channel(&self, session_id: &str, channel_id: &str) -> bool {
        let removed = self
            .channels
            .remove_if(session_id, |_, c| c.id == channel_id)
            .is_some();
        if removed {
            debug!(session_id, channel_id, "live channel unregistered");
        }
        removed
    }

    /// Current channel for `session_id`.
    pub fn get(&self, session_id: &str) -> Option<Arc<LiveChannel>> {
        self.channels.get(session_id).map(|c| Arc::clone(c.value()))
    }

    /// Whether `session_id` has a live channel.
    pub fn has(&self, session_id: &str) -> bool {
        self.channels.contains_key(session_id)
    }

    /// Number of registered channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether no channels are registered.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Close and remove every channel.
    pub fn close_all(&self) {
        for entry in &self.channels {
            entry.value().close();
        }
        self.channels.clear();
    }
}
