//! Relay hub: routes ingested fragments to live channels and mailboxes.

use std::sync::Arc;

use tarot_core::{
    DeliveryMode, Fragment, IngressRequest, Message, PushFrame, RelayError, Result,
};
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use crate::channel::LiveChannel;
use crate::mailbox::{AppendOutcome, DEFAULT_CAPACITY, Mailbox};
use crate::registry::ConnectionRegistry;

/// Hub construction parameters.
#[derive(Clone, Copy, Debug)]
pub struct RelayConfig {
    /// Delivery strategy.
    pub mode: DeliveryMode,
    /// Messages retained per session.
    pub mailbox_capacity: usize,
    /// Frames queued per live channel.
    pub channel_buffer: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            mode: DeliveryMode::Hybrid,
            mailbox_capacity: DEFAULT_CAPACITY,
            channel_buffer: 64,
        }
    }
}

/// Result of a successful ingest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    /// A frame was queued on the session's live channel.
    pub pushed: bool,
    /// A live channel was registered but the frame could not be written.
    pub dropped: bool,
    /// Mailbox outcome, when the mode stores.
    pub stored: Option<AppendOutcome>,
}

/// What happened to the live frame of one ingest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PushOutcome {
    Skipped,
    NoChannel,
    Delivered,
    Dropped,
}

/// A freshly registered live channel and its receiving end.
pub struct Subscription {
    /// The registered channel.
    pub channel: Arc<LiveChannel>,
    /// Frames pushed to the channel.
    pub frames: mpsc::Receiver<Arc<String>>,
    /// The channel this one replaced, already closed.
    pub superseded: Option<Arc<LiveChannel>>,
}

/// Shared relay state: one registry, one mailbox, one delivery mode.
#[derive(Debug)]
pub struct RelayHub {
    registry: ConnectionRegistry,
    mailbox: Mailbox,
    mode: DeliveryMode,
    channel_buffer: usize,
}

impl Default for RelayHub {
    fn default() -> Self {
        Self::new(RelayConfig::default())
    }
}

impl RelayHub {
    /// Create a hub.
    pub fn new(config: RelayConfig) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            mailbox: Mailbox::new(config.mailbox_capacity),
            mode: config.mode,
            channel_buffer: config.channel_buffer.max(1),
        }
    }

    /// Deliver one fragment.
    ///
    /// Pushes when the mode pushes and a channel is registered, stores when
    /// the mode stores. Push-only delivery without a working channel fails
    /// with [`RelayError::NoActiveClient`].
    #[instrument(skip_all, fields(session_id = %request.session_id, mode = %self.mode))]
    pub fn ingest(&self, request: IngressRequest) -> Result<Delivery> {
        let IngressRequest {
            session_id,
            fragment,
        } = request;
        if session_id.trim().is_empty() {
            return Err(RelayError::MissingSessionId);
        }
        if fragment.is_empty() {
            return Err(RelayError::EmptyFragment);
        }

        let outcome = if self.mode.pushes() {
            self.push(&session_id, &fragment)
        } else {
            PushOutcome::Skipped
        };
        let pushed = outcome == PushOutcome::Delivered;
        let dropped = outcome == PushOutcome::Dropped;

        if self.mode.requires_subscriber() && !pushed {
            return Err(RelayError::NoActiveClient { session_id });
        }

        let stored = if self.mode.stores() {
            Some(self.mailbox.append(&session_id, fragment)?)
        } else {
            None
        };

        debug!(
            pushed,
            dropped,
            merged = stored.as_ref().is_some_and(AppendOutcome::is_merged),
            "fragment ingested"
        );
        Ok(Delivery {
            pushed,
            dropped,
            stored,
        })
    }

    fn push(&self, session_id: &str, fragment: &Fragment) -> PushOutcome {
        let Some(channel) = self.registry.get(session_id) else {
            return PushOutcome::NoChannel;
        };
        if channel.send_frame(&PushFrame::new(session_id, fragment)) {
            return PushOutcome::Delivered;
        }
        if channel.is_closed() {
            let _ = self.registry.unregister_channel(session_id, &channel.id);
            debug!(session_id, channel_id = %channel.id, "dropped dead live channel");
        } else {
            warn!(
                session_id,
                channel_id = %channel.id,
                dropped = channel.drop_count(),
                "live channel queue full, frame dropped"
            );
        }
        PushOutcome::Dropped
    }

    /// Open and register a live channel for `session_id`, replacing any
    /// existing one.
    pub fn subscribe(&self, session_id: &str) -> Subscription {
        let (channel, frames) = LiveChannel::open(self.channel_buffer);
        let channel = Arc::new(channel);
        let superseded = self.registry.register(session_id, Arc::clone(&channel));
        debug!(session_id, channel_id = %channel.id, "live channel registered");
        Subscription {
            channel,
            frames,
            superseded,
        }
    }

    /// Remove `channel_id` from `session_id` if it is still the current one.
    pub fn unsubscribe(&self, session_id: &str, channel_id: &str) -> bool {
        self.registry.unregister_channel(session_id, channel_id)
    }

    /// Stored messages for `session_id`, oldest first.
    pub fn messages(&self, session_id: &str) -> Vec<Message> {
        self.mailbox.list(session_id)
    }

    /// Delivery mode.
    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    /// Live channel registry.
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Message store.
    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Close every live channel.
    pub fn shutdown(&self) {
        self.registry.close_all();
    }
}
