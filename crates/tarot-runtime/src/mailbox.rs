//! Bounded per-session message store with fragment merging.

use std::collections::VecDeque;

use dashmap::DashMap;
use tarot_core::{Fragment, Message, RelayError, Result};
use tracing::{debug, trace};

/// Default number of messages retained per session.
pub const DEFAULT_CAPACITY: usize = 100;

/// What happened when a fragment was appended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The fragment filled gaps in the latest message.
    Merged(Message),
    /// The fragment became a new message.
    Appended {
        /// The new message.
        message: Message,
        /// Oldest messages dropped to stay within capacity.
        evicted: usize,
    },
}

impl AppendOutcome {
    /// The resulting message (merged or new).
    pub fn message(&self) -> &Message {
        match self {
            Self::Merged(message) | Self::Appended { message, .. } => message,
        }
    }

    /// Whether the fragment was merged into an existing message.
    pub fn is_merged(&self) -> bool {
        matches!(self, Self::Merged(_))
    }
}

/// Per-session ordered message history, oldest first.
///
/// Each session keeps at most `capacity` messages. Appends to one session
/// are serialized by the shard lock, so a merge can never race an append.
#[derive(Debug)]
pub struct Mailbox {
    sessions: DashMap<String, VecDeque<Message>>,
    capacity: usize,
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Mailbox {
    /// Create a mailbox keeping up to `capacity` messages per session.
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Store a fragment for `session_id`.
    ///
    /// If the latest message lacks every field the fragment supplies, the
    /// fragment fills those fields in place. Otherwise it becomes a new
    /// message and the oldest entries are evicted past capacity. Populated
    /// fields are never overwritten.
    pub fn append(&self, session_id: &str, fragment: Fragment) -> Result<AppendOutcome> {
        if fragment.is_empty() {
            return Err(RelayError::EmptyFragment);
        }

        let mut entry = self.sessions.entry(session_id.to_string()).or_default();
        let queue = entry.value_mut();

        if let Some(latest) = queue.back_mut() {
            if latest.can_absorb(&fragment) {
                latest.absorb(fragment);
                trace!(session_id, message_id = %latest.id, "fragment merged");
                return Ok(AppendOutcome::Merged(latest.clone()));
            }
        }

        let message = Message::from_fragment(fragment);
        queue.push_back(message.clone());

        let mut evicted = 0;
        while queue.len() > self.capacity {
            let _ = queue.pop_front();
            evicted += 1;
        }
        if evicted > 0 {
            debug!(session_id, evicted, "mailbox at capacity, oldest evicted");
        }
        trace!(session_id, message_id = %message.id, len = queue.len(), "message appended");

        Ok(AppendOutcome::Appended { message, evicted })
    }

    /// Snapshot of the session's messages, oldest first. Empty if unknown.
    pub fn list(&self, session_id: &str) -> Vec<Message> {
        self.sessions
            .get(session_id)
            .map(|queue| queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of messages held for `session_id`.
    pub fn len(&self, session_id: &str) -> usize {
        self.sessions.get(session_id).map_or(0, |queue| queue.len())
    }

    /// Number of sessions with at least one message.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Messages held across all sessions.
    pub fn message_count(&self) -> usize {
        self.sessions.iter().map(|entry| entry.value().len()).sum()
    }

    /// Per-session limit.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
