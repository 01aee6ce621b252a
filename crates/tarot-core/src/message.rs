//! Fragments, mailbox messages, and push frames.

use serde::{Deserialize, Serialize};

/// Opaque per-reading identifier generated by the browser.
pub type SessionId = String;

/// A partial result from the workflow engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// Chat reply text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Rendered card layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread_html: Option<String>,
}

impl Fragment {
    /// Fragment with text only.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            spread_html: None,
        }
    }

    /// Fragment with a spread only.
    pub fn spread(spread_html: impl Into<String>) -> Self {
        Self {
            text: None,
            spread_html: Some(spread_html.into()),
        }
    }

    /// Whether neither field is populated.
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.spread_html.is_none()
    }
}

/// A delivered chat entry held in a session mailbox.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique within the session; clients deduplicate on it.
    pub id: String,
    /// Chat reply text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Rendered card layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread_html: Option<String>,
    /// Creation (or last merge) time in Unix milliseconds.
    pub timestamp: i64,
}

impl Message {
    /// Create a message from a fragment with a fresh id and the current time.
    pub fn from_fragment(fragment: Fragment) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            text: fragment.text,
            spread_html: fragment.spread_html,
            timestamp: now_millis(),
        }
    }

    /// Whether `fragment` only fills fields this message is missing.
    ///
    /// An empty fragment never merges.
    pub fn can_absorb(&self, fragment: &Fragment) -> bool {
        if fragment.is_empty() {
            return false;
        }
        let text_free = fragment.text.is_none() || self.text.is_none();
        let spread_free = fragment.spread_html.is_none() || self.spread_html.is_none();
        text_free && spread_free
    }

    /// Fill missing fields from `fragment` and refresh the timestamp.
    ///
    /// Fields already set are left untouched.
    pub fn absorb(&mut self, fragment: Fragment) {
        if self.text.is_none() {
            self.text = fragment.text;
        }
        if self.spread_html.is_none() {
            self.spread_html = fragment.spread_html;
        }
        self.timestamp = now_millis().max(self.timestamp);
    }
}

/// A frame written to a live push channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushFrame {
    /// Target session.
    #[serde(rename = "sessionId")]
    pub session_id: SessionId,
    /// Chat reply text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Rendered card layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread_html: Option<String>,
}

impl PushFrame {
    /// Build the frame for a fragment addressed to `session_id`.
    pub fn new(session_id: &str, fragment: &Fragment) -> Self {
        Self {
            session_id: session_id.to_string(),
            text: fragment.text.clone(),
            spread_html: fragment.spread_html.clone(),
        }
    }
}

/// Sentinel payload sent when a push stream opens.
pub const CONNECTED_SENTINEL: &str = r#"{"status":"connected"}"#;

/// Current Unix time in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
