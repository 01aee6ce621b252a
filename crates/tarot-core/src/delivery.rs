//! Delivery mode selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How ingress fragments reach the browser.
///
/// A deployment picks one mode and keeps it; the browser shell must use the
/// matching delivery endpoint (polling or the event stream).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Mailbox only. Live channels are never written.
    Poll,
    /// Live channel only. Pushing to a session without one is an error.
    Push,
    /// Push when a live channel exists and always store in the mailbox.
    #[default]
    Hybrid,
}

impl DeliveryMode {
    /// Whether fragments are stored in the mailbox.
    pub fn stores(self) -> bool {
        matches!(self, Self::Poll | Self::Hybrid)
    }

    /// Whether fragments are written to live channels.
    pub fn pushes(self) -> bool {
        matches!(self, Self::Push | Self::Hybrid)
    }

    /// Whether a missing live channel fails the request.
    pub fn requires_subscriber(self) -> bool {
        self == Self::Push
    }

    /// Lowercase name as used in settings and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Poll => "poll",
            Self::Push => "push",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "poll" => Ok(Self::Poll),
            "push" => Ok(Self::Push),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(format!("unknown delivery mode '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_hybrid() {
        assert_eq!(DeliveryMode::default(), DeliveryMode::Hybrid);
    }

    #[test]
    fn capabilities() {
        assert!(DeliveryMode::Poll.stores());
        assert!(!DeliveryMode::Poll.pushes());
        assert!(!DeliveryMode::Push.stores());
        assert!(DeliveryMode::Push.pushes());
        assert!(DeliveryMode::Push.requires_subscriber());
        assert!(DeliveryMode::Hybrid.stores());
        assert!(DeliveryMode::Hybrid.pushes());
        assert!(!DeliveryMode::Hybrid.requires_subscriber());
    }

    #[test]
    fn parse_case_insensitive() {
        assert_eq!("PUSH".parse::<DeliveryMode>().unwrap(), DeliveryMode::Push);
        assert_eq!(" poll ".parse::<DeliveryMode>().unwrap(), DeliveryMode::Poll);
        assert!("stream".parse::<DeliveryMode>().is_err());
    }

    #[test]
    fn serde_lowercase() {
        let json = serde_json::to_string(&DeliveryMode::Hybrid).unwrap();
        assert_eq!(json, "\"hybrid\"");
        let back: DeliveryMode = serde_json::from_str("\"push\"").unwrap();
        assert_eq!(back, DeliveryMode::Push);
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(DeliveryMode::Poll.to_string(), "poll");
    }
}
