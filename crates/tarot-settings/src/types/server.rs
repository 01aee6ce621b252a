//! Server and logging settings.

use serde::{Deserialize, Serialize};

/// HTTP listener settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Listen port (`0` for auto-assign).
    pub port: u16,
    /// Interval between SSE keep-alive comments.
    pub heartbeat_interval_secs: u64,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
    /// Directory of pre-built client shell assets to serve, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            heartbeat_interval_secs: 15,
            max_body_bytes: 2 * 1024 * 1024,
            static_dir: None,
        }
    }
}

/// Logging settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_defaults() {
        let s = ServerSettings::default();
        assert_eq!(s.host, "0.0.0.0");
        assert_eq!(s.port, 3000);
        assert_eq!(s.heartbeat_interval_secs, 15);
        assert_eq!(s.max_body_bytes, 2 * 1024 * 1024);
        assert!(s.static_dir.is_none());
    }

    #[test]
    fn static_dir_omitted_when_none() {
        let json = serde_json::to_value(ServerSettings::default()).unwrap();
        assert!(json.get("staticDir").is_none());
    }

    #[test]
    fn partial_server_json() {
        let s: ServerSettings = serde_json::from_str(r#"{"port": 8080, "staticDir": "public"}"#).unwrap();
        assert_eq!(s.port, 8080);
        assert_eq!(s.host, "0.0.0.0");
        assert_eq!(s.static_dir.as_deref(), Some("public"));
    }

    #[test]
    fn logging_defaults() {
        let l = LoggingSettings::default();
        assert_eq!(l.level, "info");
        assert!(!l.json);
    }
}
