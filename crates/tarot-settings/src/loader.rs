//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`TarotSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. Validate
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tarot_core::DeliveryMode;
use tracing::debug;

use crate::errors::Result;
use crate::types::TarotSettings;

/// Resolve the default settings file path (`~/.tarot/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".tarot").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<TarotSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults (plus env overrides). If the
/// file contains invalid JSON, or the result fails validation, returns an
/// error.
pub fn load_settings_from_path(path: &Path) -> Result<TarotSettings> {
    let mut settings = read_file_layer(path)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Defaults deep-merged with the settings file, without env overrides.
pub fn read_file_layer(path: &Path) -> Result<TarotSettings> {
    let defaults = serde_json::to_value(TarotSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply overrides from the process environment.
pub fn apply_env_overrides(settings: &mut TarotSettings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides using `lookup` to read variables.
///
/// Each variable has strict parsing rules:
/// - Integers must be valid and within the specified range
/// - Booleans accept: `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`
/// - Invalid values are logged and ignored (fall back to file/default)
/// - Empty strings are ignored
///
/// `PORT` is honored because hosting platforms assign it; `TAROT_PORT` wins
/// when both are set.
pub fn apply_overrides_from<F>(settings: &mut TarotSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = env.string("TAROT_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = env
        .u64_range("TAROT_PORT", 0, 65_535)
        .or_else(|| env.u64_range("PORT", 0, 65_535))
    {
        settings.server.port = u16::try_from(v).unwrap_or(settings.server.port);
    }
    if let Some(v) = env.u64_range("TAROT_HEARTBEAT_SECS", 1, 3_600) {
        settings.server.heartbeat_interval_secs = v;
    }
    if let Some(v) = env.usize_range("TAROT_MAX_BODY_BYTES", 1024, 1_073_741_824) {
        settings.server.max_body_bytes = v;
    }
    if let Some(v) = env.string("TAROT_STATIC_DIR") {
        settings.server.static_dir = Some(v);
    }

    // ── Relay ───────────────────────────────────────────────────────
    if let Some(v) = env.string("TAROT_DELIVERY_MODE") {
        match v.parse::<DeliveryMode>() {
            Ok(mode) => settings.relay.delivery_mode = mode,
            Err(e) => tracing::warn!(key = "TAROT_DELIVERY_MODE", error = %e, "ignoring"),
        }
    }
    if let Some(v) = env.usize_range("TAROT_MAILBOX_CAPACITY", 1, 100_000) {
        settings.relay.mailbox_capacity = v;
    }
    if let Some(v) = env.usize_range("TAROT_CHANNEL_BUFFER", 1, 65_536) {
        settings.relay.channel_buffer = v;
    }

    // ── Workflow ────────────────────────────────────────────────────
    if let Some(v) = env.string("TAROT_WORKFLOW_URL") {
        settings.workflow.url = Some(v);
    }
    if let Some(v) = env.u64_range("TAROT_WORKFLOW_TIMEOUT_MS", 100, 600_000) {
        settings.workflow.timeout_ms = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = env.string("TAROT_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = env.bool("TAROT_LOG_JSON") {
        settings.logging.json = v;
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within an inclusive range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within an inclusive range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env readers ─────────────────────────────────────────────────────────────

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        let val = self.string(name)?;
        let result = parse_bool(&val);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
        }
        result
    }

    fn u64_range(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = self.string(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
        }
        result
    }

    fn usize_range(&self, name: &str, min: usize, max: usize) -> Option<usize> {
        let val = self.string(name)?;
        let result = parse_usize_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid usize env var, ignoring");
        }
        result
    }
}
