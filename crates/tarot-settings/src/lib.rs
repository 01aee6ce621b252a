//! # tarot-settings
//!
//! Configuration management with layered sources for the tarot relay.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`TarotSettings::default()`]
//! 2. **Settings file**: `~/.tarot/settings.json` or an explicit path
//!    (deep-merged over defaults)
//! 3. **Environment variables**: `TAROT_*` overrides (highest priority)
//!
//! The binary applies command line flags on top of the loaded settings.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
