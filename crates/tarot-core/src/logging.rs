//! `tracing` subscriber setup.
//!
//! Context (session id, channel id) travels as structured fields on events
//! and spans rather than being baked into message strings.

use tracing_subscriber::EnvFilter;

/// Build the filter: `RUST_LOG` wins, otherwise `level`.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize the global tracing subscriber writing to stderr.
///
/// Call once at application startup. Subsequent calls are no-ops.
///
/// * `level` - Minimum level when `RUST_LOG` is unset (e.g. `"info"`).
/// * `json` - Emit newline-delimited JSON instead of compact text.
pub fn init_subscriber(level: &str, json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_target(true)
        .with_writer(std::io::stderr);

    // set_global_default is a no-op if already set
    if json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.compact().try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_subscriber_does_not_panic() {
        // Multiple calls should be safe (no-op after first)
        init_subscriber("warn", false);
        init_subscriber("debug", true);
    }

    #[test]
    fn env_filter_accepts_directives() {
        let filter = env_filter("tarot_server=debug,info");
        assert!(!filter.to_string().is_empty());
    }
}
