//! # tarot-agent
//!
//! Relay server binary: loads settings, starts the HTTP server, and waits
//! for ctrl-c.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tarot_core::DeliveryMode;
use tarot_server::config::relay_config;
use tarot_server::{ServerConfig, TarotServer};
use tarot_settings::TarotSettings;

/// Tarot reading relay server.
#[derive(Parser, Debug)]
#[command(name = "tarot-agent", about = "Tarot reading relay server", version)]
struct Cli {
    /// Settings file (default `~/.tarot/settings.json`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Host to bind.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,

    /// `poll`, `push`, or `hybrid`.
    #[arg(long)]
    delivery_mode: Option<DeliveryMode>,

    /// Forward `POST /webhook/tarot-chat` to this URL.
    #[arg(long)]
    workflow_url: Option<String>,

    /// Serve the client shell from this directory.
    #[arg(long)]
    static_dir: Option<String>,
}

impl Cli {
    /// Load the settings file and layer command line values on top.
    fn resolve_settings(&self) -> Result<TarotSettings> {
        let path = self.config.clone().unwrap_or_else(tarot_settings::settings_path);
        let mut settings = tarot_settings::load_settings_from_path(&path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;

        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(mode) = self.delivery_mode {
            settings.relay.delivery_mode = mode;
        }
        if let Some(url) = &self.workflow_url {
            settings.workflow.url = Some(url.clone());
        }
        if let Some(dir) = &self.static_dir {
            settings.server.static_dir = Some(dir.clone());
        }

        settings.validate().context("Invalid settings")?;
        Ok(settings)
    }
}

fn build_server(settings: &TarotSettings) -> Result<TarotServer> {
    TarotServer::new(ServerConfig::from_settings(settings), relay_config(settings))
        .context("Failed to build server")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let settings = args.resolve_settings()?;

    tarot_core::logging::init_subscriber(&settings.logging.level, settings.logging.json);

    let mut server = build_server(&settings)?;
    match tarot_server::metrics::install_recorder() {
        Ok(handle) => server = server.with_metrics(handle),
        Err(e) => tracing::warn!(error = %e, "metrics disabled"),
    }

    let addr = server.listen().await.context("Failed to bind server")?;
    tracing::info!(
        mode = %settings.relay.delivery_mode,
        "Tarot relay listening on http://{addr}"
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    server.shutdown().graceful_shutdown(None).await;
    tracing::info!("Shutdown complete");
    Ok(())
}
