//! `TarotServer`: router assembly and listener.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use tarot_core::RelayError;
use tarot_runtime::{RelayConfig, RelayHub};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::proxy::WorkflowProxy;
use crate::routes::{self, diagnostics};
use crate::shutdown::ShutdownCoordinator;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Registry and mailbox.
    pub hub: Arc<RelayHub>,
    /// Workflow forwarder, when a workflow URL is configured.
    pub proxy: Option<Arc<WorkflowProxy>>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// When the server started.
    pub start_time: Instant,
    /// Event stream keep-alive interval.
    pub heartbeat: Duration,
    /// Prometheus handle for `/metrics`.
    pub metrics: Option<PrometheusHandle>,
}

/// The relay server.
pub struct TarotServer {
    config: ServerConfig,
    hub: Arc<RelayHub>,
    proxy: Option<Arc<WorkflowProxy>>,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
    metrics: Option<PrometheusHandle>,
}

impl TarotServer {
    /// Create a server with a fresh hub.
    pub fn new(config: ServerConfig, relay: RelayConfig) -> Result<Self, RelayError> {
        let proxy = config
            .workflow_url
            .as_deref()
            .map(|url| WorkflowProxy::new(url, config.workflow_timeout()).map(Arc::new))
            .transpose()?;
        Ok(Self {
            config,
            hub: Arc::new(RelayHub::new(relay)),
            proxy,
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
            metrics: None,
        })
    }

    /// Serve `/metrics` from `handle`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Build the Axum router with all routes and layers.
    pub fn router(&self) -> Router {
        let state = AppState {
            hub: Arc::clone(&self.hub),
            proxy: self.proxy.clone(),
            shutdown: Arc::clone(&self.shutdown),
            start_time: self.start_time,
            heartbeat: self.config.heartbeat_interval(),
            metrics: self.metrics.clone(),
        };

        let relay = routes::relay_routes();
        let mut router = Router::new()
            .route("/health", get(diagnostics::health))
            .route("/metrics", get(diagnostics::metrics))
            .merge(relay.clone())
            .nest("/api", relay);

        if let Some(dir) = &self.config.static_dir {
            router = router.fallback_service(ServeDir::new(dir));
        }

        router
            .with_state(state)
            .layer(DefaultBodyLimit::max(self.config.max_body_bytes))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }

    /// Bind and serve in a background task.
    ///
    /// The task is tracked by the shutdown coordinator and stops accepting
    /// connections when shutdown begins.
    pub async fn listen(&self) -> std::io::Result<SocketAddr> {
        let bind = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&bind).await?;
        let addr = listener.local_addr()?;

        let router = self.router();
        let token = self.shutdown.token();
        let hub = Arc::clone(&self.hub);
        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    token.cancelled().await;
                    hub.shutdown();
                })
                .await;
            if let Err(e) = result {
                error!(error = %e, "server terminated");
            }
        });
        self.shutdown.track(handle);

        info!(
            %addr,
            mode = %self.hub.mode(),
            proxy = self.proxy.as_ref().map(|p| p.url()),
            "relay server listening"
        );
        Ok(addr)
    }

    /// Shared relay hub.
    pub fn hub(&self) -> &Arc<RelayHub> {
        &self.hub
    }

    /// Shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
