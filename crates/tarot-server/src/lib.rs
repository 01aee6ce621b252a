//! # tarot-server
//!
//! Axum HTTP surface of the relay.
//!
//! - Ingress: `POST /push` and the `POST /webhook/tarot-chat` pass-through
//! - Delivery: mailbox polling and per-session server-sent events
//! - Operations: health, Prometheus metrics, webhook diagnostics
//! - Graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod health;
pub mod metrics;
pub mod proxy;
pub mod routes;
pub mod server;
pub mod shutdown;

pub use config::ServerConfig;
pub use errors::ApiError;
pub use server::{AppState, TarotServer};
pub use shutdown::ShutdownCoordinator;
