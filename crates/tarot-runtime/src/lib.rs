//! # tarot-runtime
//!
//! In-memory relay state shared by the HTTP surface.
//!
//! - [`channel`]: a single live push channel and its drop accounting
//! - [`registry`]: session id to live channel, last registration wins
//! - [`mailbox`]: bounded per-session history with fragment merging
//! - [`hub`]: routes an ingested fragment according to the delivery mode

#![deny(unsafe_code)]

pub mod channel;
pub mod hub;
pub mod mailbox;
pub mod registry;

pub use channel::LiveChannel;
pub use hub::{Delivery, RelayConfig, RelayHub, Subscription};
pub use mailbox::{AppendOutcome, Mailbox};
pub use registry::ConnectionRegistry;
