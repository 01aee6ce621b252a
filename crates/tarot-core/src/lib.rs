//! # tarot-core
//!
//! Shared types for the tarot reading relay.
//!
//! - [`message`]: fragments, mailbox messages, and live push frames
//! - [`ingress`]: lenient normalization of workflow callback bodies
//! - [`delivery`]: poll / push / hybrid delivery modes
//! - [`errors`]: request-scoped relay error kinds with stable codes
//! - [`logging`]: `tracing` subscriber initialization

#![deny(unsafe_code)]

pub mod delivery;
pub mod errors;
pub mod ingress;
pub mod logging;
pub mod message;

pub use delivery::DeliveryMode;
pub use errors::{RelayError, Result};
pub use ingress::IngressRequest;
pub use message::{Fragment, Message, PushFrame, SessionId};
