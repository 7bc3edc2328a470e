//! # Weather Relay Core
//!
//! The consume → decode → validate → forward → acknowledge loop that moves
//! weather observations from the broker queue to the ingestion API.
//!
//! ## Architecture Role
//!
//! ```text
//! broker queue ─► DeliverySource ─► Relay ─► decode / validate
//!                       ▲                         │
//!                       │                         ▼
//!                  Disposition ◄── MessageOutcome ◄── Forwarder ─► MessageSink (HTTP)
//! ```
//!
//! - [`transport`]: where deliveries come from and how they are settled
//! - [`forwarder`]: bounded, sequential retries against a `MessageSink`
//! - [`disposition`]: the four-way ack / reject / requeue decision
//! - [`common`]: the relay loop that ties them together
//!
//! ## Delivery Semantics
//!
//! A message is acknowledged only after the ingestion API confirmed it.
//! Forwarding and acknowledging are not atomic: if the process dies between
//! the two, the broker redelivers and the API sees the observation twice.
//! Delivery is therefore at-least-once, and deduplication is the ingestion
//! side's concern.

pub mod common;
pub mod disposition;
pub mod forwarder;
pub mod testing;
pub mod transport;

// Re-export commonly used types
pub use common::error::{RelayError, RelayResult};
pub use common::{Relay, RelayStats};
pub use disposition::{Disposition, MessageOutcome};
pub use forwarder::{ForwardError, ForwardReport, Forwarder, RetryPolicy};
pub use transport::amqp::AmqpSource;
pub use transport::{DeliverySource, InboundDelivery};
