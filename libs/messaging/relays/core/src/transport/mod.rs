//! Inbound transport abstraction
//!
//! The relay pulls deliveries one at a time from a [`DeliverySource`] and
//! settles each through its [`InboundDelivery`] handle. The AMQP consumer is
//! the production source; `testing::MemorySource` stands in for it in tests.

pub mod amqp;

use crate::disposition::Disposition;
use crate::RelayResult;
use async_trait::async_trait;

/// One message handed out by the broker, awaiting settlement
#[async_trait]
pub trait InboundDelivery: Send + Sync {
    /// Raw message body
    fn payload(&self) -> &[u8];

    /// Broker-assigned delivery tag, for logging
    fn delivery_tag(&self) -> u64;

    /// Whether the broker has handed this message out before
    fn redelivered(&self) -> bool {
        false
    }

    /// Acknowledge, reject or requeue this delivery
    async fn settle(&self, disposition: Disposition) -> RelayResult<()>;
}

/// Ordered stream of deliveries from a single subscription
#[async_trait]
pub trait DeliverySource: Send {
    type Delivery: InboundDelivery;

    /// Wait for the next delivery.
    ///
    /// `None` means the subscription ended; an error means the connection
    /// to the broker failed. Both are fatal for the relay loop.
    async fn next_delivery(&mut self) -> Option<RelayResult<Self::Delivery>>;
}
