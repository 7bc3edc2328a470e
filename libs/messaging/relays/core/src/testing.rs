//! In-memory delivery source for exercising the relay without a broker
//!
//! Requeued deliveries are recorded but not handed out again; once the
//! scripted payloads are used up the source reports a closed subscription.

use crate::disposition::Disposition;
use crate::transport::{DeliverySource, InboundDelivery};
use crate::{RelayError, RelayResult};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug)]
pub struct MemorySource {
    pending: VecDeque<Vec<u8>>,
    next_tag: u64,
    settled: Arc<Mutex<Vec<Disposition>>>,
    fail_settle_at: Option<u64>,
}

impl MemorySource {
    pub fn new<P: Into<Vec<u8>>>(payloads: impl IntoIterator<Item = P>) -> Self {
        Self {
            pending: payloads.into_iter().map(Into::into).collect(),
            next_tag: 0,
            settled: Arc::new(Mutex::new(Vec::new())),
            fail_settle_at: None,
        }
    }

    /// Make settling the delivery with this tag (0-based) fail like a dead channel
    pub fn fail_settle_at(mut self, delivery_tag: u64) -> Self {
        self.fail_settle_at = Some(delivery_tag);
        self
    }

    /// Dispositions in the order deliveries were settled
    pub fn settled(&self) -> Vec<Disposition> {
        self.settled.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

#[async_trait]
impl DeliverySource for MemorySource {
    type Delivery = MemoryDelivery;

    async fn next_delivery(&mut self) -> Option<RelayResult<MemoryDelivery>> {
        let payload = self.pending.pop_front()?;
        let delivery_tag = self.next_tag;
        self.next_tag += 1;

        Some(Ok(MemoryDelivery {
            payload,
            delivery_tag,
            settled: Arc::clone(&self.settled),
            fail_settle: self.fail_settle_at == Some(delivery_tag),
        }))
    }
}

#[derive(Debug)]
pub struct MemoryDelivery {
    payload: Vec<u8>,
    delivery_tag: u64,
    settled: Arc<Mutex<Vec<Disposition>>>,
    fail_settle: bool,
}

#[async_trait]
impl InboundDelivery for MemoryDelivery {
    fn payload(&self) -> &[u8] {
        &self.payload
    }

    fn delivery_tag(&self) -> u64 {
        self.delivery_tag
    }

    async fn settle(&self, disposition: Disposition) -> RelayResult<()> {
        if self.fail_settle {
            return Err(RelayError::Broker(format!(
                "channel closed while settling delivery {}",
                self.delivery_tag
            )));
        }
        self.settled.lock().unwrap().push(disposition);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hands_out_payloads_in_order() {
        let mut source = MemorySource::new(["a", "b"]);

        let first = source.next_delivery().await.unwrap().unwrap();
        assert_eq!(first.payload(), b"a");
        assert_eq!(first.delivery_tag(), 0);
        first.settle(Disposition::Ack).await.unwrap();

        let second = source.next_delivery().await.unwrap().unwrap();
        assert_eq!(second.payload(), b"b");
        second.settle(Disposition::Requeue).await.unwrap();

        assert!(source.next_delivery().await.is_none());
        assert_eq!(source.remaining(), 0);
        assert_eq!(source.settled(), vec![Disposition::Ack, Disposition::Requeue]);
    }
}
