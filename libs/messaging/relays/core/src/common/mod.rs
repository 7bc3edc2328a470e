//! # Relay Engine
//!
//! Drives one subscription: pull a delivery, decode it, validate it, forward
//! it, settle it, then pull the next one. Exactly one message is in flight at
//! any time, so deliveries reach the ingestion API in queue order.
//!
//! ## Failure Handling
//! - Per-message problems become a [`MessageOutcome`] and are settled on the
//!   broker; they never stop the loop
//! - A broken subscription (stream error, stream end, failed ack/nack) ends
//!   [`Relay::run`] with [`RelayError::Broker`]
//!
//! There is no cancellation: a forward in progress when the process stops is
//! simply abandoned and the broker redelivers the unacknowledged message.

pub mod error;

use crate::common::error::{RelayError, RelayResult};
use crate::disposition::{Disposition, MessageOutcome};
use crate::forwarder::Forwarder;
use crate::transport::{DeliverySource, InboundDelivery};
use message_sink::MessageSink;
use tracing::{debug, error, info, warn};
use types::WeatherObservation;

/// Settlement counters since the relay started
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub acknowledged: u64,
    pub rejected: u64,
    pub requeued: u64,
}

impl RelayStats {
    fn record(&mut self, disposition: Disposition) {
        match disposition {
            Disposition::Ack => self.acknowledged += 1,
            Disposition::Reject => self.rejected += 1,
            Disposition::Requeue => self.requeued += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.acknowledged + self.rejected + self.requeued
    }
}

/// Queue-to-sink relay for weather observations
#[derive(Debug)]
pub struct Relay<S: MessageSink> {
    forwarder: Forwarder<S>,
    stats: RelayStats,
}

impl<S: MessageSink> Relay<S> {
    pub fn new(forwarder: Forwarder<S>) -> Self {
        Self {
            forwarder,
            stats: RelayStats::default(),
        }
    }

    pub fn stats(&self) -> RelayStats {
        self.stats
    }

    /// Decode, validate and forward one payload.
    ///
    /// The forwarder is only reached for payloads that decode and validate.
    pub async fn process(&self, payload: &[u8]) -> MessageOutcome {
        let observation = match WeatherObservation::decode(payload) {
            Ok(observation) => observation,
            Err(e) => {
                warn!(error = %e, bytes = payload.len(), "Error parsing message");
                return MessageOutcome::Malformed(e);
            }
        };

        if let Err(e) = observation.validate() {
            warn!(
                error = %e,
                timestamp = observation.timestamp,
                "Rejecting weather observation"
            );
            return MessageOutcome::Invalid(e);
        }

        match self.forwarder.forward(&observation).await {
            Ok(report) => {
                info!(
                    attempts = report.attempts,
                    timestamp = observation.timestamp,
                    lat = %observation.location_lat,
                    lon = %observation.location_lon,
                    temperature_c = observation.temperature_c,
                    "Processed weather log"
                );
                MessageOutcome::Forwarded {
                    attempts: report.attempts,
                }
            }
            Err(e) => {
                error!(
                    error = %e,
                    timestamp = observation.timestamp,
                    "Giving up on weather observation for now"
                );
                MessageOutcome::from(e)
            }
        }
    }

    /// Process one delivery to completion and settle it on the broker
    pub async fn handle<D: InboundDelivery>(&mut self, delivery: &D) -> RelayResult<Disposition> {
        if delivery.redelivered() {
            debug!(delivery_tag = delivery.delivery_tag(), "Handling redelivered message");
        }

        let outcome = self.process(delivery.payload()).await;
        let disposition = outcome.disposition();

        // Ack strictly after the forward result is known
        delivery.settle(disposition).await?;
        self.stats.record(disposition);

        debug!(
            delivery_tag = delivery.delivery_tag(),
            %disposition,
            attempts = outcome.attempts(),
            "Delivery settled"
        );
        Ok(disposition)
    }

    /// Consume until the subscription fails.
    ///
    /// Never returns `Ok`: the loop only ends when the broker connection is
    /// lost or the consumer stream closes.
    pub async fn run<Src: DeliverySource>(&mut self, source: &mut Src) -> RelayResult<()> {
        info!(
            endpoint = self.forwarder.sink().endpoint(),
            max_attempts = self.forwarder.policy().max_attempts,
            "Relay started. Waiting for messages..."
        );

        loop {
            let delivery = match source.next_delivery().await {
                Some(Ok(delivery)) => delivery,
                Some(Err(e)) => {
                    error!(error = %e, stats = ?self.stats, "Consumer failed");
                    return Err(e);
                }
                None => {
                    error!(stats = ?self.stats, "Consumer stream closed");
                    return Err(RelayError::Broker("consumer stream closed".to_string()));
                }
            };

            self.handle(&delivery).await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forwarder::RetryPolicy;
    use crate::testing::MemorySource;
    use message_sink::test_utils::{status, ScriptedSink};
    use std::sync::Arc;

    const VALID: &[u8] = br#"{"timestamp":1700000000,"location_lat":"12.9","location_lon":"77.6","temperature_c":28.5,"humidity_percent":60,"wind_speed_kmh":10.2,"weather_code":3,"collected_at":1700000001.5}"#;
    const MISSING_LAT: &[u8] = br#"{"timestamp":1700000000,"location_lat":"","location_lon":"77.6","temperature_c":28.5}"#;

    fn relay(sink: &Arc<ScriptedSink>) -> Relay<Arc<ScriptedSink>> {
        Relay::new(Forwarder::new(Arc::clone(sink), RetryPolicy::default()))
    }

    #[tokio::test]
    async fn test_invalid_payloads_never_reach_sink() {
        let sink = Arc::new(ScriptedSink::accepting());
        let relay = relay(&sink);

        let outcome = relay.process(b"\xff\xfe garbage").await;
        assert!(matches!(outcome, MessageOutcome::Malformed(_)));

        let outcome = relay.process(MISSING_LAT).await;
        assert!(matches!(outcome, MessageOutcome::Invalid(_)));

        assert_eq!(sink.call_count(), 0);
    }

    #[tokio::test]
    async fn test_process_forwards_valid_payload() {
        let sink = Arc::new(ScriptedSink::new([status(503)]));
        let outcome = relay(&sink).process(VALID).await;

        assert!(matches!(outcome, MessageOutcome::Forwarded { attempts: 2 }));
        assert_eq!(outcome.disposition(), Disposition::Ack);
    }

    #[tokio::test]
    async fn test_run_settles_each_delivery_in_order() {
        let sink = Arc::new(ScriptedSink::new([Ok(()), status(500), status(500), status(500)]));
        let mut relay = relay(&sink);
        let mut source = MemorySource::new([VALID, VALID, MISSING_LAT, b"{".as_slice(), VALID]);

        let err = relay.run(&mut source).await.unwrap_err();
        assert!(matches!(err, RelayError::Broker(_)));

        assert_eq!(
            source.settled(),
            vec![
                Disposition::Ack,
                Disposition::Requeue,
                Disposition::Reject,
                Disposition::Reject,
                Disposition::Ack,
            ]
        );
        // 1 + 3 + 0 + 0 + 1
        assert_eq!(sink.call_count(), 5);
        assert_eq!(
            relay.stats(),
            RelayStats {
                acknowledged: 2,
                rejected: 2,
                requeued: 1,
            }
        );
        assert_eq!(relay.stats().total(), 5);
    }

    #[tokio::test]
    async fn test_settle_failure_stops_the_loop() {
        let sink = Arc::new(ScriptedSink::accepting());
        let mut relay = relay(&sink);
        let mut source = MemorySource::new([VALID, VALID]).fail_settle_at(0);

        let err = relay.run(&mut source).await.unwrap_err();
        assert!(matches!(err, RelayError::Broker(_)));

        // The forward happened, the ack did not
        assert_eq!(sink.call_count(), 1);
        assert!(source.settled().is_empty());
        assert_eq!(relay.stats().total(), 0);
    }

    #[tokio::test]
    async fn test_empty_source_is_a_broker_error() {
        let sink = Arc::new(ScriptedSink::accepting());
        let mut source = MemorySource::new(Vec::<Vec<u8>>::new());

        let err = relay(&sink).run(&mut source).await.unwrap_err();
        assert_eq!(err.to_string(), "Broker connection error: consumer stream closed");
    }
}
