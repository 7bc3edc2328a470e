//! AMQP 0-9-1 delivery source (RabbitMQ)
//!
//! Connects, declares the durable queue the collector publishes to, and
//! registers a single non-exclusive consumer with manual acknowledgment.
//! Negative acknowledgments use `basic.nack` without the `multiple` flag.

use crate::disposition::Disposition;
use crate::transport::{DeliverySource, InboundDelivery};
use crate::{RelayError, RelayResult};
use async_trait::async_trait;
use futures_util::stream::StreamExt;
use lapin::message::Delivery;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions,
    QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties, Consumer};
use relay_config::BrokerSettings;
use tracing::{debug, info};

/// Consumer on one durable queue
pub struct AmqpSource {
    // Held so the connection and channel live as long as the consumer
    _connection: Connection,
    _channel: Channel,
    consumer: Consumer,
    queue: String,
}

impl AmqpSource {
    /// Connect and start consuming.
    ///
    /// Any failure here is a broker connection error; the caller is expected
    /// to exit and let the supervisor restart the process.
    pub async fn connect(settings: &BrokerSettings) -> RelayResult<Self> {
        let connection = Connection::connect(&settings.url, ConnectionProperties::default())
            .await
            .map_err(|e| RelayError::Broker(format!("Failed to connect to broker: {}", e)))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| RelayError::Broker(format!("Failed to open a channel: {}", e)))?;

        channel
            .basic_qos(settings.prefetch, BasicQosOptions::default())
            .await
            .map_err(|e| RelayError::Broker(format!("Failed to set prefetch: {}", e)))?;

        let queue = channel
            .queue_declare(
                &settings.queue,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| RelayError::Broker(format!("Failed to declare a queue: {}", e)))?;

        info!(
            queue = %settings.queue,
            messages = queue.message_count(),
            consumers = queue.consumer_count(),
            "Declared durable queue"
        );

        let consumer = channel
            .basic_consume(
                &settings.queue,
                &settings.consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| RelayError::Broker(format!("Failed to register a consumer: {}", e)))?;

        Ok(Self {
            _connection: connection,
            _channel: channel,
            consumer,
            queue: settings.queue.clone(),
        })
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }
}

#[async_trait]
impl DeliverySource for AmqpSource {
    type Delivery = AmqpDelivery;

    async fn next_delivery(&mut self) -> Option<RelayResult<AmqpDelivery>> {
        let next = self.consumer.next().await?;
        Some(next.map(AmqpDelivery).map_err(RelayError::from))
    }
}

/// Broker call that settles a delivery
#[derive(Debug)]
enum Settlement {
    Ack(BasicAckOptions),
    Nack(BasicNackOptions),
}

impl From<Disposition> for Settlement {
    fn from(disposition: Disposition) -> Self {
        match disposition {
            Disposition::Ack => Settlement::Ack(BasicAckOptions { multiple: false }),
            Disposition::Reject | Disposition::Requeue => Settlement::Nack(BasicNackOptions {
                multiple: false,
                requeue: disposition.requeue(),
            }),
        }
    }
}

/// Delivery received from the AMQP consumer
pub struct AmqpDelivery(Delivery);

#[async_trait]
impl InboundDelivery for AmqpDelivery {
    fn payload(&self) -> &[u8] {
        &self.0.data
    }

    fn delivery_tag(&self) -> u64 {
        self.0.delivery_tag
    }

    fn redelivered(&self) -> bool {
        self.0.redelivered
    }

    async fn settle(&self, disposition: Disposition) -> RelayResult<()> {
        debug!(
            delivery_tag = self.0.delivery_tag,
            %disposition,
            "Settling delivery"
        );

        let acker = &self.0.acker;
        let result = match Settlement::from(disposition) {
            Settlement::Ack(options) => acker.ack(options).await.map(|_| ()),
            Settlement::Nack(options) => acker.nack(options).await.map(|_| ()),
        };

        result.map_err(|e| {
            RelayError::Broker(format!(
                "Failed to {} delivery {}: {}",
                disposition, self.0.delivery_tag, e
            ))
        })
    }
}
