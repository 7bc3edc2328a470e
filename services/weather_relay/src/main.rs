//! Weather relay worker
//!
//! Consumes weather observations from the durable broker queue and posts
//! each one to the ingestion API, acknowledging only after the API accepted it.
//!
//! Usage:
//!   RABBITMQ_URL=amqp://... NESTJS_API_URL=http://... weather_relay
//!   WEATHER_RELAY_CONFIG=config/weather_relay.toml weather_relay
//!
//! Exits non-zero when the broker is unreachable at startup or the
//! subscription fails later; the supervisor is expected to restart it.

mod logging;

use anyhow::{Context, Result};
use message_sink::HttpSink;
use relay_config::RelayConfig;
use relay_core::{AmqpSource, Forwarder, Relay, RetryPolicy};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = RelayConfig::load().context("Failed to load configuration")?;

    logging::init_logging(&config.logging)?;

    info!("Starting weather relay");
    info!(
        broker = %config.broker.redacted_url(),
        queue = %config.broker.queue,
        prefetch = config.broker.prefetch,
        endpoint = %config.ingest.endpoint(),
        max_attempts = config.retry.max_attempts,
        "Configuration loaded"
    );

    let sink = HttpSink::new(config.ingest.endpoint(), config.ingest.request_timeout())
        .context("Failed to build ingestion client")?;
    let mut relay = Relay::new(Forwarder::new(sink, RetryPolicy::from(&config.retry)));

    let mut source = AmqpSource::connect(&config.broker)
        .await
        .map_err(|e| {
            error!("Failed to connect to RabbitMQ: {}", e);
            e
        })
        .context("Broker unavailable at startup")?;

    info!(queue = source.queue(), "Connected to RabbitMQ");

    if let Err(e) = relay.run(&mut source).await {
        error!(error = %e, stats = ?relay.stats(), "Relay stopped");
        return Err(e).context("Relay subscription failed");
    }

    Ok(())
}
