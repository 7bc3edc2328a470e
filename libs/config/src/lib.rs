//! # Weather Relay Configuration
//!
//! Centralized configuration for the weather relay worker.
//!
//! ## Sources (lowest to highest precedence)
//!
//! - **Defaults**: values in [`service`], matching existing deployments
//! - **TOML file**: path taken from `WEATHER_RELAY_CONFIG`, skipped when unset
//! - **Environment**: `WEATHER_RELAY_<SECTION>__<KEY>`, e.g. `WEATHER_RELAY_RETRY__MAX_ATTEMPTS=5`
//! - **Deployment variables**: `RABBITMQ_URL` and `NESTJS_API_URL`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use relay_config::RelayConfig;
//!
//! let config = RelayConfig::load()?;
//! println!("consuming {}", config.broker.queue);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod service;
pub mod service_config;

// Re-export commonly used types
pub use service_config::{
    BrokerSettings, IngestSettings, LogFormat, LoggingSettings, RelayConfig, RetrySettings,
};
