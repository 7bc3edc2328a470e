//! Service Configuration Module
//!
//! Provides configuration loading for the weather relay. Defaults are layered
//! under an optional TOML file, prefixed environment overrides and the two
//! deployment variables already set by existing deployments.

use crate::service::{self, env};
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Main relay configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RelayConfig {
    /// Inbound queue settings
    pub broker: BrokerSettings,

    /// Downstream ingestion API settings
    pub ingest: IngestSettings,

    /// Forwarding retry policy
    pub retry: RetrySettings,

    pub logging: LoggingSettings,
}

/// AMQP broker and queue settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BrokerSettings {
    pub url: String,
    pub queue: String,
    pub consumer_tag: String,
    pub prefetch: u16,
}

/// Ingestion API settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IngestSettings {
    pub base_url: String,
    pub path: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RetrySettings {
    /// Total attempts per message, including the first
    pub max_attempts: u32,
    pub delay_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl BrokerSettings {
    /// Broker URL with the password masked, for logging
    pub fn redacted_url(&self) -> String {
        let Ok(mut url) = Url::parse(&self.url) else {
            return "<unparseable broker url>".to_string();
        };
        if url.password().is_some() && url.set_password(Some("***")).is_err() {
            return "<unparseable broker url>".to_string();
        }
        url.to_string()
    }
}

impl IngestSettings {
    /// Full URL the forwarder posts to
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl RetrySettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl RelayConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::load_from_vars(std::env::vars().collect())
    }

    /// Load configuration from an explicit set of environment variables
    ///
    /// The config file path is read from the same map, so tests can drive
    /// every layer without touching the process environment.
    pub fn load_from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let file = non_empty(&vars, env::CONFIG_PATH).map(PathBuf::from);
        Self::load_with(file.as_deref(), vars)
    }

    /// Load configuration from an optional TOML file plus environment variables
    pub fn load_with(file: Option<&Path>, vars: HashMap<String, String>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("broker.url", service::broker::URL)?
            .set_default("broker.queue", service::broker::QUEUE)?
            .set_default("broker.consumer_tag", service::broker::CONSUMER_TAG)?
            .set_default("broker.prefetch", i64::from(service::broker::PREFETCH))?
            .set_default("ingest.base_url", service::ingest::BASE_URL)?
            .set_default("ingest.path", service::ingest::PATH)?
            .set_default(
                "ingest.request_timeout_ms",
                service::ingest::REQUEST_TIMEOUT_MS as i64,
            )?
            .set_default("retry.max_attempts", i64::from(service::retry::MAX_ATTEMPTS))?
            .set_default("retry.delay_ms", service::retry::DELAY_MS as i64)?
            .set_default("logging.level", service::logging::LEVEL)?
            .set_default("logging.format", service::logging::FORMAT)?;

        if let Some(path) = file {
            info!("Loading relay config file: {:?}", path);
            builder = builder.add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(true),
            );
        }

        // Override with environment variables (WEATHER_RELAY_ prefix)
        builder = builder.add_source(
            Environment::with_prefix(env::PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(Some(vars.clone())),
        );

        // Deployment variables win over everything else
        builder = builder
            .set_override_option("broker.url", non_empty(&vars, env::RABBITMQ_URL))?
            .set_override_option("ingest.base_url", non_empty(&vars, env::NESTJS_API_URL))?;

        let config: RelayConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        debug!(?config.retry, ?config.logging, "Relay configuration loaded");
        Ok(config)
    }

    /// Reject settings the relay cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.broker.queue.is_empty() {
            bail!("broker.queue must not be empty");
        }
        if self.broker.prefetch == 0 {
            bail!("broker.prefetch must be >= 1");
        }
        if self.retry.max_attempts == 0 {
            bail!("retry.max_attempts must be >= 1");
        }
        if self.ingest.request_timeout_ms == 0 {
            bail!("ingest.request_timeout_ms must be > 0");
        }
        if !self.ingest.path.starts_with('/') {
            bail!("ingest.path must start with '/': {}", self.ingest.path);
        }

        let base = Url::parse(&self.ingest.base_url)
            .with_context(|| format!("Invalid ingest.base_url: {}", self.ingest.base_url))?;
        if !matches!(base.scheme(), "http" | "https") {
            bail!("ingest.base_url must be http or https: {}", self.ingest.base_url);
        }

        Ok(())
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            broker: BrokerSettings {
                url: service::broker::URL.to_string(),
                queue: service::broker::QUEUE.to_string(),
                consumer_tag: service::broker::CONSUMER_TAG.to_string(),
                prefetch: service::broker::PREFETCH,
            },
            ingest: IngestSettings {
                base_url: service::ingest::BASE_URL.to_string(),
                path: service::ingest::PATH.to_string(),
                request_timeout_ms: service::ingest::REQUEST_TIMEOUT_MS,
            },
            retry: RetrySettings {
                max_attempts: service::retry::MAX_ATTEMPTS,
                delay_ms: service::retry::DELAY_MS,
            },
            logging: LoggingSettings {
                level: service::logging::LEVEL.to_string(),
                format: LogFormat::Pretty,
            },
        }
    }
}

/// Unset and empty variables are treated the same
fn non_empty(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    vars.get(key).filter(|v| !v.is_empty()).cloned()
}
