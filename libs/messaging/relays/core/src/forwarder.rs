//! # Forwarder - Bounded Retry Delivery
//!
//! Encodes a validated observation once and submits it to a [`MessageSink`]
//! until the sink accepts it or the attempt budget runs out.
//!
//! ## Retry Policy
//! - Attempts are sequential, never overlapped
//! - The first accepted attempt ends forwarding immediately
//! - `delay` is slept between attempts, never after the last one
//! - A sink error that another attempt cannot fix ends forwarding early
//! - Defaults: 3 attempts, no delay
//!
//! Every attempt reaches the downstream, so a message that is accepted on
//! the third try was also posted twice before. Receivers must tolerate that.

use message_sink::{MessageSink, SinkError};
use relay_config::RetrySettings;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use types::{CodecError, WeatherObservation};

/// Default total attempts per message
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; values below 1 are treated as 1
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: Duration::ZERO,
        }
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            delay: settings.delay(),
        }
    }
}

impl RetryPolicy {
    fn attempt_budget(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Successful forwarding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardReport {
    /// Attempt that was accepted (1-based)
    pub attempts: u32,
}

#[derive(Error, Debug)]
pub enum ForwardError {
    /// Observation could not be serialized; nothing was sent
    #[error(transparent)]
    Encode(#[from] CodecError),

    /// Every attempt failed
    #[error("Forwarding failed after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: SinkError },
}

/// Retrying submitter in front of a sink
#[derive(Debug)]
pub struct Forwarder<S: MessageSink> {
    sink: S,
    policy: RetryPolicy,
}

impl<S: MessageSink> Forwarder<S> {
    pub fn new(sink: S, policy: RetryPolicy) -> Self {
        Self { sink, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Submit one observation, retrying per policy
    pub async fn forward(
        &self,
        observation: &WeatherObservation,
    ) -> Result<ForwardReport, ForwardError> {
        let body = observation.encode()?;
        let budget = self.policy.attempt_budget();
        let mut attempt = 1;

        loop {
            match self.sink.send(&body).await {
                Ok(()) => {
                    debug!(
                        attempt,
                        endpoint = self.sink.endpoint(),
                        "Observation accepted by downstream"
                    );
                    return Ok(ForwardReport { attempts: attempt });
                }
                Err(e) => {
                    warn!(
                        attempt,
                        max_attempts = budget,
                        endpoint = self.sink.endpoint(),
                        error = %e,
                        "Error sending observation to ingestion API"
                    );
                    if attempt >= budget || !e.is_recoverable() {
                        return Err(ForwardError::Exhausted {
                            attempts: attempt,
                            last_error: e,
                        });
                    }
                }
            }

            if !self.policy.delay.is_zero() {
                tokio::time::sleep(self.policy.delay).await;
            }
            attempt += 1;
        }
    }
}
