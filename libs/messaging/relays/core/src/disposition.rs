//! Acknowledgment decisions
//!
//! Every delivery ends in exactly one [`MessageOutcome`], and every outcome
//! maps to exactly one [`Disposition`]:
//!
//! | outcome     | disposition | why                                         |
//! |-------------|-------------|---------------------------------------------|
//! | `Malformed` | `Reject`    | broken payload, redelivery would loop       |
//! | `Invalid`   | `Reject`    | missing content, not a transient condition  |
//! | `Forwarded` | `Ack`       | ingestion API confirmed the observation     |
//! | `Exhausted` | `Requeue`   | downstream or network trouble, try later    |

use crate::forwarder::ForwardError;
use message_sink::SinkError;
use types::{CodecError, ValidationError};

/// What happened to one delivery
#[derive(Debug)]
pub enum MessageOutcome {
    /// Payload could not be decoded (or re-encoded) as an observation
    Malformed(CodecError),
    /// Decoded but failed validation
    Invalid(ValidationError),
    /// Accepted by the ingestion API
    Forwarded { attempts: u32 },
    /// Every forwarding attempt failed
    Exhausted { attempts: u32, last_error: SinkError },
}

/// Broker-side settlement of a delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// Mark consumed
    Ack,
    /// Negative acknowledgment, message is discarded
    Reject,
    /// Negative acknowledgment, message returns to the queue
    Requeue,
}

impl MessageOutcome {
    pub fn disposition(&self) -> Disposition {
        match self {
            MessageOutcome::Malformed(_) | MessageOutcome::Invalid(_) => Disposition::Reject,
            MessageOutcome::Forwarded { .. } => Disposition::Ack,
            MessageOutcome::Exhausted { .. } => Disposition::Requeue,
        }
    }

    /// Number of downstream calls made for this delivery
    pub fn attempts(&self) -> u32 {
        match self {
            MessageOutcome::Malformed(_) | MessageOutcome::Invalid(_) => 0,
            MessageOutcome::Forwarded { attempts } | MessageOutcome::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }
}

impl From<ForwardError> for MessageOutcome {
    fn from(err: ForwardError) -> Self {
        match err {
            ForwardError::Encode(e) => MessageOutcome::Malformed(e),
            ForwardError::Exhausted {
                attempts,
                last_error,
            } => MessageOutcome::Exhausted {
                attempts,
                last_error,
            },
        }
    }
}

impl Disposition {
    /// Whether the broker should redeliver the message
    pub fn requeue(self) -> bool {
        matches!(self, Disposition::Requeue)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Disposition::Ack => "ack",
            Disposition::Reject => "reject",
            Disposition::Requeue => "requeue",
        }
    }
}

impl std::fmt::Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
