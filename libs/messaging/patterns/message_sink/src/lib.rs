//! Outbound delivery abstraction for relays
//!
//! A [`MessageSink`] hands an encoded payload to a downstream system and
//! reports whether that system accepted it. Sinks make exactly one delivery
//! attempt per call; retry policy belongs to the caller.

pub mod error;
pub mod sinks;
pub mod test_utils;

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

pub use error::SinkError;
pub use sinks::HttpSink;

/// A destination for encoded messages that abstracts away transport details
#[async_trait]
pub trait MessageSink: Send + Sync + Debug {
    /// Deliver one payload.
    ///
    /// `Ok(())` means the downstream confirmed acceptance. Transport failures
    /// and rejections by the downstream are both errors.
    async fn send(&self, payload: &[u8]) -> Result<(), SinkError>;

    /// Where this sink delivers to, for logging
    fn endpoint(&self) -> &str;
}

#[async_trait]
impl<S: MessageSink + ?Sized> MessageSink for Arc<S> {
    async fn send(&self, payload: &[u8]) -> Result<(), SinkError> {
        (**self).send(payload).await
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptedSink;

    #[tokio::test]
    async fn test_shared_sink_counts_through_arc() {
        let sink = Arc::new(ScriptedSink::accepting());
        let shared: Arc<dyn MessageSink> = sink.clone();

        shared.send(b"first").await.unwrap();
        shared.send(b"second").await.unwrap();

        assert_eq!(sink.call_count(), 2);
        assert_eq!(
            sink.received_payloads(),
            vec![b"first".to_vec(), b"second".to_vec()]
        );
        assert_eq!(shared.endpoint(), "memory://scripted");
    }
}
