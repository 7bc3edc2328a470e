use crate::{MessageSink, SinkError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

/// A sink that replays scripted results and records every payload
///
/// Results are taken from the script in order; once it runs dry every
/// further call gets the fallback result.
#[derive(Debug)]
pub struct ScriptedSink {
    script: Mutex<VecDeque<Result<(), SinkError>>>,
    fallback: Result<(), SinkError>,
    calls: AtomicUsize,
    payloads: Mutex<Vec<Vec<u8>>>,
}

impl ScriptedSink {
    /// Replay `script`, then accept everything
    pub fn new(script: impl IntoIterator<Item = Result<(), SinkError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback: Ok(()),
            calls: AtomicUsize::new(0),
            payloads: Mutex::new(Vec::new()),
        }
    }

    /// Accept every payload
    pub fn accepting() -> Self {
        Self::new([])
    }

    /// Answer every payload with the same non-2xx status
    pub fn rejecting(status: u16) -> Self {
        Self::new([]).then(Err(SinkError::UpstreamStatus { status }))
    }

    /// Fail every payload before a response is received
    pub fn unreachable() -> Self {
        Self::new([]).then(Err(SinkError::transport("connection refused")))
    }

    /// Result returned once the script is exhausted
    pub fn then(mut self, fallback: Result<(), SinkError>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Number of `send` calls so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn received_payloads(&self) -> Vec<Vec<u8>> {
        self.payloads.lock().unwrap().clone()
    }
}

/// Scripted non-2xx answer
pub fn status(code: u16) -> Result<(), SinkError> {
    Err(SinkError::UpstreamStatus { status: code })
}

#[async_trait]
impl MessageSink for ScriptedSink {
    async fn send(&self, payload: &[u8]) -> Result<(), SinkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads.lock().unwrap().push(payload.to_vec());

        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }

    fn endpoint(&self) -> &str {
        "memory://scripted"
    }
}
