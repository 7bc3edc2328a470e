/// Failure of a single delivery attempt
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// The request never produced a response (connect, TLS, timeout, ...)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The downstream answered with a non-2xx status
    #[error("Upstream rejected message with status {status}")]
    UpstreamStatus { status: u16 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SinkError {
    /// Check if another attempt could succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SinkError::Transport(_) | SinkError::UpstreamStatus { .. }
        )
    }

    /// Status code returned by the downstream, if it answered
    pub fn status(&self) -> Option<u16> {
        match self {
            SinkError::UpstreamStatus { status } => Some(*status),
            _ => None,
        }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        SinkError::Transport(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let refused = SinkError::transport("connection refused");
        assert!(refused.is_recoverable());
        assert_eq!(refused.status(), None);

        let rejected = SinkError::UpstreamStatus { status: 503 };
        assert!(rejected.is_recoverable());
        assert_eq!(rejected.status(), Some(503));
        assert_eq!(
            rejected.to_string(),
            "Upstream rejected message with status 503"
        );

        assert!(!SinkError::InvalidConfig("bad tls".to_string()).is_recoverable());
    }
}
