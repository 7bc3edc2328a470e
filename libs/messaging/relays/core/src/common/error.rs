//! # Relay Error Types
//!
//! Only process-level failures live here. Per-message problems (bad payload,
//! missing coordinates, downstream refusing) are outcomes settled on the
//! broker and never surface as `RelayError`.

use thiserror::Error;

/// Relay engine operation errors
#[derive(Error, Debug)]
pub enum RelayError {
    /// Broker connection, channel or consumer failure; fatal for the process
    #[error("Broker connection error: {0}")]
    Broker(String),
}

impl From<lapin::Error> for RelayError {
    fn from(err: lapin::Error) -> Self {
        RelayError::Broker(err.to_string())
    }
}

/// Result type alias for relay engine operations
pub type RelayResult<T> = std::result::Result<T, RelayError>;
