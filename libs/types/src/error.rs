use thiserror::Error;

/// Errors converting a `WeatherObservation` to or from its JSON wire form
#[derive(Error, Debug)]
pub enum CodecError {
    /// Payload is not JSON or does not match the observation schema
    #[error("Failed to decode weather observation: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Failed to encode weather observation: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Reasons an observation may not be forwarded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid data: missing location ({field} is empty)")]
    MissingLocation { field: &'static str },
}
