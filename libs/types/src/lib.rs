//! # Weather Relay Types
//!
//! Shared data model for the weather relay: the `WeatherObservation` record
//! carried on the queue, its JSON codec and the forwarding validation gate.
//!
//! ## Quick Start
//!
//! ```rust
//! use types::WeatherObservation;
//!
//! let payload = br#"{"timestamp":1700000000,"location_lat":"12.9","location_lon":"77.6"}"#;
//! let observation = WeatherObservation::decode(payload).unwrap();
//! assert!(observation.validate().is_ok());
//!
//! let body = observation.encode().unwrap();
//! assert_eq!(WeatherObservation::decode(&body).unwrap(), observation);
//! ```
//!
//! ## Integration Points
//!
//! - **Relay core**: decodes every delivery and gates forwarding on `validate()`
//! - **Forwarder**: encodes the same record as the ingestion request body

pub mod error;
pub mod observation;

pub use error::{CodecError, ValidationError};
pub use observation::WeatherObservation;
