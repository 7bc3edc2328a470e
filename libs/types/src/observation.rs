//! # Weather Observation Record
//!
//! The single entity carried by the relay. Field names on the wire are
//! snake_case and identical in both directions, so the ingestion request body
//! decodes back to the record that was received from the queue.
//!
//! ## Decoding Rules
//! - Absent fields and explicit `null` values take the zero value of their type
//! - Unknown fields are ignored
//! - A repeated key keeps its last value
//! - Keys match field names ASCII case-insensitively; an exact match wins
//!   over a case variant, and among several variants of one field without an
//!   exact match any one of them may be used
//! - A value of the wrong JSON type fails the whole decode
//! - Integers are accepted where a float is expected, never the reverse
//!
//! The collector publishes `null` for readings the weather provider omitted,
//! so a null reading becomes zero and a null coordinate becomes an empty
//! string that `validate()` rejects.

use crate::error::{CodecError, ValidationError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Wire names of every field, in declaration order
const FIELD_NAMES: [&str; 8] = [
    "timestamp",
    "location_lat",
    "location_lon",
    "temperature_c",
    "humidity_percent",
    "wind_speed_kmh",
    "weather_code",
    "collected_at",
];

/// One weather reading as published by the collector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    /// Observation time (epoch seconds)
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub location_lat: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub location_lon: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub temperature_c: f64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub humidity_percent: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub wind_speed_kmh: f64,

    /// Provider condition code, passed through untouched
    #[serde(default, deserialize_with = "null_as_default")]
    pub weather_code: i64,

    /// Collection time (fractional epoch seconds), distinct from `timestamp`
    #[serde(default, deserialize_with = "null_as_default")]
    pub collected_at: f64,
}

impl WeatherObservation {
    /// Parse a queue payload
    pub fn decode(payload: &[u8]) -> Result<Self, CodecError> {
        // Going through `Value` collapses repeated keys to the last one
        let mut value: Value = serde_json::from_slice(payload).map_err(CodecError::Decode)?;
        if let Value::Object(fields) = &mut value {
            fold_field_names(fields);
        }
        serde_json::from_value(value).map_err(CodecError::Decode)
    }

    /// Serialize to the JSON body accepted by the ingestion API
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(self).map_err(CodecError::Encode)
    }

    /// Check the fields required for forwarding.
    ///
    /// Only the coordinates are required. Numeric readings are not range
    /// checked, implausible values are forwarded unchanged.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.location_lat.is_empty() {
            return Err(ValidationError::MissingLocation {
                field: "location_lat",
            });
        }
        if self.location_lon.is_empty() {
            return Err(ValidationError::MissingLocation {
                field: "location_lon",
            });
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Rename case variants of known fields to their wire name
fn fold_field_names(fields: &mut Map<String, Value>) {
    for name in FIELD_NAMES {
        if fields.contains_key(name) {
            continue;
        }
        let variant = fields
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .cloned();
        if let Some(value) = variant.and_then(|key| fields.remove(&key)) {
            fields.insert(name.to_string(), value);
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO_PAYLOAD: &[u8] = br#"{
        "timestamp": 1700000000,
        "location_lat": "12.9",
        "location_lon": "77.6",
        "temperature_c": 28.5,
        "humidity_percent": 60,
        "wind_speed_kmh": 10.2,
        "weather_code": 3,
        "collected_at": 1700000001.5
    }"#;

    fn scenario_observation() -> WeatherObservation {
        WeatherObservation {
            timestamp: 1_700_000_000,
            location_lat: "12.9".to_string(),
            location_lon: "77.6".to_string(),
            temperature_c: 28.5,
            humidity_percent: 60,
            wind_speed_kmh: 10.2,
            weather_code: 3,
            collected_at: 1_700_000_001.5,
        }
    }

    #[test]
    fn test_decode_full_payload() {
        let observation = WeatherObservation::decode(SCENARIO_PAYLOAD).unwrap();
        assert_eq!(observation, scenario_observation());
        assert!(observation.validate().is_ok());
    }

    #[test]
    fn test_decode_rejects_non_json() {
        let err = WeatherObservation::decode(b"\x00\x01 not json at all").unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));

        assert!(WeatherObservation::decode(b"").is_err());
        assert!(WeatherObservation::decode(b"[1, 2, 3]").is_err());
        assert!(WeatherObservation::decode(br#""a string""#).is_err());
    }

    #[test]
    fn test_decode_rejects_wrong_field_types() {
        assert!(WeatherObservation::decode(br#"{"temperature_c": "hot"}"#).is_err());
        assert!(WeatherObservation::decode(br#"{"timestamp": 1700000000.5}"#).is_err());
        assert!(WeatherObservation::decode(br#"{"location_lat": 12.9}"#).is_err());
    }

    #[test]
    fn test_absent_and_null_fields_default_to_zero() {
        let observation = WeatherObservation::decode(
            br#"{"location_lat": "40.7128", "location_lon": "-74.0060",
                 "wind_speed_kmh": null, "weather_code": null}"#,
        )
        .unwrap();

        assert_eq!(observation.timestamp, 0);
        assert_eq!(observation.wind_speed_kmh, 0.0);
        assert_eq!(observation.weather_code, 0);
        assert_eq!(observation.humidity_percent, 0);
        assert!(observation.is_valid());
    }

    #[test]
    fn test_null_coordinate_is_missing() {
        let observation =
            WeatherObservation::decode(br#"{"location_lat": null, "location_lon": "1.0"}"#)
                .unwrap();
        assert_eq!(
            observation.validate(),
            Err(ValidationError::MissingLocation {
                field: "location_lat"
            })
        );
    }

    #[test]
    fn test_unknown_fields_ignored_and_integers_widen() {
        let observation = WeatherObservation::decode(
            br#"{"location_lat": "1", "location_lon": "2", "temperature_c": 21, "source": "owm"}"#,
        )
        .unwrap();
        assert_eq!(observation.temperature_c, 21.0);
    }

    #[test]
    fn test_repeated_key_keeps_last_value() {
        let observation = WeatherObservation::decode(
            br#"{"location_lat":"1","location_lat":"2","location_lon":"3"}"#,
        )
        .unwrap();
        assert_eq!(observation.location_lat, "2");
        assert_eq!(observation.location_lon, "3");
        assert!(observation.is_valid());

        // A repeated null still ends up missing
        let observation = WeatherObservation::decode(
            br#"{"location_lat":"1","location_lat":null,"location_lon":"3"}"#,
        )
        .unwrap();
        assert!(!observation.is_valid());
    }

    #[test]
    fn test_keys_match_case_insensitively() {
        let observation = WeatherObservation::decode(
            br#"{"Location_Lat":"1","LOCATION_LON":"3","Temperature_C":21.5}"#,
        )
        .unwrap();
        assert_eq!(observation.location_lat, "1");
        assert_eq!(observation.location_lon, "3");
        assert_eq!(observation.temperature_c, 21.5);

        // Exact name wins over a case variant
        let observation = WeatherObservation::decode(
            br#"{"LOCATION_LAT":"9","location_lat":"1","location_lon":"3"}"#,
        )
        .unwrap();
        assert_eq!(observation.location_lat, "1");

        // Case variant of the wrong type still fails the decode
        assert!(WeatherObservation::decode(br#"{"TimeStamp":"now"}"#).is_err());
    }

    #[test]
    fn test_validate_requires_both_coordinates() {
        let mut observation = scenario_observation();
        observation.location_lat.clear();
        assert_eq!(
            observation.validate(),
            Err(ValidationError::MissingLocation {
                field: "location_lat"
            })
        );

        let mut observation = scenario_observation();
        observation.location_lon.clear();
        assert_eq!(
            observation.validate(),
            Err(ValidationError::MissingLocation {
                field: "location_lon"
            })
        );
    }

    #[test]
    fn test_implausible_readings_still_valid() {
        let observation = WeatherObservation {
            temperature_c: -500.0,
            humidity_percent: 250,
            wind_speed_kmh: -3.0,
            weather_code: 99_999,
            ..scenario_observation()
        };
        assert!(observation.is_valid());

        // Whitespace is present, not missing
        let observation = WeatherObservation {
            location_lat: " ".to_string(),
            ..scenario_observation()
        };
        assert!(observation.is_valid());
    }

    #[test]
    fn test_encode_uses_wire_field_names() {
        let body = scenario_observation().encode().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(value["timestamp"], 1_700_000_000i64);
        assert_eq!(value["location_lat"], "12.9");
        assert_eq!(value["location_lon"], "77.6");
        assert_eq!(value["temperature_c"], 28.5);
        assert_eq!(value["humidity_percent"], 60);
        assert_eq!(value["wind_speed_kmh"], 10.2);
        assert_eq!(value["weather_code"], 3);
        assert_eq!(value["collected_at"], 1_700_000_001.5);
        assert_eq!(value.as_object().unwrap().len(), 8);
    }
}
