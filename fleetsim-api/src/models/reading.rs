use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Id;

/// Geographic position emitted by GPS sensors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// A single generated sensor value.
///
/// Serialized untagged, so the wire carries plain JSON booleans, numbers or
/// `{"lat": .., "lon": ..}` objects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReadingValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Position(GeoPoint),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Device-sensor mapping the value belongs to
    pub device_sensor_id: Id,
    /// Generated value
    pub value: ReadingValue,
    /// Sample time
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
}

/// Body of a batched reading submission for one device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReadingsRequest {
    pub readings: Vec<SensorReading>,
    /// Skip the server-side check that every mapping belongs to the device
    #[serde(default)]
    pub no_validation: bool,
    /// Ask the server not to echo the stored readings back
    #[serde(default)]
    pub no_response_body: bool,
}
