use serde::{Deserialize, Serialize};

use super::Id;

/// Unit reported for sensor types missing from the unit table.
pub const UNKNOWN_UNIT: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensor {
    /// Sensor identifier
    pub id: Id,
    /// Sensor type label, e.g. `GPS` or `Tire Pressure`
    #[serde(rename = "type")]
    pub sensor_type: String,
    /// Unit of measure
    pub unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSensorRequest {
    /// Sensor type label
    #[serde(rename = "type")]
    pub sensor_type: String,
    /// Unit of measure
    pub unit: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSensorRequest {
    /// New sensor type label
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub sensor_type: Option<String>,
    /// New unit of measure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl UpdateSensorRequest {
    pub fn is_empty(&self) -> bool {
        self.sensor_type.is_none() && self.unit.is_none()
    }
}
