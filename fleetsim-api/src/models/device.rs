use serde::{Deserialize, Serialize};

use super::Id;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Device identifier
    pub id: Id,
    /// Human readable device name
    pub name: String,
    /// Device type label, one of the configured device types
    #[serde(rename = "type")]
    pub device_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDeviceRequest {
    /// Device name
    pub name: String,
    /// Device type label
    #[serde(rename = "type")]
    pub device_type: String,
}
