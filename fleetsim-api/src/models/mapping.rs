use serde::{Deserialize, Serialize};

use super::Id;

/// Attachment of one sensor to one device.
///
/// The mapping `id` is the device-sensor handle readings are submitted
/// against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSensorMapping {
    /// Mapping identifier
    pub id: Id,
    /// Owning device
    pub device_id: Id,
    /// Attached sensor
    pub sensor_id: Id,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMappingRequest {
    /// Device to attach to
    pub device_id: Id,
    /// Sensor to attach
    pub sensor_id: Id,
}
