use std::collections::HashMap;

use fleetsim_api::models::UNKNOWN_UNIT;

use crate::configs::settings::Settings;

/// Static lookup tables for device types and sensor units.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    device_types: HashMap<String, Vec<String>>,
    sensor_units: HashMap<String, String>,
}

impl Catalog {
    pub fn new<D, U>(device_types: D, sensor_units: U) -> Self
    where
        D: IntoIterator<Item = (String, Vec<String>)>,
        U: IntoIterator<Item = (String, String)>,
    {
        Self {
            device_types: device_types.into_iter().collect(),
            sensor_units: sensor_units.into_iter().collect(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings
                .device_types
                .iter()
                .map(|entry| (entry.name.clone(), entry.sensors.clone())),
            settings
                .sensor_units
                .iter()
                .map(|entry| (entry.sensor_type.clone(), entry.unit.clone())),
        )
    }

    pub fn is_known_device_type(&self, device_type: &str) -> bool {
        self.device_types.contains_key(device_type)
    }

    /// Sensor types every device of `device_type` is registered with.
    pub fn sensors_for(&self, device_type: &str) -> Option<&[String]> {
        self.device_types.get(device_type).map(Vec::as_slice)
    }

    pub fn unit_for(&self, sensor_type: &str) -> &str {
        self.sensor_units
            .get(sensor_type)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_UNIT)
    }
}
