use std::sync::Arc;

use fleetsim_api::models::{Device, Id, Sensor};

use crate::errors::CommandError;
use crate::services::mapping_cache::{MappingCache, Scope};
use crate::services::telemetry_service::TelemetryService;

/// One sensor attached to a device, as listed by `get-device-mappings`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedSensor {
    pub mapping_id: Id,
    pub sensor_id: Id,
    /// `None` when the sensor is no longer registered
    pub sensor_type: Option<String>,
}

impl core::fmt::Display for MappedSensor {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "Sensor: {}, Mapping ID: {}",
            self.sensor_type.as_deref().unwrap_or("Unknown Sensor"),
            self.mapping_id
        )
    }
}

/// Read-only queries over the registered fleet.
pub struct InventoryService {
    service: Arc<dyn TelemetryService>,
    cache: MappingCache,
}

impl InventoryService {
    pub fn new(service: Arc<dyn TelemetryService>) -> Self {
        Self {
            cache: MappingCache::new(Arc::clone(&service)),
            service,
        }
    }

    pub async fn list_devices(&self) -> Result<Vec<Device>, CommandError> {
        Ok(self.service.list_devices().await?)
    }

    pub async fn list_sensors(&self) -> Result<Vec<Sensor>, CommandError> {
        Ok(self.service.list_sensors().await?)
    }

    /// Sensors mapped to the device called `device_name`, in mapping order.
    pub async fn device_mappings(&self, device_name: &str, force_refresh: bool) -> Result<Vec<MappedSensor>, CommandError> {
        let device = self
            .service
            .list_devices()
            .await?
            .into_iter()
            .find(|device| device.name == device_name)
            .ok_or_else(|| CommandError::DeviceNotFound(device_name.to_string()))?;

        let entry = self.cache.resolve(&Scope::AllDevices, force_refresh).await;
        let mappings: Vec<_> = entry
            .mappings
            .iter()
            .filter(|mapping| mapping.device_id == device.id)
            .collect();

        if mappings.is_empty() {
            return Ok(Vec::new());
        }

        let sensors = self.service.list_sensors().await?;

        Ok(mappings
            .into_iter()
            .map(|mapping| MappedSensor {
                mapping_id: mapping.id,
                sensor_id: mapping.sensor_id,
                sensor_type: sensors
                    .iter()
                    .find(|sensor| sensor.id == mapping.sensor_id)
                    .map(|sensor| sensor.sensor_type.clone()),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTelemetryService;

    #[tokio::test]
    async fn test_device_mappings_joins_sensor_types() {
        let service = Arc::new(MockTelemetryService::new());
        let car = service.add_device("car #1", "car");
        let truck = service.add_device("truck #1", "truck");
        let gps = service.add_sensor("GPS", "coordinates");
        let speed = service.add_sensor("Speed", "km/h");
        let first = service.add_mapping(car.id, gps.id);
        service.add_mapping(truck.id, gps.id);
        let second = service.add_mapping(car.id, speed.id);
        let inventory = InventoryService::new(service.clone());

        let mapped = inventory.device_mappings("car #1", false).await.unwrap();

        assert_eq!(
            mapped,
            vec![
                MappedSensor { mapping_id: first.id, sensor_id: gps.id, sensor_type: Some("GPS".to_string()) },
                MappedSensor { mapping_id: second.id, sensor_id: speed.id, sensor_type: Some("Speed".to_string()) },
            ]
        );
        assert_eq!(mapped[0].to_string(), format!("Sensor: GPS, Mapping ID: {}", first.id));
    }

    #[tokio::test]
    async fn test_unknown_device_name() {
        let service = Arc::new(MockTelemetryService::new());
        service.add_device("car #1", "car");
        let inventory = InventoryService::new(service);

        let result = inventory.device_mappings("car #2", false).await;

        assert!(matches!(result, Err(CommandError::DeviceNotFound(ref name)) if name == "car #2"));
    }

    #[tokio::test]
    async fn test_device_without_sensors() {
        let service = Arc::new(MockTelemetryService::new());
        service.add_device("car #1", "car");
        let inventory = InventoryService::new(service.clone());

        let mapped = inventory.device_mappings("car #1", false).await.unwrap();

        assert!(mapped.is_empty());
        assert_eq!(service.sensor_fetches(), 0);
    }

    #[tokio::test]
    async fn test_missing_sensor_is_unknown() {
        let service = Arc::new(MockTelemetryService::new());
        let car = service.add_device("car #1", "car");
        service.add_mapping(car.id, 42);
        let inventory = InventoryService::new(service);

        let mapped = inventory.device_mappings("car #1", false).await.unwrap();

        assert_eq!(mapped[0].sensor_type, None);
        assert!(mapped[0].to_string().starts_with("Sensor: Unknown Sensor"));
    }

    #[tokio::test]
    async fn test_mappings_cached_between_lookups() {
        let service = Arc::new(MockTelemetryService::new());
        let car = service.add_device("car #1", "car");
        let gps = service.add_sensor("GPS", "coordinates");
        service.add_mapping(car.id, gps.id);
        let inventory = InventoryService::new(service.clone());

        inventory.device_mappings("car #1", false).await.unwrap();
        inventory.device_mappings("car #1", false).await.unwrap();
        assert_eq!(service.mapping_fetches(), 1);

        inventory.device_mappings("car #1", true).await.unwrap();
        assert_eq!(service.mapping_fetches(), 2);
    }
}
