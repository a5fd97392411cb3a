use std::sync::Arc;

use uuid::Uuid;

use fleetsim_api::models::{Device, Id, Sensor, UpdateSensorRequest};

use crate::configs::Catalog;
use crate::errors::CommandError;
use crate::services::telemetry_service::TelemetryService;

/// A device together with the sensors attached to it during registration.
#[derive(Debug, Clone)]
pub struct RegisteredDevice {
    pub device: Device,
    pub sensors: Vec<Sensor>,
}

/// Splits `"train=2, truck=1 car=3"` into tokens, keeping quoted runs
/// together so `"warehouse robot"=2` survives.
fn tokens(list: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in list.chars() {
        match c {
            '"' => quoted = !quoted,
            c if !quoted && (c == ',' || c.is_whitespace()) => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

pub fn parse_device_count(token: &str) -> Result<(String, usize), CommandError> {
    let invalid = || CommandError::InvalidDeviceCount(token.to_string());

    let (device_type, count) = token.split_once('=').ok_or_else(invalid)?;
    let device_type = device_type.trim();
    if device_type.is_empty() {
        return Err(invalid());
    }

    let count = count.trim().parse::<usize>().map_err(|_| invalid())?;

    Ok((device_type.to_string(), count))
}

/// Parses a `type=count` list. Every token is parsed on its own, so one
/// malformed token does not hide the others.
pub fn parse_device_counts(list: &str) -> Vec<Result<(String, usize), CommandError>> {
    tokens(list).iter().map(|token| parse_device_count(token)).collect()
}

pub struct RegistrationService {
    service: Arc<dyn TelemetryService>,
    catalog: Arc<Catalog>,
}

impl RegistrationService {
    pub fn new(service: Arc<dyn TelemetryService>, catalog: Arc<Catalog>) -> Self {
        Self { service, catalog }
    }

    /// Registers one device and, when `with_sensors` is set, every sensor
    /// type its device type requires.
    pub async fn register_device(
        &self,
        name: &str,
        device_type: &str,
        with_sensors: bool,
    ) -> Result<RegisteredDevice, CommandError> {
        if !self.catalog.is_known_device_type(device_type) {
            tracing::warn!("Unknown device type '{}'", device_type);
            return Err(CommandError::UnknownDeviceType(device_type.to_string()));
        }

        let device = self.service.register_device(name, device_type).await?;
        tracing::info!("Registered: {} (ID: {})", device.name, device.id);

        let sensors = if with_sensors {
            self.attach_device_type_sensors(&device).await
        } else {
            Vec::new()
        };

        Ok(RegisteredDevice { device, sensors })
    }

    /// Registers `count` devices per type, named `"<type> #<uuid>"`.
    pub async fn register_devices(&self, list: &str) -> Vec<RegisteredDevice> {
        let mut registered = Vec::new();

        for parsed in parse_device_counts(list) {
            let (device_type, count) = match parsed {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!("{}", e);
                    continue;
                }
            };

            if !self.catalog.is_known_device_type(&device_type) {
                tracing::warn!("Unknown device type '{}'", device_type);
                continue;
            }

            for _ in 0..count {
                let name = format!("{} #{}", device_type, Uuid::new_v4());

                match self.register_device(&name, &device_type, true).await {
                    Ok(device) => registered.push(device),
                    Err(e) => tracing::error!("Failed to register device {}: {}", name, e),
                }
            }
        }

        registered
    }

    /// Registers a sensor type. An already registered type is not an error:
    /// it is logged and `None` is returned.
    pub async fn register_sensor(&self, sensor_type: &str, unit: Option<&str>) -> Option<Sensor> {
        let unit = unit.unwrap_or_else(|| self.catalog.unit_for(sensor_type));

        match self.service.register_sensor(sensor_type, unit).await {
            Ok(sensor) => {
                tracing::info!("Sensor '{}' added with unit: {}", sensor.sensor_type, sensor.unit);
                Some(sensor)
            }
            Err(e) => {
                tracing::warn!("Sensor '{}' might already exist.", sensor_type);
                tracing::debug!("register sensor '{}': {}", sensor_type, e);
                None
            }
        }
    }

    /// Maps `sensor_id` to `device_id` unless that pair is mapped already.
    /// Returns whether a new mapping was created.
    pub async fn attach_sensor(&self, device_id: Id, sensor_id: Id) -> Result<bool, CommandError> {
        let existing = self.service.list_device_sensor_mappings(Some(device_id)).await?;

        if existing.iter().any(|mapping| mapping.sensor_id == sensor_id) {
            tracing::info!("Sensor {} is already attached to device {}", sensor_id, device_id);
            return Ok(false);
        }

        self.service.map_sensor_to_device(device_id, sensor_id).await?;
        tracing::info!("Sensor {} attached to device {}", sensor_id, device_id);

        Ok(true)
    }

    pub async fn detach_sensor(&self, device_id: Id, sensor_id: Id) -> Result<(), CommandError> {
        self.service.unmap_sensor_from_device(device_id, sensor_id).await?;
        tracing::info!("Sensor {} detached from device {}", sensor_id, device_id);

        Ok(())
    }

    pub async fn delete_device(&self, device_id: Id) -> Result<(), CommandError> {
        self.service.delete_device(device_id).await?;
        tracing::info!("Successfully deleted device with id: {}", device_id);

        Ok(())
    }

    pub async fn update_sensor(
        &self,
        sensor_id: Id,
        sensor_type: Option<String>,
        unit: Option<String>,
    ) -> Result<Sensor, CommandError> {
        let update = UpdateSensorRequest { sensor_type, unit };
        if update.is_empty() {
            return Err(CommandError::EmptyUpdate(sensor_id));
        }

        let sensor = self.service.update_sensor(sensor_id, &update).await?;
        tracing::info!("Sensor {} updated: {} ({})", sensor.id, sensor.sensor_type, sensor.unit);

        Ok(sensor)
    }

    /// Registers and maps the sensors of the device's type. A sensor type the
    /// service already knows is mapped through its existing sensor; any other
    /// failure skips that sensor.
    async fn attach_device_type_sensors(&self, device: &Device) -> Vec<Sensor> {
        let Some(sensor_types) = self.catalog.sensors_for(&device.device_type) else {
            return Vec::new();
        };

        tracing::info!(
            "Registering and mapping {} sensors for device {}...",
            sensor_types.len(),
            device.id
        );

        let mut known: Option<Vec<Sensor>> = None;
        let mut attached = Vec::new();

        for sensor_type in sensor_types {
            let sensor = match self.register_sensor(sensor_type, None).await {
                Some(sensor) => sensor,
                None => {
                    if known.is_none() {
                        known = match self.service.list_sensors().await {
                            Ok(sensors) => Some(sensors),
                            Err(e) => {
                                tracing::error!("Failed to fetch sensors: {}", e);
                                Some(Vec::new())
                            }
                        };
                    }

                    match known
                        .iter()
                        .flatten()
                        .find(|sensor| &sensor.sensor_type == sensor_type)
                    {
                        Some(sensor) => sensor.clone(),
                        None => continue,
                    }
                }
            };

            match self.service.map_sensor_to_device(device.id, sensor.id).await {
                Ok(()) => attached.push(sensor),
                Err(e) => tracing::error!("Failed to map sensor {} to device {}: {}", sensor.id, device.id, e),
            }
        }

        attached
    }
}
