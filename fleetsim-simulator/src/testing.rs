//! In-memory telemetry service for tests.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use fleetsim_api::models::{Device, DeviceSensorMapping, Id, Sensor, SensorReading, UpdateSensorRequest};

use crate::errors::TelemetryError;
use crate::services::telemetry_service::{SubmitOptions, TelemetryService};

/// A reading batch accepted by [`MockTelemetryService`].
#[derive(Debug, Clone)]
pub struct Submission {
    pub device_id: Id,
    pub readings: Vec<SensorReading>,
    pub options: SubmitOptions,
}

#[derive(Default)]
struct MockState {
    devices: Vec<Device>,
    sensors: Vec<Sensor>,
    mappings: Vec<DeviceSensorMapping>,
    submissions: Vec<Submission>,
    next_device_id: Id,
    next_sensor_id: Id,
    next_mapping_id: Id,
    failing_devices: HashSet<Id>,
    offline: bool,
    latency: Option<Duration>,
    device_fetches: usize,
    sensor_fetches: usize,
    mapping_fetches: usize,
}

/// Behaves like the telemetry API: unique device names, unique sensor types
/// and unique device-sensor pairs, answering conflicts with `409`.
#[derive(Default)]
pub struct MockTelemetryService {
    state: Mutex<MockState>,
}

fn conflict(body: impl Into<String>) -> TelemetryError {
    TelemetryError::Status {
        status: 409,
        body: body.into(),
    }
}

fn not_found(body: impl Into<String>) -> TelemetryError {
    TelemetryError::Status {
        status: 404,
        body: body.into(),
    }
}

impl MockTelemetryService {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_device(&self, name: &str, device_type: &str) -> Device {
        let mut state = self.state();
        state.next_device_id += 1;

        let device = Device {
            id: state.next_device_id,
            name: name.to_string(),
            device_type: device_type.to_string(),
        };
        state.devices.push(device.clone());

        device
    }

    pub fn add_sensor(&self, sensor_type: &str, unit: &str) -> Sensor {
        let mut state = self.state();
        state.next_sensor_id += 1;

        let sensor = Sensor {
            id: state.next_sensor_id,
            sensor_type: sensor_type.to_string(),
            unit: unit.to_string(),
        };
        state.sensors.push(sensor.clone());

        sensor
    }

    pub fn add_mapping(&self, device_id: Id, sensor_id: Id) -> DeviceSensorMapping {
        let mut state = self.state();
        state.next_mapping_id += 1;

        let mapping = DeviceSensorMapping {
            id: state.next_mapping_id,
            device_id,
            sensor_id,
        };
        state.mappings.push(mapping.clone());

        mapping
    }

    /// Replaces all mappings, keeping the given ids.
    pub fn set_mappings(&self, mappings: Vec<DeviceSensorMapping>) {
        let mut state = self.state();
        state.next_mapping_id = mappings.iter().map(|m| m.id).max().unwrap_or(0);
        state.mappings = mappings;
    }

    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    /// Delays every reading submission by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.state().latency = Some(latency);
    }

    pub fn fail_submissions_for(&self, device_id: Id) {
        self.state().failing_devices.insert(device_id);
    }

    pub fn devices(&self) -> Vec<Device> {
        self.state().devices.clone()
    }

    pub fn sensors(&self) -> Vec<Sensor> {
        self.state().sensors.clone()
    }

    pub fn mappings(&self) -> Vec<DeviceSensorMapping> {
        self.state().mappings.clone()
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.state().submissions.clone()
    }

    pub fn device_fetches(&self) -> usize {
        self.state().device_fetches
    }

    pub fn sensor_fetches(&self) -> usize {
        self.state().sensor_fetches
    }

    pub fn mapping_fetches(&self) -> usize {
        self.state().mapping_fetches
    }

    fn online(&self) -> Result<MutexGuard<'_, MockState>, TelemetryError> {
        let state = self.state();

        if state.offline {
            return Err(TelemetryError::Status {
                status: 503,
                body: String::from("service unavailable"),
            });
        }

        Ok(state)
    }
}

#[async_trait]
impl TelemetryService for MockTelemetryService {
    async fn list_devices(&self) -> Result<Vec<Device>, TelemetryError> {
        let mut state = self.online()?;
        state.device_fetches += 1;

        Ok(state.devices.clone())
    }

    async fn list_sensors(&self) -> Result<Vec<Sensor>, TelemetryError> {
        let mut state = self.online()?;
        state.sensor_fetches += 1;

        Ok(state.sensors.clone())
    }

    async fn list_device_sensor_mappings(&self, device_id: Option<Id>) -> Result<Vec<DeviceSensorMapping>, TelemetryError> {
        let mut state = self.online()?;
        state.mapping_fetches += 1;

        Ok(state
            .mappings
            .iter()
            .filter(|mapping| device_id.is_none_or(|id| mapping.device_id == id))
            .cloned()
            .collect())
    }

    async fn submit_readings(
        &self,
        device_id: Id,
        readings: &[SensorReading],
        options: SubmitOptions,
    ) -> Result<Option<serde_json::Value>, TelemetryError> {
        let latency = self.state().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.online()?;

        if state.failing_devices.contains(&device_id) {
            return Err(TelemetryError::Status {
                status: 500,
                body: format!("cannot store readings for device {device_id}"),
            });
        }

        if options.validate {
            let foreign = readings.iter().find(|reading| {
                !state
                    .mappings
                    .iter()
                    .any(|mapping| mapping.id == reading.device_sensor_id && mapping.device_id == device_id)
            });

            if let Some(reading) = foreign {
                return Err(TelemetryError::Status {
                    status: 400,
                    body: format!(
                        "device-sensor {} does not belong to device {device_id}",
                        reading.device_sensor_id
                    ),
                });
            }
        }

        state.submissions.push(Submission {
            device_id,
            readings: readings.to_vec(),
            options,
        });

        Ok(options.echo_response.then(|| {
            json!({
                "device_id": device_id,
                "stored": readings.len(),
                "readings": readings,
            })
        }))
    }

    async fn register_device(&self, name: &str, device_type: &str) -> Result<Device, TelemetryError> {
        {
            let state = self.online()?;
            if state.devices.iter().any(|device| device.name == name) {
                return Err(conflict(format!("device '{name}' already exists")));
            }
        }

        Ok(self.add_device(name, device_type))
    }

    async fn delete_device(&self, device_id: Id) -> Result<(), TelemetryError> {
        let mut state = self.online()?;

        let before = state.devices.len();
        state.devices.retain(|device| device.id != device_id);
        if state.devices.len() == before {
            return Err(not_found(format!("device {device_id} not found")));
        }

        state.mappings.retain(|mapping| mapping.device_id != device_id);

        Ok(())
    }

    async fn register_sensor(&self, sensor_type: &str, unit: &str) -> Result<Sensor, TelemetryError> {
        {
            let state = self.online()?;
            if state.sensors.iter().any(|sensor| sensor.sensor_type == sensor_type) {
                return Err(conflict(format!("sensor '{sensor_type}' already exists")));
            }
        }

        Ok(self.add_sensor(sensor_type, unit))
    }

    async fn update_sensor(&self, sensor_id: Id, update: &UpdateSensorRequest) -> Result<Sensor, TelemetryError> {
        let mut state = self.online()?;

        let sensor = state
            .sensors
            .iter_mut()
            .find(|sensor| sensor.id == sensor_id)
            .ok_or_else(|| not_found(format!("sensor {sensor_id} not found")))?;

        if let Some(sensor_type) = &update.sensor_type {
            sensor.sensor_type = sensor_type.clone();
        }
        if let Some(unit) = &update.unit {
            sensor.unit = unit.clone();
        }

        Ok(sensor.clone())
    }

    async fn map_sensor_to_device(&self, device_id: Id, sensor_id: Id) -> Result<(), TelemetryError> {
        {
            let state = self.online()?;
            if !state.devices.iter().any(|device| device.id == device_id) {
                return Err(not_found(format!("device {device_id} not found")));
            }
            if !state.sensors.iter().any(|sensor| sensor.id == sensor_id) {
                return Err(not_found(format!("sensor {sensor_id} not found")));
            }
            if state
                .mappings
                .iter()
                .any(|mapping| mapping.device_id == device_id && mapping.sensor_id == sensor_id)
            {
                return Err(conflict(format!("sensor {sensor_id} already mapped to device {device_id}")));
            }
        }

        self.add_mapping(device_id, sensor_id);

        Ok(())
    }

    async fn unmap_sensor_from_device(&self, device_id: Id, sensor_id: Id) -> Result<(), TelemetryError> {
        let mut state = self.online()?;

        let before = state.mappings.len();
        state
            .mappings
            .retain(|mapping| !(mapping.device_id == device_id && mapping.sensor_id == sensor_id));

        if state.mappings.len() == before {
            return Err(not_found(format!("sensor {sensor_id} is not mapped to device {device_id}")));
        }

        Ok(())
    }
}
