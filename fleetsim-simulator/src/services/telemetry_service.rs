use async_trait::async_trait;
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;

use fleetsim_api::models::{
    CreateDeviceRequest, CreateMappingRequest, CreateSensorRequest, Device, DeviceSensorMapping, Id, Sensor,
    SensorReading, SubmitReadingsRequest, UpdateSensorRequest,
};

use crate::configs::Api;
use crate::errors::TelemetryError;

/// Per-batch switches forwarded with a reading submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Service checks that each `device_sensor_id` belongs to the device
    pub validate: bool,
    /// Service echoes the stored readings back
    pub echo_response: bool,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            validate: true,
            echo_response: true,
        }
    }
}

/// Remote telemetry API the simulator registers against and reports to.
#[async_trait]
pub trait TelemetryService: Send + Sync {
    async fn list_devices(&self) -> Result<Vec<Device>, TelemetryError>;

    async fn list_sensors(&self) -> Result<Vec<Sensor>, TelemetryError>;

    /// All mappings, or only those of `device_id` when given.
    async fn list_device_sensor_mappings(&self, device_id: Option<Id>) -> Result<Vec<DeviceSensorMapping>, TelemetryError>;

    /// Submits one device's batch. Returns the echoed payload when one was requested and sent.
    async fn submit_readings(
        &self,
        device_id: Id,
        readings: &[SensorReading],
        options: SubmitOptions,
    ) -> Result<Option<serde_json::Value>, TelemetryError>;

    async fn register_device(&self, name: &str, device_type: &str) -> Result<Device, TelemetryError>;

    async fn delete_device(&self, device_id: Id) -> Result<(), TelemetryError>;

    async fn register_sensor(&self, sensor_type: &str, unit: &str) -> Result<Sensor, TelemetryError>;

    async fn update_sensor(&self, sensor_id: Id, update: &UpdateSensorRequest) -> Result<Sensor, TelemetryError>;

    async fn map_sensor_to_device(&self, device_id: Id, sensor_id: Id) -> Result<(), TelemetryError>;

    async fn unmap_sensor_from_device(&self, device_id: Id, sensor_id: Id) -> Result<(), TelemetryError>;
}

/// [`TelemetryService`] speaking JSON over HTTP.
pub struct HttpTelemetryService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTelemetryService {
    pub fn new(api: &Api) -> Result<Self, TelemetryError> {
        Url::parse(&api.base_url).map_err(|_| TelemetryError::InvalidUrl(api.base_url.clone()))?;

        let client = reqwest::Client::builder()
            .timeout(api.timeout())
            .connect_timeout(api.connect_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn check(response: Response) -> Result<Response, TelemetryError> {
        let status = response.status();

        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(TelemetryError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn read<T: DeserializeOwned>(response: Response) -> Result<T, TelemetryError> {
        let bytes = Self::check(response).await?.bytes().await?;

        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl TelemetryService for HttpTelemetryService {
    async fn list_devices(&self) -> Result<Vec<Device>, TelemetryError> {
        let response = self.client.get(self.url("devices")).send().await?;
        Self::read(response).await
    }

    async fn list_sensors(&self) -> Result<Vec<Sensor>, TelemetryError> {
        let response = self.client.get(self.url("sensors")).send().await?;
        Self::read(response).await
    }

    async fn list_device_sensor_mappings(&self, device_id: Option<Id>) -> Result<Vec<DeviceSensorMapping>, TelemetryError> {
        let path = match device_id {
            Some(device_id) => format!("device-sensors/{device_id}"),
            None => String::from("device-sensors"),
        };

        let response = self.client.get(self.url(&path)).send().await?;
        Self::read(response).await
    }

    async fn submit_readings(
        &self,
        device_id: Id,
        readings: &[SensorReading],
        options: SubmitOptions,
    ) -> Result<Option<serde_json::Value>, TelemetryError> {
        let body = SubmitReadingsRequest {
            readings: readings.to_vec(),
            no_validation: !options.validate,
            no_response_body: !options.echo_response,
        };

        let response = self
            .client
            .post(self.url(&format!("sensor-readings/{device_id}")))
            .json(&body)
            .send()
            .await?;
        let text = Self::check(response).await?.text().await?;

        if !options.echo_response || text.is_empty() {
            return Ok(None);
        }

        // The readings are stored once the service answers 2xx, so a body
        // that is not JSON is kept as text instead of failing the batch.
        match serde_json::from_str(&text) {
            Ok(echo) => Ok(Some(echo)),
            Err(e) => {
                tracing::debug!("Readings echo for device {} is not JSON: {}", device_id, e);
                Ok(Some(serde_json::Value::String(text)))
            }
        }
    }

    async fn register_device(&self, name: &str, device_type: &str) -> Result<Device, TelemetryError> {
        let body = CreateDeviceRequest {
            name: name.to_string(),
            device_type: device_type.to_string(),
        };

        let response = self.client.post(self.url("devices")).json(&body).send().await?;
        Self::read(response).await
    }

    async fn delete_device(&self, device_id: Id) -> Result<(), TelemetryError> {
        let response = self
            .client
            .delete(self.url(&format!("devices/{device_id}")))
            .send()
            .await?;
        Self::check(response).await?;

        Ok(())
    }

    async fn register_sensor(&self, sensor_type: &str, unit: &str) -> Result<Sensor, TelemetryError> {
        let body = CreateSensorRequest {
            sensor_type: sensor_type.to_string(),
            unit: unit.to_string(),
        };

        let response = self.client.post(self.url("sensors")).json(&body).send().await?;
        Self::read(response).await
    }

    async fn update_sensor(&self, sensor_id: Id, update: &UpdateSensorRequest) -> Result<Sensor, TelemetryError> {
        let response = self
            .client
            .put(self.url(&format!("sensors/{sensor_id}")))
            .json(update)
            .send()
            .await?;
        Self::read(response).await
    }

    async fn map_sensor_to_device(&self, device_id: Id, sensor_id: Id) -> Result<(), TelemetryError> {
        let body = CreateMappingRequest { device_id, sensor_id };

        let response = self.client.post(self.url("device-sensor")).json(&body).send().await?;
        Self::check(response).await?;

        Ok(())
    }

    async fn unmap_sensor_from_device(&self, device_id: Id, sensor_id: Id) -> Result<(), TelemetryError> {
        let response = self
            .client
            .delete(self.url(&format!("device-sensor/{device_id}/{sensor_id}")))
            .send()
            .await?;
        Self::check(response).await?;

        Ok(())
    }
}
