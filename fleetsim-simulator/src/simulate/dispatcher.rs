use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use time::Duration;

use fleetsim_api::models::{Id, SensorReading};

use crate::services::telemetry_service::{SubmitOptions, TelemetryService};

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Delivered { response: Option<serde_json::Value> },
    Failed,
}

impl DispatchOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered { .. })
    }
}

/// Submits reading batches one device at a time. A failed batch is logged
/// and reported, never raised.
pub struct ReadingDispatcher {
    service: Arc<dyn TelemetryService>,
    rng: StdRng,
}

impl ReadingDispatcher {
    pub fn new(service: Arc<dyn TelemetryService>) -> Self {
        Self {
            service,
            rng: StdRng::from_os_rng(),
        }
    }

    pub async fn dispatch(&mut self, device_id: Id, mut readings: Vec<SensorReading>, options: SubmitOptions) -> DispatchOutcome {
        self.jitter(&mut readings);

        match self.service.submit_readings(device_id, &readings, options).await {
            Ok(response) => {
                if let Some(body) = &response {
                    tracing::info!("Sent readings for device {}: {}", device_id, body);
                } else {
                    tracing::info!("Sent {} readings for device {}", readings.len(), device_id);
                }

                DispatchOutcome::Delivered { response }
            }
            Err(e) => {
                tracing::error!("Failed to send sensor readings for device {}: {}", device_id, e);
                DispatchOutcome::Failed
            }
        }
    }

    /// Offsets every reading by 0-999 µs so readings of one tick do not
    /// share a timestamp.
    fn jitter(&mut self, readings: &mut [SensorReading]) {
        for reading in readings {
            reading.time += Duration::microseconds(self.rng.random_range(0..1000));
        }
    }
}
