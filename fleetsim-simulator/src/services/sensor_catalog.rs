use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use fleetsim_api::models::Id;

use crate::services::telemetry_service::TelemetryService;

/// Sensor id to sensor type lookup used to pick a value generator per
/// mapping.
pub struct SensorCatalog {
    service: Arc<dyn TelemetryService>,
    types: HashMap<Id, String>,
    /// Ids a successful fetch did not list. Cleared by the next fetch.
    absent: HashSet<Id>,
    stale: bool,
    refreshed: bool,
}

impl SensorCatalog {
    pub fn new(service: Arc<dyn TelemetryService>) -> Self {
        Self {
            service,
            types: HashMap::new(),
            absent: HashSet::new(),
            stale: true,
            refreshed: false,
        }
    }

    /// Starts a tick. With `force_refresh` the next lookup refetches the
    /// sensor list; at most one fetch happens per tick either way.
    pub fn begin_tick(&mut self, force_refresh: bool) {
        self.stale |= force_refresh;
        self.refreshed = false;
    }

    /// Sensor types for `sensor_ids`, in the same order. Unknown ids map to `None`.
    ///
    /// An id the service did not list is not fetched for again until a
    /// forced refresh or another unseen id triggers the next fetch.
    pub async fn lookup(&mut self, sensor_ids: &[Id]) -> Vec<Option<String>> {
        let missing = sensor_ids
            .iter()
            .any(|id| !self.types.contains_key(id) && !self.absent.contains(id));

        if (self.stale || missing) && !self.refreshed && self.refresh().await {
            let unlisted: Vec<Id> = sensor_ids
                .iter()
                .filter(|id| !self.types.contains_key(id))
                .copied()
                .collect();
            if !unlisted.is_empty() {
                tracing::warn!("Sensors {:?} are not registered", unlisted);
            }
            self.absent.extend(unlisted);
        }

        sensor_ids
            .iter()
            .map(|id| self.types.get(id).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    async fn refresh(&mut self) -> bool {
        self.refreshed = true;

        match self.service.list_sensors().await {
            Ok(sensors) => {
                self.types = sensors
                    .into_iter()
                    .map(|sensor| (sensor.id, sensor.sensor_type))
                    .collect();
                self.absent.clear();
                self.stale = false;
                true
            }
            Err(e) => {
                tracing::error!("Failed to fetch sensors: {}", e);
                false
            }
        }
    }
}
