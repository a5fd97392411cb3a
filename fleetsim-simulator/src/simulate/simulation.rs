use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use fleetsim_api::models::{DeviceSensorMapping, Id, SensorReading};

use crate::configs::Settings;
use crate::services::mapping_cache::{MappingCache, Scope};
use crate::services::sensor_catalog::SensorCatalog;
use crate::services::telemetry_service::{SubmitOptions, TelemetryService};
use crate::simulate::dispatcher::{DispatchOutcome, ReadingDispatcher};
use crate::simulate::generator::ReadingGenerator;

/// What a simulation reports for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Every registered device, re-listed on each tick
    AllDevices,
    Devices(Vec<Id>),
    /// Explicit device-sensor mapping ids
    Sensors(Vec<Id>),
}

impl core::fmt::Display for Target {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Target::AllDevices => write!(f, "all devices"),
            Target::Devices(ids) => write!(f, "devices: {ids:?}"),
            Target::Sensors(ids) => write!(f, "sensors: {ids:?}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub target: Target,
    pub interval: Duration,
    /// Reuse fetched mappings across ticks instead of refetching every tick
    pub use_mapping_cache: bool,
    pub submit: SubmitOptions,
}

impl SimulationConfig {
    pub fn from_settings(settings: &Settings, target: Target) -> Self {
        Self {
            target,
            interval: settings.simulation.interval(),
            use_mapping_cache: settings.simulation.use_mapping_cache,
            submit: SubmitOptions {
                validate: settings.simulation.validate,
                echo_response: settings.simulation.echo_response,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    Idle,
    Running,
    Stopped,
}

/// Counters for one tick.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Devices considered
    pub targets: usize,
    pub dispatched: usize,
    pub failed: usize,
    /// Devices without any mapping
    pub skipped: usize,
    pub readings: usize,
}

/// Periodic reading generator for one [`Target`].
///
/// Owns the mapping cache, the sensor type catalogue and the GPS route
/// cursors, so independent simulations never share state.
pub struct Simulation {
    service: Arc<dyn TelemetryService>,
    config: SimulationConfig,
    cache: MappingCache,
    sensors: SensorCatalog,
    generator: ReadingGenerator,
    dispatcher: ReadingDispatcher,
    state: SimulationState,
}

impl Simulation {
    pub fn new(service: Arc<dyn TelemetryService>, config: SimulationConfig) -> Self {
        Self {
            cache: MappingCache::new(Arc::clone(&service)),
            sensors: SensorCatalog::new(Arc::clone(&service)),
            generator: ReadingGenerator::new(),
            dispatcher: ReadingDispatcher::new(Arc::clone(&service)),
            service,
            config,
            state: SimulationState::Idle,
        }
    }

    pub fn with_generator(mut self, generator: ReadingGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn cache(&self) -> &MappingCache {
        &self.cache
    }

    /// Ticks immediately, then once per interval until `shutdown` fires.
    ///
    /// Ticks run one after another on this task; a tick that outlasts the
    /// interval delays the next one instead of piling up.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        tracing::info!(
            "Starting simulation for {} every {} ms...",
            self.config.target,
            self.config.interval.as_millis()
        );

        self.state = SimulationState::Running;

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let report = self.tick().await;
                    tracing::debug!("tick finished: {:?}", report);
                }
            }
        }

        self.state = SimulationState::Stopped;
        tracing::info!("Simulation for {} stopped", self.config.target);
    }

    /// Runs one tick: resolve targets, generate one reading per mapping and
    /// dispatch per device.
    pub async fn tick(&mut self) -> TickReport {
        let force_refresh = !self.config.use_mapping_cache;
        self.sensors.begin_tick(force_refresh);
        let now = OffsetDateTime::now_utc();

        let mut report = TickReport::default();

        match self.config.target.clone() {
            Target::AllDevices => match self.service.list_devices().await {
                Ok(devices) => {
                    let ids: Vec<Id> = devices.into_iter().map(|device| device.id).collect();
                    self.evict_unlisted(&ids).await;
                    self.tick_devices(&ids, force_refresh, now, &mut report).await;
                }
                Err(e) => tracing::error!("Failed to fetch devices: {}", e),
            },
            Target::Devices(ids) => self.tick_devices(&ids, force_refresh, now, &mut report).await,
            Target::Sensors(ids) => self.tick_sensors(&ids, force_refresh, now, &mut report).await,
        }

        report
    }

    /// Drops cached mappings of devices the service no longer lists.
    async fn evict_unlisted(&self, device_ids: &[Id]) {
        let listed: HashSet<Id> = device_ids.iter().copied().collect();

        let evicted = self
            .cache
            .retain(|scope| match scope {
                Scope::Devices(ids) => ids.iter().all(|id| listed.contains(id)),
                _ => true,
            })
            .await;

        if evicted > 0 {
            tracing::debug!("evicted {} cached mapping entries of removed devices", evicted);
        }
    }

    async fn tick_devices(
        &mut self,
        device_ids: &[Id],
        force_refresh: bool,
        now: OffsetDateTime,
        report: &mut TickReport,
    ) {
        if device_ids.is_empty() {
            tracing::warn!("No devices found.");
            return;
        }

        for &device_id in device_ids {
            report.targets += 1;

            tracing::debug!("Fetching device-sensor mappings for device {}...", device_id);
            let entry = self.cache.resolve(&Scope::devices([device_id]), force_refresh).await;

            if entry.is_empty() {
                tracing::warn!("No mappings found for device {}.", device_id);
                report.skipped += 1;
                continue;
            }

            self.process_device(device_id, &entry.mappings, now, report).await;
        }
    }

    async fn tick_sensors(
        &mut self,
        mapping_ids: &[Id],
        force_refresh: bool,
        now: OffsetDateTime,
        report: &mut TickReport,
    ) {
        let entry = self
            .cache
            .resolve(&Scope::sensors(mapping_ids.iter().copied()), force_refresh)
            .await;

        if entry.is_empty() {
            tracing::warn!("No mappings found for specified sensors.");
            return;
        }

        // one batch per owning device, in first-seen order
        let mut batches: Vec<(Id, Vec<DeviceSensorMapping>)> = Vec::new();
        for mapping in &entry.mappings {
            match batches.iter_mut().find(|(device_id, _)| *device_id == mapping.device_id) {
                Some((_, batch)) => batch.push(mapping.clone()),
                None => batches.push((mapping.device_id, vec![mapping.clone()])),
            }
        }

        for (device_id, mappings) in batches {
            report.targets += 1;
            self.process_device(device_id, &mappings, now, report).await;
        }
    }

    async fn process_device(
        &mut self,
        device_id: Id,
        mappings: &[DeviceSensorMapping],
        now: OffsetDateTime,
        report: &mut TickReport,
    ) {
        let readings = self.generate(mappings, now).await;
        report.readings += readings.len();

        match self.dispatcher.dispatch(device_id, readings, self.config.submit).await {
            DispatchOutcome::Delivered { .. } => report.dispatched += 1,
            DispatchOutcome::Failed => report.failed += 1,
        }
    }

    /// One reading per mapping, all stamped with the tick's nominal time.
    async fn generate(&mut self, mappings: &[DeviceSensorMapping], time: OffsetDateTime) -> Vec<SensorReading> {
        let sensor_ids: Vec<Id> = mappings.iter().map(|mapping| mapping.sensor_id).collect();
        let sensor_types = self.sensors.lookup(&sensor_ids).await;

        mappings
            .iter()
            .zip(sensor_types)
            .map(|(mapping, sensor_type)| SensorReading {
                device_sensor_id: mapping.id,
                value: self.generator.generate(sensor_type.as_deref().unwrap_or_default()),
                time,
            })
            .collect()
    }
}
