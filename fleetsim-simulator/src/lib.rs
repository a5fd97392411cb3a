use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cli::{Command, SimulateFlags};
use crate::configs::{Catalog, Settings};
use crate::errors::CommandError;
use crate::services::{HttpTelemetryService, InventoryService, RegistrationService, TelemetryService};
use crate::simulate::{Simulation, SimulationConfig, Target};

pub mod cli;
pub mod configs;
pub mod errors;
pub mod services;
pub mod simulate;

#[cfg(any(test, feature = "mock"))]
pub mod testing;

pub async fn run(settings: &Arc<Settings>, command: Command) -> anyhow::Result<()> {
    let service: Arc<dyn TelemetryService> = Arc::new(HttpTelemetryService::new(&settings.api)?);

    execute(settings, service, command).await
}

/// Runs one command against `service`.
pub async fn execute(settings: &Settings, service: Arc<dyn TelemetryService>, command: Command) -> anyhow::Result<()> {
    let catalog = Arc::new(Catalog::from_settings(settings));
    let registration = RegistrationService::new(Arc::clone(&service), catalog);
    let inventory = InventoryService::new(Arc::clone(&service));

    match command {
        Command::RegisterDevices { devices } => {
            tracing::info!("Registering devices and sensors...");
            let registered = registration.register_devices(&devices).await;
            tracing::info!("Registered {} devices", registered.len());
        }
        Command::RegisterDevice {
            name,
            device_type,
            no_sensors,
        } => {
            tracing::info!("Registering device: {} (Type: {})", name, device_type);
            match registration.register_device(&name, &device_type, !no_sensors).await {
                // already logged
                Err(CommandError::UnknownDeviceType(_)) => {}
                result => {
                    result?;
                }
            }
        }
        Command::DeleteDevice { id } => registration.delete_device(id).await?,
        Command::AddSensor { sensor_type, unit } => {
            registration.register_sensor(&sensor_type, unit.as_deref()).await;
        }
        Command::UpdateSensor {
            sensor_id,
            sensor_type,
            unit,
        } => {
            registration.update_sensor(sensor_id, sensor_type, unit).await?;
        }
        Command::AttachDeviceSensor { device_id, sensor_id } => {
            registration.attach_sensor(device_id, sensor_id).await?;
        }
        Command::DetachDeviceSensor { device_id, sensor_id } => {
            registration.detach_sensor(device_id, sensor_id).await?
        }
        Command::ListDevices => {
            for device in inventory.list_devices().await? {
                println!("{}\t{}\t{}", device.id, device.name, device.device_type);
            }
        }
        Command::ListSensors => {
            for sensor in inventory.list_sensors().await? {
                println!("{}\t{}\t{}", sensor.id, sensor.sensor_type, sensor.unit);
            }
        }
        Command::GetDeviceMappings { device_name } => {
            tracing::info!("Fetching sensor mappings for device: {}", device_name);
            match inventory.device_mappings(&device_name, false).await {
                Ok(mapped) if mapped.is_empty() => tracing::info!("No sensors mapped to \"{}\".", device_name),
                Ok(mapped) => {
                    println!("Sensors mapped to {device_name}:");
                    for sensor in mapped {
                        println!("{sensor}");
                    }
                }
                Err(CommandError::DeviceNotFound(name)) => tracing::warn!("Device \"{}\" not found.", name),
                Err(e) => return Err(e.into()),
            }
        }
        Command::SimulateReadingsForAllDevices { flags } => {
            simulate(settings, service, Target::AllDevices, flags).await;
        }
        Command::SimulateReadingsForSpecifiedDevices { device_ids, flags } => {
            simulate(settings, service, Target::Devices(device_ids), flags).await;
        }
        Command::SimulateReadingsForSpecifiedSensors {
            device_sensor_ids,
            no_mapping_cache,
        } => {
            let flags = SimulateFlags {
                no_mapping_cache,
                ..SimulateFlags::default()
            };
            simulate(settings, service, Target::Sensors(device_sensor_ids), flags).await;
        }
    }

    Ok(())
}

/// Runs a simulation until Ctrl-C.
async fn simulate(settings: &Settings, service: Arc<dyn TelemetryService>, target: Target, flags: SimulateFlags) {
    let mut config = SimulationConfig::from_settings(settings, target);
    config.use_mapping_cache &= !flags.no_mapping_cache;
    config.submit.validate &= !flags.no_validation;
    config.submit.echo_response &= !flags.no_response_body;

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(tokio::signal::ctrl_c(), shutdown.clone()));

    Simulation::new(service, config).run(shutdown).await;
}

/// Cancels `shutdown` once `signal` fires. If the signal cannot be listened
/// for, the simulation keeps running.
async fn cancel_on_signal<F>(signal: F, shutdown: CancellationToken)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => shutdown.cancel(),
        Err(e) => tracing::error!("Failed to listen for shutdown signal, running until killed: {}", e),
    }
}
