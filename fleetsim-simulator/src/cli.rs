use clap::{Args, Parser, Subcommand};

use fleetsim_api::models::Id;

#[derive(Debug, Parser)]
#[command(name = "fleetsim")]
#[command(about = "Registers simulated devices and streams sensor readings to a telemetry service")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Dispatch switches shared by the device simulations.
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct SimulateFlags {
    /// Fetch fresh device-sensor mappings before each round of readings
    #[arg(long)]
    pub no_mapping_cache: bool,

    /// Skip validation of sensor mappings
    #[arg(long)]
    pub no_validation: bool,

    /// Suppress the response body from the server
    #[arg(long)]
    pub no_response_body: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register multiple devices with their sensors (e.g. train=2,truck=1,car=3)
    RegisterDevices { devices: String },

    /// Register a single device
    RegisterDevice {
        name: String,

        #[arg(value_name = "TYPE")]
        device_type: String,

        /// Do not register and map the device type's sensors
        #[arg(long)]
        no_sensors: bool,
    },

    /// Delete a device
    DeleteDevice { id: Id },

    /// Add a new sensor type (e.g. "CO2 Sensor" ppm)
    AddSensor {
        #[arg(value_name = "TYPE")]
        sensor_type: String,

        /// Defaults to the configured unit for the type
        unit: Option<String>,
    },

    /// Update the type and/or unit of a sensor
    UpdateSensor {
        #[arg(short = 'i', long)]
        sensor_id: Id,

        #[arg(short = 't', long = "type")]
        sensor_type: Option<String>,

        #[arg(short, long)]
        unit: Option<String>,
    },

    /// Attach the sensor to the device
    AttachDeviceSensor {
        #[arg(short, long)]
        device_id: Id,

        #[arg(short = 'i', long)]
        sensor_id: Id,
    },

    /// Detach the sensor from the device
    DetachDeviceSensor {
        #[arg(short, long)]
        device_id: Id,

        #[arg(short = 'i', long)]
        sensor_id: Id,
    },

    /// List registered devices
    ListDevices,

    /// List registered sensors
    ListSensors,

    /// List the sensors mapped to a device
    GetDeviceMappings { device_name: String },

    /// Simulate readings for all devices
    SimulateReadingsForAllDevices {
        #[command(flatten)]
        flags: SimulateFlags,
    },

    /// Simulate readings for specific devices (comma separated ids)
    SimulateReadingsForSpecifiedDevices {
        #[arg(value_delimiter = ',', required = true)]
        device_ids: Vec<Id>,

        #[command(flatten)]
        flags: SimulateFlags,
    },

    /// Simulate readings for specific device-sensor mappings (comma separated ids)
    SimulateReadingsForSpecifiedSensors {
        #[arg(value_delimiter = ',', required = true)]
        device_sensor_ids: Vec<Id>,

        /// Fetch fresh device-sensor mappings before each round of readings
        #[arg(long)]
        no_mapping_cache: bool,
    },
}
