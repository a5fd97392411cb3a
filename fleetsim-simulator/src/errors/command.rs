use fleetsim_api::models::Id;

use super::TelemetryError;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown device type '{0}'")]
    UnknownDeviceType(String),

    #[error("Invalid device count '{0}', expected <type>=<count>")]
    InvalidDeviceCount(String),

    #[error("Device \"{0}\" not found")]
    DeviceNotFound(String),

    #[error("Nothing to update for sensor {0}")]
    EmptyUpdate(Id),

    #[error("Telemetry service error: {0}")]
    Telemetry(#[from] TelemetryError),
}
