pub mod command;
pub mod telemetry;

pub use command::CommandError;
pub use telemetry::TelemetryError;
