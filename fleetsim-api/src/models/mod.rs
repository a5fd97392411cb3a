mod device;
mod mapping;
mod reading;
mod sensor;

pub use device::*;
pub use mapping::*;
pub use reading::*;
pub use sensor::*;

/// Identifier assigned by the telemetry service.
pub type Id = i64;
