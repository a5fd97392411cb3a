pub mod inventory_service;
pub mod mapping_cache;
pub mod registration_service;
pub mod sensor_catalog;
pub mod telemetry_service;

pub use inventory_service::{InventoryService, MappedSensor};
pub use mapping_cache::{CacheEntry, MappingCache, Scope};
pub use registration_service::{RegisteredDevice, RegistrationService};
pub use sensor_catalog::SensorCatalog;
pub use telemetry_service::{HttpTelemetryService, SubmitOptions, TelemetryService};
