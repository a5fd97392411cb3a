use std::env;
use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Api {
    pub base_url: String,
    pub timeout_ms: u64,
    pub connect_timeout_ms: u64,
}

impl Api {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    pub interval_ms: u64,
    /// Ask the service to check that every reading belongs to the device it is posted for
    pub validate: bool,
    /// Ask the service to echo stored readings back
    pub echo_response: bool,
    pub use_mapping_cache: bool,
}

impl Simulation {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceTypeEntry {
    pub name: String,
    pub sensors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorUnitEntry {
    #[serde(rename = "type")]
    pub sensor_type: String,
    pub unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub api: Api,
    pub simulation: Simulation,
    #[serde(default)]
    pub device_types: Vec<DeviceTypeEntry>,
    #[serde(default)]
    pub sensor_units: Vec<SensorUnitEntry>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(Path::new("configs"))
    }

    /// Layers `default`, the `RUN_MODE` file and `__`-separated environment
    /// variables found under `dir`.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        let default_path = dir.join("default");
        let mode_path = dir.join(&run_mode);

        let settings: Settings = Config::builder()
            .add_source(File::with_name(&default_path.to_string_lossy()))
            .add_source(File::with_name(&mode_path.to_string_lossy()).required(false))
            .add_source(Environment::default().separator("__"))
            .build()?
            .try_deserialize()?;

        if settings.simulation.interval_ms == 0 {
            return Err(ConfigError::Message("simulation.interval_ms must be greater than zero".into()));
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn configs_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("configs")
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::load(&configs_dir()).unwrap();

        assert_eq!(settings.simulation.interval(), Duration::from_millis(5000));
        assert!(settings.simulation.validate);
        assert!(settings.simulation.echo_response);
        assert!(settings.simulation.use_mapping_cache);
        assert_eq!(settings.api.base_url, "http://localhost:4000/api");
    }

    #[test]
    fn test_default_tables_keep_labels() {
        let settings = Settings::load(&configs_dir()).unwrap();

        let car = settings
            .device_types
            .iter()
            .find(|entry| entry.name == "car")
            .unwrap();
        assert_eq!(car.sensors, vec!["Camera", "LiDAR", "Radar", "GPS", "IMU"]);

        let pitot = settings
            .sensor_units
            .iter()
            .find(|entry| entry.sensor_type == "Air Data (Pitot Tube)")
            .unwrap();
        assert_eq!(pitot.unit, "knots");
    }
}
