use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use fleetsim_api::models::{GeoPoint, ReadingValue};

use crate::simulate::routes::{ROUTES, RouteCursor};

/// How values for a sensor type are drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueKind {
    Boolean,
    /// Uniform in `[min, max]`, one decimal digit
    Float { min: f64, max: f64 },
    /// Uniform in `[min, max]`
    Integer { min: i64, max: i64 },
    Gps,
}

const FALLBACK: ValueKind = ValueKind::Float { min: 1.0, max: 100.0 };

impl ValueKind {
    pub fn of(sensor_type: &str) -> Self {
        match sensor_type {
            "Camera" | "Door Sensor" | "Motion Sensors" | "Blind Spot Detection" | "Lane Departure Warning" => {
                ValueKind::Boolean
            }
            // meters
            "LiDAR" => ValueKind::Float { min: 0.5, max: 30.0 },
            "Radar" => ValueKind::Float { min: 1.0, max: 200.0 },
            // m/s²
            "IMU" => ValueKind::Float { min: -5.0, max: 5.0 },
            // °C
            "Temperature" => ValueKind::Float { min: -20.0, max: 50.0 },
            "Engine Temperature" => ValueKind::Float { min: 70.0, max: 110.0 },
            "Cargo Temperature" => ValueKind::Float { min: -25.0, max: 25.0 },
            // psi
            "Tire Pressure" => ValueKind::Float { min: 25.0, max: 45.0 },
            "Oil Pressure" => ValueKind::Float { min: 20.0, max: 80.0 },
            // km/h
            "Speed" => ValueKind::Float { min: 0.0, max: 120.0 },
            // mm/s
            "Vibration" => ValueKind::Float { min: 0.0, max: 50.0 },
            // rpm
            "Wheel Speed" => ValueKind::Integer { min: 0, max: 250 },
            // systolic mmHg
            "Blood Pressure" => ValueKind::Integer { min: 80, max: 180 },
            "SpO2" => ValueKind::Integer { min: 90, max: 100 },
            // kg
            "Cargo Weight" => ValueKind::Integer { min: 100, max: 5000 },
            "Fuel Level" | "Cargo Humidity" => ValueKind::Integer { min: 0, max: 100 },
            "GPS" => ValueKind::Gps,
            _ => FALLBACK,
        }
    }
}

/// Produces plausible sensor values. GPS values follow per-city routes, so
/// the generator owns the route cursors.
pub struct ReadingGenerator {
    rng: StdRng,
    routes: RouteCursor,
}

impl Default for ReadingGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadingGenerator {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            routes: RouteCursor::new(),
        }
    }

    pub fn generate(&mut self, sensor_type: &str) -> ReadingValue {
        self.sample(ValueKind::of(sensor_type))
    }

    pub fn sample(&mut self, kind: ValueKind) -> ReadingValue {
        match kind {
            ValueKind::Boolean => ReadingValue::Boolean(self.rng.random_bool(0.5)),
            ValueKind::Float { min, max } => {
                let value: f64 = self.rng.random_range(min..=max);
                ReadingValue::Float(((value * 10.0).round() / 10.0).clamp(min, max))
            }
            ValueKind::Integer { min, max } => ReadingValue::Integer(self.rng.random_range(min..=max)),
            ValueKind::Gps => ReadingValue::Position(self.gps(None)),
        }
    }

    /// Next point along `city`'s route, or along a random city's route.
    pub fn gps(&mut self, city: Option<&str>) -> GeoPoint {
        let city = match city {
            Some(city) => city,
            None => ROUTES
                .choose(&mut self.rng)
                .map(|route| route.city)
                .unwrap_or_default(),
        };

        self.routes.advance(city)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulate::routes::route;

    const BOUNDED: &[&str] = &[
        "LiDAR",
        "Radar",
        "IMU",
        "Temperature",
        "Engine Temperature",
        "Cargo Temperature",
        "Tire Pressure",
        "Oil Pressure",
        "Speed",
        "Vibration",
        "Wheel Speed",
        "Blood Pressure",
        "SpO2",
        "Cargo Weight",
        "Fuel Level",
        "Cargo Humidity",
        "Gas Detection",
    ];

    #[test]
    fn test_bounded_types_stay_in_range() {
        let mut generator = ReadingGenerator::seeded(7);

        for sensor_type in BOUNDED {
            let kind = ValueKind::of(sensor_type);
            for _ in 0..1000 {
                match (kind, generator.generate(sensor_type)) {
                    (ValueKind::Float { min, max }, ReadingValue::Float(value)) => {
                        assert!(value >= min && value <= max, "{sensor_type}: {value}");
                        assert_eq!((value * 10.0).round() / 10.0, value);
                    }
                    (ValueKind::Integer { min, max }, ReadingValue::Integer(value)) => {
                        assert!(value >= min && value <= max, "{sensor_type}: {value}");
                    }
                    (kind, value) => panic!("{sensor_type}: {kind:?} produced {value:?}"),
                }
            }
        }
    }

    #[test]
    fn test_boolean_types() {
        let mut generator = ReadingGenerator::seeded(1);

        let values: Vec<ReadingValue> = (0..200).map(|_| generator.generate("Camera")).collect();

        assert!(values.iter().all(|value| matches!(value, ReadingValue::Boolean(_))));
        assert!(values.contains(&ReadingValue::Boolean(true)));
        assert!(values.contains(&ReadingValue::Boolean(false)));
    }

    #[test]
    fn test_unknown_type_falls_back() {
        assert_eq!(ValueKind::of("Flux Capacitor"), FALLBACK);
        assert_eq!(ValueKind::of(""), FALLBACK);
        assert_eq!(ValueKind::of("gps"), FALLBACK);
    }

    #[test]
    fn test_gps_follows_city_route() {
        let mut generator = ReadingGenerator::seeded(3);
        let toronto = route("Toronto");

        for cycle in 0..2 {
            for index in 0..toronto.len() {
                generator.gps(Some("Ottawa"));
                assert_eq!(generator.gps(Some("Toronto")), toronto.point(index), "cycle {cycle}");
            }
        }
    }

    #[test]
    fn test_random_gps_stays_on_known_routes() {
        let mut generator = ReadingGenerator::seeded(11);

        for _ in 0..50 {
            let ReadingValue::Position(point) = generator.generate("GPS") else {
                panic!("GPS must produce a position");
            };
            let on_route = ROUTES
                .iter()
                .flat_map(|route| route.waypoints.iter())
                .any(|&(lon, lat)| point == GeoPoint { lat, lon });
            assert!(on_route);
        }
    }
}
