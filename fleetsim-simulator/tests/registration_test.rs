use std::path::Path;
use std::sync::Arc;

use fleetsim_simulator::configs::{Catalog, Settings};
use fleetsim_simulator::errors::CommandError;
use fleetsim_simulator::services::{InventoryService, RegistrationService, TelemetryService};

mod common;
use common::mock_app::MockApp;

fn catalog() -> Arc<Catalog> {
    let settings = Settings::load(&Path::new(env!("CARGO_MANIFEST_DIR")).join("configs")).unwrap();
    Arc::new(Catalog::from_settings(&settings))
}

#[tokio::test]
async fn test_register_car_maps_configured_sensors() {
    let app = MockApp::new().await;
    let client = app.client();
    let registration = RegistrationService::new(client.clone(), catalog());
    let inventory = InventoryService::new(client.clone());

    let registered = registration.register_device("car #1", "car", true).await.unwrap();

    let expected = ["Camera", "LiDAR", "Radar", "GPS", "IMU"];
    let attached: Vec<&str> = registered.sensors.iter().map(|s| s.sensor_type.as_str()).collect();
    assert_eq!(attached, expected);
    assert_eq!(app.store.mappings().len(), 5);

    let mapped = inventory.device_mappings("car #1", false).await.unwrap();
    let listed: Vec<&str> = mapped.iter().filter_map(|m| m.sensor_type.as_deref()).collect();
    assert_eq!(listed, expected);
    assert!(mapped.iter().all(|m| m.to_string().starts_with("Sensor: ")));
}

#[tokio::test]
async fn test_sensor_registration_is_idempotent() {
    let app = MockApp::new().await;
    let registration = RegistrationService::new(app.client(), catalog());

    let first = registration.register_sensor("CO2 Sensor", Some("ppm")).await;
    let second = registration.register_sensor("CO2 Sensor", Some("ppm")).await;

    assert!(first.is_some());
    assert!(second.is_none());
    assert_eq!(app.store.sensors().len(), 1);
}

#[tokio::test]
async fn test_bulk_registration_over_http() {
    let app = MockApp::new().await;
    let registration = RegistrationService::new(app.client(), catalog());

    let registered = registration.register_devices("truck=2, spaceship=1").await;

    assert_eq!(registered.len(), 2);
    for device in &registered {
        assert!(device.device.name.starts_with("truck #"));
        assert!(!device.sensors.is_empty());
    }
    // both trucks share the sensors registered by the first one
    let per_truck = registered[0].sensors.len();
    assert_eq!(app.store.sensors().len(), per_truck);
    assert_eq!(app.store.mappings().len(), per_truck * 2);
}

#[tokio::test]
async fn test_unknown_device_type_sends_nothing() {
    let app = MockApp::new().await;
    let registration = RegistrationService::new(app.client(), catalog());

    let result = registration.register_device("ufo #1", "ufo", true).await;

    assert!(matches!(result, Err(CommandError::UnknownDeviceType(_))));
    assert!(app.store.devices().is_empty());
    assert_eq!(app.store.device_fetches(), 0);
}

#[tokio::test]
async fn test_status_errors_carry_the_code() {
    let app = MockApp::new().await;
    let client = app.client();

    let error = client.delete_device(404).await.unwrap_err();
    assert!(error.is_not_found());

    client.register_device("car #1", "car").await.unwrap();
    let error = client.register_device("car #1", "car").await.unwrap_err();
    assert!(error.is_conflict());
}

#[tokio::test]
async fn test_attach_update_and_detach_over_http() {
    let app = MockApp::new().await;
    let client = app.client();
    let registration = RegistrationService::new(client.clone(), catalog());

    let device = client.register_device("robot #1", "warehouse-robot").await.unwrap();
    let sensor = registration.register_sensor("LiDAR", None).await.unwrap();
    assert_eq!(sensor.unit, "m");

    assert!(registration.attach_sensor(device.id, sensor.id).await.unwrap());
    assert!(!registration.attach_sensor(device.id, sensor.id).await.unwrap());

    let updated = registration
        .update_sensor(sensor.id, Some("LiDAR v2".to_string()), None)
        .await
        .unwrap();
    assert_eq!(updated.sensor_type, "LiDAR v2");
    assert_eq!(updated.unit, "m");

    registration.detach_sensor(device.id, sensor.id).await.unwrap();
    assert!(client.list_device_sensor_mappings(Some(device.id)).await.unwrap().is_empty());
}
