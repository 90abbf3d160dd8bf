#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use charge_dispatch::DispatchService;
use charge_dispatch::domain::config::dispatch_config::DispatchConfig;
use charge_dispatch::domain::ground_control::ground_control_mock::MockGroundControl;

pub const VEHICLE_TYPE: &str = "charging";

pub struct VehicleSpec {
    pub id: String,
    pub garage: String,
    pub spots: Vec<(String, String)>,
}

/// `spots` maps aircraft node to service spot.
pub fn vehicle(id: &str, garage: &str, spots: &[(&str, &str)]) -> VehicleSpec {
    VehicleSpec { id: id.to_string(), garage: garage.to_string(), spots: spots.iter().map(|(a, s)| (a.to_string(), s.to_string())).collect() }
}

pub fn push_vehicle(gateway: &MockGroundControl, spec: &VehicleSpec) {
    let spots: Vec<(&str, &str)> = spec.spots.iter().map(|(a, s)| (a.as_str(), s.as_str())).collect();
    gateway.push_vehicle(&spec.id, &spec.garage, &spots);
}

/// Mock ground control plus a service with `vehicles` already registered.
pub async fn setup(vehicles: Vec<VehicleSpec>, config: DispatchConfig) -> (Arc<MockGroundControl>, DispatchService) {
    let gateway = Arc::new(MockGroundControl::default());
    for spec in &vehicles {
        push_vehicle(&gateway, spec);
    }

    let service = DispatchService::new(gateway.clone(), config, VEHICLE_TYPE);
    let registered = service.coordinator().initialize_fleet(vehicles.len()).await;
    assert_eq!(registered, vehicles.len(), "All scripted vehicles should register");

    (gateway, service)
}

/// Virtual time is exact up to timer resolution.
pub fn assert_elapsed(start: Instant, expected: Duration) {
    let elapsed = start.elapsed();
    assert!(elapsed >= expected && elapsed < expected + Duration::from_millis(5), "Expected {:?} to pass, got {:?}", expected, elapsed);
}
