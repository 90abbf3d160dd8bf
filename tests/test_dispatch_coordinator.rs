mod common;

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use charge_dispatch::api::admin_dto::AdminConfigDto;
use charge_dispatch::api::charge_dto::{ChargingCompletionRequestDto, ChargingRequestDto, ChargingResponseDto};
use charge_dispatch::domain::config::dispatch_config::DispatchConfig;
use charge_dispatch::domain::utils::id::{NodeId, VehicleId};
use charge_dispatch::domain::vehicle::vehicle::{VehiclePosition, VehicleState};
use charge_dispatch::error::Error;

use common::{assert_elapsed, setup, vehicle};

fn state_of(service: &charge_dispatch::DispatchService, id: &str) -> VehicleState {
    service.coordinator().pool().get(&VehicleId::new(id)).unwrap().state()
}

#[tokio::test(start_paused = true)]
async fn test_request_without_eligible_vehicle_waits() {
    // Setup
    let (gateway, service) = setup(vec![vehicle("V1", "G1", &[("A", "S-A")])], DispatchConfig::default()).await;

    // Execution
    let response = service.request_charging(&ChargingRequestDto::new("B"), &CancellationToken::new()).await.unwrap();

    // Verification
    assert_eq!(response, ChargingResponseDto { wait: true });
    assert_eq!(state_of(&service, "V1"), VehicleState::Free);
    assert!(service.coordinator().sessions().is_empty());
    assert!(gateway.route_queries().is_empty(), "A waiting request must not talk to ground control");
}

#[tokio::test(start_paused = true)]
async fn test_request_when_all_eligible_vehicles_busy_waits() {
    let (_gateway, service) = setup(vec![vehicle("V1", "G1", &[("A", "S1-A"), ("B", "S1-B")])], DispatchConfig::default()).await;
    let cancel = CancellationToken::new();

    let first = service.request_charging(&ChargingRequestDto::new("A"), &cancel).await.unwrap();
    let second = service.request_charging(&ChargingRequestDto::new("B"), &cancel).await.unwrap();

    assert!(!first.wait);
    assert!(second.wait);
    assert_eq!(service.coordinator().sessions().len(), 1);
    assert!(service.coordinator().sessions().get(&NodeId::new("B")).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_complete_without_session_is_not_found() {
    let (gateway, service) = setup(vec![vehicle("V1", "G1", &[("A", "S-A")])], DispatchConfig::default()).await;

    let result = service.complete_charging(&ChargingCompletionRequestDto::new("A")).await;

    match result {
        Err(e) => assert!(e.is_not_found(), "Expected a not-found error, got {:?}", e),
        Ok(()) => panic!("Completion without a session must fail"),
    }
    assert_eq!(state_of(&service, "V1"), VehicleState::Free);
    assert!(gateway.route_queries().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_round_trip_frees_vehicle() {
    // Setup: garage -> X -> spot, and back the same way
    let (gateway, service) = setup(vec![vehicle("V1", "G1", &[("A", "S-A")])], DispatchConfig::default()).await;
    gateway.set_route("G1", "S-A", &["G1", "X", "S-A"]);
    gateway.set_route("S-A", "G1", &["S-A", "X", "G1"]);
    let cancel = CancellationToken::new();

    // Execution: request
    let response = service.request_charging(&ChargingRequestDto::new("A"), &cancel).await.unwrap();

    assert!(!response.wait);
    assert_eq!(state_of(&service, "V1"), VehicleState::Busy);
    assert_eq!(service.coordinator().sessions().get(&NodeId::new("A")), Some(VehicleId::new("V1")));
    let vehicle = service.coordinator().pool().get(&VehicleId::new("V1")).unwrap();
    assert_eq!(vehicle.position(), VehiclePosition::At(NodeId::new("S-A")));

    // Execution: completion
    service.complete_charging(&ChargingCompletionRequestDto::new("A")).await.unwrap();

    // Verification
    assert_eq!(state_of(&service, "V1"), VehicleState::Free);
    assert!(service.coordinator().sessions().is_empty());
    assert_eq!(vehicle.position(), VehiclePosition::At(NodeId::new("G1")));

    let arrived: Vec<String> = gateway.arrivals().into_iter().map(|(_, node)| node.to_string()).collect();
    assert_eq!(arrived, vec!["X", "S-A", "X", "G1"]);

    let again = service.complete_charging(&ChargingCompletionRequestDto::new("A")).await;
    assert!(matches!(again, Err(Error::NoServicingVehicle(_))), "Second completion must be NotFound, got {:?}", again);
}

#[tokio::test(start_paused = true)]
async fn test_completion_without_return_route_frees_immediately() {
    let (gateway, service) = setup(vec![vehicle("V1", "G1", &[("A", "S-A")])], DispatchConfig::default()).await;
    let cancel = CancellationToken::new();
    service.request_charging(&ChargingRequestDto::new("A"), &cancel).await.unwrap();
    let arrivals_before = gateway.arrivals().len();

    gateway.set_route("S-A", "G1", &["S-A"]);
    let start = Instant::now();
    service.complete_charging(&ChargingCompletionRequestDto::new("A")).await.unwrap();

    assert_elapsed(start, Duration::ZERO);
    assert_eq!(gateway.arrivals().len(), arrivals_before);
    assert_eq!(state_of(&service, "V1"), VehicleState::Free);
}

#[tokio::test(start_paused = true)]
async fn test_segment_delay_is_distance_over_speed() {
    // distance 40 at speed 20 -> 2 seconds
    let (gateway, service) = setup(vec![vehicle("V1", "G1", &[("A", "S-A")])], DispatchConfig::new(20.0, 15).unwrap()).await;
    gateway.set_distance("G1", "S-A", 40.0);

    let start = Instant::now();
    let response = service.request_charging(&ChargingRequestDto::new("A"), &CancellationToken::new()).await.unwrap();

    assert!(!response.wait);
    assert_elapsed(start, Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_two_requests_for_single_vehicle() {
    let (_gateway, service) = setup(vec![vehicle("V1", "G1", &[("A", "S-A")])], DispatchConfig::default()).await;
    let cancel = CancellationToken::new();
    let request = ChargingRequestDto::new("A");

    let (first, second) = tokio::join!(service.request_charging(&request, &cancel), service.request_charging(&request, &cancel));

    let mut waits = vec![first.unwrap().wait, second.unwrap().wait];
    waits.sort();
    assert_eq!(waits, vec![false, true], "Exactly one request may get the vehicle");
    assert_eq!(service.coordinator().sessions().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_missing_route_strands_vehicle() {
    let (gateway, service) = setup(vec![vehicle("V1", "G1", &[("A", "S-A")])], DispatchConfig::default()).await;
    gateway.set_route("G1", "S-A", &[]);

    let result = service.request_charging(&ChargingRequestDto::new("A"), &CancellationToken::new()).await;

    assert!(matches!(result, Err(Error::RouteNotFound { .. })), "Expected RouteNotFound, got {:?}", result);
    // No compensation: vehicle and session stay as they were at the failure.
    assert_eq!(state_of(&service, "V1"), VehicleState::Busy);
    assert_eq!(service.coordinator().sessions().get(&NodeId::new("A")), Some(VehicleId::new("V1")));
}

#[tokio::test(start_paused = true)]
async fn test_gateway_failure_mid_route_then_admin_release() {
    let (gateway, service) = setup(vec![vehicle("V1", "G1", &[("A", "S-A")])], DispatchConfig::default()).await;
    gateway.set_route("G1", "S-A", &["G1", "X", "S-A"]);
    gateway.fail_moves_on("X", "S-A");

    let result = service.request_charging(&ChargingRequestDto::new("A"), &CancellationToken::new()).await;

    assert!(matches!(result, Err(Error::GatewayStatus { status: 500, .. })), "Gateway error should propagate, got {:?}", result);
    let vehicle = service.coordinator().pool().get(&VehicleId::new("V1")).unwrap();
    assert_eq!(vehicle.state(), VehicleState::Busy);
    assert_eq!(vehicle.position(), VehiclePosition::At(NodeId::new("X")));

    // A stranded vehicle only comes back through the administrator.
    service.release_vehicle(&VehicleId::new("V1")).unwrap();

    assert_eq!(vehicle.state(), VehicleState::Free);
    assert!(service.coordinator().sessions().is_empty());
    assert!(matches!(service.release_vehicle(&VehicleId::new("V9")), Err(Error::UnknownVehicle(_))));
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_during_travel() {
    let (gateway, service) = setup(vec![vehicle("V1", "G1", &[("A", "S-A")])], DispatchConfig::default()).await;
    gateway.set_distance("G1", "S-A", 200.0);
    let cancel = CancellationToken::new();

    let request = ChargingRequestDto::new("A");
    let canceller = async {
        tokio::time::sleep(Duration::from_secs(3)).await;
        cancel.cancel();
    };
    let (result, ()) = tokio::join!(service.request_charging(&request, &cancel), canceller);

    assert!(matches!(result, Err(Error::Cancelled { .. })), "Expected cancellation, got {:?}", result);
    assert!(gateway.arrivals().is_empty());
    assert_eq!(state_of(&service, "V1"), VehicleState::Busy);
    let vehicle = service.coordinator().pool().get(&VehicleId::new("V1")).unwrap();
    assert_eq!(vehicle.position(), VehiclePosition::Moving { from: NodeId::new("G1"), to: NodeId::new("S-A") });
}

#[tokio::test(start_paused = true)]
async fn test_travelling_vehicle_cannot_be_released_or_reassigned() {
    // Setup: V1 serves A and B, the trip to A takes 10s.
    let (gateway, service) = setup(vec![vehicle("V1", "G1", &[("A", "S1-A"), ("B", "S1-B")])], DispatchConfig::default()).await;
    gateway.set_distance("G1", "S1-A", 200.0);
    let v1 = VehicleId::new("V1");

    let start = Instant::now();
    let task_service = service.clone();
    let handle = tokio::spawn(async move { task_service.request_charging(&ChargingRequestDto::new("A"), &CancellationToken::new()).await });
    tokio::time::sleep(Duration::from_secs(1)).await;

    // Execution
    let release = service.release_vehicle(&v1);
    let second = service.request_charging(&ChargingRequestDto::new("B"), &CancellationToken::new()).await.unwrap();
    let early_completion = service.complete_charging(&ChargingCompletionRequestDto::new("A")).await;

    // Verification
    assert!(matches!(release, Err(Error::VehicleInTransit(_))), "Release during travel must be refused, got {:?}", release);
    assert_eq!(second, ChargingResponseDto { wait: true }, "A travelling vehicle must not be handed out again");
    assert!(matches!(early_completion, Err(Error::VehicleInTransit(_))), "Completion before arrival must be refused, got {:?}", early_completion);
    assert_eq!(state_of(&service, "V1"), VehicleState::Busy);
    assert_eq!(service.coordinator().sessions().get(&NodeId::new("A")), Some(v1.clone()), "Session of the trip in progress must stay");
    assert!(!service.coordinator().sessions().contains(&NodeId::new("B")));

    let first = handle.await.unwrap().unwrap();
    assert!(!first.wait);
    assert_elapsed(start, Duration::from_secs(10));

    service.complete_charging(&ChargingCompletionRequestDto::new("A")).await.unwrap();
    assert_eq!(gateway.arrivals(), vec![(v1.clone(), NodeId::new("S1-A")), (v1.clone(), NodeId::new("G1"))], "V1 must only have driven to A and back");
    assert_eq!(state_of(&service, "V1"), VehicleState::Free);
    service.release_vehicle(&v1).unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_speed_is_read_per_segment() {
    // Two segments of 40 units. Speed doubles while the first one is travelled.
    let (gateway, service) = setup(vec![vehicle("V1", "G1", &[("A", "S-A")])], DispatchConfig::new(20.0, 15).unwrap()).await;
    gateway.set_route("G1", "S-A", &["G1", "X", "S-A"]);
    gateway.set_distance("G1", "X", 40.0);
    gateway.set_distance("X", "S-A", 40.0);

    let start = Instant::now();
    let task_service = service.clone();
    let handle = tokio::spawn(async move { task_service.request_charging(&ChargingRequestDto::new("A"), &CancellationToken::new()).await });

    tokio::time::sleep(Duration::from_secs(1)).await;
    service.update_config(&AdminConfigDto { movement_speed: 40.0, conflict_retry_limit: 15 }).unwrap();

    let response = handle.await.unwrap().unwrap();
    assert!(!response.wait);
    // 2s for the first segment at the old speed, 1s for the second at the new one.
    assert_elapsed(start, Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_blank_node_is_rejected_before_dispatch() {
    let (gateway, service) = setup(vec![vehicle("V1", "G1", &[("A", "S-A")])], DispatchConfig::default()).await;

    let result = service.request_charging(&ChargingRequestDto::new(" "), &CancellationToken::new()).await;

    assert!(matches!(result, Err(Error::Validation(_))));
    assert_eq!(state_of(&service, "V1"), VehicleState::Free);
    assert!(gateway.route_queries().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_never_double_book() {
    let spots: &[(&str, &str)] = &[("A", "S-A"), ("B", "S-B"), ("C", "S-C"), ("D", "S-D"), ("E", "S-E"), ("F", "S-F")];
    let (_gateway, service) = setup(vec![vehicle("V1", "G1", spots), vehicle("V2", "G2", spots), vehicle("V3", "G3", spots)], DispatchConfig::new(1000.0, 15).unwrap()).await;

    let mut handles = Vec::new();
    for node in ["A", "B", "C", "D", "E", "F"] {
        for _ in 0..4 {
            let service = service.clone();
            handles.push(tokio::spawn(async move { service.request_charging(&ChargingRequestDto::new(node), &CancellationToken::new()).await }));
        }
    }

    let responses: Vec<ChargingResponseDto> = futures::future::join_all(handles).await.into_iter().map(|joined| joined.unwrap().unwrap()).collect();
    let dispatched = responses.iter().filter(|response| !response.wait).count();

    let sessions = service.coordinator().sessions().snapshot();
    let mut vehicles: Vec<VehicleId> = sessions.iter().map(|session| session.vehicle_id.clone()).collect();
    vehicles.sort();
    vehicles.dedup();

    assert_eq!(dispatched, sessions.len(), "Every successful dispatch owns exactly one session");
    assert_eq!(vehicles.len(), sessions.len(), "No vehicle may serve two sessions");
    assert!((1..=3).contains(&dispatched), "Three vehicles can serve at most three aircraft, got {}", dispatched);

    for vehicle in service.coordinator().pool().snapshot() {
        let expected = if vehicles.contains(vehicle.id()) { VehicleState::Busy } else { VehicleState::Free };
        assert_eq!(vehicle.state(), expected, "Vehicle {} must be Busy exactly when it serves a session", vehicle.id());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_requests_race_for_one_vehicle() {
    for _ in 0..25 {
        let (_gateway, service) = setup(vec![vehicle("V1", "G1", &[("A", "S-A")])], DispatchConfig::new(1000.0, 15).unwrap()).await;
        let barrier = std::sync::Arc::new(tokio::sync::Barrier::new(2));

        let mut handles = Vec::new();
        for _ in 0..2 {
            let service = service.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                service.request_charging(&ChargingRequestDto::new("A"), &CancellationToken::new()).await
            }));
        }

        let mut waits: Vec<bool> = futures::future::join_all(handles).await.into_iter().map(|joined| joined.unwrap().unwrap().wait).collect();
        waits.sort();
        assert_eq!(waits, vec![false, true]);
    }
}
