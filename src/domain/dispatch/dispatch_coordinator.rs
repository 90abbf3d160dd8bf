use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::api::admin_dto::{RegisterVehicleDto, VehicleInfoDto};
use crate::api::charge_dto::ChargingResponseDto;
use crate::domain::config::dispatch_config::ConfigProvider;
use crate::domain::dispatch::movement::MovementExecutor;
use crate::domain::ground_control::ground_control_trait::GroundControlGateway;
use crate::domain::session::session_registry::ActiveSessionRegistry;
use crate::domain::utils::id::{NodeId, VehicleId};
use crate::domain::vehicle::vehicle::{Trip, Vehicle, VehiclePosition};
use crate::domain::vehicle::vehicle_pool::VehiclePool;
use crate::error::{Error, Result};

/// Target of the structured per-operation dispatch events.
pub const DISPATCH_ANALYTICS_TARGET: &str = "dispatch_analytics";

/// Assigns vehicles to charge requests and drives them there and back.
///
/// A failed traversal is not compensated: the vehicle stays Busy and, for the
/// outbound trip, its session stays registered until `release_vehicle` is called.
/// Every movement runs under the vehicle's `Trip`, so nothing else can reassign or
/// release a vehicle while it drives.
#[derive(Debug)]
pub struct DispatchCoordinator {
    vehicle_type: String,
    pool: VehiclePool,
    sessions: ActiveSessionRegistry,
    gateway: Arc<dyn GroundControlGateway>,
    movement: MovementExecutor,
}

impl DispatchCoordinator {
    pub fn new(gateway: Arc<dyn GroundControlGateway>, config: Arc<dyn ConfigProvider>, vehicle_type: impl Into<String>) -> Self {
        DispatchCoordinator {
            vehicle_type: vehicle_type.into(),
            pool: VehiclePool::new(),
            sessions: ActiveSessionRegistry::new(),
            movement: MovementExecutor::new(gateway.clone(), config),
            gateway,
        }
    }

    pub fn vehicle_type(&self) -> &str {
        &self.vehicle_type
    }

    pub fn pool(&self) -> &VehiclePool {
        &self.pool
    }

    pub fn sessions(&self) -> &ActiveSessionRegistry {
        &self.sessions
    }

    /// Registers the startup fleet. A vehicle that fails to register is logged and skipped.
    ///
    /// # Returns
    /// Number of vehicles that joined the pool.
    pub async fn initialize_fleet(&self, vehicle_count: usize) -> usize {
        let mut registered = 0;

        for number in 1..=vehicle_count {
            log::info!("Registering vehicle {}/{} of type '{}'", number, vehicle_count, self.vehicle_type);
            match self.register(&self.vehicle_type).await {
                Ok(_) => registered += 1,
                Err(e) => log::error!("Registration of vehicle {}/{} failed: {}", number, vehicle_count, e),
            }
        }

        log::info!("Fleet initialized with {} of {} vehicles", registered, vehicle_count);
        registered
    }

    /// Registers one more vehicle on administrator request.
    pub async fn register_vehicle(&self, dto: &RegisterVehicleDto) -> Result<VehicleId> {
        let vehicle_type = dto.vehicle_type.trim();
        if vehicle_type.is_empty() {
            return Err(Error::Validation("Type is required".to_string()));
        }
        self.register(vehicle_type).await
    }

    async fn register(&self, vehicle_type: &str) -> Result<VehicleId> {
        let registration = self.gateway.register_vehicle(vehicle_type).await?;
        let vehicle = Vehicle::from_registration(registration, vehicle_type);
        let vehicle_id = vehicle.id().clone();

        log::info!(
            "Vehicle {} registered. Garage: {}. Service spots: {}",
            vehicle_id,
            vehicle.garage_node(),
            vehicle.service_spots().iter().map(|(aircraft, spot)| format!("{}={}", aircraft, spot)).collect::<Vec<_>>().join(", ")
        );

        if !self.pool.insert_if_absent(vehicle) {
            log::warn!("Ground control handed out vehicle id {} twice; keeping the first registration", vehicle_id);
            return Err(Error::DuplicateVehicle(vehicle_id));
        }
        Ok(vehicle_id)
    }

    /// Sends a free vehicle to `aircraft_node`.
    ///
    /// Returns `wait: true` without side effects when no eligible vehicle is free, the
    /// candidate was taken by a concurrent request, or the aircraft already has a vehicle;
    /// the caller retries later. Otherwise the call returns once the vehicle reached its
    /// service spot.
    pub async fn request_charging(&self, aircraft_node: &NodeId, cancel: &CancellationToken) -> Result<ChargingResponseDto> {
        log::info!("Processing charging request for aircraft node {}", aircraft_node);

        if self.sessions.contains(aircraft_node) {
            log::info!("Aircraft node {} is already being serviced", aircraft_node);
            return Ok(ChargingResponseDto::wait());
        }

        let Some((trip, target)) = self.claim_vehicle(aircraft_node)? else {
            return Ok(ChargingResponseDto::wait());
        };
        let vehicle = trip.vehicle();
        let source = vehicle.garage_node().clone();

        let started = Instant::now();
        let route = self.gateway.get_route(&source, &target, vehicle.vehicle_type()).await?;
        if route.len() < 2 {
            log::error!("No route found from {} to {} for vehicle {}", source, target, vehicle.id());
            return Err(Error::RouteNotFound { from: source, to: target });
        }

        let travelled = self.movement.traverse(vehicle, &route, Some(cancel)).await?;

        log::info!("Vehicle {} started charging at aircraft node {}", vehicle.id(), aircraft_node);
        tracing::info!(
            target: DISPATCH_ANALYTICS_TARGET,
            Operation = "RequestCharging",
            VehicleId = %vehicle.id(),
            AircraftNode = %aircraft_node,
            Segments = route.len() - 1,
            TravelTimeMs = millis(travelled),
            ProcessingTimeMs = millis(started.elapsed()),
        );

        trip.park();
        Ok(ChargingResponseDto::dispatched())
    }

    /// Wins a free eligible vehicle and records the session for `aircraft_node`.
    ///
    /// # Returns
    /// The outbound trip and the service spot it heads for, or `None` if the request has to wait.
    fn claim_vehicle(&self, aircraft_node: &NodeId) -> Result<Option<(Trip, NodeId)>> {
        let Some(vehicle) = self.pool.find_free_for(aircraft_node) else {
            log::info!("No free vehicle available for aircraft node {}", aircraft_node);
            return Ok(None);
        };
        let target = vehicle.service_spot(aircraft_node).cloned().ok_or_else(|| Error::NoServicingVehicle(aircraft_node.clone()))?;

        let Some(trip) = vehicle.try_acquire() else {
            log::info!("Vehicle {} was taken by a concurrent request for aircraft node {}", vehicle.id(), aircraft_node);
            return Ok(None);
        };

        if !self.sessions.insert_if_absent(aircraft_node.clone(), vehicle.id().clone()) {
            // Nothing has moved yet.
            trip.release();
            log::info!("Aircraft node {} got a vehicle from a concurrent request", aircraft_node);
            return Ok(None);
        }

        log::info!("Vehicle {} assigned to aircraft node {}", vehicle.id(), aircraft_node);
        Ok(Some((trip, target)))
    }

    /// Ends the session at `aircraft_node` and brings its vehicle back to the garage.
    ///
    /// The session is removed before anything else, so a duplicate completion fails
    /// with `Error::NoServicingVehicle`. While the vehicle is still on its way to the
    /// aircraft the session is kept and the call fails with `Error::VehicleInTransit`.
    pub async fn complete_charging(&self, aircraft_node: &NodeId) -> Result<()> {
        log::info!("Processing charging completion for aircraft node {}", aircraft_node);

        let trip = self.claim_return_trip(aircraft_node)?;
        let vehicle = trip.vehicle();
        let source = vehicle.service_spot(aircraft_node).cloned().ok_or_else(|| Error::NoServicingVehicle(aircraft_node.clone()))?;
        let target = vehicle.garage_node().clone();

        let started = Instant::now();
        let route = self.gateway.get_route(&source, &target, vehicle.vehicle_type()).await?;

        let travelled = if route.len() < 2 {
            log::info!("Vehicle {} needs no travel to reach garage {}", vehicle.id(), target);
            Duration::ZERO
        } else {
            self.movement.traverse(vehicle, &route, None).await?
        };

        vehicle.set_position(VehiclePosition::At(target));
        log::info!("Vehicle {} is free again in its garage", vehicle.id());

        tracing::info!(
            target: DISPATCH_ANALYTICS_TARGET,
            Operation = "CompleteCharging",
            VehicleId = %vehicle.id(),
            AircraftNode = %aircraft_node,
            Segments = route.len().saturating_sub(1),
            TravelTimeMs = millis(travelled),
            ProcessingTimeMs = millis(started.elapsed()),
        );

        trip.release();
        Ok(())
    }

    /// Removes the session and starts the return trip of its parked vehicle in one step.
    fn claim_return_trip(&self, aircraft_node: &NodeId) -> Result<Trip> {
        loop {
            let Some(vehicle_id) = self.sessions.get(aircraft_node) else {
                log::error!("No vehicle is servicing aircraft node {}", aircraft_node);
                return Err(Error::NoServicingVehicle(aircraft_node.clone()));
            };

            let Some(vehicle) = self.pool.get(&vehicle_id) else {
                self.sessions.remove_if_held_by(aircraft_node, &vehicle_id);
                return Err(Error::UnknownVehicle(vehicle_id));
            };

            let mut trip = None;
            let removed = self.sessions.remove_if(aircraft_node, |held_by| {
                if held_by != &vehicle_id {
                    return false;
                }
                trip = vehicle.begin_trip();
                trip.is_some()
            });

            if let (Some(_), Some(trip)) = (removed, trip) {
                return Ok(trip);
            }

            // Either the vehicle has not reached the aircraft yet or the session changed hands.
            if self.sessions.get(aircraft_node).as_ref() == Some(&vehicle_id) && vehicle.is_travelling() {
                log::warn!("Vehicle {} is still on its way to aircraft node {}", vehicle_id, aircraft_node);
                return Err(Error::VehicleInTransit(vehicle_id));
            }
        }
    }

    /// Administrative release of a vehicle stranded by a failed or cancelled trip.
    ///
    /// Drops the session the vehicle still holds, if any, and marks it Free. Its last
    /// known position is kept. A vehicle that is travelling is refused with
    /// `Error::VehicleInTransit` and left untouched.
    pub fn release_vehicle(&self, vehicle_id: &VehicleId) -> Result<()> {
        let vehicle = self.pool.get(vehicle_id).ok_or_else(|| Error::UnknownVehicle(vehicle_id.clone()))?;

        if vehicle.is_travelling() {
            log::warn!("Refusing to release vehicle {} while it travels", vehicle_id);
            return Err(Error::VehicleInTransit(vehicle_id.clone()));
        }

        if let Some(aircraft_node) = self.sessions.find_by_vehicle(vehicle_id) {
            if self.sessions.remove_if_held_by(&aircraft_node, vehicle_id).is_some() {
                log::warn!("Dropped session of aircraft node {} held by vehicle {}", aircraft_node, vehicle_id);
            }
        }

        if vehicle.release()? {
            log::warn!("Vehicle {} released by administrator at {}", vehicle_id, vehicle.position());
        }
        Ok(())
    }

    /// Fleet overview, sorted by vehicle id.
    pub fn vehicles_info(&self) -> Vec<VehicleInfoDto> {
        let mut info: Vec<VehicleInfoDto> = self
            .pool
            .snapshot()
            .iter()
            .map(|vehicle| VehicleInfoDto {
                vehicle_id: vehicle.id().to_string(),
                current_node: vehicle.position().to_string(),
                status: vehicle.state().to_string(),
                serving_node: self.sessions.find_by_vehicle(vehicle.id()).map(String::from),
            })
            .collect();

        info.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
        info
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
