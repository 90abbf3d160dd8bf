use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::ground_control::ground_control_trait::VehicleRegistration;
use crate::domain::utils::id::{NodeId, VehicleId};
use crate::error::{Error, Result};

const FREE: u8 = 0;
const BUSY: u8 = 1;
const TRAVELLING: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleState {
    Free,
    Busy,
}

impl fmt::Display for VehicleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleState::Free => write!(f, "Free"),
            VehicleState::Busy => write!(f, "Busy"),
        }
    }
}

/// Last known whereabouts of a vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VehiclePosition {
    At(NodeId),
    /// Permission for the segment was granted and arrival was not reported yet.
    Moving { from: NodeId, to: NodeId },
}

impl fmt::Display for VehiclePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehiclePosition::At(node) => write!(f, "{}", node),
            VehiclePosition::Moving { from, to } => write!(f, "{} -> {}", from, to),
        }
    }
}

/// A service vehicle known to ground control.
///
/// Assignment state is a single atomic changed only by compare-and-swap: Free,
/// Busy while parked at a spot, or Busy while travelling. Two dispatchers can never
/// both win the same vehicle, and a travelling vehicle is only let go by its `Trip`.
#[derive(Debug)]
pub struct Vehicle {
    id: VehicleId,
    vehicle_type: String,
    garage_node: NodeId,
    service_spots: HashMap<NodeId, NodeId>,
    state: AtomicU8,
    position: RwLock<VehiclePosition>,
}

impl Vehicle {
    pub fn new(id: VehicleId, vehicle_type: impl Into<String>, garage_node: NodeId, service_spots: HashMap<NodeId, NodeId>) -> Self {
        let position = RwLock::new(VehiclePosition::At(garage_node.clone()));
        Vehicle { id, vehicle_type: vehicle_type.into(), garage_node, service_spots, state: AtomicU8::new(FREE), position }
    }

    pub fn from_registration(registration: VehicleRegistration, vehicle_type: impl Into<String>) -> Self {
        Vehicle::new(registration.vehicle_id, vehicle_type, registration.garage_node, registration.service_spots)
    }

    pub fn id(&self) -> &VehicleId {
        &self.id
    }

    pub fn vehicle_type(&self) -> &str {
        &self.vehicle_type
    }

    pub fn garage_node(&self) -> &NodeId {
        &self.garage_node
    }

    pub fn service_spots(&self) -> &HashMap<NodeId, NodeId> {
        &self.service_spots
    }

    /// Docking node this vehicle uses for the given aircraft, if it can serve it at all.
    pub fn service_spot(&self, aircraft_node: &NodeId) -> Option<&NodeId> {
        self.service_spots.get(aircraft_node)
    }

    pub fn serves(&self, aircraft_node: &NodeId) -> bool {
        self.service_spots.contains_key(aircraft_node)
    }

    pub fn state(&self) -> VehicleState {
        if self.state.load(Ordering::Acquire) == FREE { VehicleState::Free } else { VehicleState::Busy }
    }

    pub fn is_free(&self) -> bool {
        self.state() == VehicleState::Free
    }

    pub fn is_travelling(&self) -> bool {
        self.state.load(Ordering::Acquire) == TRAVELLING
    }

    /// Free -> Busy, with the outbound trip already started.
    ///
    /// # Returns
    /// The trip if this call won the vehicle, `None` if it was already Busy.
    pub fn try_acquire(self: &Arc<Self>) -> Option<Trip> {
        self.transition(FREE, TRAVELLING).then(|| Trip::new(self.clone()))
    }

    /// Starts a trip for a vehicle parked at a spot. Fails if it is Free or already travelling.
    pub fn begin_trip(self: &Arc<Self>) -> Option<Trip> {
        self.transition(BUSY, TRAVELLING).then(|| Trip::new(self.clone()))
    }

    /// Administrative Busy -> Free for a vehicle that is not travelling.
    ///
    /// # Returns
    /// `true` if the vehicle was Busy before the call, `false` if it was already Free.
    ///
    /// # Errors
    /// `Error::VehicleInTransit` while a trip holds the vehicle.
    pub fn release(&self) -> Result<bool> {
        match self.state.compare_exchange(BUSY, FREE, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => Ok(true),
            Err(FREE) => Ok(false),
            Err(_) => Err(Error::VehicleInTransit(self.id.clone())),
        }
    }

    fn transition(&self, from: u8, to: u8) -> bool {
        self.state.compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire).is_ok()
    }

    pub fn position(&self) -> VehiclePosition {
        self.position.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_position(&self, position: VehiclePosition) {
        *self.position.write().unwrap_or_else(PoisonError::into_inner) = position;
    }
}

/// Exclusive right to move a vehicle.
///
/// Dropping the trip leaves the vehicle Busy where it stopped, which is also what
/// happens when the owning request fails or is cancelled.
#[derive(Debug)]
#[must_use]
pub struct Trip {
    vehicle: Arc<Vehicle>,
    active: bool,
}

impl Trip {
    fn new(vehicle: Arc<Vehicle>) -> Self {
        Trip { vehicle, active: true }
    }

    pub fn vehicle(&self) -> &Arc<Vehicle> {
        &self.vehicle
    }

    /// Ends the trip with the vehicle Busy at its current position.
    pub fn park(self) {}

    /// Ends the trip and hands the vehicle back to the pool.
    pub fn release(mut self) {
        self.active = false;
        self.vehicle.state.store(FREE, Ordering::Release);
    }
}

impl Drop for Trip {
    fn drop(&mut self) {
        if self.active {
            self.vehicle.transition(TRAVELLING, BUSY);
        }
    }
}
