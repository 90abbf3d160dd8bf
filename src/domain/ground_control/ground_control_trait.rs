use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;

use crate::api::ground_control_dto::VehicleRegistrationDto;
use crate::domain::utils::id::{NodeId, VehicleId};
use crate::error::{Error, Result};

/// What ground control hands out when a vehicle joins the airfield.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleRegistration {
    pub vehicle_id: VehicleId,
    pub garage_node: NodeId,
    /// Aircraft node -> docking node this vehicle uses when serving that aircraft.
    pub service_spots: HashMap<NodeId, NodeId>,
}

impl TryFrom<VehicleRegistrationDto> for VehicleRegistration {
    type Error = Error;

    fn try_from(dto: VehicleRegistrationDto) -> Result<Self> {
        if dto.vehicle_id.trim().is_empty() || dto.garrage_node_id.trim().is_empty() {
            return Err(Error::Validation("vehicle registration is missing the vehicle id or garage node".to_string()));
        }
        if dto.service_spots.is_empty() {
            return Err(Error::Validation(format!("vehicle {} was registered without any service spots", dto.vehicle_id)));
        }

        let service_spots = dto.service_spots.into_iter().map(|(aircraft, spot)| (NodeId::new(aircraft), NodeId::new(spot))).collect();

        Ok(VehicleRegistration { vehicle_id: VehicleId::new(dto.vehicle_id), garage_node: NodeId::new(dto.garrage_node_id), service_spots })
    }
}

/// Answer to a movement permission request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    /// Segment granted; `distance` is its physical length.
    Granted { distance: f64 },
    /// Another mover holds the segment.
    Conflict,
}

/// The external ground-traffic authority. It owns routing and decides who may
/// move where; the dispatcher only asks.
#[async_trait]
pub trait GroundControlGateway: Debug + Send + Sync {
    async fn register_vehicle(&self, vehicle_type: &str) -> Result<VehicleRegistration>;

    /// Ordered nodes from `from` to `to`. Fewer than two nodes means there is nothing to travel.
    async fn get_route(&self, from: &NodeId, to: &NodeId, vehicle_type: &str) -> Result<Vec<NodeId>>;

    async fn request_move(&self, vehicle_id: &VehicleId, vehicle_type: &str, from: &NodeId, to: &NodeId) -> Result<MoveOutcome>;

    async fn notify_arrival(&self, vehicle_id: &VehicleId, vehicle_type: &str, node: &NodeId) -> Result<()>;
}
