use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::ground_control::ground_control_trait::{GroundControlGateway, MoveOutcome, VehicleRegistration};
use crate::domain::utils::id::{NodeId, VehicleId};
use crate::error::{Error, Result};

type Segment = (NodeId, NodeId);

#[derive(Debug, Default)]
struct MockState {
    registrations: VecDeque<Option<VehicleRegistration>>,
    registration_types: Vec<String>,
    routes: HashMap<Segment, Vec<NodeId>>,
    route_queries: Vec<Segment>,
    conflicts: HashMap<Segment, u32>,
    distances: HashMap<Segment, f64>,
    failing_moves: HashSet<Segment>,
    move_attempts: HashMap<Segment, u32>,
    arrivals: Vec<(VehicleId, NodeId)>,
}

/// Scripted stand-in for ground control.
///
/// Unscripted routes are direct (`[from, to]`), unscripted segments are granted
/// at `default_distance`, and registrations are served from a queue.
#[derive(Debug)]
pub struct MockGroundControl {
    default_distance: f64,
    state: Mutex<MockState>,
}

impl MockGroundControl {
    pub fn new(default_distance: f64) -> Self {
        MockGroundControl { default_distance, state: Mutex::new(MockState::default()) }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues a registration answer. `spots` maps aircraft node to docking node.
    pub fn push_vehicle(&self, vehicle_id: &str, garage: &str, spots: &[(&str, &str)]) {
        let registration = VehicleRegistration {
            vehicle_id: VehicleId::new(vehicle_id),
            garage_node: NodeId::new(garage),
            service_spots: spots.iter().map(|(aircraft, spot)| (NodeId::new(*aircraft), NodeId::new(*spot))).collect(),
        };
        self.state().registrations.push_back(Some(registration));
    }

    /// Queues a registration that fails with a gateway error.
    pub fn push_failed_registration(&self) {
        self.state().registrations.push_back(None);
    }

    pub fn set_route(&self, from: &str, to: &str, nodes: &[&str]) {
        self.state().routes.insert(segment(from, to), nodes.iter().map(|node| NodeId::new(*node)).collect());
    }

    /// The next `count` move requests for this segment are answered with a conflict.
    pub fn set_conflicts(&self, from: &str, to: &str, count: u32) {
        self.state().conflicts.insert(segment(from, to), count);
    }

    pub fn set_distance(&self, from: &str, to: &str, distance: f64) {
        self.state().distances.insert(segment(from, to), distance);
    }

    /// Move requests for this segment fail with a server error.
    pub fn fail_moves_on(&self, from: &str, to: &str) {
        self.state().failing_moves.insert(segment(from, to));
    }

    pub fn move_attempts(&self, from: &str, to: &str) -> u32 {
        self.state().move_attempts.get(&segment(from, to)).copied().unwrap_or(0)
    }

    pub fn total_move_attempts(&self) -> u32 {
        self.state().move_attempts.values().sum()
    }

    pub fn arrivals(&self) -> Vec<(VehicleId, NodeId)> {
        self.state().arrivals.clone()
    }

    pub fn route_queries(&self) -> Vec<(NodeId, NodeId)> {
        self.state().route_queries.clone()
    }

    pub fn registration_types(&self) -> Vec<String> {
        self.state().registration_types.clone()
    }
}

impl Default for MockGroundControl {
    fn default() -> Self {
        MockGroundControl::new(20.0)
    }
}

fn segment(from: &str, to: &str) -> Segment {
    (NodeId::new(from), NodeId::new(to))
}

fn server_error(endpoint: &str, body: String) -> Error {
    Error::GatewayStatus { endpoint: endpoint.to_string(), status: 500, body }
}

#[async_trait]
impl GroundControlGateway for MockGroundControl {
    async fn register_vehicle(&self, vehicle_type: &str) -> Result<VehicleRegistration> {
        let mut state = self.state();
        state.registration_types.push(vehicle_type.to_string());

        match state.registrations.pop_front() {
            Some(Some(registration)) => Ok(registration),
            Some(None) => Err(server_error("POST /register-vehicle", "scripted registration failure".to_string())),
            None => Err(server_error("POST /register-vehicle", "no vehicles left to register".to_string())),
        }
    }

    async fn get_route(&self, from: &NodeId, to: &NodeId, _vehicle_type: &str) -> Result<Vec<NodeId>> {
        let mut state = self.state();
        let key = (from.clone(), to.clone());
        state.route_queries.push(key.clone());

        if let Some(route) = state.routes.get(&key) {
            return Ok(route.clone());
        }
        if from == to {
            return Ok(vec![from.clone()]);
        }
        Ok(vec![from.clone(), to.clone()])
    }

    async fn request_move(&self, _vehicle_id: &VehicleId, _vehicle_type: &str, from: &NodeId, to: &NodeId) -> Result<MoveOutcome> {
        let mut state = self.state();
        let key = (from.clone(), to.clone());
        *state.move_attempts.entry(key.clone()).or_insert(0) += 1;

        if state.failing_moves.contains(&key) {
            return Err(server_error("POST /move", format!("segment {} -> {} is closed", from, to)));
        }

        if let Some(remaining) = state.conflicts.get_mut(&key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(MoveOutcome::Conflict);
            }
        }

        let distance = state.distances.get(&key).copied().unwrap_or(self.default_distance);
        Ok(MoveOutcome::Granted { distance })
    }

    async fn notify_arrival(&self, vehicle_id: &VehicleId, _vehicle_type: &str, node: &NodeId) -> Result<()> {
        self.state().arrivals.push((vehicle_id.clone(), node.clone()));
        Ok(())
    }
}
