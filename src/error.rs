use thiserror::Error;

use crate::domain::utils::id::{NodeId, VehicleId};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("No route found from {from} to {to}")]
    RouteNotFound { from: NodeId, to: NodeId },

    #[error("No vehicle is servicing aircraft node {0}")]
    NoServicingVehicle(NodeId),

    #[error("Movement of vehicle {vehicle_id} from {from} to {to} still in conflict after {attempts} attempts")]
    ConflictRetryExhausted { vehicle_id: VehicleId, from: NodeId, to: NodeId, attempts: u32 },

    #[error("Vehicle {0} is not registered in the vehicle pool")]
    UnknownVehicle(VehicleId),

    #[error("Vehicle {0} is travelling and cannot be released")]
    VehicleInTransit(VehicleId),

    #[error("Vehicle {0} is already registered")]
    DuplicateVehicle(VehicleId),

    #[error("Travel of vehicle {vehicle_id} towards {node} was cancelled")]
    Cancelled { vehicle_id: VehicleId, node: NodeId },

    #[error("Ground control request failed: {0}")]
    GatewayTransport(#[from] reqwest::Error),

    #[error("Ground control endpoint {endpoint} answered with status {status}: {body}")]
    GatewayStatus { endpoint: String, status: u16, body: String },

    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// True for errors a transport layer should report as "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NoServicingVehicle(_) | Error::UnknownVehicle(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
