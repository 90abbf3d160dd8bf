use serde::{Deserialize, Serialize};

/// Replaces the live dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminConfigDto {
    pub movement_speed: f64,
    #[serde(alias = "conflictRetryCount")]
    pub conflict_retry_limit: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegisterVehicleDto {
    #[serde(rename = "type", default)]
    pub vehicle_type: String,
}

/// One line of the fleet overview shown to administrators.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInfoDto {
    pub vehicle_id: String,
    pub current_node: String,
    pub status: String,
    /// Aircraft node of the session the vehicle is bound to, if any.
    pub serving_node: Option<String>,
}
