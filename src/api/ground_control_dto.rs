use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Answer of `POST /register-vehicle/{type}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRegistrationDto {
    pub vehicle_id: String,
    // Spelling is dictated by ground control.
    #[serde(alias = "garageNodeId")]
    pub garrage_node_id: String,
    #[serde(default)]
    pub service_spots: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteRequestDto<'a> {
    pub from: &'a str,
    pub to: &'a str,
    #[serde(rename = "type")]
    pub vehicle_type: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequestDto<'a> {
    pub vehicle_id: &'a str,
    pub vehicle_type: &'a str,
    pub from: &'a str,
    pub to: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveResponseDto {
    pub distance: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrivalDto<'a> {
    pub vehicle_id: &'a str,
    pub vehicle_type: &'a str,
    pub node_id: &'a str,
}
