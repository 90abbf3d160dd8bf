use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_GROUND_CONTROL_URL: &str = "https://ground-control.reaport.ru";
pub const DEFAULT_VEHICLE_TYPE: &str = "charging";

/// Startup configuration of the dispatch service, read from a JSON file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceConfigDto {
    pub ground_control_url: String,
    pub vehicle_type: String,
    pub vehicle_count: usize,
    pub movement_speed: f64,
    pub conflict_retry_limit: u32,
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfigDto {
    fn default() -> Self {
        ServiceConfigDto {
            ground_control_url: DEFAULT_GROUND_CONTROL_URL.to_string(),
            vehicle_type: DEFAULT_VEHICLE_TYPE.to_string(),
            vehicle_count: 3,
            movement_speed: 20.0,
            conflict_retry_limit: 15,
            request_timeout_secs: 30,
        }
    }
}

impl ServiceConfigDto {
    pub fn validate(&self) -> Result<()> {
        if self.ground_control_url.trim().is_empty() {
            return Err(Error::InvalidConfig("groundControlUrl must not be empty".to_string()));
        }
        if self.vehicle_type.trim().is_empty() {
            return Err(Error::InvalidConfig("vehicleType must not be empty".to_string()));
        }
        if !(self.movement_speed.is_finite() && self.movement_speed > 0.0) {
            return Err(Error::InvalidConfig(format!("movementSpeed must be positive, got {}", self.movement_speed)));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::InvalidConfig("requestTimeoutSecs must be positive".to_string()));
        }
        Ok(())
    }
}
