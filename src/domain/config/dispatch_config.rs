use arc_swap::ArcSwap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::api::admin_dto::AdminConfigDto;
use crate::api::service_config_dto::ServiceConfigDto;
use crate::error::{Error, Result};

pub const DEFAULT_MOVEMENT_SPEED: f64 = 20.0;
pub const DEFAULT_CONFLICT_RETRY_LIMIT: u32 = 15;

/// Tunables read by in-flight dispatch operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchConfig {
    /// Travel speed in distance units per second. Always finite and positive.
    movement_speed: f64,
    /// Maximum number of movement requests per segment while ground control reports a conflict.
    conflict_retry_limit: u32,
}

impl DispatchConfig {
    pub fn new(movement_speed: f64, conflict_retry_limit: u32) -> Result<Self> {
        if !(movement_speed.is_finite() && movement_speed > 0.0) {
            return Err(Error::Validation(format!("movementSpeed must be a positive number, got {}", movement_speed)));
        }
        Ok(DispatchConfig { movement_speed, conflict_retry_limit })
    }

    pub fn movement_speed(&self) -> f64 {
        self.movement_speed
    }

    pub fn conflict_retry_limit(&self) -> u32 {
        self.conflict_retry_limit
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig { movement_speed: DEFAULT_MOVEMENT_SPEED, conflict_retry_limit: DEFAULT_CONFLICT_RETRY_LIMIT }
    }
}

impl TryFrom<&AdminConfigDto> for DispatchConfig {
    type Error = Error;

    fn try_from(dto: &AdminConfigDto) -> Result<Self> {
        DispatchConfig::new(dto.movement_speed, dto.conflict_retry_limit)
    }
}

impl TryFrom<&ServiceConfigDto> for DispatchConfig {
    type Error = Error;

    fn try_from(dto: &ServiceConfigDto) -> Result<Self> {
        DispatchConfig::new(dto.movement_speed, dto.conflict_retry_limit).map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

/// Source of the current dispatch configuration.
///
/// Implementations must be cheap to read: every travelled segment asks for the
/// current value.
pub trait ConfigProvider: Debug + Send + Sync {
    fn current(&self) -> Arc<DispatchConfig>;
}

/// Administratively mutable configuration. Readers never block; an update
/// swaps in a new snapshot and is seen by the next read (last write wins).
#[derive(Debug)]
pub struct LiveConfig {
    inner: ArcSwap<DispatchConfig>,
}

impl LiveConfig {
    pub fn new(config: DispatchConfig) -> Self {
        LiveConfig { inner: ArcSwap::from_pointee(config) }
    }

    /// Replaces the live configuration.
    ///
    /// # Returns
    /// The snapshot now in effect, or `Error::Validation` if the dto is rejected
    /// (the previous configuration stays active in that case).
    pub fn update(&self, dto: &AdminConfigDto) -> Result<Arc<DispatchConfig>> {
        let config = Arc::new(DispatchConfig::try_from(dto)?);
        self.inner.store(config.clone());

        log::info!("Configuration updated: movement speed = {}, conflict retry limit = {}", config.movement_speed(), config.conflict_retry_limit());
        Ok(config)
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        LiveConfig::new(DispatchConfig::default())
    }
}

impl ConfigProvider for LiveConfig {
    fn current(&self) -> Arc<DispatchConfig> {
        self.inner.load_full()
    }
}
