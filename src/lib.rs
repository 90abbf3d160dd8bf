use std::sync::Arc;

use crate::api::admin_dto::{AdminConfigDto, RegisterVehicleDto, VehicleInfoDto};
use crate::api::charge_dto::{ChargingCompletionRequestDto, ChargingRequestDto, ChargingResponseDto};
use crate::api::service_config_dto::ServiceConfigDto;
use crate::domain::config::dispatch_config::{DispatchConfig, LiveConfig};
use crate::domain::dispatch::dispatch_coordinator::DispatchCoordinator;
use crate::domain::ground_control::ground_control_trait::GroundControlGateway;
use crate::domain::utils::id::VehicleId;
use crate::error::Result;
use crate::loader::parser::parse_json_file;

use tokio_util::sync::CancellationToken;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// The charging module as seen by a transport layer: request-level operations
/// with input validation, plus the administrative surface.
#[derive(Debug, Clone)]
pub struct DispatchService {
    coordinator: Arc<DispatchCoordinator>,
    config: Arc<LiveConfig>,
}

impl DispatchService {
    pub fn new(gateway: Arc<dyn GroundControlGateway>, config: DispatchConfig, vehicle_type: impl Into<String>) -> Self {
        let config = Arc::new(LiveConfig::new(config));
        let coordinator = Arc::new(DispatchCoordinator::new(gateway, config.clone(), vehicle_type));
        DispatchService { coordinator, config }
    }

    pub fn coordinator(&self) -> &Arc<DispatchCoordinator> {
        &self.coordinator
    }

    pub fn config(&self) -> &Arc<LiveConfig> {
        &self.config
    }

    pub async fn request_charging(&self, request: &ChargingRequestDto, cancel: &CancellationToken) -> Result<ChargingResponseDto> {
        let aircraft_node = request.validate()?;
        self.coordinator.request_charging(&aircraft_node, cancel).await
    }

    pub async fn complete_charging(&self, request: &ChargingCompletionRequestDto) -> Result<()> {
        let aircraft_node = request.validate()?;
        self.coordinator.complete_charging(&aircraft_node).await
    }

    pub fn update_config(&self, dto: &AdminConfigDto) -> Result<Arc<DispatchConfig>> {
        self.config.update(dto)
    }

    pub async fn register_vehicle(&self, dto: &RegisterVehicleDto) -> Result<VehicleId> {
        self.coordinator.register_vehicle(dto).await
    }

    pub fn release_vehicle(&self, vehicle_id: &VehicleId) -> Result<()> {
        self.coordinator.release_vehicle(vehicle_id)
    }

    pub fn vehicles_info(&self) -> Vec<VehicleInfoDto> {
        self.coordinator.vehicles_info()
    }
}

/// Reads the service configuration from `file_path`, or uses the defaults when no file is given.
pub fn load_service_config(file_path: Option<&str>) -> Result<ServiceConfigDto> {
    let dto = match file_path {
        Some(path) => {
            let dto: ServiceConfigDto = parse_json_file(path)?;
            log::info!("Service configuration loaded from '{}'.", path);
            dto
        }
        None => ServiceConfigDto::default(),
    };

    dto.validate()?;
    Ok(dto)
}

/// Builds the service and registers the startup fleet with ground control.
pub async fn start_dispatch_service(dto: &ServiceConfigDto, gateway: Arc<dyn GroundControlGateway>) -> Result<DispatchService> {
    let config = DispatchConfig::try_from(dto)?;
    let service = DispatchService::new(gateway, config, dto.vehicle_type.clone());

    let registered = service.coordinator.initialize_fleet(dto.vehicle_count).await;
    if registered < dto.vehicle_count {
        log::warn!("Only {} of {} vehicles could be registered", registered, dto.vehicle_count);
    }

    Ok(service)
}
