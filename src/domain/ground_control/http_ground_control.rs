use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::Serialize;
use std::time::Duration;

use crate::api::ground_control_dto::{ArrivalDto, MoveRequestDto, MoveResponseDto, RouteRequestDto, VehicleRegistrationDto};
use crate::api::service_config_dto::ServiceConfigDto;
use crate::domain::ground_control::ground_control_endpoint::GroundControlEndpoint;
use crate::domain::ground_control::ground_control_trait::{GroundControlGateway, MoveOutcome, VehicleRegistration};
use crate::domain::utils::id::{NodeId, VehicleId};
use crate::error::{Error, Result};

/// Ground control reached over its JSON/HTTP API.
#[derive(Debug, Clone)]
pub struct HttpGroundControl {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGroundControl {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(HttpGroundControl { base_url, client })
    }

    pub fn from_config(dto: &ServiceConfigDto) -> Result<Self> {
        HttpGroundControl::new(dto.ground_control_url.clone(), Duration::from_secs(dto.request_timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B: Serialize + ?Sized>(&self, endpoint: GroundControlEndpoint<'_>, body: Option<&B>) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        let mut request = self.client.request(endpoint.method(), url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        log::debug!("Ground control answered {} with status {}", endpoint, response.status());
        Ok(response)
    }

    async fn ensure_success(endpoint: GroundControlEndpoint<'_>, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        log::error!("Ground control request {} failed.\nResponse-Status-Code: <<{}>>\nResponse-Body: <<{}>>", endpoint, status, body);
        Err(Error::GatewayStatus { endpoint: endpoint.to_string(), status: status.as_u16(), body })
    }
}

#[async_trait]
impl GroundControlGateway for HttpGroundControl {
    async fn register_vehicle(&self, vehicle_type: &str) -> Result<VehicleRegistration> {
        let endpoint = GroundControlEndpoint::RegisterVehicle(vehicle_type);
        log::info!("Requesting registration of a vehicle of type '{}'", vehicle_type);

        let response = self.post::<()>(endpoint, None).await?;
        let response = Self::ensure_success(endpoint, response).await?;
        let dto: VehicleRegistrationDto = response.json().await?;

        VehicleRegistration::try_from(dto)
    }

    async fn get_route(&self, from: &NodeId, to: &NodeId, vehicle_type: &str) -> Result<Vec<NodeId>> {
        let endpoint = GroundControlEndpoint::Route;
        let body = RouteRequestDto { from: from.as_str(), to: to.as_str(), vehicle_type };

        let response = self.post(endpoint, Some(&body)).await?;
        let response = Self::ensure_success(endpoint, response).await?;
        // A `null` body is how ground control says "no route".
        let route: Option<Vec<NodeId>> = response.json().await?;
        let route = route.unwrap_or_default();

        log::debug!("Route from {} to {}: {}", from, to, route.iter().map(NodeId::as_str).collect::<Vec<_>>().join(" -> "));
        Ok(route)
    }

    async fn request_move(&self, vehicle_id: &VehicleId, vehicle_type: &str, from: &NodeId, to: &NodeId) -> Result<MoveOutcome> {
        let endpoint = GroundControlEndpoint::Move;
        let body = MoveRequestDto { vehicle_id: vehicle_id.as_str(), vehicle_type, from: from.as_str(), to: to.as_str() };

        let response = self.post(endpoint, Some(&body)).await?;
        if response.status() == StatusCode::CONFLICT {
            return Ok(MoveOutcome::Conflict);
        }

        let response = Self::ensure_success(endpoint, response).await?;
        let moved: MoveResponseDto = response.json().await?;
        Ok(MoveOutcome::Granted { distance: moved.distance })
    }

    async fn notify_arrival(&self, vehicle_id: &VehicleId, vehicle_type: &str, node: &NodeId) -> Result<()> {
        let endpoint = GroundControlEndpoint::Arrived;
        let body = ArrivalDto { vehicle_id: vehicle_id.as_str(), vehicle_type, node_id: node.as_str() };

        let response = self.post(endpoint, Some(&body)).await?;
        Self::ensure_success(endpoint, response).await?;
        Ok(())
    }
}
