use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::domain::config::dispatch_config::ConfigProvider;
use crate::domain::ground_control::ground_control_trait::{GroundControlGateway, MoveOutcome};
use crate::domain::utils::id::{NodeId, VehicleId};
use crate::domain::vehicle::vehicle::{Vehicle, VehiclePosition};
use crate::error::{Error, Result};

/// Pause between two movement requests for a contested segment.
pub const CONFLICT_BACKOFF: Duration = Duration::from_secs(2);

/// Time needed to cover `distance` at `movement_speed` units per second.
///
/// Non-positive or non-finite distances take no time.
pub fn travel_delay(distance: f64, movement_speed: f64) -> Duration {
    if !(distance.is_finite() && distance > 0.0) {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(distance / movement_speed).unwrap_or(Duration::MAX)
}

/// Asks ground control for the segment `from -> to` until it is granted.
///
/// A conflict is answered with a `CONFLICT_BACKOFF` pause and another request,
/// for at most `retry_limit` requests in total. A limit of 0 still makes one request.
/// There is no pause after the last rejected request.
///
/// # Returns
/// The segment's physical distance, or `Error::ConflictRetryExhausted`.
/// Gateway errors are passed through untouched.
pub async fn acquire_segment(
    gateway: &dyn GroundControlGateway,
    vehicle_id: &VehicleId,
    vehicle_type: &str,
    from: &NodeId,
    to: &NodeId,
    retry_limit: u32,
) -> Result<f64> {
    let max_attempts = retry_limit.max(1);
    let mut attempts = 0;

    loop {
        attempts += 1;
        match gateway.request_move(vehicle_id, vehicle_type, from, to).await? {
            MoveOutcome::Granted { distance } => {
                log::debug!("Vehicle {} may move {} -> {} ({} units, attempt {})", vehicle_id, from, to, distance, attempts);
                return Ok(distance);
            }
            MoveOutcome::Conflict if attempts < max_attempts => {
                log::warn!(
                    "Conflict moving vehicle {} from {} to {} (attempt {}/{}). Retrying in {:?}.",
                    vehicle_id,
                    from,
                    to,
                    attempts,
                    max_attempts,
                    CONFLICT_BACKOFF
                );
                sleep(CONFLICT_BACKOFF).await;
            }
            MoveOutcome::Conflict => {
                log::error!("Giving up moving vehicle {} from {} to {} after {} attempts.", vehicle_id, from, to, attempts);
                return Err(Error::ConflictRetryExhausted { vehicle_id: vehicle_id.clone(), from: from.clone(), to: to.clone(), attempts });
            }
        }
    }
}

/// Drives a vehicle along a route handed out by ground control.
#[derive(Debug, Clone)]
pub struct MovementExecutor {
    gateway: Arc<dyn GroundControlGateway>,
    config: Arc<dyn ConfigProvider>,
}

impl MovementExecutor {
    pub fn new(gateway: Arc<dyn GroundControlGateway>, config: Arc<dyn ConfigProvider>) -> Self {
        MovementExecutor { gateway, config }
    }

    /// Travels every consecutive pair of `route`: permission, travel time, arrival notice.
    ///
    /// The configuration is read per segment, so an update reaches vehicles already on
    /// the road from their next segment on. `cancel` is only observed while travelling;
    /// a cancelled traversal leaves the vehicle where it was and reports `Error::Cancelled`.
    ///
    /// # Returns
    /// Total time spent travelling, backoffs excluded.
    pub async fn traverse(&self, vehicle: &Vehicle, route: &[NodeId], cancel: Option<&CancellationToken>) -> Result<Duration> {
        let mut travelled = Duration::ZERO;

        for pair in route.windows(2) {
            let (from, to) = (&pair[0], &pair[1]);

            let retry_limit = self.config.current().conflict_retry_limit();
            let distance = acquire_segment(self.gateway.as_ref(), vehicle.id(), vehicle.vehicle_type(), from, to, retry_limit).await?;

            vehicle.set_position(VehiclePosition::Moving { from: from.clone(), to: to.clone() });
            let delay = travel_delay(distance, self.config.current().movement_speed());

            match cancel {
                Some(token) => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => {
                            log::warn!("Travel of vehicle {} from {} to {} cancelled", vehicle.id(), from, to);
                            return Err(Error::Cancelled { vehicle_id: vehicle.id().clone(), node: to.clone() });
                        }
                        _ = sleep(delay) => {}
                    }
                }
                None => sleep(delay).await,
            }
            travelled += delay;

            self.gateway.notify_arrival(vehicle.id(), vehicle.vehicle_type(), to).await?;
            vehicle.set_position(VehiclePosition::At(to.clone()));
            log::debug!("Vehicle {} arrived at {}", vehicle.id(), to);
        }

        Ok(travelled)
    }
}
