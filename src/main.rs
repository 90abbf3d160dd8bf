use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use charge_dispatch::domain::ground_control::http_ground_control::HttpGroundControl;
use charge_dispatch::{load_service_config, logger, start_dispatch_service};

/// Dispatcher for the aircraft charging vehicle fleet.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON service configuration. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<String>,

    /// Overrides the ground control base url of the configuration.
    #[arg(long)]
    gateway_url: Option<String>,

    /// Overrides the number of vehicles registered at startup.
    #[arg(long)]
    vehicle_count: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::init();
    let args = Args::parse();

    let mut dto = load_service_config(args.config.as_deref()).context("failed to load service configuration")?;
    if let Some(url) = args.gateway_url {
        dto.ground_control_url = url;
    }
    if let Some(count) = args.vehicle_count {
        dto.vehicle_count = count;
    }
    dto.validate()?;

    log::info!("Using ground control at {}", dto.ground_control_url);
    let gateway = Arc::new(HttpGroundControl::from_config(&dto)?);
    let service = start_dispatch_service(&dto, gateway).await?;

    for vehicle in service.vehicles_info() {
        log::info!("Vehicle {} at {} is {}", vehicle.vehicle_id, vehicle.current_node, vehicle.status);
    }

    log::info!("Charging dispatcher ready. Press Ctrl-C to stop.");
    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
    log::info!("Shutting down.");

    Ok(())
}
