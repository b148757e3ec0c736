use std::sync::Arc;

use anyhow::Result;
use ev_fleet_simulator::{api, config::Config, fleet, publish::LogSink, simulation, telemetry};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let cfg = Config::load()?;
    cfg.validate()?;

    let table = Arc::new(simulation::EnergyConsumptionTable::tesla_model_s());
    let sink = Arc::new(LogSink::new(cfg.publish.topic_prefix.clone()));

    let fleet = fleet::spawn_fleet(&cfg, table, sink);

    let app = api::router(api::ApiState {
        anomalies: fleet.anomalies.clone(),
    });

    let addr = cfg.server.socket_addr()?;
    info!(%addr, battery_count = cfg.fleet.battery_count, "starting EV fleet simulator");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    fleet.shutdown().await;
    warn!("shutdown complete");
    Ok(())
}
