//! Telemetry record and publish seam.
//!
//! The simulator hands each per-tick record to a [`TelemetrySink`]; delivery
//! guarantees, retries and broker addressing live behind that trait, outside
//! the simulation core. A sink failure is logged by the owning loop and never
//! perturbs simulation state.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::info;

/// One telemetry sample for one battery, emitted once per tick.
///
/// Field names and rounding match the fleet wire payload: state of charge and
/// health carry four decimals, everything else two.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRecord {
    pub battery_id: u32,
    pub state_of_charge: f64,
    pub state_of_health: f64,
    pub battery_current: f64,
    pub battery_voltage: f64,
    pub kmh: f64,
    pub distance: f64,
    pub battery_temp: f64,
    pub ambient_temp: f64,
}

impl TelemetryRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        battery_id: u32,
        state_of_charge: f64,
        state_of_health: f64,
        battery_current: f64,
        battery_voltage: f64,
        kmh: f64,
        distance: f64,
        battery_temp: f64,
        ambient_temp: f64,
    ) -> Self {
        Self {
            battery_id,
            state_of_charge: round_to(state_of_charge, 4),
            state_of_health: round_to(state_of_health, 4),
            battery_current: round_to(battery_current, 2),
            battery_voltage: round_to(battery_voltage, 2),
            kmh: round_to(kmh, 2),
            distance: round_to(distance, 2),
            battery_temp: round_to(battery_temp, 2),
            ambient_temp: round_to(ambient_temp, 2),
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Destination for per-tick telemetry, keyed by battery id.
///
/// Implementations must be non-blocking from the simulation's point of view;
/// best-effort delivery is enough.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn publish(&self, record: &TelemetryRecord) -> Result<()>;
}

/// Default sink: serializes the record and emits it through tracing together
/// with its per-battery topic (`<prefix><battery_id>`).
pub struct LogSink {
    topic_prefix: String,
}

impl LogSink {
    pub fn new(topic_prefix: impl Into<String>) -> Self {
        Self {
            topic_prefix: topic_prefix.into(),
        }
    }
}

#[async_trait]
impl TelemetrySink for LogSink {
    async fn publish(&self, record: &TelemetryRecord) -> Result<()> {
        let payload = serde_json::to_string(record)?;
        info!(
            topic = %format!("{}{}", self.topic_prefix, record.battery_id),
            %payload,
            "telemetry"
        );
        Ok(())
    }
}

/// Sink backed by an unbounded channel, for embedding the simulator in
/// another process and for tests.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<TelemetryRecord>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TelemetryRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl TelemetrySink for ChannelSink {
    async fn publish(&self, record: &TelemetryRecord) -> Result<()> {
        self.tx
            .send(record.clone())
            .map_err(|_| anyhow::anyhow!("telemetry channel closed"))
    }
}
