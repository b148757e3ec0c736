//! # Fleet Scheduler
//!
//! Owns the set of per-battery simulation loops. Each battery id gets its own
//! periodic tokio task with exclusive ownership of that battery's entity
//! state; tasks never block on or observe one another. The single piece of
//! externally written state is the per-battery anomaly flag, one atomic slot
//! per id, toggled by the control plane and read by the owning loop each
//! tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use crate::config::Config;
use crate::publish::TelemetrySink;
use crate::simulation::energy_table::EnergyConsumptionTable;
use crate::simulation::entity::{BatteryEntity, BatteryParams, VehicleParams};

/// Per-battery anomaly toggles, indexed by battery id 1..=N.
///
/// Reads and writes are relaxed atomics: a toggle may take effect on the
/// current or the next tick, either is acceptable. Out-of-range ids are
/// ignored rather than rejected.
pub struct AnomalyFlags {
    slots: Vec<AtomicBool>,
}

impl AnomalyFlags {
    pub fn new(battery_count: usize) -> Self {
        Self {
            slots: (0..battery_count).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    pub fn battery_count(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, battery_id: u32) -> Option<&AtomicBool> {
        battery_id
            .checked_sub(1)
            .and_then(|idx| self.slots.get(idx as usize))
    }

    /// Idempotently set the flag for one battery. Returns `false` (and does
    /// nothing) when the id is outside the fleet range.
    pub fn set(&self, battery_id: u32, enabled: bool) -> bool {
        match self.slot(battery_id) {
            Some(slot) => {
                slot.store(enabled, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Current flag value; `false` for out-of-range ids.
    pub fn get(&self, battery_id: u32) -> bool {
        self.slot(battery_id)
            .map(|slot| slot.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}

/// Handle to a running fleet: the shared anomaly flags plus the means to
/// stop scheduling further ticks.
pub struct FleetHandle {
    pub anomalies: Arc<AnomalyFlags>,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl FleetHandle {
    /// Stop scheduling future ticks and wait for every battery loop to
    /// drain. In-progress ticks are never interrupted mid-computation.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tracker.wait().await;
    }
}

/// Start one simulation loop per configured battery id.
pub fn spawn_fleet(
    cfg: &Config,
    table: Arc<EnergyConsumptionTable>,
    sink: Arc<dyn TelemetrySink>,
) -> FleetHandle {
    let anomalies = Arc::new(AnomalyFlags::new(cfg.fleet.battery_count as usize));
    let tracker = TaskTracker::new();
    let cancel = CancellationToken::new();

    let vehicle = VehicleParams {
        weight_kg: cfg.vehicle.weight_kg,
        drag_coefficient: cfg.vehicle.drag_coefficient,
        width_m: cfg.vehicle.width_m,
        height_m: cfg.vehicle.height_m,
        tire_rolling_resistance: cfg.vehicle.tire_rolling_resistance,
        max_wheel_speed_mps: cfg.vehicle.max_wheel_speed_mps,
    };
    let battery = BatteryParams {
        capacity_kwh: cfg.battery.capacity_kwh,
        nominal_voltage_v: cfg.battery.nominal_voltage_v,
    };
    let tick = Duration::from_secs(cfg.fleet.tick_seconds.max(1));

    for i in 0..cfg.fleet.battery_count {
        let battery_id = i + 1;
        let entity = BatteryEntity::new(
            battery_id,
            vehicle.clone(),
            battery.clone(),
            table.clone(),
            tick.as_secs_f64(),
            cfg.fleet.rng_seed.map(|seed| seed + u64::from(battery_id)),
        );
        tracker.spawn(run_battery_loop(
            entity,
            tick,
            anomalies.clone(),
            sink.clone(),
            cancel.clone(),
        ));
    }
    tracker.close();

    info!(
        battery_count = cfg.fleet.battery_count,
        tick_seconds = tick.as_secs(),
        "fleet simulation started"
    );

    FleetHandle {
        anomalies,
        tracker,
        cancel,
    }
}

async fn run_battery_loop(
    mut entity: BatteryEntity,
    tick: Duration,
    anomalies: Arc<AnomalyFlags>,
    sink: Arc<dyn TelemetrySink>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(tick);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!(battery_id = entity.id(), "battery simulation loop stopped");
                break;
            }
            _ = interval.tick() => {
                let anomaly = anomalies.get(entity.id());
                let record = entity.tick(anomaly);
                if let Err(e) = sink.publish(&record).await {
                    warn!(battery_id = entity.id(), error = %e, "telemetry publish failed");
                }
            }
        }
    }
}
