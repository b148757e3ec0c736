//! # Battery Entity
//!
//! The mutable record for one simulated vehicle battery and the ordered
//! per-tick update that advances it. Each entity is owned exclusively by its
//! own scheduled loop; the only externally written input is the per-battery
//! anomaly flag, passed in by value each tick.

use std::sync::Arc;

use tracing::{info, warn};

use crate::publish::TelemetryRecord;
use crate::simulation::battery_physics::BatteryPhysicsModel;
use crate::simulation::driving_profile::DrivingProfileGenerator;
use crate::simulation::energy_table::EnergyConsumptionTable;

const AIR_DENSITY_KG_PER_M3: f64 = 1.2;
const GRAVITY_MPS2: f64 = 9.81;
const INITIAL_AMBIENT_TEMP_C: f64 = 18.3;
const ANOMALY_VOLTAGE_DROP_V: f64 = 2.83;
const SOH_RESET_THRESHOLD: f64 = 0.5;
const SOC_RESET_THRESHOLD: f64 = 0.05;
/// The physics model always advances with a 1 s step, even when the
/// scheduler tick is longer.
const PHYSICS_STEP_S: f64 = 1.0;

/// Physical parameters of the simulated vehicle.
#[derive(Debug, Clone)]
pub struct VehicleParams {
    pub weight_kg: f64,
    pub drag_coefficient: f64,
    pub width_m: f64,
    pub height_m: f64,
    pub tire_rolling_resistance: f64,
    pub max_wheel_speed_mps: f64,
}

impl VehicleParams {
    fn frontal_area_m2(&self) -> f64 {
        self.width_m * self.height_m
    }
}

/// Nominal pack ratings.
#[derive(Debug, Clone)]
pub struct BatteryParams {
    pub capacity_kwh: f64,
    pub nominal_voltage_v: f64,
}

/// One battery's full simulation state: driving profile, physics model and
/// the accumulated electrical/odometer quantities.
pub struct BatteryEntity {
    id: u32,
    vehicle: VehicleParams,
    battery: BatteryParams,
    table: Arc<EnergyConsumptionTable>,
    tick_interval_s: f64,
    profile: DrivingProfileGenerator,
    physics: BatteryPhysicsModel,
    remaining_capacity_kwh: f64,
    driving_distance_km: f64,
    speed_mps: f64,
    ambient_temp_c: f64,
    applied_voltage_v: f64,
}

impl BatteryEntity {
    pub fn new(
        id: u32,
        vehicle: VehicleParams,
        battery: BatteryParams,
        table: Arc<EnergyConsumptionTable>,
        tick_interval_s: f64,
        rng_seed: Option<u64>,
    ) -> Self {
        info!(battery_id = id, "initializing battery simulation entity");
        let remaining_capacity_kwh = battery.capacity_kwh;
        let applied_voltage_v = battery.nominal_voltage_v;
        let speed_mps = vehicle.max_wheel_speed_mps * 0.5;
        Self {
            id,
            vehicle,
            battery,
            table,
            tick_interval_s,
            profile: DrivingProfileGenerator::new(rng_seed),
            physics: BatteryPhysicsModel::new(),
            remaining_capacity_kwh,
            driving_distance_km: 0.0,
            speed_mps,
            ambient_temp_c: INITIAL_AMBIENT_TEMP_C,
            applied_voltage_v,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Advance the entity one tick and produce the telemetry record for it.
    ///
    /// The sequence is fixed: drive, integrate distance and losses, derive
    /// SOC and current, step the physics model, apply the anomaly override,
    /// build the record, then check the terminal thresholds. When a
    /// threshold is hit the entity re-initializes in place; the record built
    /// this tick is still emitted.
    pub fn tick(&mut self, anomaly_voltage_drop: bool) -> TelemetryRecord {
        let (speed_mps, ambient_c) = self.profile.advance(
            self.speed_mps,
            self.ambient_temp_c,
            self.vehicle.max_wheel_speed_mps,
        );
        self.speed_mps = speed_mps;
        self.ambient_temp_c = ambient_c;
        let kmh = speed_mps * 3.6;

        self.driving_distance_km += speed_mps * self.tick_interval_s / 1000.0;

        // Energy drawn over this tick: table draw plus drag and rolling
        // losses, all in kWh.
        let draw_kw = self.table.lookup(kmh);
        let consumption_kwh = draw_kw / 3600.0 * self.tick_interval_s;
        let air_kwh = self.air_resistance_kwh(speed_mps);
        let rolling_kwh = self.rolling_resistance_kwh(speed_mps);
        self.remaining_capacity_kwh -= consumption_kwh + air_kwh + rolling_kwh;

        let state_of_charge = self.remaining_capacity_kwh / self.battery.capacity_kwh;

        // Demanded power in W over the pack's present voltage.
        let battery_current_a = draw_kw * 1000.0 / self.applied_voltage_v;

        let events = self
            .physics
            .step(battery_current_a, PHYSICS_STEP_S, state_of_charge);
        if events.runaway_triggered {
            warn!(
                battery_id = self.id,
                battery_temp_c = self.physics.temperature_c(),
                "thermal runaway initiated"
            );
        }
        if events.critical_failure {
            warn!(
                battery_id = self.id,
                battery_temp_c = self.physics.temperature_c(),
                "battery reached critical failure temperature"
            );
        }

        if anomaly_voltage_drop {
            // Injected fault: flat per-tick sag, ignoring the model voltage.
            self.applied_voltage_v -= ANOMALY_VOLTAGE_DROP_V;
        } else {
            self.applied_voltage_v = self.physics.voltage_v();
        }

        let record = TelemetryRecord::new(
            self.id,
            state_of_charge,
            self.physics.state_of_health(),
            battery_current_a,
            self.applied_voltage_v,
            kmh,
            self.driving_distance_km,
            self.physics.temperature_c(),
            self.ambient_temp_c,
        );

        if self.physics.state_of_health() <= SOH_RESET_THRESHOLD
            || state_of_charge <= SOC_RESET_THRESHOLD
        {
            info!(
                battery_id = self.id,
                state_of_health = self.physics.state_of_health(),
                state_of_charge,
                "terminal threshold reached, re-initializing battery entity"
            );
            self.reinitialize();
        }

        record
    }

    /// Full reset to startup defaults; the next tick starts fresh.
    fn reinitialize(&mut self) {
        self.remaining_capacity_kwh = self.battery.capacity_kwh;
        self.driving_distance_km = 0.0;
        self.applied_voltage_v = self.battery.nominal_voltage_v;
        self.speed_mps = self.vehicle.max_wheel_speed_mps * 0.5;
        self.ambient_temp_c = INITIAL_AMBIENT_TEMP_C;
        self.physics.reset();
    }

    // F_air = rho/2 * c_d * A * v^2, integrated over the tick and scaled
    // from Ws to kWh.
    fn air_resistance_kwh(&self, speed_mps: f64) -> f64 {
        let force_n = (AIR_DENSITY_KG_PER_M3 / 2.0)
            * self.vehicle.drag_coefficient
            * self.vehicle.frontal_area_m2()
            * speed_mps
            * speed_mps;
        force_n * speed_mps * self.tick_interval_s / 3_600_000.0
    }

    // F_roll = m * g * c_rr, same integration and scaling.
    fn rolling_resistance_kwh(&self, speed_mps: f64) -> f64 {
        let force_n = self.vehicle.weight_kg * GRAVITY_MPS2 * self.vehicle.tire_rolling_resistance;
        force_n * speed_mps * self.tick_interval_s / 3_600_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_vehicle() -> VehicleParams {
        VehicleParams {
            weight_kg: 2200.0,
            drag_coefficient: 0.23,
            width_m: 1.96,
            height_m: 1.44,
            tire_rolling_resistance: 0.012,
            max_wheel_speed_mps: 69.0,
        }
    }

    fn test_battery() -> BatteryParams {
        BatteryParams {
            capacity_kwh: 100.0,
            nominal_voltage_v: 400.0,
        }
    }

    fn test_entity(seed: u64) -> BatteryEntity {
        BatteryEntity::new(
            1,
            test_vehicle(),
            test_battery(),
            Arc::new(EnergyConsumptionTable::tesla_model_s()),
            1.0,
            Some(seed),
        )
    }

    #[test]
    fn test_anomaly_applies_flat_voltage_drop() {
        let mut entity = test_entity(42);
        assert_eq!(entity.applied_voltage_v, 400.0);

        let record = entity.tick(true);

        // 400.0 - 2.83, irrespective of the physics-model voltage that tick.
        assert_eq!(record.battery_voltage, 397.17);
        assert!((entity.applied_voltage_v - 397.17).abs() < 1e-9);
    }

    #[test]
    fn test_without_anomaly_voltage_tracks_physics_model() {
        let mut entity = test_entity(42);
        let record = entity.tick(false);

        assert!((entity.applied_voltage_v - entity.physics.voltage_v()).abs() < 1e-12);
        // A healthy pack near full charge sits on the top curve step.
        assert!(record.battery_voltage > 390.0);
    }

    #[test]
    fn test_physics_advances_one_second_per_tick_regardless_of_interval() {
        let mut entity = BatteryEntity::new(
            1,
            test_vehicle(),
            test_battery(),
            Arc::new(EnergyConsumptionTable::tesla_model_s()),
            5.0,
            Some(42),
        );

        entity.tick(false);

        // Wear reflects exactly one second of base degradation, not five.
        assert!((entity.physics.state_of_health() - 99.9999).abs() < 1e-9);
        // The odometer, by contrast, integrates over the full 5 s tick.
        assert!((entity.driving_distance_km - entity.speed_mps * 5.0 / 1000.0).abs() < 1e-12);
    }

    #[test]
    fn test_distance_accumulates_monotonically() {
        let mut entity = test_entity(7);
        let mut prev_distance = 0.0;

        for _ in 0..50 {
            let record = entity.tick(false);
            assert!(entity.driving_distance_km >= prev_distance);
            assert!(record.distance >= 0.0);
            prev_distance = entity.driving_distance_km;
        }
    }

    #[test]
    fn test_capacity_drains_while_driving() {
        let mut entity = test_entity(11);
        for _ in 0..20 {
            entity.tick(false);
        }
        assert!(entity.remaining_capacity_kwh < 100.0);
    }

    #[test]
    fn test_stationary_vehicle_draws_no_current() {
        let mut vehicle = test_vehicle();
        vehicle.max_wheel_speed_mps = 0.0;
        let mut entity = BatteryEntity::new(
            1,
            vehicle,
            test_battery(),
            Arc::new(EnergyConsumptionTable::tesla_model_s()),
            1.0,
            Some(42),
        );

        let record = entity.tick(false);

        assert_eq!(record.kmh, 0.0);
        assert_eq!(record.battery_current, 0.0);
        assert_eq!(record.distance, 0.0);
        assert!((entity.remaining_capacity_kwh - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_low_soc_triggers_full_reinitialization() {
        let mut entity = test_entity(42);
        entity.remaining_capacity_kwh = 4.0; // SOC 0.04, under the 0.05 floor

        let record = entity.tick(false);

        // The terminal-tick record still reports the drained state...
        assert!(record.state_of_charge <= 0.05);
        // ...but the entity itself starts fresh.
        assert_eq!(entity.remaining_capacity_kwh, 100.0);
        assert_eq!(entity.driving_distance_km, 0.0);
        assert_eq!(entity.applied_voltage_v, 400.0);
        assert_eq!(entity.physics.state_of_health(), 100.0);
        assert_eq!(entity.ambient_temp_c, INITIAL_AMBIENT_TEMP_C);
        assert_eq!(entity.speed_mps, 69.0 * 0.5);
    }

    #[test]
    fn test_degraded_soh_triggers_full_reinitialization() {
        use crate::simulation::battery_physics::ThermalMode;

        let mut entity = test_entity(42);
        // Overdrive the physics model until it latches into runaway; the
        // next tick's own physics step then collapses SOH to zero and the
        // terminal check fires.
        while entity.physics.mode() == ThermalMode::Normal {
            entity.physics.step(1000.0, 1.0, 0.9);
        }

        entity.tick(false);

        assert_eq!(entity.physics.state_of_health(), 100.0);
        assert_eq!(entity.physics.mode(), ThermalMode::Normal);
        assert_eq!(entity.remaining_capacity_kwh, 100.0);
        assert_eq!(entity.driving_distance_km, 0.0);
    }

    #[test]
    fn test_tick_values_stay_finite_over_long_runs() {
        let mut entity = test_entity(1234);
        for _ in 0..5_000 {
            let record = entity.tick(false);
            assert!(record.state_of_charge.is_finite());
            assert!(record.battery_current.is_finite());
            assert!(record.battery_voltage.is_finite());
            assert!(record.battery_temp.is_finite());
        }
    }
}
