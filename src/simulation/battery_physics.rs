//! # Battery Physics Model
//!
//! Per-battery electrical and thermal state machine computing temperature,
//! state-of-health and terminal voltage from applied current and state of
//! charge each tick.
//!
//! ## Physics Model
//!
//! In normal operation:
//!
//! - Joule heating: P = I² * R_internal
//! - Cooling toward the 25 °C ambient baseline, proportional to the
//!   temperature delta
//! - SOH wears at a base rate per second, with extra wear above 45 °C
//! - Terminal voltage follows a stepped SOC/voltage curve minus the ohmic
//!   drop through an SOC- and temperature-dependent effective resistance
//!
//! At 70 °C the pack enters **thermal runaway**: temperature grows 5% per
//! step, SOH collapses to zero, and there is no path back to normal short of
//! a full external reset. At 150 °C the model reports a critical failure; the
//! owning loop decides when to re-initialize.

use serde::Serialize;

const INITIAL_TEMPERATURE_C: f64 = 25.0;
const COOLING_RATE: f64 = 0.2;
const HEATING_COEFFICIENT: f64 = 0.0005;
const INTERNAL_RESISTANCE_OHM: f64 = 0.0461;

const THERMAL_RUNAWAY_THRESHOLD_C: f64 = 70.0;
const RUNAWAY_MULTIPLIER: f64 = 1.05;
const CRITICAL_FAILURE_TEMP_C: f64 = 150.0;

const BASE_DEGRADATION_PER_S: f64 = 0.0001;
const HIGH_TEMP_DEGRADATION_PER_S: f64 = 0.0005;
const HIGH_TEMP_THRESHOLD_C: f64 = 45.0;

const NOMINAL_VOLTAGE_V: f64 = 400.0;
const MIN_VOLTAGE_V: f64 = 300.0;

/// Thermal operating mode of the pack.
///
/// `Runaway` is terminal: the only way back to `Normal` is an explicit
/// [`BatteryPhysicsModel::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ThermalMode {
    Normal,
    Runaway,
}

/// Observable events raised by a single physics step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepEvents {
    /// The pack crossed the 70 °C threshold this step and entered runaway.
    pub runaway_triggered: bool,
    /// The pack is in runaway at or above the 150 °C failure temperature.
    pub critical_failure: bool,
}

/// Mutable electrical/thermal state of one battery pack.
#[derive(Debug, Clone, Serialize)]
pub struct BatteryPhysicsModel {
    temperature_c: f64,
    state_of_health: f64,
    voltage_v: f64,
    mode: ThermalMode,
}

impl Default for BatteryPhysicsModel {
    fn default() -> Self {
        Self::new()
    }
}

impl BatteryPhysicsModel {
    pub fn new() -> Self {
        Self {
            temperature_c: INITIAL_TEMPERATURE_C,
            state_of_health: 100.0,
            voltage_v: NOMINAL_VOLTAGE_V,
            mode: ThermalMode::Normal,
        }
    }

    pub fn temperature_c(&self) -> f64 {
        self.temperature_c
    }

    /// State of health in percent, 100 = new, 0 = failed. Never negative.
    pub fn state_of_health(&self) -> f64 {
        self.state_of_health
    }

    pub fn voltage_v(&self) -> f64 {
        self.voltage_v
    }

    pub fn mode(&self) -> ThermalMode {
        self.mode
    }

    /// Advance the model one step given the applied current, step duration
    /// and pack state of charge (0..1).
    pub fn step(&mut self, current_a: f64, interval_s: f64, state_of_charge: f64) -> StepEvents {
        match self.mode {
            ThermalMode::Normal => self.step_normal(current_a, interval_s, state_of_charge),
            ThermalMode::Runaway => self.step_runaway(current_a, state_of_charge),
        }
    }

    fn step_normal(&mut self, current_a: f64, interval_s: f64, state_of_charge: f64) -> StepEvents {
        let mut events = StepEvents::default();

        // Joule heating: P = I^2 * R, offset by cooling toward ambient.
        let power_dissipation_w = current_a * current_a * INTERNAL_RESISTANCE_OHM;
        let cooling_effect =
            COOLING_RATE * interval_s * (self.temperature_c - INITIAL_TEMPERATURE_C);
        self.temperature_c += HEATING_COEFFICIENT * power_dissipation_w - cooling_effect;

        // Wear: base rate, plus accelerated wear at high temperature.
        self.state_of_health -= BASE_DEGRADATION_PER_S * interval_s;
        if self.temperature_c > HIGH_TEMP_THRESHOLD_C {
            self.state_of_health -= HIGH_TEMP_DEGRADATION_PER_S * interval_s;
        }
        if self.state_of_health < 0.0 {
            self.state_of_health = 0.0;
        }

        // Ohmic drop through the effective resistance (rises as the pack
        // drains and heats up).
        let resistance_ohm = INTERNAL_RESISTANCE_OHM
            + 0.02 * (1.0 - state_of_charge)
            + 0.0005 * (self.temperature_c - INITIAL_TEMPERATURE_C);
        let voltage_drop_v = current_a * resistance_ohm;

        // The nominal-voltage figure is assigned first and immediately
        // replaced by the SOC-curve figure; the curve value is the one
        // published. The first assignment is intentionally discarded.
        self.voltage_v = NOMINAL_VOLTAGE_V - voltage_drop_v;
        self.voltage_v = soc_voltage_curve(state_of_charge) - voltage_drop_v;

        if self.temperature_c >= THERMAL_RUNAWAY_THRESHOLD_C {
            self.mode = ThermalMode::Runaway;
            events.runaway_triggered = true;
        }

        events
    }

    fn step_runaway(&mut self, current_a: f64, state_of_charge: f64) -> StepEvents {
        let mut events = StepEvents::default();

        // Exponential temperature rise, independent of current and interval.
        self.temperature_c *= RUNAWAY_MULTIPLIER;
        self.state_of_health = 0.0;

        let voltage_drop_v = current_a * INTERNAL_RESISTANCE_OHM;
        // Same deliberate overwrite as the normal branch.
        self.voltage_v = NOMINAL_VOLTAGE_V - voltage_drop_v;
        self.voltage_v = soc_voltage_curve(state_of_charge) - voltage_drop_v;

        if self.temperature_c >= CRITICAL_FAILURE_TEMP_C {
            events.critical_failure = true;
        }

        events
    }

    /// Restore the pack to nominal: 25 °C, 100% SOH, 400 V, normal mode.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Stepped SOC/voltage curve, scanned from the highest threshold down.
///
/// No interpolation between steps: 0.55 falls in the >= 0.5 bracket and maps
/// to 360 V. Below 0.1 the pack sits at the fully-discharged minimum.
pub fn soc_voltage_curve(state_of_charge: f64) -> f64 {
    if state_of_charge >= 0.9 {
        NOMINAL_VOLTAGE_V
    } else if state_of_charge >= 0.8 {
        390.0
    } else if state_of_charge >= 0.7 {
        380.0
    } else if state_of_charge >= 0.6 {
        370.0
    } else if state_of_charge >= 0.5 {
        360.0
    } else if state_of_charge >= 0.4 {
        350.0
    } else if state_of_charge >= 0.3 {
        340.0
    } else if state_of_charge >= 0.2 {
        330.0
    } else if state_of_charge >= 0.1 {
        320.0
    } else {
        MIN_VOLTAGE_V
    }
}
