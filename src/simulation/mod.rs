//! # Battery Simulation Core
//!
//! Per-battery simulation building blocks, composed once per tick by the
//! fleet scheduler:
//!
//! - **EnergyConsumptionTable**: static speed→energy lookup with linear
//!   interpolation between fleet-measured samples
//! - **DrivingProfileGenerator**: bounded random walk producing the next
//!   wheel speed and ambient temperature
//! - **BatteryPhysicsModel**: temperature, state-of-health and voltage
//!   dynamics with an irreversible thermal-runaway state
//! - **BatteryEntity**: one battery's mutable state and the ordered tick
//!   sequence that advances it, including the terminal-threshold reset

pub mod battery_physics;
pub mod driving_profile;
pub mod energy_table;
pub mod entity;

pub use battery_physics::{BatteryPhysicsModel, StepEvents, ThermalMode};
pub use driving_profile::DrivingProfileGenerator;
pub use energy_table::{EnergyConsumptionTable, EnergySample, EnergyTableError};
pub use entity::{BatteryEntity, BatteryParams, VehicleParams};
