//! # EV Fleet Simulator
//!
//! Simulates the electrical and thermal behavior of a fleet of EV batteries
//! and emits periodic per-battery telemetry. Each battery runs on its own
//! fixed-interval loop, composing a stochastic driving profile, a
//! speed→energy lookup table and a thermal/degradation physics model, and
//! resets itself when state-of-health or state-of-charge hits a terminal
//! threshold. A small control plane toggles a per-battery voltage-drop
//! anomaly for testing downstream consumers.

pub mod api;
pub mod config;
pub mod fleet;
pub mod publish;
pub mod simulation;
pub mod telemetry;
