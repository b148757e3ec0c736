//! Anomaly injection endpoints
//!
//! Toggle a flat per-tick voltage drop for one battery. Toggles are
//! idempotent; an id outside the configured fleet range is acknowledged and
//! ignored.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::{debug, info};

use super::ApiState;

#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub message: String,
}

pub async fn enable_voltage_drop(
    State(st): State<ApiState>,
    Path(battery_id): Path<u32>,
) -> impl IntoResponse {
    set_voltage_drop(&st, battery_id, true)
}

pub async fn disable_voltage_drop(
    State(st): State<ApiState>,
    Path(battery_id): Path<u32>,
) -> impl IntoResponse {
    set_voltage_drop(&st, battery_id, false)
}

fn set_voltage_drop(st: &ApiState, battery_id: u32, enabled: bool) -> impl IntoResponse {
    let action = if enabled { "enabled" } else { "disabled" };

    if st.anomalies.set(battery_id, enabled) {
        info!(battery_id, enabled, "voltage-drop anomaly toggled");
        (
            StatusCode::OK,
            Json(AckResponse {
                message: format!("voltage drop {action} for battery {battery_id}"),
            }),
        )
    } else {
        let fleet_size = st.anomalies.battery_count();
        debug!(battery_id, fleet_size, "anomaly toggle for unknown battery id ignored");
        (
            StatusCode::OK,
            Json(AckResponse {
                message: format!(
                    "battery {battery_id} outside fleet range 1..={fleet_size}, toggle ignored"
                ),
            }),
        )
    }
}
