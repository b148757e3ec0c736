//! Control-plane HTTP surface.
//!
//! The simulation core never depends on this layer; it only exposes the
//! per-battery anomaly toggles and a liveness probe.

pub mod anomaly;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::fleet::AnomalyFlags;

#[derive(Clone)]
pub struct ApiState {
    pub anomalies: Arc<AnomalyFlags>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api/v1", v1_router(state))
        .layer(TraceLayer::new_for_http())
}

fn v1_router(state: ApiState) -> Router {
    Router::new()
        .route(
            "/batteries/:battery_id/anomaly/voltage-drop/enable",
            post(anomaly::enable_voltage_drop),
        )
        .route(
            "/batteries/:battery_id/anomaly/voltage-drop/disable",
            post(anomaly::disable_voltage_drop),
        )
        .with_state(state)
}

pub async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}
