use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::Utc;
use serde::Serialize;

use crate::shared::{app_state::AppState, http::response_envelope::ApiResponse};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Entries in the loaded color → default image slot table.
    pub color_slots: usize,
    pub timestamp: String,
}

/// Liveness plus a short summary of loaded configuration.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        color_slots: state.color_slots,
        timestamp: Utc::now().to_rfc3339(),
    }))
}
