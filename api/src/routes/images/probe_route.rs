use std::sync::Arc;

use axum::{Json, extract::State};
use image_service::ProbeStatus;

use crate::error_handler::{AppError, AppResult};
use crate::routes::images::probe_request::ProbeRequest;
use crate::shared::{app_state::AppState, http::response_envelope::ApiResponse};

/// Upper bound on URLs per probe request.
const MAX_PROBE_URLS: usize = 50;

/// `POST /images/probe`: check whether resolved image URLs actually serve images.
pub async fn probe_images(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ProbeRequest>,
) -> AppResult<Json<ApiResponse<Vec<ProbeStatus>>>> {
    validate_urls(&payload.urls)?;
    let statuses = state.probe.check_many(&payload.urls).await;
    Ok(Json(ApiResponse::success(statuses)))
}

fn validate_urls(urls: &[String]) -> AppResult<()> {
    if urls.is_empty() {
        return Err(AppError::BadRequest("urls must not be empty".into()));
    }
    if urls.len() > MAX_PROBE_URLS {
        return Err(AppError::BadRequest(format!(
            "at most {MAX_PROBE_URLS} urls per request, got {}",
            urls.len()
        )));
    }
    Ok(())
}
