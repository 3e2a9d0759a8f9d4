use std::sync::Arc;

use axum::{Json, extract::State};
use image_service::prepare_email_images;
use tracing::info;

use crate::routes::quotes::{
    consolidate_request::ConsolidateRequest, email_images_response::EmailImagesResponse,
};
use crate::shared::{app_state::AppState, http::response_envelope::ApiResponse};

/// `POST /quotes/email_images`: consolidate, then prepare every resolved image
/// for an outgoing email. A failing image becomes a placeholder; the request
/// itself still succeeds.
pub async fn prepare_quote_email_images(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ConsolidateRequest>,
) -> Json<ApiResponse<EmailImagesResponse>> {
    let quote = state.assembler.assemble_quote(payload.header, &payload.lines);
    let urls: Vec<Option<String>> = quote
        .lines
        .iter()
        .map(|l| l.resolved_image_url.clone())
        .collect();

    let images = prepare_email_images(&state.fetcher, &urls, &state.image_cfg).await;
    let placeholders = images.iter().filter(|i| i.is_placeholder()).count();
    info!(lines = quote.lines.len(), placeholders, "email images ready");

    let subtotal = quote.subtotal();
    Json(ApiResponse::success(EmailImagesResponse {
        quote,
        subtotal,
        images,
    }))
}
