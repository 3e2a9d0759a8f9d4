use std::sync::Arc;

use axum::{Json, extract::State};
use quote_lines::QuoteRenderModel;
use tracing::info;

use crate::routes::quotes::consolidate_request::ConsolidateRequest;
use crate::shared::{app_state::AppState, http::response_envelope::ApiResponse};

/// `POST /quotes/consolidate`: merge duplicate selections, price them and
/// attach one image per line.
pub async fn consolidate_quote(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ConsolidateRequest>,
) -> Json<ApiResponse<QuoteRenderModel>> {
    let raw = payload.lines.len();
    let model = state.assembler.assemble_quote(payload.header, &payload.lines);

    info!(
        raw,
        consolidated = model.lines.len(),
        subtotal = model.subtotal(),
        "quote consolidated"
    );

    Json(ApiResponse::success(model))
}
