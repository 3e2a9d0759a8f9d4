//! HTTP surface for the quote console: consolidation, image probes and
//! email image preparation.

use std::{env, sync::Arc};

pub mod error_handler;
mod middleware_layer;
mod routes;
pub mod shared;

use axum::{
    Router,
    http::Uri,
    middleware,
    routing::{get, post},
};
use tokio::signal;
use tracing::{error, info};

use crate::error_handler::{AppError, AppResult};
use crate::middleware_layer::json_extractor::json_error_mapper;
use crate::routes::{
    health_route::health,
    images::probe_route::probe_images,
    quotes::{consolidate_route::consolidate_quote, email_images_route::prepare_quote_email_images},
};
use crate::shared::app_state::AppState;

const DEFAULT_API_ADDRESS: &str = "127.0.0.1:8080";

/// Build the router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/quotes/consolidate", post(consolidate_quote))
        .route("/quotes/email_images", post(prepare_quote_email_images))
        .route("/images/probe", post(probe_images))
        .fallback(route_not_found)
        .layer(middleware::from_fn(json_error_mapper))
        .with_state(state)
}

async fn route_not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

/// Load configuration, bind `API_ADDRESS` and serve until Ctrl+C.
pub async fn start() -> AppResult<()> {
    let host_url = env::var("API_ADDRESS")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_ADDRESS.to_string());

    let state = Arc::new(AppState::from_env()?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&host_url)
        .await
        .map_err(AppError::Bind)?;
    info!(%host_url, "quote console API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
}
