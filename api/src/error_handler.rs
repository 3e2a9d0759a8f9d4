use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use image_service::ImageServiceError;
use quote_lines::QuoteLinesError;
use thiserror::Error;

use crate::shared::http::response_envelope::ApiResponse;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("quote engine configuration: {0}")]
    QuoteConfig(#[from] QuoteLinesError),

    #[error(transparent)]
    ImageService(#[from] ImageServiceError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("no route for {0}")]
    NotFound(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::QuoteConfig(_) => StatusCode::INTERNAL_SERVER_ERROR, // startup-only
            AppError::ImageService(_) => StatusCode::BAD_GATEWAY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Bind(_) | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::QuoteConfig(_) => "CONFIG_ERROR",
            AppError::ImageService(_) => "IMAGE_SERVICE_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotFound(_) => "NOT_FOUND",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ApiResponse::failure(self.error_code(), self.to_string());
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;
