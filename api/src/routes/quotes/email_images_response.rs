use image_service::EmailImage;
use quote_lines::QuoteRenderModel;
use serde::Serialize;

/// Consolidated quote plus one prepared image per line, index-aligned.
#[derive(Debug, Serialize)]
pub struct EmailImagesResponse {
    pub quote: QuoteRenderModel,
    pub subtotal: f64,
    pub images: Vec<EmailImage>,
}
