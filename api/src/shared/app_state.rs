use std::sync::Arc;

use image_service::{HttpImageFetcher, ImageProbeService, ImageServiceConfig};
use quote_lines::{ColorSlotTable, ConsolidatedLineAssembler};
use tracing::info;

use crate::error_handler::AppResult;

/// Shared state for all HTTP handlers.
pub struct AppState {
    /// Consolidation pipeline with the catalog's color slot table.
    pub assembler: ConsolidatedLineAssembler,
    /// Reachability diagnostics for resolved image URLs.
    pub probe: ImageProbeService,
    /// Downloads images that must be inlined into emails.
    pub fetcher: HttpImageFetcher,
    /// Limits and public host list for email images.
    pub image_cfg: ImageServiceConfig,
    /// Size of the loaded color slot table, reported by `/health`.
    pub color_slots: usize,
}

impl AppState {
    /// Build state from explicit parts.
    pub fn new(color_slots: ColorSlotTable, image_cfg: ImageServiceConfig) -> AppResult<Self> {
        let slot_count = color_slots.len();
        let assembler = ConsolidatedLineAssembler::with_color_slots(Arc::new(color_slots));
        let probe = ImageProbeService::new(Some(image_cfg.timeout_secs))?;
        let fetcher = HttpImageFetcher::new(&image_cfg)?;
        Ok(Self {
            assembler,
            probe,
            fetcher,
            image_cfg,
            color_slots: slot_count,
        })
    }

    /// Load shared state from environment variables.
    pub fn from_env() -> AppResult<Self> {
        let color_slots = ColorSlotTable::from_env()?;
        let image_cfg = ImageServiceConfig::from_env()?;
        info!(
            color_slots = color_slots.len(),
            public_hosts = image_cfg.public_hosts.len(),
            "app state loaded"
        );
        Self::new(color_slots, image_cfg)
    }
}
