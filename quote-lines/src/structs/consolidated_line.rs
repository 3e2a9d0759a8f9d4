//! Output line handed to renderers.

use serde::Serialize;

use crate::structs::raw_quote_line::TIER_COUNT;
use crate::structs::variation_record::VariationRecord;

/// Which resolution rule produced a line's image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    CapturedImageUrl,
    CapturedVariationSnapshot,
    CapturedVariationImage,
    VariationColorMatch,
    ColorSlot,
    DefaultImage,
}

impl ImageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSource::CapturedImageUrl => "captured_image_url",
            ImageSource::CapturedVariationSnapshot => "captured_variation_snapshot",
            ImageSource::CapturedVariationImage => "captured_variation_image",
            ImageSource::VariationColorMatch => "variation_color_match",
            ImageSource::ColorSlot => "color_slot",
            ImageSource::DefaultImage => "default_image",
        }
    }
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Image inputs carried from the merged raw lines to the resolution chain.
///
/// Not serialized: renderers only see the resolved URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageCandidates {
    pub captured_image_url: Option<String>,
    pub captured_variation_snapshot: Option<String>,
    pub captured_variation_image: Option<String>,
    pub variations: Vec<VariationRecord>,
    pub default_images: Vec<Option<String>>,
}

/// One deduplicated, priced line of a quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedQuoteLine {
    /// Canonical grouping key shared by every contributing raw line.
    pub key: String,

    pub product_code: Option<String>,
    pub product_id: Option<String>,
    pub title: Option<String>,

    /// Per-bracket quantities summed over contributing lines.
    pub tier_quantities: [f64; TIER_COUNT],
    /// First non-empty price seen per bracket.
    pub tier_prices: [Option<f64>; TIER_COUNT],

    /// Three tiers plus the generic quantity.
    pub quantity: f64,
    pub unit_price: f64,
    /// Always `quantity * unit_price`.
    pub line_total: f64,

    /// Display color (structured value already unwrapped); `None` when no color was chosen.
    pub resolved_color: Option<String>,
    /// Best image candidate; `None` means render the "no image" placeholder.
    pub resolved_image_url: Option<String>,
    pub image_source: Option<ImageSource>,

    #[serde(skip)]
    pub images: ImageCandidates,
}
