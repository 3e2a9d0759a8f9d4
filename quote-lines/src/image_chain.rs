//! Representative-image resolution as a chain of responsibility.
//!
//! Each rule is a small [`ImageResolver`]; [`ImageChain`] asks them in order
//! and the first one that returns a URL wins. No rule performs I/O, so the
//! result depends only on the line's state and the injected slot table.
//!
//! Standard order:
//! 1. captured image URL
//! 2. captured variation snapshot
//! 3. captured variation image
//! 4. variation whose color matches the line color
//! 5. default image slot mapped from the line color
//! 6. first populated default image

use std::sync::Arc;

use tracing::debug;

use crate::cfg::{ColorSlotTable, DEFAULT_IMAGE_SLOTS};
use crate::normalize::normalize;
use crate::structs::consolidated_line::{ConsolidatedQuoteLine, ImageSource};
use crate::structs::raw_quote_line::present;
use crate::structs::variation_record::VariationRecord;

/// One fallback rule of the chain.
pub trait ImageResolver: Send + Sync {
    /// Tag recorded on the line when this rule wins.
    fn source(&self) -> ImageSource;

    /// Candidate URL for `line`, or `None` to defer to the next rule.
    fn resolve(&self, line: &ConsolidatedQuoteLine) -> Option<String>;
}

/// Winning URL together with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResolution {
    pub url: String,
    pub source: ImageSource,
}

pub struct CapturedImageUrl;

impl ImageResolver for CapturedImageUrl {
    fn source(&self) -> ImageSource {
        ImageSource::CapturedImageUrl
    }

    fn resolve(&self, line: &ConsolidatedQuoteLine) -> Option<String> {
        present(&line.images.captured_image_url).map(str::to_string)
    }
}

pub struct CapturedVariationSnapshot;

impl ImageResolver for CapturedVariationSnapshot {
    fn source(&self) -> ImageSource {
        ImageSource::CapturedVariationSnapshot
    }

    fn resolve(&self, line: &ConsolidatedQuoteLine) -> Option<String> {
        present(&line.images.captured_variation_snapshot).map(str::to_string)
    }
}

pub struct CapturedVariationImage;

impl ImageResolver for CapturedVariationImage {
    fn source(&self) -> ImageSource {
        ImageSource::CapturedVariationImage
    }

    fn resolve(&self, line: &ConsolidatedQuoteLine) -> Option<String> {
        present(&line.images.captured_variation_image).map(str::to_string)
    }
}

/// First variation whose normalized color equals the line color. When that
/// entry carries no image the rule defers.
pub struct VariationColorMatch;

impl ImageResolver for VariationColorMatch {
    fn source(&self) -> ImageSource {
        ImageSource::VariationColorMatch
    }

    fn resolve(&self, line: &ConsolidatedQuoteLine) -> Option<String> {
        let wanted = normalize(line.resolved_color.as_deref()?);
        if wanted.is_empty() {
            return None;
        }
        line.images
            .variations
            .iter()
            .find(|v| v.color.as_deref().is_some_and(|c| normalize(c) == wanted))
            .and_then(VariationRecord::image_url)
            .map(str::to_string)
    }
}

/// Default image at the slot the catalog table assigns to the line color.
pub struct ColorSlotLookup {
    table: Arc<ColorSlotTable>,
}

impl ColorSlotLookup {
    pub fn new(table: Arc<ColorSlotTable>) -> Self {
        Self { table }
    }
}

impl ImageResolver for ColorSlotLookup {
    fn source(&self) -> ImageSource {
        ImageSource::ColorSlot
    }

    fn resolve(&self, line: &ConsolidatedQuoteLine) -> Option<String> {
        let slot = self.table.slot_for(line.resolved_color.as_deref()?)?;
        line.images
            .default_images
            .get(slot)
            .and_then(present)
            .map(str::to_string)
    }
}

/// First populated generic product image.
pub struct FirstDefaultImage;

impl ImageResolver for FirstDefaultImage {
    fn source(&self) -> ImageSource {
        ImageSource::DefaultImage
    }

    fn resolve(&self, line: &ConsolidatedQuoteLine) -> Option<String> {
        line.images
            .default_images
            .iter()
            .take(DEFAULT_IMAGE_SLOTS)
            .find_map(present)
            .map(str::to_string)
    }
}

/// Ordered list of resolvers evaluated left to right.
pub struct ImageChain {
    resolvers: Vec<Box<dyn ImageResolver>>,
}

impl ImageChain {
    /// Chain with a custom rule list.
    pub fn new(resolvers: Vec<Box<dyn ImageResolver>>) -> Self {
        Self { resolvers }
    }

    /// The six standard rules, with `table` driving the color-slot step.
    pub fn standard(table: Arc<ColorSlotTable>) -> Self {
        Self::new(vec![
            Box::new(CapturedImageUrl),
            Box::new(CapturedVariationSnapshot),
            Box::new(CapturedVariationImage),
            Box::new(VariationColorMatch),
            Box::new(ColorSlotLookup::new(table)),
            Box::new(FirstDefaultImage),
        ])
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// First successful rule, or `None` when the chain is exhausted.
    pub fn resolve(&self, line: &ConsolidatedQuoteLine) -> Option<ImageResolution> {
        let hit = self.resolvers.iter().find_map(|r| {
            r.resolve(line).map(|url| ImageResolution {
                url,
                source: r.source(),
            })
        });

        match &hit {
            Some(h) => debug!(key = %line.key, source = %h.source, url = %h.url, "image resolved"),
            None => debug!(key = %line.key, "no image available"),
        }
        hit
    }
}

impl Default for ImageChain {
    fn default() -> Self {
        Self::standard(Arc::new(ColorSlotTable::default()))
    }
}

/// Resolve one line with the standard chain.
pub fn resolve_image(line: &ConsolidatedQuoteLine, table: Arc<ColorSlotTable>) -> Option<String> {
    ImageChain::standard(table).resolve(line).map(|h| h.url)
}
