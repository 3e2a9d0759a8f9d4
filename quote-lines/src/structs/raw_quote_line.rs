//! Read view of one persisted product selection attached to a quote.

use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::structs::variation_record::VariationRecord;

/// Number of independently negotiated quantity/price brackets per line.
pub const TIER_COUNT: usize = 3;

/// One raw product selection as stored with the quote.
///
/// Every field is optional: rows are frequently partial and the
/// consolidation stage treats missing numbers as zero and missing text as
/// absent. Field names follow the camelCase shape of the stored rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuoteLine {
    // ── Identity ────────────────────────────────────────────────────────────
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub product_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub product_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub title: Option<String>,

    // ── Tiered pricing ──────────────────────────────────────────────────────
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub tier_quantity_1: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub tier_quantity_2: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub tier_quantity_3: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub tier_price_1: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub tier_price_2: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub tier_price_3: Option<f64>,

    // ── Single-price fallback ───────────────────────────────────────────────
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub unit_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub line_total: Option<f64>,

    // ── Color ───────────────────────────────────────────────────────────────
    /// Plain label or a serialized object carrying `cor`, `nome` or `color`.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub selected_color_raw: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub color_fallback: Option<String>,

    // ── Images frozen at quote-save time ────────────────────────────────────
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub captured_image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub captured_variation_snapshot: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub captured_variation_image: Option<String>,

    // ── Catalog image data ──────────────────────────────────────────────────
    #[serde(default, deserialize_with = "lenient::tolerant_list")]
    pub variations: Vec<VariationRecord>,
    /// Generic product images; only the first three slots are consulted.
    #[serde(default, deserialize_with = "lenient::opt_string_list")]
    pub default_images: Vec<Option<String>>,
}

impl RawQuoteLine {
    /// Tier quantities in bracket order (absent ⇒ 0).
    pub fn tier_quantities(&self) -> [f64; TIER_COUNT] {
        [
            self.tier_quantity_1.unwrap_or(0.0),
            self.tier_quantity_2.unwrap_or(0.0),
            self.tier_quantity_3.unwrap_or(0.0),
        ]
    }

    /// Tier prices in bracket order, as stored.
    pub fn tier_prices(&self) -> [Option<f64>; TIER_COUNT] {
        [self.tier_price_1, self.tier_price_2, self.tier_price_3]
    }
}

/// Returns the trimmed value when it carries any visible text.
#[inline]
pub fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_partial_and_loosely_typed_rows() {
        let line: RawQuoteLine = serde_json::from_value(json!({
            "productCode": 4021,
            "title": "Caneca Porcelana",
            "tierQuantity1": "100",
            "tierPrice1": "12,50",
            "tierQuantity2": null,
            "quantity": "n/a",
            "selectedColorRaw": { "cor": "Azul" },
            "variations": [{ "color": "Azul", "link_image": "https://cdn/x.png" }],
            "defaultImages": ["https://cdn/a.png", null],
            "lineTotal": null
        }))
        .unwrap();

        assert_eq!(line.product_code.as_deref(), Some("4021"));
        assert_eq!(line.tier_quantities(), [100.0, 0.0, 0.0]);
        assert_eq!(line.tier_price_1, Some(12.5));
        assert_eq!(line.quantity, None);
        assert_eq!(line.selected_color_raw.as_deref(), Some(r#"{"cor":"Azul"}"#));
        assert_eq!(line.variations[0].image_url(), Some("https://cdn/x.png"));
        assert_eq!(line.default_images.len(), 2);
        assert_eq!(line.line_total, None);
    }

    #[test]
    fn null_variations_and_odd_entries_do_not_fail_the_row() {
        let line: RawQuoteLine =
            serde_json::from_value(json!({ "variations": null, "title": "Squeeze" })).unwrap();
        assert!(line.variations.is_empty());

        let line: RawQuoteLine = serde_json::from_value(json!({
            "variations": [42, { "color": "Preto", "image": "p.png" }]
        }))
        .unwrap();
        assert_eq!(line.variations.len(), 1);
        assert_eq!(line.variations[0].color.as_deref(), Some("Preto"));
    }

    #[test]
    fn present_ignores_blank_text() {
        assert_eq!(present(&Some("  ".into())), None);
        assert_eq!(present(&Some(" a ".into())), Some("a"));
        assert_eq!(present(&None), None);
    }
}
