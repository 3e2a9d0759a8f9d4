//! Final composition: aggregate raw lines, then resolve one image per line.

use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use crate::aggregate::aggregate;
use crate::cfg::ColorSlotTable;
use crate::image_chain::ImageChain;
use crate::structs::consolidated_line::ConsolidatedQuoteLine;
use crate::structs::quote_header::QuoteHeader;
use crate::structs::raw_quote_line::RawQuoteLine;

/// Everything a renderer (screen, print, email) needs for one quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRenderModel {
    pub header: QuoteHeader,
    pub lines: Vec<ConsolidatedQuoteLine>,
}

impl QuoteRenderModel {
    /// Sum of line totals.
    pub fn subtotal(&self) -> f64 {
        self.lines.iter().map(|l| l.line_total).sum()
    }
}

/// Stateless assembler. Holds only the configured image chain; nothing is
/// cached between calls, so every render reflects the current rows.
pub struct ConsolidatedLineAssembler {
    chain: ImageChain,
}

impl ConsolidatedLineAssembler {
    pub fn new(chain: ImageChain) -> Self {
        Self { chain }
    }

    /// Assembler using the standard chain and the given slot table.
    pub fn with_color_slots(table: Arc<ColorSlotTable>) -> Self {
        Self::new(ImageChain::standard(table))
    }

    /// Consolidate `lines` and attach the resolved image to each output line.
    #[instrument(level = "debug", skip_all, fields(raw = lines.len()))]
    pub fn assemble(&self, lines: &[RawQuoteLine]) -> Vec<ConsolidatedQuoteLine> {
        aggregate(lines)
            .into_iter()
            .map(|mut line| {
                if let Some(hit) = self.chain.resolve(&line) {
                    line.resolved_image_url = Some(hit.url);
                    line.image_source = Some(hit.source);
                }
                line
            })
            .collect()
    }

    /// [`assemble`](Self::assemble) plus the quote header.
    pub fn assemble_quote(&self, header: QuoteHeader, lines: &[RawQuoteLine]) -> QuoteRenderModel {
        QuoteRenderModel {
            header,
            lines: self.assemble(lines),
        }
    }
}

impl Default for ConsolidatedLineAssembler {
    fn default() -> Self {
        Self::new(ImageChain::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::consolidated_line::ImageSource;
    use serde_json::json;

    fn raw_lines() -> Vec<RawQuoteLine> {
        serde_json::from_value(json!([
            {
                "productCode": "CAN-01", "title": "Caneca Cerâmica",
                "tierQuantity1": 10, "tierPrice1": 5,
                "selectedColorRaw": "{\"cor\":\"Branco\"}",
                "variations": [{ "color": "branco", "image": "branco.png" }],
                "defaultImages": ["d0.png"]
            },
            {
                "productCode": "can-01", "title": "caneca ceramica",
                "tierQuantity1": "5", "tierPrice1": "5",
                "selectedColorRaw": "BRANCO",
                "capturedImageUrl": "captured.png"
            },
            {
                "productCode": "SQZ-9", "title": "Squeeze",
                "quantity": 0, "unitPrice": 3,
                "defaultImages": ["s.png"]
            },
            {
                "productId": 77, "title": "Bloco",
                "quantity": 100, "unitPrice": "0,80"
            }
        ]))
        .unwrap()
    }

    #[test]
    fn assembles_priced_deduplicated_lines_with_images() {
        let asm = ConsolidatedLineAssembler::default();
        let out = asm.assemble(&raw_lines());

        assert_eq!(out.len(), 2);

        let mug = &out[0];
        assert_eq!(mug.key, "can-01-caneca ceramica-branco");
        assert_eq!(mug.quantity, 15.0);
        assert_eq!(mug.line_total, 75.0);
        assert_eq!(mug.resolved_color.as_deref(), Some("Branco"));
        assert_eq!(mug.resolved_image_url.as_deref(), Some("captured.png"));
        assert_eq!(mug.image_source, Some(ImageSource::CapturedImageUrl));

        let pad = &out[1];
        assert_eq!(pad.key, "77-bloco-no-color");
        assert_eq!(pad.unit_price, 0.8);
        assert_eq!(pad.resolved_image_url, None);
        assert_eq!(pad.image_source, None);
    }

    #[test]
    fn pipeline_is_idempotent() {
        let asm = ConsolidatedLineAssembler::default();
        let lines = raw_lines();
        let a = serde_json::to_vec(&asm.assemble(&lines)).unwrap();
        let b = serde_json::to_vec(&asm.assemble(&lines)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn render_model_carries_header_and_subtotal() {
        let asm = ConsolidatedLineAssembler::default();
        let header = QuoteHeader {
            payment_terms: Some("28 dias".into()),
            ..Default::default()
        };
        let model = asm.assemble_quote(header.clone(), &raw_lines());
        assert_eq!(model.header, header);
        assert!((model.subtotal() - 155.0).abs() < 1e-9);

        let v = serde_json::to_value(&model).unwrap();
        assert_eq!(v["header"]["paymentTerms"], "28 dias");
        assert_eq!(v["lines"][0]["resolvedImageUrl"], "captured.png");
        assert!(v["lines"][0].get("images").is_none());
    }

    #[test]
    fn injected_slot_table_changes_resolution() {
        let table = Arc::new(ColorSlotTable::from_pairs([("verde", 1)]).unwrap());
        let asm = ConsolidatedLineAssembler::with_color_slots(table);
        let lines: Vec<RawQuoteLine> = serde_json::from_value(json!([{
            "productCode": "B1", "title": "Boné", "quantity": 1,
            "colorFallback": "Verde",
            "defaultImages": ["d0.png", "d1.png"]
        }]))
        .unwrap();

        let out = asm.assemble(&lines);
        assert_eq!(out[0].resolved_image_url.as_deref(), Some("d1.png"));
        assert_eq!(out[0].image_source, Some(ImageSource::ColorSlot));
    }
}
