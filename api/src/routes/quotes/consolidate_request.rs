use quote_lines::{QuoteHeader, RawQuoteLine};
use serde::Deserialize;

/// Body for the consolidation endpoints. Individual line fields are decoded
/// leniently; only the envelope shape is enforced.
#[derive(Debug, Deserialize)]
pub struct ConsolidateRequest {
    #[serde(default)]
    pub header: QuoteHeader,
    pub lines: Vec<RawQuoteLine>,
}
