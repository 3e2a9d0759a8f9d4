use serde::{Deserialize, Serialize};

/// Commercial conditions printed alongside the lines. Passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteHeader {
    #[serde(default)]
    pub payment_terms: Option<String>,
    #[serde(default)]
    pub freight_option: Option<String>,
    #[serde(default)]
    pub validity: Option<String>,
    #[serde(default)]
    pub delivery_lead_time: Option<String>,
}
