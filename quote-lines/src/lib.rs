//! Quote line consolidation and variant image resolution.
//!
//! Turns the raw, possibly duplicated product selections attached to a quote
//! into a canonical list of priced lines, each with one representative image.
//!
//! Pipeline: raw lines → [`build_key`] → [`aggregate`] → [`ImageChain`] per
//! line → [`ConsolidatedLineAssembler`]. Every stage is synchronous and
//! total; the only fallible entry point is loading the [`ColorSlotTable`].
//!
//! # Example
//! ```
//! use quote_lines::{ConsolidatedLineAssembler, RawQuoteLine};
//!
//! let lines: Vec<RawQuoteLine> = serde_json::from_str(r#"[
//!     {"productCode": "P1", "title": "Caneta", "tierQuantity1": 10, "tierPrice1": 5},
//!     {"productCode": "p1", "title": "CANETA", "tierQuantity1": 5, "tierPrice1": 5}
//! ]"#).unwrap();
//!
//! let out = ConsolidatedLineAssembler::default().assemble(&lines);
//! assert_eq!(out.len(), 1);
//! assert_eq!(out[0].line_total, 75.0);
//! ```

pub mod aggregate;
pub mod assemble;
pub mod cfg;
pub mod color;
pub mod errors;
pub mod image_chain;
pub mod key;
pub mod lenient;
pub mod normalize;
pub mod structs;

pub use aggregate::{LineAccumulator, LinePricing, aggregate, fold_lines, price_line};
pub use assemble::{ConsolidatedLineAssembler, QuoteRenderModel};
pub use cfg::ColorSlotTable;
pub use color::{StructuredColor, parse_optional_structured_color, resolve_color};
pub use errors::quote_lines_error::QuoteLinesError;
pub use image_chain::{ImageChain, ImageResolution, ImageResolver, resolve_image};
pub use key::{CanonicalGroupKey, build_key};
pub use normalize::normalize;
pub use structs::{
    consolidated_line::{ConsolidatedQuoteLine, ImageCandidates, ImageSource},
    quote_header::QuoteHeader,
    raw_quote_line::RawQuoteLine,
    variation_record::VariationRecord,
};
