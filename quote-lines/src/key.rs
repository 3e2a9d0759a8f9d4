//! Canonical grouping key: normalized product identity plus resolved color.

use std::fmt;

use serde::Serialize;

use crate::color::resolve_color_opt;
use crate::normalize::normalize;
use crate::structs::raw_quote_line::{RawQuoteLine, present};

const NO_CODE: &str = "no-code";
const NO_TITLE: &str = "no-title";
const NO_COLOR: &str = "no-color";

/// Derived identity of a logical quote line. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CanonicalGroupKey(String);

impl CanonicalGroupKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalGroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display color of a line: the structured/plain selection, else the
/// secondary color field. `None` when neither carries text.
pub fn line_color(line: &RawQuoteLine) -> Option<String> {
    let resolved = resolve_color_opt(line.selected_color_raw.as_deref());
    if !resolved.trim().is_empty() {
        return Some(resolved);
    }
    present(&line.color_fallback).map(str::to_string)
}

/// Build the grouping key of a raw line.
///
/// `normalize(code | id | "no-code") - normalize(title | "no-title") - normalize(color | "no-color")`
pub fn build_key(line: &RawQuoteLine) -> CanonicalGroupKey {
    let color = line_color(line);
    build_key_with_color(line, color.as_deref())
}

/// Key construction with an already resolved color, so the aggregator does
/// not resolve twice.
pub(crate) fn build_key_with_color(line: &RawQuoteLine, color: Option<&str>) -> CanonicalGroupKey {
    let code = present(&line.product_code)
        .or_else(|| present(&line.product_id))
        .unwrap_or(NO_CODE);
    let title = present(&line.title).unwrap_or(NO_TITLE);
    let color = color.unwrap_or(NO_COLOR);

    CanonicalGroupKey(format!(
        "{}-{}-{}",
        normalize(code),
        normalize(title),
        normalize(color)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(code: Option<&str>, id: Option<&str>, title: Option<&str>) -> RawQuoteLine {
        RawQuoteLine {
            product_code: code.map(Into::into),
            product_id: id.map(Into::into),
            title: title.map(Into::into),
            ..Default::default()
        }
    }

    #[test]
    fn code_is_preferred_over_id() {
        let k = build_key(&line(Some("CX-10"), Some("99"), Some("Caneca")));
        assert_eq!(k.as_str(), "cx-10-caneca-no-color");
        let k = build_key(&line(None, Some("99"), Some("Caneca")));
        assert_eq!(k.as_str(), "99-caneca-no-color");
        let k = build_key(&line(Some("  "), None, None));
        assert_eq!(k.as_str(), "no-code-no-title-no-color");
    }

    #[test]
    fn structured_and_plain_color_of_same_label_share_a_key() {
        let mut a = line(Some("CX-10"), None, Some("Caneca Térmica"));
        a.selected_color_raw = Some(r#"{"cor":"Azul"}"#.into());
        let mut b = line(Some("cx-10 "), None, Some("caneca termica"));
        b.selected_color_raw = Some(" AZUL".into());
        assert_eq!(build_key(&a), build_key(&b));
        assert_eq!(build_key(&a).as_str(), "cx-10-caneca termica-azul");
    }

    #[test]
    fn fallback_color_is_used_when_selection_is_empty() {
        let mut a = line(Some("1"), None, Some("Bolsa"));
        a.selected_color_raw = Some("   ".into());
        a.color_fallback = Some("Preto".into());
        assert_eq!(line_color(&a).as_deref(), Some("Preto"));
        assert_eq!(build_key(&a).as_str(), "1-bolsa-preto");
    }

    #[test]
    fn different_colors_make_different_keys() {
        let mut a = line(Some("1"), None, Some("Bolsa"));
        a.selected_color_raw = Some("Preto".into());
        let mut b = a.clone();
        b.selected_color_raw = Some("Branco".into());
        assert_ne!(build_key(&a), build_key(&b));
    }
}
