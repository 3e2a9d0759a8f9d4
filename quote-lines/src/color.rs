//! Color label extraction from a field that may hold plain text or a
//! serialized object (`{"cor": "Azul"}`, `{"nome": ...}`, `{"color": ...}`).
//!
//! Runs in the grouping hot path, so nothing here may fail: a malformed
//! object is logged and the raw text is used as the label.

use serde_json::{Map, Value};
use tracing::warn;

/// Keys checked, in priority order, inside a structured color value.
pub const COLOR_LABEL_KEYS: [&str; 3] = ["cor", "nome", "color"];

/// A successfully parsed structured color value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredColor {
    pub cor: Option<String>,
    pub nome: Option<String>,
    pub color: Option<String>,
}

impl StructuredColor {
    fn from_map(map: &Map<String, Value>) -> Self {
        let pick = |k: &str| {
            map.get(k)
                .and_then(|v| match v {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
        };
        Self {
            cor: pick(COLOR_LABEL_KEYS[0]),
            nome: pick(COLOR_LABEL_KEYS[1]),
            color: pick(COLOR_LABEL_KEYS[2]),
        }
    }

    /// First present of `cor`, `nome`, `color`.
    pub fn label(&self) -> Option<&str> {
        self.cor
            .as_deref()
            .or(self.nome.as_deref())
            .or(self.color.as_deref())
    }
}

/// Longest prefix of a malformed color value written to the logs.
const RAW_PREVIEW_CHARS: usize = 64;

/// True when the trimmed text is wrapped in `{` … `}`.
#[inline]
pub fn looks_structured(raw: &str) -> bool {
    let t = raw.trim();
    t.len() >= 2 && t.starts_with('{') && t.ends_with('}')
}

/// Safe-parse a structured color value.
///
/// Returns `None` when the text does not look like an object or when it
/// fails to parse as one; the latter is logged at `warn`.
pub fn parse_optional_structured_color(raw: &str) -> Option<StructuredColor> {
    if !looks_structured(raw) {
        return None;
    }
    match serde_json::from_str::<Map<String, Value>>(raw.trim()) {
        Ok(map) => Some(StructuredColor::from_map(&map)),
        Err(e) => {
            let preview: String = raw.chars().take(RAW_PREVIEW_CHARS).collect();
            warn!(raw = %preview, error = %e, "malformed structured color; using raw text");
            None
        }
    }
}

/// Resolve the canonical color label of a raw color field.
///
/// - empty ⇒ empty string
/// - structured and parseable ⇒ first of `cor`/`nome`/`color`, else the trimmed text
/// - structured but unparseable ⇒ the original text unchanged
/// - plain ⇒ trimmed text
///
/// # Example
/// ```
/// use quote_lines::resolve_color;
/// assert_eq!(resolve_color(r#"{"cor":"Azul"}"#), "Azul");
/// assert_eq!(resolve_color(" Verde "), "Verde");
/// ```
pub fn resolve_color(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if !looks_structured(trimmed) {
        return trimmed.to_string();
    }
    match parse_optional_structured_color(trimmed) {
        Some(sc) => sc.label().unwrap_or(trimmed).to_string(),
        None => raw.to_string(),
    }
}

/// [`resolve_color`] over an optional field.
#[inline]
pub fn resolve_color_opt(raw: Option<&str>) -> String {
    raw.map(resolve_color).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_value_priority() {
        assert_eq!(resolve_color(r#"{"cor":"Azul"}"#), "Azul");
        assert_eq!(resolve_color(r#"{"nome":"Verde","color":"Green"}"#), "Verde");
        assert_eq!(resolve_color(r#"{"color":"Red"}"#), "Red");
        assert_eq!(
            resolve_color(r#"{"color":"Red","cor":"Vermelho","nome":"Rubro"}"#),
            "Vermelho"
        );
    }

    #[test]
    fn structured_value_without_known_keys_falls_back_to_trimmed_text() {
        assert_eq!(resolve_color(r##" {"hex":"#fff"} "##), r##"{"hex":"#fff"}"##);
        assert_eq!(resolve_color(r#"{"cor":""}"#), r#"{"cor":""}"#);
    }

    #[test]
    fn plain_labels_are_trimmed() {
        assert_eq!(resolve_color("Verde"), "Verde");
        assert_eq!(resolve_color("  Verde Limão "), "Verde Limão");
    }

    #[test]
    fn invalid_json_is_returned_unchanged() {
        assert_eq!(resolve_color("{cor:Azul"), "{cor:Azul");
        assert_eq!(resolve_color("{cor:Azul}"), "{cor:Azul}");
        assert_eq!(parse_optional_structured_color("{cor:Azul}"), None);
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(resolve_color(""), "");
        assert_eq!(resolve_color("   "), "");
        assert_eq!(resolve_color_opt(None), "");
    }

    #[test]
    fn numeric_labels_are_accepted() {
        let sc = parse_optional_structured_color(r#"{"cor": 305}"#).unwrap();
        assert_eq!(sc.label(), Some("305"));
    }
}
