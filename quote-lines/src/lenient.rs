//! Tolerant serde decoders for persisted quote selections.
//!
//! Rows come from a loosely typed store: numbers may arrive as strings,
//! ids as numbers, and the selected color as a nested object. None of this
//! may fail a whole quote, so each decoder degrades to `None` instead.

use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;
use tracing::warn;

/// Decode a numeric field. Accepts numbers and numeric strings (dot or comma
/// decimal separator). Anything else, and non-finite values, become `None`.
pub fn opt_f64<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(de)?;
    Ok(v.as_ref().and_then(number_from_value))
}

/// Decode a text field. Accepts strings, numbers and booleans. Objects and
/// arrays are kept as compact JSON so later stages can inspect them.
pub fn opt_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(de)?;
    Ok(v.and_then(string_from_value))
}

/// Decode a list of optional strings, dropping nothing so positions are kept.
pub fn opt_string_list<'de, D>(de: D) -> Result<Vec<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(de)?;
    Ok(match v {
        Some(Value::Array(items)) => items.into_iter().map(string_from_value).collect(),
        Some(other) => vec![string_from_value(other)],
        None => Vec::new(),
    })
}

/// Decode a list of records, skipping (and logging) elements that do not fit `T`.
/// `null` or a non-array value yields an empty list.
pub fn tolerant_list<'de, D, T>(de: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = Option::<Value>::deserialize(de)?;
    Ok(match v {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "skipping malformed list entry");
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Interpret a JSON value as a finite number.
pub fn number_from_value(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

/// Parse a user-entered number, tolerating a comma decimal separator.
pub fn parse_number(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    let parsed = t.parse::<f64>().ok().or_else(|| {
        if t.contains(',') && !t.contains('.') {
            t.replace(',', ".").parse::<f64>().ok()
        } else {
            None
        }
    });
    parsed.filter(|f| f.is_finite())
}

fn string_from_value(v: Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other @ (Value::Object(_) | Value::Array(_)) => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_from_mixed_sources() {
        assert_eq!(number_from_value(&json!(12)), Some(12.0));
        assert_eq!(number_from_value(&json!("12.5")), Some(12.5));
        assert_eq!(number_from_value(&json!(" 3,75 ")), Some(3.75));
        assert_eq!(number_from_value(&json!("abc")), None);
        assert_eq!(number_from_value(&json!("")), None);
        assert_eq!(number_from_value(&json!(true)), None);
        assert_eq!(number_from_value(&json!(null)), None);
    }

    #[test]
    fn thousands_style_commas_are_not_guessed() {
        assert_eq!(parse_number("1,234.5"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
    }
}
