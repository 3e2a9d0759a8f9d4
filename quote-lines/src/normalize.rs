//! Free-text canonicalization used for every comparison in the crate.
//!
//! Catalog data is typed by hand, so the same color or title shows up as
//! "Verde", "verde ", "VERDE" or "vérde". All of them must compare equal.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Normalize a free-text field for comparison.
///
/// - Decomposes to NFD and drops combining marks (accents, cedillas, tildes).
/// - Lower-cases.
/// - Trims and collapses internal whitespace runs to a single space.
///
/// Total function: empty input yields an empty string.
///
/// # Example
/// ```
/// use quote_lines::normalize;
/// assert_eq!(normalize("  Vérde   Limão "), "verde limao");
/// ```
pub fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;

    for ch in s.nfd().filter(|c| !is_combining_mark(*c)) {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.extend(ch.to_lowercase());
    }

    out
}
