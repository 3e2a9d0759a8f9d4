//! Runtime configuration: the color → default-image-slot table.
//!
//! Catalogs photograph some colors in a fixed default-image position (e.g.
//! the white mug is always the first picture). The table is injected so each
//! catalog can carry its own mapping.
//!
//! Environment variables:
//! - `QUOTE_COLOR_SLOTS`: inline JSON object, e.g. `{"branco": 0, "preto": 1}`
//! - `QUOTE_COLOR_SLOTS_PATH`: path to a JSON file with the same shape
//!
//! When both are set the inline value wins. When neither is set the table is empty.

use std::{collections::BTreeMap, path::Path};

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::errors::quote_lines_error::QuoteLinesError;
use crate::normalize::normalize;

/// Number of generic product images consulted by the resolution chain.
pub const DEFAULT_IMAGE_SLOTS: usize = 3;

const ENV_INLINE: &str = "QUOTE_COLOR_SLOTS";
const ENV_PATH: &str = "QUOTE_COLOR_SLOTS_PATH";

/// Normalized color → default image slot (`0..DEFAULT_IMAGE_SLOTS`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorSlotTable {
    slots: BTreeMap<String, usize>,
}

impl ColorSlotTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(color, slot)` pairs.
    ///
    /// # Errors
    /// [`QuoteLinesError::InvalidConfig`] when a slot is out of range or a
    /// color normalizes to an empty string.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, QuoteLinesError>
    where
        I: IntoIterator<Item = (S, usize)>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for (color, slot) in pairs {
            table.insert(color.as_ref(), slot)?;
        }
        Ok(table)
    }

    /// Add or replace one mapping. The color is normalized.
    pub fn insert(&mut self, color: &str, slot: usize) -> Result<(), QuoteLinesError> {
        if slot >= DEFAULT_IMAGE_SLOTS {
            return Err(QuoteLinesError::InvalidConfig(format!(
                "color slot for '{color}' must be < {DEFAULT_IMAGE_SLOTS}, got {slot}"
            )));
        }
        let key = normalize(color);
        if key.is_empty() {
            return Err(QuoteLinesError::InvalidConfig(
                "color slot table contains an empty color".into(),
            ));
        }
        self.slots.insert(key, slot);
        Ok(())
    }

    /// Slot mapped to `color` (normalized before lookup).
    pub fn slot_for(&self, color: &str) -> Option<usize> {
        self.slots.get(&normalize(color)).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Parse a JSON object `{ "<color>": <slot> }`.
    ///
    /// # Errors
    /// JSON errors, non-object documents, and non-integer or out-of-range slots.
    pub fn from_json_str(s: &str) -> Result<Self, QuoteLinesError> {
        let map: Map<String, Value> = serde_json::from_str(s)?;
        let mut table = Self::new();
        for (color, v) in map {
            let slot = v
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| QuoteLinesError::EnvParse {
                    key: color.clone(),
                    value: v.to_string(),
                })?;
            table.insert(&color, slot)?;
        }
        Ok(table)
    }

    /// Load the table from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, QuoteLinesError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Build from `QUOTE_COLOR_SLOTS` / `QUOTE_COLOR_SLOTS_PATH`.
    pub fn from_env() -> Result<Self, QuoteLinesError> {
        let inline = std::env::var(ENV_INLINE).ok();
        let path = std::env::var(ENV_PATH).ok();
        Self::from_sources(inline.as_deref(), path.as_deref())
    }

    fn from_sources(inline: Option<&str>, path: Option<&str>) -> Result<Self, QuoteLinesError> {
        let inline = inline.map(str::trim).filter(|s| !s.is_empty());
        let path = path.map(str::trim).filter(|s| !s.is_empty());

        let table = match (inline, path) {
            (Some(json), _) => Self::from_json_str(json).map_err(|e| match e {
                QuoteLinesError::Json(_) => QuoteLinesError::EnvParse {
                    key: ENV_INLINE.into(),
                    value: json.to_string(),
                },
                other => other,
            })?,
            (None, Some(p)) => {
                debug!(path = %p, "loading color slot table from file");
                Self::from_file(p)?
            }
            (None, None) => Self::new(),
        };

        info!(entries = table.len(), "color slot table ready");
        Ok(table)
    }
}
