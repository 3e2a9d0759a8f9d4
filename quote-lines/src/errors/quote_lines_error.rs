//! Unified error type for the quote-lines crate.
//!
//! Only configuration loading can fail. Consolidation and image resolution
//! are total over any decoded input.

use thiserror::Error;

/// Errors produced while building the engine's configuration.
#[derive(Debug, Error)]
pub enum QuoteLinesError {
    // ── Configuration / environment ──────────────────────────────────────────
    /// Failed to parse an environment variable into the expected shape.
    #[error("failed to parse env variable: {key} = '{value}'")]
    EnvParse { key: String, value: String },

    /// Configuration values are invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O & filesystem ────────────────────────────────────────────────────
    /// Underlying I/O error (e.g. reading the color slot table file).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    // ── JSON / serialization ────────────────────────────────────────────────
    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
