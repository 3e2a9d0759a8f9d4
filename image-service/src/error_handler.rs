//! Unified error handling for `image-service`.
//!
//! This module exposes a single top-level error type [`ImageServiceError`] for the
//! whole library, and groups domain-specific errors in nested enums ([`ConfigError`],
//! [`ProbeError`], [`FetchError`]). Small helpers for reading environment variables
//! return the unified [`Result<T>`] alias.
//!
//! All messages include the suffix `[Image Service]` to simplify attribution in logs.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, ImageServiceError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `image-service` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ImageServiceError {
    /// Configuration/validation errors (startup).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Reachability probe errors.
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// Image download/decoding errors.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Underlying HTTP transport error.
    #[error("[Image Service] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),

    /// Operation exceeded the configured timeout.
    #[error("[Image Service] operation timed out after {0:?}")]
    Timeout(Duration),
}

impl ImageServiceError {
    /// Classify a `reqwest` failure: timeouts become [`ImageServiceError::Timeout`]
    /// carrying the configured limit, everything else stays a transport error.
    pub fn from_transport(err: reqwest::Error, limit: Duration) -> Self {
        if err.is_timeout() {
            ImageServiceError::Timeout(limit)
        } else {
            ImageServiceError::HttpTransport(err)
        }
    }
}

/* ------------------------------------------------------------------------- */
/* Shared HTTP status payload                                                */
/* ------------------------------------------------------------------------- */

/// Non-successful HTTP response summary.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub status: StatusCode,
    pub url: String,
    /// Short, trimmed snippet of the response body.
    pub snippet: String,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {} from {}: {}", self.status, self.url, self.snippet)
    }
}

/// Trim a response body into a single-line snippet suitable for logs.
pub fn make_snippet(body: &str) -> String {
    const MAX: usize = 200;
    let flat = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX {
        flat
    } else {
        let mut s: String = flat.chars().take(MAX).collect();
        s.push('…');
        s
    }
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for environment/config-driven setup.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A number failed to parse (timeouts, limits).
    #[error("[Image Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Variable name (e.g., `IMAGE_TIMEOUT_SECS`).
        var: &'static str,
        /// Human-readable reason (e.g., `expected u64`).
        reason: &'static str,
    },

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[Image Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        var: &'static str,
        reason: &'static str,
    },

    /// A numeric field was outside of the allowed range.
    #[error("[Image Service] {field} is out of range: {detail}")]
    OutOfRange {
        field: &'static str,
        detail: &'static str,
    },
}

/* ------------------------------------------------------------------------- */
/* Probe errors                                                              */
/* ------------------------------------------------------------------------- */

/// Error enum for URL reachability probes.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The URL is empty, unparseable, or uses a scheme we cannot probe.
    #[error("[Image Service] invalid image url: {0}")]
    InvalidUrl(String),

    /// Upstream returned a non-successful HTTP status.
    #[error("[Image Service] {0}")]
    HttpStatus(HttpError),
}

/* ------------------------------------------------------------------------- */
/* Fetch errors                                                              */
/* ------------------------------------------------------------------------- */

/// Error enum for downloading images that will be embedded in an email.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum FetchError {
    /// Scheme other than http, https or data.
    #[error("[Image Service] unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    /// Upstream returned a non-successful HTTP status.
    #[error("[Image Service] {0}")]
    HttpStatus(HttpError),

    /// Payload exceeded the configured size cap.
    #[error("[Image Service] image at {url} exceeds {limit} bytes")]
    TooLarge { url: String, limit: usize },

    /// Payload was not declared as an image.
    #[error("[Image Service] {url} is not an image (content-type: {content_type})")]
    NotAnImage { url: String, content_type: String },

    /// Empty payload.
    #[error("[Image Service] empty image payload from {0}")]
    Empty(String),

    /// `data:` URL could not be decoded.
    #[error("[Image Service] decode error: {0}")]
    Decode(String),
}

/* ------------------------------------------------------------------------- */
/* Env helpers (return unified `Result<T>`)                                  */
/* ------------------------------------------------------------------------- */

/// Parses an optional `u64` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// [`ConfigError::InvalidNumber`] if the variable is set but not a valid `u64`.
pub fn env_opt_u64(name: &'static str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.trim().parse::<u64>().map(Some).map_err(|_| {
            ImageServiceError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u64",
            })
        }),
        _ => Ok(None),
    }
}

/// Parses an optional `usize` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// [`ConfigError::InvalidNumber`] if the variable is set but not a valid `usize`.
pub fn env_opt_usize(name: &'static str) -> Result<Option<usize>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.trim().parse::<usize>().map(Some).map_err(|_| {
            ImageServiceError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected usize",
            })
        }),
        _ => Ok(None),
    }
}

/// Reads an optional non-empty string from env.
pub fn env_opt_string(name: &'static str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/* ------------------------------------------------------------------------- */
/* Validation helpers                                                        */
/* ------------------------------------------------------------------------- */

/// Validates that a URL starts with `http://` or `https://`.
///
/// # Errors
/// [`ConfigError::InvalidFormat`] when the string does not start with a valid HTTP scheme.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}
