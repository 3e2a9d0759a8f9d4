//! Runtime settings for image probing and email attachment preparation.
//!
//! # Environment variables
//!
//! - `IMAGE_TIMEOUT_SECS`    = per-request timeout (default 10)
//! - `IMAGE_CONCURRENCY`     = parallel downloads per batch (default 4)
//! - `IMAGE_MAX_BYTES`       = size cap for an inline attachment (default 5 MiB)
//! - `IMAGE_PUBLIC_HOSTS`    = comma separated hosts serving public, stable URLs
//! - `IMAGE_PLACEHOLDER_URL` = image linked when a line's image cannot be used

use serde::Serialize;

use crate::error_handler::{
    ConfigError, Result, env_opt_string, env_opt_u64, env_opt_usize, validate_http_endpoint,
};

/// Settings shared by the probe service and the attachment pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageServiceConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum number of concurrent downloads in one batch.
    pub concurrency: usize,
    /// Maximum accepted payload size for inline attachments.
    pub max_bytes: usize,
    /// Hosts whose `https` URLs may be linked directly from an email.
    /// Empty means any `https` host qualifies.
    pub public_hosts: Vec<String>,
    /// Optional image linked in place of an unusable one.
    pub placeholder_url: Option<String>,
}

impl Default for ImageServiceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            concurrency: 4,
            max_bytes: 5 * 1024 * 1024,
            public_hosts: Vec::new(),
            placeholder_url: None,
        }
    }
}

impl ImageServiceConfig {
    /// Build from environment variables with defaults.
    ///
    /// # Errors
    /// [`ConfigError`] variants for unparsable numbers, zero limits, or an
    /// invalid placeholder URL.
    pub fn from_env() -> Result<Self> {
        let dflt = Self::default();
        let cfg = Self {
            timeout_secs: env_opt_u64("IMAGE_TIMEOUT_SECS")?.unwrap_or(dflt.timeout_secs),
            concurrency: env_opt_usize("IMAGE_CONCURRENCY")?.unwrap_or(dflt.concurrency),
            max_bytes: env_opt_usize("IMAGE_MAX_BYTES")?.unwrap_or(dflt.max_bytes),
            public_hosts: env_opt_string("IMAGE_PUBLIC_HOSTS")
                .map(|s| parse_host_list(&s))
                .unwrap_or_default(),
            placeholder_url: env_opt_string("IMAGE_PLACEHOLDER_URL"),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks limits and the placeholder URL.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::OutOfRange {
                field: "timeout_secs",
                detail: "expected > 0",
            }
            .into());
        }
        if self.concurrency == 0 {
            return Err(ConfigError::OutOfRange {
                field: "concurrency",
                detail: "expected > 0",
            }
            .into());
        }
        if self.max_bytes == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max_bytes",
                detail: "expected > 0",
            }
            .into());
        }
        if let Some(p) = &self.placeholder_url {
            validate_http_endpoint("IMAGE_PLACEHOLDER_URL", p)?;
        }
        Ok(())
    }

    /// True when `host` equals a configured public host or is a subdomain of one.
    pub fn is_public_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.public_hosts.is_empty()
            || self
                .public_hosts
                .iter()
                .any(|h| host == *h || host.ends_with(&format!(".{h}")))
    }
}

/// Split a comma separated host list, lower-cased, empties dropped.
pub fn parse_host_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|h| h.trim().trim_end_matches('.').to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_list_parsing() {
        assert_eq!(
            parse_host_list(" CDN.Example.com, ,images.shop.com. "),
            vec!["cdn.example.com", "images.shop.com"]
        );
    }

    #[test]
    fn public_host_matching() {
        let cfg = ImageServiceConfig {
            public_hosts: vec!["example.com".into()],
            ..Default::default()
        };
        assert!(cfg.is_public_host("example.com"));
        assert!(cfg.is_public_host("CDN.example.com"));
        assert!(!cfg.is_public_host("badexample.com"));
        assert!(ImageServiceConfig::default().is_public_host("anything.net"));
    }

    #[test]
    fn validation_rejects_zero_limits_and_bad_placeholder() {
        let mut cfg = ImageServiceConfig::default();
        assert!(cfg.validate().is_ok());
        cfg.concurrency = 0;
        assert!(cfg.validate().is_err());

        let cfg = ImageServiceConfig {
            placeholder_url: Some("placeholder.png".into()),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
