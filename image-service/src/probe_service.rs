//! Reachability diagnostics for resolved image URLs.
//!
//! Resolution itself never touches the network; this module is the optional
//! troubleshooting step that answers "does this URL actually serve an image?".
//!
//! - `HEAD {url}`, retried as `GET` when the server rejects HEAD (405/501)
//! - 2xx required; `content-type` must be `image/*` for `is_image = true`
//! - `data:` URLs are checked locally
//!
//! [`ImageProbeService::check`] is resilient and never fails (errors mapped to
//! `ok=false`). [`ImageProbeService::try_probe`] returns a strict `Result`.

use std::time::{Duration, Instant};

use reqwest::{StatusCode, header};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error_handler::{HttpError, ImageServiceError, ProbeError, make_snippet};

/// A serializable probe snapshot for a single URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeStatus {
    pub url: String,
    /// Overall flag: reachable and served as an image.
    pub ok: bool,
    /// HTTP status of the final request, if one was made.
    pub http_status: Option<u16>,
    pub content_type: Option<String>,
    pub is_image: bool,
    pub latency_ms: u128,
    /// Short human-readable message with details.
    pub message: String,
}

impl ProbeStatus {
    #[inline]
    fn fail(url: &str, latency_ms: u128, message: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            ok: false,
            http_status: None,
            content_type: None,
            is_image: false,
            latency_ms,
            message: message.into(),
        }
    }
}

/// URL prober that reuses a single HTTP client.
pub struct ImageProbeService {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl ImageProbeService {
    /// Creates a new probe service with an optional client timeout (seconds).
    ///
    /// # Errors
    /// Returns [`ImageServiceError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, ImageServiceError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        info!(
            default_timeout_secs = timeout.as_secs(),
            "ImageProbeService initialized"
        );

        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    /// Probes one URL. Never returns an error; failures become `ok = false`.
    pub async fn check(&self, url: &str) -> ProbeStatus {
        let start = Instant::now();
        match self.try_probe(url).await {
            Ok(status) => {
                info!(
                    url = %status.url,
                    ok = status.ok,
                    http_status = ?status.http_status,
                    latency_ms = status.latency_ms,
                    "image probe completed"
                );
                status
            }
            Err(err) => {
                let status = ProbeStatus::fail(url, start.elapsed().as_millis(), err.to_string());
                warn!(
                    url = %status.url,
                    latency_ms = status.latency_ms,
                    message = %status.message,
                    "image probe failed"
                );
                status
            }
        }
    }

    /// Probes several URLs sequentially, one status per input.
    pub async fn check_many(&self, urls: &[String]) -> Vec<ProbeStatus> {
        debug!(count = urls.len(), "running batch image probes");
        let mut out = Vec::with_capacity(urls.len());
        for u in urls {
            out.push(self.check(u).await);
        }
        out
    }

    /// Strict probe. Returns an error on invalid URLs, transport failures,
    /// and non-success statuses.
    pub async fn try_probe(&self, url: &str) -> Result<ProbeStatus, ImageServiceError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ProbeError::InvalidUrl("empty url".into()).into());
        }
        if url.starts_with("data:") {
            return Ok(probe_data_url(url));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ProbeError::InvalidUrl(url.to_string()).into());
        }

        let start = Instant::now();
        debug!(%url, "HEAD {}", url);
        let mut resp = self
            .client
            .head(url)
            .timeout(self.default_timeout)
            .send()
            .await
            .map_err(|e| ImageServiceError::from_transport(e, self.default_timeout))?;

        if matches!(
            resp.status(),
            StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
        ) {
            debug!(%url, status = %resp.status(), "HEAD rejected; retrying with GET");
            resp = self
                .client
                .get(url)
                .timeout(self.default_timeout)
                .send()
                .await
                .map_err(|e| ImageServiceError::from_transport(e, self.default_timeout))?;
        }

        let latency = start.elapsed().as_millis();
        let status = resp.status();

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);
            error!(
                %url,
                %status,
                %snippet,
                latency_ms = latency,
                "image probe returned non-success status"
            );
            return Err(ProbeError::HttpStatus(HttpError {
                status,
                url: url.to_string(),
                snippet,
            })
            .into());
        }

        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(status_from_response(
            url,
            status,
            content_type,
            latency,
        ))
    }
}

/// Classifies a successful response by its declared content type.
fn status_from_response(
    url: &str,
    status: StatusCode,
    content_type: Option<String>,
    latency_ms: u128,
) -> ProbeStatus {
    let is_image = content_type.as_deref().is_some_and(is_image_content_type);
    let message = match (&content_type, is_image) {
        (_, true) => "reachable image".to_string(),
        (Some(ct), false) => format!("reachable, but content-type is {ct}"),
        (None, false) => "reachable, but no content-type header".to_string(),
    };
    ProbeStatus {
        url: url.to_string(),
        ok: is_image,
        http_status: Some(status.as_u16()),
        content_type,
        is_image,
        latency_ms,
        message,
    }
}

fn probe_data_url(url: &str) -> ProbeStatus {
    let meta = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .map(|(meta, _)| meta);
    let content_type = meta
        .map(|m| m.split(';').next().unwrap_or_default().to_string())
        .filter(|m| !m.is_empty());
    let is_image = content_type.as_deref().is_some_and(is_image_content_type);

    ProbeStatus {
        url: url.chars().take(64).collect(),
        ok: is_image,
        http_status: None,
        content_type,
        is_image,
        latency_ms: 0,
        message: if is_image {
            "inline data url".into()
        } else {
            "data url without image media type".into()
        },
    }
}

/// `image/*` media type check, ignoring parameters and case.
pub fn is_image_content_type(ct: &str) -> bool {
    ct.split(';')
        .next()
        .map(|m| m.trim().to_ascii_lowercase().starts_with("image/"))
        .unwrap_or(false)
}
