//! Email image preparation for consolidated quote lines.
//!
//! For every line image the email renderer needs one of:
//! - a direct link, when the URL is public and stable;
//! - an inline attachment addressed by the SHA-256 of its bytes, when the
//!   URL is private, signed, plain `http`, or a `data:` URL;
//! - a placeholder, when the line has no image or fetching it failed.
//!
//! Each image is attempted independently: a failing download degrades that
//! image to a placeholder and never aborts the batch.

use std::{future::Future, pin::Pin, time::Duration};

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use futures::stream::{self, StreamExt};
use reqwest::header;
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::image_service_config::ImageServiceConfig;
use crate::error_handler::{FetchError, HttpError, ImageServiceError, make_snippet};
use crate::probe_service::is_image_content_type;

/// Query parameters that mark a URL as signed or expiring.
const SIGNED_QUERY_KEYS: [&str; 6] = [
    "token",
    "signature",
    "x-amz-signature",
    "x-goog-signature",
    "expires",
    "sig",
];

/// Downloaded image payload.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Source of image bytes. Implement to plug in a different transport.
pub trait ImageFetcher: Send + Sync {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<FetchedImage, ImageServiceError>> + Send + 'a>>;
}

/// How an image URL should be referenced from an outgoing email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageReference {
    /// Link directly; the URL is public and stable.
    PublicLink,
    /// Download and attach inline.
    Inline,
    /// Cannot be used at all.
    Unusable(String),
}

/// Decide between linking and inlining an image URL.
pub fn classify_image_url(url: &str, cfg: &ImageServiceConfig) -> ImageReference {
    let url = url.trim();
    if url.is_empty() {
        return ImageReference::Unusable("empty url".into());
    }
    if url.starts_with("data:") {
        return ImageReference::Inline;
    }

    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(e) => return ImageReference::Unusable(format!("unparseable url: {e}")),
    };

    match parsed.scheme() {
        "https" => {
            let signed = parsed
                .query_pairs()
                .any(|(k, _)| SIGNED_QUERY_KEYS.contains(&k.to_ascii_lowercase().as_str()));
            let public_host = parsed.host_str().is_some_and(|h| cfg.is_public_host(h));
            if public_host && !signed {
                ImageReference::PublicLink
            } else {
                ImageReference::Inline
            }
        }
        "http" => ImageReference::Inline,
        other => ImageReference::Unusable(format!("unsupported scheme: {other}")),
    }
}

/// One prepared image, in the same position as its quote line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmailImage {
    Linked {
        url: String,
    },
    Inline {
        /// Content id referenced as `cid:<content_id>` from the HTML body.
        content_id: String,
        content_type: String,
        size: usize,
        #[serde(serialize_with = "as_base64")]
        data: Vec<u8>,
    },
    Placeholder {
        /// The URL that could not be used, if there was one.
        url: Option<String>,
        reason: String,
        /// Configured placeholder image, if any.
        placeholder_url: Option<String>,
    },
}

impl EmailImage {
    fn placeholder(url: Option<&str>, reason: impl Into<String>, cfg: &ImageServiceConfig) -> Self {
        EmailImage::Placeholder {
            url: url.map(str::to_string),
            reason: reason.into(),
            placeholder_url: cfg.placeholder_url.clone(),
        }
    }

    fn inline(img: FetchedImage) -> Self {
        EmailImage::Inline {
            content_id: content_id(&img.bytes),
            content_type: img.content_type,
            size: img.bytes.len(),
            data: img.bytes,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, EmailImage::Placeholder { .. })
    }
}

fn as_base64<S: Serializer>(data: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&B64.encode(data))
}

/// Content-addressed attachment id: identical bytes share one attachment.
pub fn content_id(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let hex = format!("{digest:x}");
    format!("{}@quote-image", &hex[..32])
}

/// Prepare one email image per input slot.
///
/// `None` slots (lines with no resolved image) become placeholders. Fetches
/// run with bounded concurrency; output order always matches input order.
pub async fn prepare_email_images(
    fetcher: &dyn ImageFetcher,
    urls: &[Option<String>],
    cfg: &ImageServiceConfig,
) -> Vec<EmailImage> {
    info!(
        total = urls.len(),
        concurrency = cfg.concurrency,
        "preparing email images"
    );

    let out: Vec<EmailImage> = stream::iter(
        urls.iter()
            .map(|slot| prepare_one(fetcher, slot.as_deref(), cfg))
            .collect::<Vec<_>>(),
    )
        .buffered(cfg.concurrency.max(1))
        .collect()
        .await;

    let failed = out.iter().filter(|i| i.is_placeholder()).count();
    debug!(total = out.len(), placeholders = failed, "email images prepared");
    out
}

async fn prepare_one(
    fetcher: &dyn ImageFetcher,
    url: Option<&str>,
    cfg: &ImageServiceConfig,
) -> EmailImage {
    let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
        return EmailImage::placeholder(None, "no image available", cfg);
    };

    match classify_image_url(url, cfg) {
        ImageReference::PublicLink => EmailImage::Linked {
            url: url.to_string(),
        },
        ImageReference::Unusable(reason) => {
            warn!(%url, %reason, "image url unusable; substituting placeholder");
            EmailImage::placeholder(Some(url), reason, cfg)
        }
        ImageReference::Inline => match fetcher.fetch(url).await {
            Ok(img) => EmailImage::inline(img),
            Err(e) => {
                warn!(%url, error = %e, "image fetch failed; substituting placeholder");
                EmailImage::placeholder(Some(url), e.to_string(), cfg)
            }
        },
    }
}

/// Decode a base64 `data:` URL into an image payload.
pub fn decode_data_url(url: &str) -> Result<FetchedImage, ImageServiceError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| FetchError::Decode("not a data url".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| FetchError::Decode("data url without payload".into()))?;

    let mut parts = meta.split(';');
    let content_type = parts.next().unwrap_or_default().trim().to_string();
    if !parts.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        return Err(FetchError::Decode("only base64 data urls are supported".into()).into());
    }
    if !is_image_content_type(&content_type) {
        return Err(FetchError::NotAnImage {
            url: "data:".into(),
            content_type,
        }
        .into());
    }

    let bytes = B64
        .decode(payload.trim())
        .map_err(|e| FetchError::Decode(e.to_string()))?;
    if bytes.is_empty() {
        return Err(FetchError::Empty("data:".into()).into());
    }
    Ok(FetchedImage {
        bytes,
        content_type,
    })
}

/// HTTP(S) fetcher with a size cap; also serves `data:` URLs locally.
pub struct HttpImageFetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_bytes: usize,
}

impl HttpImageFetcher {
    /// # Errors
    /// Returns [`ImageServiceError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(cfg: &ImageServiceConfig) -> Result<Self, ImageServiceError> {
        let timeout = Duration::from_secs(cfg.timeout_secs);
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            timeout,
            max_bytes: cfg.max_bytes,
        })
    }

    fn transport(&self, err: reqwest::Error) -> ImageServiceError {
        ImageServiceError::from_transport(err, self.timeout)
    }

    fn too_large(&self, url: &str) -> ImageServiceError {
        FetchError::TooLarge {
            url: url.to_string(),
            limit: self.max_bytes,
        }
        .into()
    }

    async fn fetch_http(&self, url: &str) -> Result<FetchedImage, ImageServiceError> {
        debug!(%url, "GET {}", url);
        let mut resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        let status = resp.status();

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(FetchError::HttpStatus(HttpError {
                status,
                url: url.to_string(),
                snippet: make_snippet(&text),
            })
            .into());
        }

        if resp
            .content_length()
            .is_some_and(|n| n > self.max_bytes as u64)
        {
            return Err(self.too_large(url));
        }

        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !is_image_content_type(&content_type) {
            return Err(FetchError::NotAnImage {
                url: url.to_string(),
                content_type,
            }
            .into());
        }

        // Content-Length may be absent (chunked) or wrong; enforce the cap while reading.
        let mut bytes = Vec::new();
        while let Some(chunk) = resp.chunk().await.map_err(|e| self.transport(e))? {
            if bytes.len() + chunk.len() > self.max_bytes {
                warn!(%url, limit = self.max_bytes, "image body exceeds size cap; aborting download");
                return Err(self.too_large(url));
            }
            bytes.extend_from_slice(&chunk);
        }
        if bytes.is_empty() {
            return Err(FetchError::Empty(url.to_string()).into());
        }

        Ok(FetchedImage {
            bytes,
            content_type,
        })
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<FetchedImage, ImageServiceError>> + Send + 'a>> {
        Box::pin(async move {
            if url.starts_with("data:") {
                return decode_data_url(url);
            }
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(FetchError::UnsupportedScheme(url.to_string()).into());
            }
            self.fetch_http(url).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves fixed bytes for URLs containing "ok", fails otherwise.
    struct FakeFetcher {
        calls: AtomicUsize,
    }

    impl FakeFetcher {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ImageFetcher for FakeFetcher {
        fn fetch<'a>(
            &'a self,
            url: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<FetchedImage, ImageServiceError>> + Send + 'a>>
        {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                if url.starts_with("data:") {
                    return decode_data_url(url);
                }
                if url.contains("ok") {
                    Ok(FetchedImage {
                        bytes: url.as_bytes().to_vec(),
                        content_type: "image/png".into(),
                    })
                } else {
                    Err(FetchError::Empty(url.to_string()).into())
                }
            })
        }
    }

    fn cfg() -> ImageServiceConfig {
        ImageServiceConfig {
            public_hosts: vec!["cdn.shop.com".into()],
            placeholder_url: Some("https://cdn.shop.com/no-image.png".into()),
            concurrency: 2,
            ..Default::default()
        }
    }

    #[test]
    fn classification() {
        let c = cfg();
        assert_eq!(
            classify_image_url("https://cdn.shop.com/p/1.png", &c),
            ImageReference::PublicLink
        );
        assert_eq!(
            classify_image_url("https://cdn.shop.com/p/1.png?token=abc", &c),
            ImageReference::Inline
        );
        assert_eq!(
            classify_image_url("https://storage.private.io/p/1.png", &c),
            ImageReference::Inline
        );
        assert_eq!(
            classify_image_url("http://cdn.shop.com/p/1.png", &c),
            ImageReference::Inline
        );
        assert_eq!(
            classify_image_url("data:image/png;base64,AAAA", &c),
            ImageReference::Inline
        );
        assert!(matches!(
            classify_image_url("ftp://cdn.shop.com/1.png", &c),
            ImageReference::Unusable(_)
        ));
        assert!(matches!(
            classify_image_url("not a url", &c),
            ImageReference::Unusable(_)
        ));
    }

    #[test]
    fn content_ids_are_content_addressed() {
        assert_eq!(content_id(b"abc"), content_id(b"abc"));
        assert_ne!(content_id(b"abc"), content_id(b"abd"));
        assert!(content_id(b"abc").starts_with("ba7816bf8f01cfea414140de5dae2223"));
    }

    #[test]
    fn data_url_decoding() {
        let img = decode_data_url("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(img.bytes, b"hello");
        assert_eq!(img.content_type, "image/png");

        assert!(decode_data_url("data:image/png,raw").is_err());
        assert!(decode_data_url("data:text/plain;base64,aGVsbG8=").is_err());
        assert!(decode_data_url("data:image/png;base64,!!!").is_err());
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_batch() {
        let fetcher = FakeFetcher::new();
        let urls = vec![
            Some("https://private.io/ok-1.png".to_string()),
            Some("https://private.io/broken.png".to_string()),
            None,
            Some("https://cdn.shop.com/public.png".to_string()),
            Some("data:image/png;base64,aGVsbG8=".to_string()),
            Some("http://private.io/ok-2.png".to_string()),
        ];

        let out = prepare_email_images(&fetcher, &urls, &cfg()).await;
        assert_eq!(out.len(), urls.len());

        assert!(matches!(&out[0], EmailImage::Inline { size, .. } if *size == 27));
        assert!(matches!(
            &out[1],
            EmailImage::Placeholder { url: Some(u), placeholder_url: Some(_), .. } if u.contains("broken")
        ));
        assert!(matches!(&out[2], EmailImage::Placeholder { url: None, .. }));
        assert_eq!(
            out[3],
            EmailImage::Linked {
                url: "https://cdn.shop.com/public.png".into()
            }
        );
        assert!(matches!(&out[4], EmailImage::Inline { data, .. } if data == b"hello"));
        assert!(matches!(&out[5], EmailImage::Inline { .. }));

        // Public links and empty slots never hit the fetcher.
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn inline_images_serialize_as_base64() {
        let img = EmailImage::inline(FetchedImage {
            bytes: b"hello".to_vec(),
            content_type: "image/png".into(),
        });
        let v = serde_json::to_value(&img).unwrap();
        assert_eq!(v["kind"], "inline");
        assert_eq!(v["data"], "aGVsbG8=");
        assert_eq!(v["size"], 5);
    }

    /// Serves one chunked `image/png` response without a Content-Length header.
    async fn serve_chunked_once(chunks: usize, chunk_len: usize) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut req = [0u8; 2048];
            let _ = sock.read(&mut req).await;

            let mut resp = b"HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n".to_vec();
            for _ in 0..chunks {
                resp.extend_from_slice(format!("{chunk_len:x}\r\n").as_bytes());
                resp.extend(std::iter::repeat_n(b'x', chunk_len));
                resp.extend_from_slice(b"\r\n");
            }
            resp.extend_from_slice(b"0\r\n\r\n");
            let _ = sock.write_all(&resp).await;
            let _ = sock.shutdown().await;
        });
        format!("http://{addr}/chunked.png")
    }

    fn capped_fetcher(max_bytes: usize) -> HttpImageFetcher {
        HttpImageFetcher::new(&ImageServiceConfig {
            max_bytes,
            timeout_secs: 5,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn chunked_body_over_cap_is_rejected_while_streaming() {
        let url = serve_chunked_once(4, 64).await;
        let err = capped_fetcher(100).fetch(&url).await.unwrap_err();
        assert!(matches!(
            err,
            ImageServiceError::Fetch(FetchError::TooLarge { limit: 100, .. })
        ));
    }

    #[tokio::test]
    async fn chunked_body_within_cap_is_collected() {
        let url = serve_chunked_once(3, 32).await;
        let img = capped_fetcher(100).fetch(&url).await.unwrap();
        assert_eq!(img.bytes.len(), 96);
        assert_eq!(img.content_type, "image/png");
    }
}
