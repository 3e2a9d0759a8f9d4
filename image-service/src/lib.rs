//! Image collaborators around quote rendering.
//!
//! - [`probe_service`]: optional reachability diagnostics for resolved URLs.
//! - [`attachments`]: per-image email preparation (public link, inline
//!   content-addressed attachment, or placeholder) with failure isolation.
//! - [`telemetry`]: tracing layers shared by the binary.

pub mod attachments;
pub mod config;
pub mod error_handler;
pub mod probe_service;
pub mod telemetry;

pub use attachments::{
    EmailImage, FetchedImage, HttpImageFetcher, ImageFetcher, ImageReference, classify_image_url,
    prepare_email_images,
};
pub use config::image_service_config::ImageServiceConfig;
pub use error_handler::{ImageServiceError, Result};
pub use probe_service::{ImageProbeService, ProbeStatus};
