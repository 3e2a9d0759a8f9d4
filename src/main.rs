use anyhow::Context;
use image_service::telemetry;
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `.env` is optional; real deployments pass variables directly.
    let dotenv = dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(telemetry::env_filter_with_level("info", Level::DEBUG))
        .with(telemetry::layer())
        .with(telemetry::external_layer())
        .init();

    if let Some(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    api::start().await.context("quote console API terminated")?;

    Ok(())
}
