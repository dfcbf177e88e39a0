//! SWAG Catalog - catalog, volume pricing and quotation service

use anyhow::{Context, Result};
use swag_catalog::{api, Catalog, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let config = Config::from_env()?;
    let catalog = match &config.catalog_path {
        Some(path) => Catalog::load(path).with_context(|| format!("loading catalog from {}", path.display()))?,
        None => Catalog::bundled().context("loading bundled catalog")?,
    };
    tracing::info!(products = catalog.len(), currency = %config.currency, "catalog ready");

    let port = config.port;
    let app = api::router(api::AppState::new(catalog, config));
    tracing::info!("SWAG Catalog listening on 0.0.0.0:{}", port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?, app).await?;
    Ok(())
}
