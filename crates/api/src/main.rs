//! Used-BMW Pricing Service - Main Entry Point

use api::{init_logging, run_server, AppConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== Vehicle Pricing v{} ===", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?;
    info!(
        "Pipeline artifact: {}, model artifact: {}, VIN service: {}",
        config.pipeline_path.display(),
        config.model_path.display(),
        config.vin_decoder.base_url
    );

    run_server(config).await
}
