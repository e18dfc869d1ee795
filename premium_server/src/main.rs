use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;
use premium_server::config::{DEFAULT_CONFIG_FILE, ServiceConfig};
use premium_server::engine::load_model;
use premium_server::pipeline::PremiumPipeline;
use premium_server::server::Server;
use rate_feed::RateFetcher;
use rate_feed::logger::init_logger;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logger();

    let config_path =
        std::env::var("PREMIUM_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
    let config = ServiceConfig::load(&config_path).context("Cannot load service configuration")?;
    let addr = config.bind_addr().context("Invalid bind address")?;

    let model = load_model(&config.model_path)
        .with_context(|| format!("Cannot load premium model from {}", config.model_path))?;

    // No rate, no quotes: refuse to start rather than serve a guessed conversion.
    let fetcher = RateFetcher::new(config.pricing.clone())?;
    let rate = fetcher
        .conversion_rate()
        .await
        .context("Exchange rate unavailable at startup")?;

    let pipeline = PremiumPipeline::new(Arc::new(model), rate);
    Server::init(addr, Arc::new(pipeline)).run().await?;

    info!("Premium server has been shut down gracefully");
    Ok(())
}
