use std::sync::Arc;

use listing_scraper::server::{self, ScrapeTarget};
use listing_scraper::{ChromeLauncher, JobRunner, SelectorSet, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ログ設定
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    info!(
        "target={} csv={:?} headless={}",
        config.target_url, config.scraper.output_path, config.scraper.headless
    );

    let runner = Arc::new(JobRunner::new(config.scraper.clone(), ChromeLauncher::new()));
    let target = ScrapeTarget::new(config.target_url, SelectorSet::books_to_scrape());

    server::serve(runner, target, config.addr).await?;
    Ok(())
}
