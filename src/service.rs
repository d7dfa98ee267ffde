use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tower::Service;
use tracing::info;

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::listing::{ListingScraper, SelectorSet};
use crate::traits::SessionLauncher;

/// スクレイピングリクエスト
#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub url: String,
    pub selectors: SelectorSet,
}

impl ScrapeRequest {
    pub fn new(url: impl Into<String>, selectors: SelectorSet) -> Self {
        Self {
            url: url.into(),
            selectors,
        }
    }
}

/// スクレイピング結果
#[derive(Debug, Clone)]
pub struct ScrapeResult {
    pub csv_path: PathBuf,
    pub record_count: usize,
}

/// tower::Serviceを実装したスクレイパーサービス
///
/// 1リクエスト = 抽出 + CSV保存 の1回分。
pub struct ScraperService<L> {
    scraper: Arc<ListingScraper<L>>,
}

impl<L> Clone for ScraperService<L> {
    fn clone(&self) -> Self {
        Self {
            scraper: self.scraper.clone(),
        }
    }
}

impl<L: SessionLauncher> ScraperService<L> {
    pub fn new(config: ScraperConfig, launcher: L) -> Self {
        Self {
            scraper: Arc::new(ListingScraper::new(config, launcher)),
        }
    }

    pub fn scraper(&self) -> &ListingScraper<L> {
        &self.scraper
    }
}

impl<L: SessionLauncher> Service<ScrapeRequest> for ScraperService<L> {
    type Response = ScrapeResult;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ScrapeRequest) -> Self::Future {
        info!("スクレイピングリクエスト受信: url={}", req.url);
        let scraper = self.scraper.clone();

        Box::pin(async move {
            let records = scraper.scrape(&req.url, &req.selectors).await?;

            let result = ScrapeResult {
                csv_path: scraper.config().output_path.clone(),
                record_count: records.len(),
            };

            info!(
                "スクレイピング完了: path={:?}, records={}",
                result.csv_path, result.record_count
            );

            Ok(result)
        })
    }
}
