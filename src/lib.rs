//! 商品一覧スクレイパーライブラリ
//!
//! - ヘッドレスブラウザで一覧ページを開き、タイトル / 価格 / リンクをCSVに保存
//! - バックグラウンドジョブとして実行し、HTTP API で状態確認・プレビュー・ダウンロード
//!
//! # 使用例
//!
//! ```rust,ignore
//! use listing_scraper::{ChromeLauncher, JobRunner, ScraperConfig, SelectorSet};
//!
//! #[tokio::main]
//! async fn main() {
//!     let runner = JobRunner::new(ScraperConfig::new("./books.csv"), ChromeLauncher::new());
//!
//!     runner
//!         .start("http://books.toscrape.com/", SelectorSet::books_to_scrape())
//!         .await
//!         .unwrap();
//!     runner.join().await;
//!     println!("status: {:?}", runner.poll().await);
//! }
//! ```

pub mod browser;
pub mod config;
pub mod error;
pub mod listing;
pub mod runner;
pub mod server;
pub mod service;
pub mod store;
pub mod traits;

#[cfg(test)]
mod testing;

// 主要な型をリエクスポート
pub use browser::{ChromeLauncher, ChromeSession};
pub use config::{ScraperConfig, ServerConfig};
pub use error::ScraperError;
pub use listing::{ListingScraper, Record, SelectorSet};
pub use runner::{FetchKind, Fetched, JobRunner, JobStatus, StartOutcome};
pub use server::ScrapeTarget;
pub use service::{ScrapeRequest, ScrapeResult, ScraperService};
pub use store::{CsvStore, PREVIEW_LIMIT};
pub use traits::{BrowserSession, SessionLauncher};
