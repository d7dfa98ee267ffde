use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;

use crate::config::ScraperConfig;
use crate::error::ScraperError;

/// ブラウザ操作の最小インターフェース
#[async_trait]
pub trait BrowserSession: Send + Sync {
    type Element: Send + Sync;

    /// URLへ遷移
    async fn navigate(&mut self, url: &str) -> Result<(), ScraperError>;

    /// 現在のページURL（リダイレクト後）
    async fn current_url(&self) -> Result<String, ScraperError>;

    /// ページ全体からセレクタに一致する要素を文書順で取得
    async fn find_all(&self, selector: &str) -> Result<Vec<Self::Element>, ScraperError>;

    /// 要素を起点にセレクタを評価
    async fn find_within(
        &self,
        parent: &Self::Element,
        selector: &str,
    ) -> Result<Vec<Self::Element>, ScraperError>;

    async fn attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, ScraperError>;

    /// 表示テキスト（要素がテキストを持たなければ None）
    async fn text(&self, element: &Self::Element) -> Result<Option<String>, ScraperError>;

    /// リソース解放
    async fn close(&mut self) -> Result<(), ScraperError>;

    /// セレクタに一致する要素が1つ以上現れるまでポーリング
    async fn wait_for(
        &self,
        selector: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<usize, ScraperError> {
        let start = Instant::now();

        loop {
            match self.find_all(selector).await {
                Ok(found) if !found.is_empty() => {
                    debug!("{} matched {} elements after {:?}", selector, found.len(), start.elapsed());
                    return Ok(found.len());
                }
                Ok(_) => {}
                Err(e) => debug!("wait_for query error: {}", e),
            }

            if start.elapsed() >= timeout {
                return Err(ScraperError::PageLoad(format!(
                    "{:?}以内に {} が見つかりませんでした",
                    timeout, selector
                )));
            }

            tokio::time::sleep(poll_interval).await;
        }
    }
}

/// ブラウザセッションの起動
#[async_trait]
pub trait SessionLauncher: Send + Sync + 'static {
    type Session: BrowserSession + 'static;

    async fn launch(&self, config: &ScraperConfig) -> Result<Self::Session, ScraperError>;
}
