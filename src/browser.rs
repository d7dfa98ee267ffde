//! chromiumoxide によるブラウザセッション

use std::path::Path;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use futures::StreamExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::traits::{BrowserSession, SessionLauncher};

/// Chrome / Chromium を起動するランチャー
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeLauncher;

impl ChromeLauncher {
    pub fn new() -> Self {
        Self
    }
}

/// 1ページ分のブラウザセッション
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    // ブラウザより後に drop してディレクトリを削除する
    profile: TempDir,
}

impl ChromeSession {
    /// このセッション専用のユーザーデータディレクトリ
    pub fn profile_path(&self) -> &Path {
        self.profile.path()
    }
}

/// 同時起動でプロファイルが衝突しないよう、起動ごとに一時ディレクトリを作る
fn profile_dir() -> Result<TempDir, ScraperError> {
    let dir = tempfile::Builder::new()
        .prefix("listing-scraper-")
        .tempdir()?;
    debug!("Browser profile: {}", dir.path().display());
    Ok(dir)
}

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    type Session = ChromeSession;

    async fn launch(&self, config: &ScraperConfig) -> Result<ChromeSession, ScraperError> {
        info!("Initializing browser (headless={})...", config.headless);

        let profile = profile_dir()?;
        let mut builder = BrowserConfig::builder().user_data_dir(profile.path());

        if let Some(chrome_path) = config.resolve_chrome_path() {
            builder = builder.chrome_executable(chrome_path);
        }

        if !config.headless {
            builder = builder.with_head();
        }

        builder = builder
            .no_sandbox()
            .request_timeout(config.request_timeout)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--start-maximized");

        let browser_config = builder.build().map_err(ScraperError::BrowserInit)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!("Browser event: {:?}", event);
            }
        });

        // 失敗時は browser → profile の順に drop される
        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(ScraperError::BrowserInit(e.to_string()));
            }
        };

        info!("Browser initialized successfully");
        Ok(ChromeSession {
            browser,
            page,
            handler: handler_task,
            profile,
        })
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    type Element = Element;

    async fn navigate(&mut self, url: &str) -> Result<(), ScraperError> {
        info!("Navigating to {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| ScraperError::PageLoad(format!("{}: {}", url, e)))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, ScraperError> {
        self.page
            .url()
            .await
            .map_err(|e| ScraperError::PageLoad(e.to_string()))?
            .ok_or_else(|| ScraperError::PageLoad("ページURLが取得できません".into()))
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Element>, ScraperError> {
        self.page
            .find_elements(selector)
            .await
            .map_err(|e| ScraperError::PageLoad(format!("{}: {}", selector, e)))
    }

    async fn find_within(
        &self,
        parent: &Element,
        selector: &str,
    ) -> Result<Vec<Element>, ScraperError> {
        parent
            .find_elements(selector)
            .await
            .map_err(|e| ScraperError::FieldExtraction(format!("{}: {}", selector, e)))
    }

    async fn attribute(&self, element: &Element, name: &str) -> Result<Option<String>, ScraperError> {
        element
            .attribute(name)
            .await
            .map_err(|e| ScraperError::FieldExtraction(format!("属性 {}: {}", name, e)))
    }

    async fn text(&self, element: &Element) -> Result<Option<String>, ScraperError> {
        element
            .inner_text()
            .await
            .map_err(|e| ScraperError::FieldExtraction(format!("テキスト: {}", e)))
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        info!("Closing browser...");

        let closed = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| ScraperError::Browser(e.to_string()));

        // close が通らなければプロセスを kill、通ればプロセス終了を待つ
        if closed.is_err() {
            if let Some(Err(e)) = self.browser.kill().await {
                debug!("Browser kill error: {}", e);
            }
        } else if let Err(e) = self.browser.wait().await {
            debug!("Browser wait error: {}", e);
        }
        self.handler.abort();

        closed
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
