use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ScraperError;

/// 抽出ジョブの設定
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub headless: bool,
    /// コンテナ要素の出現を待つ上限
    pub wait_timeout: Duration,
    pub poll_interval: Duration,
    pub output_path: PathBuf,
    /// 未指定なら CHROME_PATH / CHROMIUM_PATH を参照
    pub chrome_path: Option<String>,
    pub request_timeout: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            headless: true,
            wait_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(250),
            output_path: PathBuf::from("books.csv"),
            chrome_path: None,
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl ScraperConfig {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            ..Default::default()
        }
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_chrome_path(mut self, path: impl Into<String>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    /// Chrome の実行ファイルパスを解決（設定 → 環境変数の順）
    pub fn resolve_chrome_path(&self) -> Option<String> {
        self.chrome_path
            .clone()
            .or_else(|| std::env::var("CHROME_PATH").ok())
            .or_else(|| std::env::var("CHROMIUM_PATH").ok())
    }
}

pub const DEFAULT_ADDR: &str = "127.0.0.1:5000";
pub const DEFAULT_TARGET_URL: &str = "http://books.toscrape.com/";

/// HTTP サーバーの設定（環境変数から読み込む）
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub target_url: String,
    pub scraper: ScraperConfig,
}

impl ServerConfig {
    /// SCRAPER_ADDR / SCRAPER_TARGET_URL / SCRAPER_CSV_PATH / SCRAPER_HEADLESS
    pub fn from_env() -> Result<Self, ScraperError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ScraperError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr_str = lookup("SCRAPER_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_str
            .parse::<SocketAddr>()
            .map_err(|e| ScraperError::Config(format!("SCRAPER_ADDR={}: {}", addr_str, e)))?;

        let target_url =
            lookup("SCRAPER_TARGET_URL").unwrap_or_else(|| DEFAULT_TARGET_URL.to_string());
        url::Url::parse(&target_url).map_err(|e| {
            ScraperError::Config(format!("SCRAPER_TARGET_URL={}: {}", target_url, e))
        })?;

        let mut scraper = ScraperConfig::default();
        if let Some(path) = lookup("SCRAPER_CSV_PATH") {
            scraper.output_path = PathBuf::from(path);
        }
        if let Some(value) = lookup("SCRAPER_HEADLESS") {
            scraper.headless = parse_bool(&value).ok_or_else(|| {
                ScraperError::Config(format!("SCRAPER_HEADLESS={} は真偽値ではありません", value))
            })?;
        }

        Ok(Self {
            addr,
            target_url,
            scraper,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
