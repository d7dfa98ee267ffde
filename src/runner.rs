//! バックグラウンドのスクレイピングジョブ管理
//!
//! 同時に走るジョブは1つだけ。状態は `idle → running → done | error` で、
//! `done` / `error` からは再度 `start` できる。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tower::Service;
use tracing::{error, info};

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::listing::{Record, SelectorSet};
use crate::service::{ScrapeRequest, ScraperService};
use crate::store::{CsvStore, PREVIEW_LIMIT};
use crate::traits::SessionLauncher;

/// ジョブの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Idle,
    Running,
    Done,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Full,
    Preview,
}

#[derive(Debug)]
pub enum Fetched {
    /// CSVファイルそのもの
    Full(Vec<u8>),
    Preview(Vec<Record>),
}

#[derive(Debug, Default)]
struct JobState {
    status: JobStatus,
    handle: Option<JoinHandle<()>>,
}

pub struct JobRunner<L> {
    service: ScraperService<L>,
    state: Arc<Mutex<JobState>>,
}

impl<L: SessionLauncher> JobRunner<L> {
    pub fn new(config: ScraperConfig, launcher: L) -> Self {
        Self {
            service: ScraperService::new(config, launcher),
            state: Arc::new(Mutex::new(JobState::default())),
        }
    }

    pub fn store(&self) -> CsvStore {
        self.service.scraper().store()
    }

    /// ジョブを開始（完了は待たない）
    ///
    /// 状態の確認と `running` への遷移は同じロック内で行う。
    pub async fn start(
        &self,
        url: &str,
        selectors: SelectorSet,
    ) -> Result<StartOutcome, ScraperError> {
        selectors.validate()?;

        let mut state = self.state.lock().await;
        if state.status == JobStatus::Running {
            info!("Scrape already running, rejecting start");
            return Ok(StartOutcome::AlreadyRunning);
        }

        state.status = JobStatus::Running;

        let mut service = self.service.clone();
        let request = ScrapeRequest::new(url, selectors);
        let shared = self.state.clone();

        state.handle = Some(tokio::spawn(async move {
            // panic もここで受け止めて error にする
            let outcome = tokio::spawn(async move { service.call(request).await }).await;

            let status = match outcome {
                Ok(Ok(result)) => {
                    info!("Scrape finished: {} records", result.record_count);
                    JobStatus::Done
                }
                Ok(Err(e)) => {
                    error!("Scraping error: {}", e);
                    JobStatus::Error
                }
                Err(e) => {
                    error!("Scraping task failed: {}", e);
                    JobStatus::Error
                }
            };

            shared.lock().await.status = status;
        }));

        info!("Scrape job started: {}", url);
        Ok(StartOutcome::Started)
    }

    pub async fn poll(&self) -> JobStatus {
        self.state.lock().await.status
    }

    /// 保存済みCSVを取得
    ///
    /// ファイル読み込みはブロッキングプールで行う。
    pub async fn fetch(&self, kind: FetchKind) -> Result<Fetched, ScraperError> {
        let store = self.store();
        tokio::task::spawn_blocking(move || match kind {
            FetchKind::Full => store.read_all().map(Fetched::Full),
            FetchKind::Preview => store.preview(PREVIEW_LIMIT).map(Fetched::Preview),
        })
        .await
        .map_err(|e| ScraperError::FileIO(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }

    /// 現在のジョブの終了を待つ
    pub async fn join(&self) {
        let handle = self.state.lock().await.handle.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Job handle failed: {}", e);
            }
        }
    }
}
