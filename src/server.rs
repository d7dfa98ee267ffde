//! HTTP API (warp)
//!
//! - `GET /` 操作画面
//! - `POST /start-scraping` ジョブ開始
//! - `GET /status` ジョブ状態
//! - `GET /download` CSVダウンロード
//! - `GET /preview` 先頭5件のプレビュー

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};
use warp::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::error::ScraperError;
use crate::listing::{Record, SelectorSet};
use crate::runner::{FetchKind, Fetched, JobRunner, JobStatus, StartOutcome};
use crate::traits::SessionLauncher;

const INDEX_HTML: &str = include_str!("../templates/index.html");

/// `/start-scraping` で使う固定のURLとセレクタ
#[derive(Debug, Clone)]
pub struct ScrapeTarget {
    pub url: String,
    pub selectors: SelectorSet,
}

impl ScrapeTarget {
    pub fn new(url: impl Into<String>, selectors: SelectorSet) -> Self {
        Self {
            url: url.into(),
            selectors,
        }
    }
}

#[derive(Debug, Serialize)]
struct StatusBody<T: Serialize> {
    status: T,
}

/// 全ルート
pub fn routes<L: SessionLauncher>(
    runner: Arc<JobRunner<L>>,
    target: ScrapeTarget,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let with_runner = warp::any().map(move || runner.clone());
    let with_target = warp::any().map(move || target.clone());

    let index_route = warp::path::end()
        .and(warp::get())
        .map(|| warp::reply::html(INDEX_HTML).into_response());

    let start_route = warp::path("start-scraping")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_runner.clone())
        .and(with_target)
        .and_then(start_scraping::<L>);

    let status_route = warp::path("status")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_runner.clone())
        .and_then(status::<L>);

    let download_route = warp::path("download")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_runner.clone())
        .and(warp::any().map(|| FetchKind::Full))
        .and_then(fetch::<L>);

    let preview_route = warp::path("preview")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_runner)
        .and(warp::any().map(|| FetchKind::Preview))
        .and_then(fetch::<L>);

    index_route
        .or(start_route)
        .unify()
        .or(status_route)
        .unify()
        .or(download_route)
        .unify()
        .or(preview_route)
        .unify()
        .with(warp::trace::request())
}

/// Ctrl-C まで待ち受ける
pub async fn serve<L: SessionLauncher>(
    runner: Arc<JobRunner<L>>,
    target: ScrapeTarget,
    addr: SocketAddr,
) -> Result<(), ScraperError> {
    let (bound, server) = warp::serve(routes(runner.clone(), target))
        .try_bind_with_graceful_shutdown(addr, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .map_err(|e| ScraperError::Server(format!("{}: {}", addr, e)))?;

    info!("Listening on http://{}", bound);
    server.await;

    // 実行中のジョブがあれば終わるまで待つ
    runner.join().await;
    info!("Server stopped");
    Ok(())
}

async fn start_scraping<L: SessionLauncher>(
    runner: Arc<JobRunner<L>>,
    target: ScrapeTarget,
) -> Result<Response, Infallible> {
    let reply = match runner.start(&target.url, target.selectors).await {
        Ok(StartOutcome::Started) => {
            warp::reply::with_status(warp::reply::json(&StatusBody { status: "started" }), StatusCode::OK)
        }
        Ok(StartOutcome::AlreadyRunning) => warp::reply::with_status(
            warp::reply::json(&StatusBody {
                status: "already running",
            }),
            StatusCode::BAD_REQUEST,
        ),
        Err(e) => {
            error!("Failed to start scrape: {}", e);
            warp::reply::with_status(
                warp::reply::json(&StatusBody { status: JobStatus::Error }),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    };
    Ok(reply.into_response())
}

async fn status<L: SessionLauncher>(runner: Arc<JobRunner<L>>) -> Result<Response, Infallible> {
    let status = runner.poll().await;
    Ok(warp::reply::json(&StatusBody { status }).into_response())
}

/// `/download` と `/preview`
async fn fetch<L: SessionLauncher>(
    runner: Arc<JobRunner<L>>,
    kind: FetchKind,
) -> Result<Response, Infallible> {
    let reply = match runner.fetch(kind).await {
        Ok(Fetched::Full(bytes)) => {
            let filename = runner
                .store()
                .path()
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "books.csv".to_string());

            let reply = warp::reply::with_header(bytes, CONTENT_TYPE, "text/csv; charset=utf-8");
            warp::reply::with_header(
                reply,
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            )
            .into_response()
        }
        Ok(Fetched::Preview(records)) => warp::reply::json(&records).into_response(),
        // 未実行ならダウンロードは404、プレビューは空配列
        Err(ScraperError::StoreNotFound(_)) => match kind {
            FetchKind::Full => {
                warp::reply::with_status("CSV not found", StatusCode::NOT_FOUND).into_response()
            }
            FetchKind::Preview => warp::reply::json(&Vec::<Record>::new()).into_response(),
        },
        Err(e) => {
            error!("Failed to read CSV: {}", e);
            match kind {
                FetchKind::Full => {
                    warp::reply::with_status("CSV read error", StatusCode::INTERNAL_SERVER_ERROR)
                        .into_response()
                }
                FetchKind::Preview => warp::reply::with_status(
                    warp::reply::json(&Vec::<Record>::new()),
                    StatusCode::INTERNAL_SERVER_ERROR,
                )
                .into_response(),
            }
        }
    };
    Ok(reply)
}
