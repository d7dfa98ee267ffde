//! 一覧ページのスクレイパー実装

use tracing::{debug, info, warn};
use url::Url;

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::store::CsvStore;
use crate::traits::{BrowserSession, SessionLauncher};

use super::types::{Record, SelectorSet};

/// タイトルを読む属性
const TITLE_ATTRIBUTE: &str = "title";
const LINK_ATTRIBUTE: &str = "href";

/// 一覧ページスクレイパー
pub struct ListingScraper<L> {
    config: ScraperConfig,
    launcher: L,
}

impl<L: SessionLauncher> ListingScraper<L> {
    pub fn new(config: ScraperConfig, launcher: L) -> Self {
        Self { config, launcher }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    pub fn store(&self) -> CsvStore {
        CsvStore::new(&self.config.output_path)
    }

    /// 抽出してCSVに保存
    ///
    /// 抽出が途中で失敗した場合は何も書き込まない。
    pub async fn scrape(
        &self,
        url: &str,
        selectors: &SelectorSet,
    ) -> Result<Vec<Record>, ScraperError> {
        let records = self.extract(url, selectors).await?;
        self.store().write(&records)?;
        Ok(records)
    }

    /// ページを開いてレコードを抽出
    ///
    /// ブラウザは成功・失敗どちらの場合も閉じる。
    pub async fn extract(
        &self,
        url: &str,
        selectors: &SelectorSet,
    ) -> Result<Vec<Record>, ScraperError> {
        selectors.validate()?;
        info!("Starting listing scrape: {}", url);

        let mut session = self.launcher.launch(&self.config).await?;
        let result = self.extract_with(&mut session, url, selectors).await;

        if let Err(e) = session.close().await {
            warn!("Failed to close browser: {}", e);
        }

        match &result {
            Ok(records) => info!("Extracted {} records", records.len()),
            Err(e) => debug!("Extraction aborted: {}", e),
        }
        result
    }

    async fn extract_with<S: BrowserSession>(
        &self,
        session: &mut S,
        url: &str,
        selectors: &SelectorSet,
    ) -> Result<Vec<Record>, ScraperError> {
        session.navigate(url).await?;

        session
            .wait_for(
                &selectors.container,
                self.config.wait_timeout,
                self.config.poll_interval,
            )
            .await?;

        let containers = session.find_all(&selectors.container).await?;
        info!("Found {} containers for {}", containers.len(), selectors.container);

        let base = resolve_base(session, url).await?;

        let mut records = Vec::with_capacity(containers.len());
        for (index, container) in containers.iter().enumerate() {
            let record = extract_record(session, container, selectors, &base, index).await?;
            debug!("#{} {:?}", index, record);
            records.push(record);
        }

        Ok(records)
    }
}

/// 相対リンクの解決に使うURL（リダイレクト後のURLを優先）
async fn resolve_base<S: BrowserSession>(session: &S, url: &str) -> Result<Url, ScraperError> {
    let current = match session.current_url().await {
        Ok(current) => current,
        Err(e) => {
            debug!("current_url unavailable, using request url: {}", e);
            url.to_string()
        }
    };

    Url::parse(&current)
        .or_else(|_| Url::parse(url))
        .map_err(|e| ScraperError::PageLoad(format!("{}: {}", url, e)))
}

async fn extract_record<S: BrowserSession>(
    session: &S,
    container: &S::Element,
    selectors: &SelectorSet,
    base: &Url,
    index: usize,
) -> Result<Record, ScraperError> {
    let title_el = first_match(session, container, &selectors.title, index).await?;
    let title = required_attribute(session, &title_el, TITLE_ATTRIBUTE, index).await?;

    let price_el = first_match(session, container, &selectors.price, index).await?;
    let price = session
        .text(&price_el)
        .await?
        .ok_or_else(|| ScraperError::FieldExtraction(format!("#{} 価格のテキストがありません", index)))?
        .trim()
        .to_string();

    let link_el = first_match(session, container, &selectors.link, index).await?;
    let href = required_attribute(session, &link_el, LINK_ATTRIBUTE, index).await?;
    let link = base
        .join(href.trim())
        .map_err(|e| ScraperError::FieldExtraction(format!("#{} リンク {}: {}", index, href, e)))?;

    Ok(Record {
        title,
        price,
        link: link.to_string(),
    })
}

/// コンテナ内で最初に一致する要素
async fn first_match<S: BrowserSession>(
    session: &S,
    container: &S::Element,
    selector: &str,
    index: usize,
) -> Result<S::Element, ScraperError> {
    session
        .find_within(container, selector)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            ScraperError::FieldExtraction(format!("#{} {} に一致する要素がありません", index, selector))
        })
}

async fn required_attribute<S: BrowserSession>(
    session: &S,
    element: &S::Element,
    name: &str,
    index: usize,
) -> Result<String, ScraperError> {
    session.attribute(element, name).await?.ok_or_else(|| {
        ScraperError::FieldExtraction(format!("#{} {} 属性がありません", index, name))
    })
}
