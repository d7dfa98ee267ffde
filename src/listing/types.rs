//! 一覧ページ抽出の型定義

use serde::{Deserialize, Serialize};

use crate::error::ScraperError;

/// 抽出対象のCSSセレクタ一式
///
/// `title` / `price` / `link` は各 `container` 要素を起点に評価される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSet {
    pub container: String,
    pub title: String,
    pub price: String,
    pub link: String,
}

impl SelectorSet {
    pub fn new(
        container: impl Into<String>,
        title: impl Into<String>,
        price: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            container: container.into(),
            title: title.into(),
            price: price.into(),
            link: link.into(),
        }
    }

    /// books.toscrape.com の商品一覧用
    pub fn books_to_scrape() -> Self {
        Self::new("article.product_pod", "h3 a", "p.price_color", "h3 a")
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = price.into();
        self
    }

    /// 空のセレクタをジョブ開始前に弾く
    pub fn validate(&self) -> Result<(), ScraperError> {
        let fields = [
            ("container", &self.container),
            ("title", &self.title),
            ("price", &self.price),
            ("link", &self.link),
        ];

        for (name, selector) in fields {
            if selector.trim().is_empty() {
                return Err(ScraperError::InvalidSelector(format!(
                    "{} セレクタが空です",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// 抽出した1件分のレコード
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Price")]
    pub price: String,
    #[serde(rename = "Link")]
    pub link: String,
}

impl Record {
    pub fn new(
        title: impl Into<String>,
        price: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            price: price.into(),
            link: link.into(),
        }
    }
}
