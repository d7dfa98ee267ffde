//! 商品一覧スクレイパーモジュール
//!
//! コンテナ要素ごとに タイトル / 価格 / リンク を抽出してCSVに保存する

mod scraper;
mod types;

pub use scraper::ListingScraper;
pub use types::{Record, SelectorSet};
