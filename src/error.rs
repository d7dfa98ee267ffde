use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("ブラウザ初期化エラー: {0}")]
    BrowserInit(String),

    #[error("ブラウザ操作エラー: {0}")]
    Browser(String),

    #[error("ページ読み込みエラー: {0}")]
    PageLoad(String),

    #[error("フィールド抽出エラー: {0}")]
    FieldExtraction(String),

    #[error("CSVが見つかりません: {0}")]
    StoreNotFound(String),

    #[error("セレクタが不正です: {0}")]
    InvalidSelector(String),

    #[error("サーバーエラー: {0}")]
    Server(String),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("CSVエラー: {0}")]
    Csv(#[from] csv::Error),

    #[error("ファイル操作エラー: {0}")]
    FileIO(#[from] std::io::Error),
}
