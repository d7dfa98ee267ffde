//! 抽出結果のCSVファイル

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::ScraperError;
use crate::listing::Record;

/// プレビューで返す最大件数
pub const PREVIEW_LIMIT: usize = 5;

/// ヘッダ行 `Title,Price,Link` 付きのCSVファイル
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// 既存の内容を置き換える
    ///
    /// 一時ファイルに書き出してからリネームするので、読み手が途中の状態を見ることはない。
    pub fn write(&self, records: &[Record]) -> Result<(), ScraperError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        let tmp_path = self.tmp_path();
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_path(&tmp_path)?;
            writer.write_record(["Title", "Price", "Link"])?;
            for record in records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }

        std::fs::rename(&tmp_path, &self.path)?;
        info!("Saved {} records to {:?}", records.len(), self.path);
        Ok(())
    }

    /// ファイル全体（ダウンロード用）
    pub fn read_all(&self) -> Result<Vec<u8>, ScraperError> {
        self.ensure_exists()?;
        Ok(std::fs::read(&self.path)?)
    }

    pub fn read_records(&self) -> Result<Vec<Record>, ScraperError> {
        self.read_first(usize::MAX)
    }

    /// 先頭 `min(limit, 全件)` 件
    pub fn preview(&self, limit: usize) -> Result<Vec<Record>, ScraperError> {
        self.read_first(limit)
    }

    fn read_first(&self, limit: usize) -> Result<Vec<Record>, ScraperError> {
        self.ensure_exists()?;
        let mut reader = csv::Reader::from_path(&self.path)?;

        let records = reader
            .deserialize::<Record>()
            .take(limit)
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Read {} records from {:?}", records.len(), self.path);
        Ok(records)
    }

    fn ensure_exists(&self) -> Result<(), ScraperError> {
        if self.exists() {
            Ok(())
        } else {
            Err(ScraperError::StoreNotFound(self.path.display().to_string()))
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
