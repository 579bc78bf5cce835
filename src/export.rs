//! Excelの保存（CLI版）
//!
//! ブラウザのダウンロードに相当する処理。バックエンドから受け取ったバイト列をそのまま書き出す。

use handtable_common::media::EXPORT_EXTENSION;
use handtable_common::FileSink;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 出力先が `.xlsx` のファイルパスならそのまま使い、
/// それ以外（既存ディレクトリ、`reports.2024` のような新規ディレクトリ）はファイル名を結合する
pub fn output_path_for(output: &Path, file_name: &str) -> PathBuf {
    let is_xlsx = output
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(EXPORT_EXTENSION));
    if is_xlsx && !output.is_dir() {
        output.to_path_buf()
    } else {
        output.join(file_name)
    }
}

/// ディスクへ保存するシンク
#[derive(Debug)]
pub struct DiskSink {
    output: PathBuf,
    saved: RefCell<Option<PathBuf>>,
}

impl DiskSink {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            saved: RefCell::new(None),
        }
    }

    /// 最後に保存したファイル
    pub fn saved_path(&self) -> Option<PathBuf> {
        self.saved.borrow().clone()
    }
}

impl FileSink for DiskSink {
    type Error = std::io::Error;

    fn save(&self, file_name: &str, media_type: &str, bytes: &[u8]) -> Result<(), Self::Error> {
        let path = output_path_for(&self.output, file_name);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&path, bytes)?;
        debug!(path = %path.display(), %media_type, bytes = bytes.len(), "spreadsheet written");
        *self.saved.borrow_mut() = Some(path);
        Ok(())
    }
}
