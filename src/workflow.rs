//! CLIの抽出・出力手順
//!
//! 共通の状態機械（Session）と実行関数（run_extraction / run_export）を
//! RefCellに載せて使う。

use crate::client::HttpBackend;
use crate::error::{HandtableError, Result};
use crate::export::DiskSink;
use crate::image::{load_image, DiskImage};
use handtable_common::{
    run_export, run_extraction, ErrorKind, Extraction, Selection, Session, TableBackend, UiError,
};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tracing::debug;

pub type CliSession = RefCell<Session<DiskImage>>;

pub fn new_session() -> CliSession {
    RefCell::new(Session::new())
}

/// 画像ファイルを選択する
pub fn select_image(session: &CliSession, path: &Path) -> Result<()> {
    let candidate = load_image(path)?;
    let mut session = session.borrow_mut();
    match session.select_file(candidate) {
        Selection::Accepted => Ok(()),
        Selection::Busy => Err(HandtableError::Busy),
        Selection::Rejected => Err(HandtableError::Ui(
            session.error().cloned().unwrap_or_else(UiError::validation),
        )),
    }
}

/// 選択中の画像を抽出し、成功すれば抽出結果を返す
pub async fn extract<B>(session: &CliSession, backend: &B) -> Result<Extraction>
where
    B: TableBackend<DiskImage>,
{
    run_extraction(session, backend).await;

    let session = session.borrow();
    match session.extraction() {
        Some(extraction) => Ok(extraction.clone()),
        None => Err(HandtableError::Ui(
            session.error().cloned().unwrap_or_else(UiError::interrupted),
        )),
    }
}

/// 抽出済みの表をExcelとして保存し、保存先を返す
pub async fn export<B>(session: &CliSession, backend: &B, sink: &DiskSink) -> Result<PathBuf>
where
    B: TableBackend<DiskImage>,
{
    if !run_export(session, backend, sink).await {
        return Err(HandtableError::NothingToExport);
    }

    if let Some(err) = session
        .borrow()
        .error()
        .filter(|e| e.kind == ErrorKind::Export)
    {
        return Err(HandtableError::Ui(err.clone()));
    }
    sink.saved_path().ok_or_else(|| HandtableError::Ui(UiError::export()))
}

/// 処理IDから出力可能なセッションを作る
///
/// ファイル名が指定されなければ履歴（`/api/extractions`）から探す。
pub async fn resume(
    backend: &HttpBackend,
    processing_id: &str,
    name: Option<String>,
) -> Result<CliSession> {
    let records = match backend.list_extractions().await {
        Ok(records) => records,
        // ファイル名が分かっていれば履歴なしでも出力できる
        Err(e) if name.is_some() => {
            debug!(error = %e, "extraction history unavailable");
            Vec::new()
        }
        Err(e) => return Err(e.into()),
    };
    let record = records.into_iter().find(|r| r.id.as_str() == processing_id);

    let (file_name, extraction) = match (name, record) {
        (Some(name), record) => {
            let extraction = record.map(|r| r.into_extraction()).unwrap_or(Extraction {
                table: Default::default(),
                processing_id: processing_id.into(),
                message: None,
            });
            (name, extraction)
        }
        (None, Some(record)) => (record.filename.clone(), record.into_extraction()),
        (None, None) => return Err(HandtableError::UnknownProcessingId(processing_id.into())),
    };

    Ok(RefCell::new(Session::resume(
        DiskImage::detached(&file_name),
        extraction,
    )))
}
