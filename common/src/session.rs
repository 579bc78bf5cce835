//! アップロード〜抽出〜出力の状態機械
//!
//! 状態: Idle → Selected → Processing → Extracted / Failed
//!
//! - 処理中と結果表示は同じ状態に同時になれない
//! - 抽出中・出力中は新しい画像の選択を受け付けない
//! - 応答には試行IDを付け、古い試行の応答は無視する

use crate::classify::{classify_extraction_failure, TransportError, UiError};
use crate::media::{export_file_name, is_image_media_type};
use crate::types::{Extraction, ExtractionOutcome, ProcessingId, TableData, UploadResponse};
use tracing::{debug, warn};

/// 選択された画像
///
/// `handle` はプラットフォームごとの実体（ブラウザのFile＋プレビューURL、CLIのバイト列など）
#[derive(Debug, Clone)]
pub struct SelectedImage<H> {
    pub file_name: String,
    pub media_type: String,
    pub handle: H,
}

impl<H> SelectedImage<H> {
    pub fn new(file_name: impl Into<String>, media_type: impl Into<String>, handle: H) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            handle,
        }
    }
}

/// 抽出試行ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptId(u64);

/// 状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// 画像未選択
    Idle,
    /// 画像選択済み、未送信
    Selected,
    /// 抽出リクエスト送信中
    Processing { attempt: AttemptId },
    /// 抽出成功
    Extracted { extraction: Extraction, exporting: bool },
    /// 抽出失敗
    Failed(UiError),
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Selected => "selected",
            Stage::Processing { .. } => "processing",
            Stage::Extracted { .. } => "extracted",
            Stage::Failed(_) => "failed",
        }
    }
}

/// `select_file` の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Accepted,
    /// 画像ではない（検証エラーを表示）
    Rejected,
    /// 処理中のため受け付けない
    Busy,
}

/// 抽出リクエストに必要な情報
#[derive(Debug, Clone)]
pub struct ExtractionRequest<H> {
    pub attempt: AttemptId,
    pub image: SelectedImage<H>,
}

/// Excel出力リクエストに必要な情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub processing_id: ProcessingId,
    pub file_name: String,
}

/// 1タブ（1プロセス）分のセッション
#[derive(Debug)]
pub struct Session<H> {
    image: Option<SelectedImage<H>>,
    stage: Stage,
    /// 状態を変えないエラー（検証エラー・出力エラー）
    notice: Option<UiError>,
    next_attempt: u64,
}

impl<H> Default for Session<H> {
    fn default() -> Self {
        Self {
            image: None,
            stage: Stage::Idle,
            notice: None,
            next_attempt: 0,
        }
    }
}

impl<H> Session<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以前に完了した抽出（履歴など）から出力可能な状態で再開する
    pub fn resume(image: SelectedImage<H>, extraction: Extraction) -> Self {
        Self {
            image: Some(image),
            stage: Stage::Extracted {
                extraction,
                exporting: false,
            },
            ..Self::default()
        }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn image(&self) -> Option<&SelectedImage<H>> {
        self.image.as_ref()
    }

    /// 表示中のエラー（新しいものを優先）
    pub fn error(&self) -> Option<&UiError> {
        match &self.stage {
            Stage::Failed(err) => self.notice.as_ref().or(Some(err)),
            _ => self.notice.as_ref(),
        }
    }

    pub fn extraction(&self) -> Option<&Extraction> {
        match &self.stage {
            Stage::Extracted { extraction, .. } => Some(extraction),
            _ => None,
        }
    }

    pub fn table(&self) -> Option<&TableData> {
        self.extraction().map(|e| &e.table)
    }

    pub fn processing_id(&self) -> Option<&ProcessingId> {
        self.extraction().map(|e| &e.processing_id)
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.stage, Stage::Processing { .. })
    }

    pub fn is_exporting(&self) -> bool {
        matches!(self.stage, Stage::Extracted { exporting: true, .. })
    }

    pub fn is_busy(&self) -> bool {
        self.is_processing() || self.is_exporting()
    }

    pub fn can_extract(&self) -> bool {
        self.image.is_some() && !self.is_busy()
    }

    pub fn can_export(&self) -> bool {
        matches!(self.stage, Stage::Extracted { exporting: false, .. })
    }

    /// 出力ファイル名（`<元画像名>_extracted.xlsx`）
    pub fn export_file_name(&self) -> Option<String> {
        self.image.as_ref().map(|img| export_file_name(&img.file_name))
    }

    /// ファイルを選択
    ///
    /// 画像でなければ検証エラーを出し、既存の選択・結果には触れない。
    /// 画像なら選択を置き換え、結果・処理ID・エラーをすべて消す。
    /// 置き換えられた画像（とそのプレビュー）はここで破棄される。
    pub fn select_file(&mut self, candidate: SelectedImage<H>) -> Selection {
        if self.is_busy() {
            debug!(file = %candidate.file_name, "selection ignored while busy");
            return Selection::Busy;
        }

        if !is_image_media_type(&candidate.media_type) {
            debug!(file = %candidate.file_name, media_type = %candidate.media_type, "not an image");
            self.notice = Some(UiError::validation());
            return Selection::Rejected;
        }

        debug!(file = %candidate.file_name, "image selected");
        self.image = Some(candidate);
        self.stage = Stage::Selected;
        self.notice = None;
        Selection::Accepted
    }

    /// 画像を手放して初期状態へ戻す
    pub fn clear(&mut self) {
        if self.is_busy() {
            return;
        }
        self.image = None;
        self.stage = Stage::Idle;
        self.notice = None;
    }

    /// 抽出開始。画像未選択・処理中なら None（何もしない）
    pub fn begin_extraction(&mut self) -> Option<ExtractionRequest<H>>
    where
        H: Clone,
    {
        if self.is_busy() {
            return None;
        }
        let image = self.image.clone()?;

        let attempt = AttemptId(self.next_attempt);
        self.next_attempt += 1;
        self.stage = Stage::Processing { attempt };
        self.notice = None;
        debug!(file = %image.file_name, attempt = attempt.0, "extraction started");

        Some(ExtractionRequest { attempt, image })
    }

    /// 抽出の応答を反映。古い試行の応答なら false
    pub fn complete_extraction(
        &mut self,
        attempt: AttemptId,
        reply: Result<UploadResponse, TransportError>,
    ) -> bool {
        if self.stage != (Stage::Processing { attempt }) {
            debug!(attempt = attempt.0, "stale extraction reply ignored");
            return false;
        }

        let outcome = reply.and_then(|response| {
            response
                .into_outcome()
                .map_err(|e| TransportError::Malformed(e.to_string()))
        });

        self.stage = match outcome {
            Ok(ExtractionOutcome::Extracted(extraction)) => {
                debug!(
                    rows = extraction.table.rows().len(),
                    processing_id = %extraction.processing_id,
                    "extraction succeeded"
                );
                Stage::Extracted {
                    extraction,
                    exporting: false,
                }
            }
            Ok(ExtractionOutcome::Rejected { message }) => {
                warn!(?message, "backend rejected extraction");
                Stage::Failed(UiError::application(message))
            }
            Err(err) => {
                warn!(error = %err, "extraction request failed");
                Stage::Failed(classify_extraction_failure(&err))
            }
        };
        true
    }

    /// 決着しないまま抜けた試行を閉じる（処理中フラグを必ず解除する）
    pub fn abandon_extraction(&mut self, attempt: AttemptId) {
        if self.stage == (Stage::Processing { attempt }) {
            warn!(attempt = attempt.0, "extraction abandoned before settling");
            self.stage = Stage::Failed(UiError::interrupted());
        }
    }

    /// 出力開始。処理IDが無ければ None（何もしない）
    pub fn begin_export(&mut self) -> Option<ExportRequest> {
        let file_name = self.export_file_name()?;
        match &mut self.stage {
            Stage::Extracted {
                extraction,
                exporting,
            } if !*exporting => {
                *exporting = true;
                debug!(processing_id = %extraction.processing_id, "export started");
                Some(ExportRequest {
                    processing_id: extraction.processing_id.clone(),
                    file_name,
                })
            }
            _ => None,
        }
    }

    /// 出力の結果を反映。失敗しても抽出結果は残す
    pub fn complete_export(&mut self, processing_id: &ProcessingId, saved: bool) {
        let Stage::Extracted {
            extraction,
            exporting,
        } = &mut self.stage
        else {
            return;
        };
        if !*exporting || extraction.processing_id != *processing_id {
            return;
        }

        *exporting = false;
        if saved {
            debug!(%processing_id, "export saved");
            self.notice = None;
        } else {
            self.notice = Some(UiError::export());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{ErrorKind, CONNECTIVITY_MESSAGE, EXPORT_FAILURE_MESSAGE};

    fn image(name: &str) -> SelectedImage<()> {
        SelectedImage::new(name, "image/png", ())
    }

    fn success(id: &str) -> UploadResponse {
        UploadResponse {
            success: true,
            message: None,
            table_data: Some(TableData::new(vec![
                vec!["Name".into(), "Age".into()],
                vec!["Alice".into(), "30".into()],
            ])),
            processing_id: Some(ProcessingId::new(id)),
        }
    }

    fn extracted_session() -> Session<()> {
        let mut session = Session::new();
        session.select_file(image("table.png"));
        let request = session.begin_extraction().unwrap();
        session.complete_extraction(request.attempt, Ok(success("abc123")));
        session
    }

    #[test]
    fn test_initial_state() {
        let session: Session<()> = Session::new();
        assert_eq!(session.stage(), &Stage::Idle);
        assert!(session.error().is_none());
        assert!(!session.can_extract());
        assert!(!session.can_export());
    }

    #[test]
    fn test_non_image_rejected_without_touching_result() {
        let mut session = extracted_session();
        let pdf = SelectedImage::new("doc.pdf", "application/pdf", ());

        assert_eq!(session.select_file(pdf), Selection::Rejected);
        assert_eq!(session.error().unwrap().kind, ErrorKind::Validation);
        assert_eq!(session.image().unwrap().file_name, "table.png");
        assert_eq!(session.processing_id().unwrap().as_str(), "abc123");
    }

    #[test]
    fn test_new_image_clears_result_and_error() {
        let mut session = extracted_session();
        session.select_file(SelectedImage::new("x.txt", "text/plain", ()));
        assert!(session.error().is_some());

        assert_eq!(session.select_file(image("other.jpg")), Selection::Accepted);
        assert_eq!(session.stage(), &Stage::Selected);
        assert!(session.table().is_none());
        assert!(session.processing_id().is_none());
        assert!(session.error().is_none());
    }

    #[test]
    fn test_extract_without_image_is_noop() {
        let mut session: Session<()> = Session::new();
        assert!(session.begin_extraction().is_none());
        assert_eq!(session.stage(), &Stage::Idle);
    }

    #[test]
    fn test_processing_refuses_second_extraction_and_selection() {
        let mut session = Session::new();
        session.select_file(image("a.png"));
        let first = session.begin_extraction().unwrap();

        assert!(session.is_busy());
        assert!(session.begin_extraction().is_none());
        assert_eq!(session.select_file(image("b.png")), Selection::Busy);
        assert_eq!(session.image().unwrap().file_name, "a.png");

        session.complete_extraction(first.attempt, Ok(success("p1")));
        assert!(!session.is_busy());
    }

    #[test]
    fn test_success_populates_table() {
        let session = extracted_session();
        let table = session.table().unwrap();
        assert_eq!(table.header().unwrap(), ["Name", "Age"]);
        assert_eq!(table.data_rows().len(), 1);
        assert!(session.error().is_none());
        assert!(session.can_export());
    }

    #[test]
    fn test_rejection_shows_backend_message() {
        let mut session = Session::new();
        session.select_file(image("a.png"));
        let request = session.begin_extraction().unwrap();
        let reply = UploadResponse {
            success: false,
            message: Some("low confidence".into()),
            ..Default::default()
        };
        session.complete_extraction(request.attempt, Ok(reply));

        assert_eq!(session.error().unwrap().message, "low confidence");
        assert!(session.table().is_none());
        assert!(!session.is_busy());
    }

    #[test]
    fn test_transport_failure_classified() {
        let mut session = Session::new();
        session.select_file(image("a.png"));
        let request = session.begin_extraction().unwrap();
        session.complete_extraction(
            request.attempt,
            Err(TransportError::Unreachable("connection refused".into())),
        );
        assert_eq!(session.error().unwrap().message, CONNECTIVITY_MESSAGE);
        assert!(session.can_extract());
    }

    #[test]
    fn test_malformed_success_is_failure() {
        let mut session = Session::new();
        session.select_file(image("a.png"));
        let request = session.begin_extraction().unwrap();
        let reply = UploadResponse {
            success: true,
            ..Default::default()
        };
        session.complete_extraction(request.attempt, Ok(reply));
        assert!(matches!(session.stage(), Stage::Failed(_)));
        assert!(session.table().is_none());
    }

    #[test]
    fn test_stale_reply_ignored() {
        let mut session = Session::new();
        session.select_file(image("a.png"));
        let first = session.begin_extraction().unwrap();
        session.abandon_extraction(first.attempt);
        let second = session.begin_extraction().unwrap();

        assert!(!session.complete_extraction(first.attempt, Ok(success("old"))));
        assert!(session.is_processing());
        assert!(session.complete_extraction(second.attempt, Ok(success("new"))));
        assert_eq!(session.processing_id().unwrap().as_str(), "new");
    }

    #[test]
    fn test_abandon_releases_busy() {
        let mut session = Session::new();
        session.select_file(image("a.png"));
        let request = session.begin_extraction().unwrap();
        session.abandon_extraction(request.attempt);
        assert!(!session.is_busy());
        assert_eq!(session.error().unwrap(), &UiError::interrupted());
    }

    #[test]
    fn test_export_without_processing_id_is_noop() {
        let mut session = Session::new();
        assert!(session.begin_export().is_none());
        session.select_file(image("a.png"));
        assert!(session.begin_export().is_none());
    }

    #[test]
    fn test_export_request_uses_base_name() {
        let mut session = extracted_session();
        let request = session.begin_export().unwrap();
        assert_eq!(request.processing_id.as_str(), "abc123");
        assert_eq!(request.file_name, "table_extracted.xlsx");
        assert!(session.is_exporting());
        assert!(session.begin_export().is_none());
    }

    #[test]
    fn test_export_failure_keeps_table() {
        let mut session = extracted_session();
        let request = session.begin_export().unwrap();
        session.complete_export(&request.processing_id, false);

        assert_eq!(session.error().unwrap().message, EXPORT_FAILURE_MESSAGE);
        assert!(session.table().is_some());
        assert!(session.can_export());

        let retry = session.begin_export().unwrap();
        session.complete_export(&retry.processing_id, true);
        assert!(session.error().is_none());
    }

    #[test]
    fn test_resume_allows_export() {
        let extraction = Extraction {
            table: TableData::new(vec![vec!["H".into()]]),
            processing_id: ProcessingId::new("p9"),
            message: None,
        };
        let mut session = Session::resume(image("scan.jpg"), extraction);
        assert!(session.can_export());
        let request = session.begin_export().unwrap();
        assert_eq!(request.file_name, "scan_extracted.xlsx");
        assert_eq!(request.processing_id.as_str(), "p9");
    }

    #[test]
    fn test_clear_returns_to_idle() {
        let mut session = extracted_session();
        session.clear();
        assert_eq!(session.stage(), &Stage::Idle);
        assert!(session.image().is_none());
    }

    #[test]
    fn test_replaced_and_cleared_images_are_released() {
        use std::rc::Rc;

        let first = Rc::new(());
        let second = Rc::new(());
        let mut session = Session::new();

        session.select_file(SelectedImage::new("a.png", "image/png", first.clone()));
        assert_eq!(Rc::strong_count(&first), 2);

        // 画像以外では置き換わらない
        session.select_file(SelectedImage::new("a.txt", "text/plain", second.clone()));
        assert_eq!(Rc::strong_count(&first), 2);
        assert_eq!(Rc::strong_count(&second), 1);

        session.select_file(SelectedImage::new("b.png", "image/png", second.clone()));
        assert_eq!(Rc::strong_count(&first), 1);

        session.clear();
        assert_eq!(Rc::strong_count(&second), 1);
    }
}
