//! バックエンドとの送受信型
//!
//! CLIとWeb(WASM)で共有される型:
//! - TableData: 抽出された表（1行目がヘッダー）
//! - UploadResponse: `/api/upload-image` のレスポンス封筒
//! - ExtractionRecord: `/api/extractions` の履歴レコード

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

pub const UPLOAD_IMAGE_PATH: &str = "/api/upload-image";
pub const GENERATE_EXCEL_PATH: &str = "/api/generate-excel";
pub const HEALTH_PATH: &str = "/api/";
pub const EXTRACTIONS_PATH: &str = "/api/extractions";

/// multipartのフィールド名
pub const UPLOAD_FIELD_NAME: &str = "file";

pub const EXTRACT_TIMEOUT: Duration = Duration::from_secs(60);
pub const EXPORT_TIMEOUT: Duration = Duration::from_secs(30);

pub const XLSX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// バックエンドURLとパスを結合（末尾スラッシュの重複を除去）
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Excel生成エンドポイントのパス
pub fn generate_excel_path(processing_id: &ProcessingId) -> String {
    format!("{}/{}", GENERATE_EXCEL_PATH, processing_id)
}

/// 抽出結果とExcel出力を紐付ける不透明なID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessingId(String);

impl ProcessingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ProcessingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProcessingId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// 抽出された表
///
/// 1行目はヘッダー、2行目以降がデータ行。
/// 行ごとの列数は揃っているとは限らない。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TableData {
    rows: Vec<Vec<String>>,
}

impl TableData {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 最も長い行の列数
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// 行を表の幅まで空セルで埋めて返す
    pub fn padded(&self, row: &[String]) -> Vec<String> {
        let mut cells = row.to_vec();
        cells.resize(self.width(), String::new());
        cells
    }
}

impl<'de> Deserialize<'de> for TableData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // AIが数値セルをそのまま返すことがあるため文字列化して受け入れる
        let raw: Vec<Vec<serde_json::Value>> = Vec::deserialize(deserializer)?;
        let rows = raw
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect();
        Ok(Self { rows })
    }
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `/api/upload-image` のレスポンス封筒
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub table_data: Option<TableData>,

    #[serde(default)]
    pub processing_id: Option<ProcessingId>,
}

/// 成功した抽出
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub table: TableData,
    pub processing_id: ProcessingId,
    pub message: Option<String>,
}

/// 封筒を検証した結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    Extracted(Extraction),
    /// `success: false`（バックエンドのメッセージ付き）
    Rejected { message: Option<String> },
}

impl UploadResponse {
    /// 封筒を検証して抽出結果へ変換
    ///
    /// `success: true` なのに `table_data` / `processing_id` が無い場合は
    /// Schemaエラーとして扱う。
    pub fn into_outcome(self) -> Result<ExtractionOutcome> {
        let message = self.message.filter(|m| !m.trim().is_empty());

        if !self.success {
            return Ok(ExtractionOutcome::Rejected { message });
        }

        let table = self
            .table_data
            .ok_or_else(|| Error::Schema("success response without table_data".into()))?;
        let processing_id = self
            .processing_id
            .filter(|id| !id.is_blank())
            .ok_or_else(|| Error::Schema("success response without processing_id".into()))?;

        Ok(ExtractionOutcome::Extracted(Extraction {
            table,
            processing_id,
            message,
        }))
    }
}

/// アップロードレスポンスをパース
pub fn parse_upload_response(body: &str) -> Result<UploadResponse> {
    Ok(serde_json::from_str(body)?)
}

/// エラーレスポンスの `detail` を取り出す
///
/// FastAPI形式: 文字列、またはバリデーションエラーの配列（`msg` を連結）
pub fn extract_error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}

/// `/api/` のヘルスチェック応答
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

impl HealthStatus {
    pub fn is_running(&self) -> bool {
        self.status.eq_ignore_ascii_case("running")
    }
}

/// `/api/extractions` の履歴レコード
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub id: ProcessingId,
    pub filename: String,
    #[serde(default)]
    pub extracted_data: TableData,
    #[serde(default)]
    pub created_at: String,
}

impl ExtractionRecord {
    pub fn into_extraction(self) -> Extraction {
        Extraction {
            table: self.extracted_data,
            processing_id: self.id,
            message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success_envelope() {
        let body = r#"{"success": true, "message": "ok",
            "table_data": [["Name", "Age"], ["Alice", "30"]],
            "processing_id": "abc123"}"#;
        let outcome = parse_upload_response(body).unwrap().into_outcome().unwrap();

        let ExtractionOutcome::Extracted(extraction) = outcome else {
            panic!("expected extraction");
        };
        assert_eq!(extraction.processing_id.as_str(), "abc123");
        assert_eq!(extraction.table.header().unwrap(), ["Name", "Age"]);
        assert_eq!(extraction.table.data_rows(), [vec!["Alice".to_string(), "30".to_string()]]);
    }

    #[test]
    fn test_parse_rejected_envelope() {
        let body = r#"{"success": false, "message": "low confidence"}"#;
        let outcome = parse_upload_response(body).unwrap().into_outcome().unwrap();
        assert_eq!(
            outcome,
            ExtractionOutcome::Rejected { message: Some("low confidence".into()) }
        );
    }

    #[test]
    fn test_rejected_blank_message_is_none() {
        let body = r#"{"success": false, "message": "  "}"#;
        let outcome = parse_upload_response(body).unwrap().into_outcome().unwrap();
        assert_eq!(outcome, ExtractionOutcome::Rejected { message: None });
    }

    #[test]
    fn test_success_without_processing_id_is_schema_error() {
        let body = r#"{"success": true, "table_data": [["A"]]}"#;
        let err = parse_upload_response(body).unwrap().into_outcome().unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_success_without_table_is_schema_error() {
        let body = r#"{"success": true, "processing_id": "x"}"#;
        let err = parse_upload_response(body).unwrap().into_outcome().unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_missing_success_field_fails_to_parse() {
        assert!(parse_upload_response(r#"{"table_data": []}"#).is_err());
        assert!(parse_upload_response("<html>").is_err());
    }

    #[test]
    fn test_non_string_cells_are_stringified() {
        let table: TableData = serde_json::from_str(r#"[["Qty", "Ok"], [3, true], [null, 1.5]]"#).unwrap();
        assert_eq!(table.rows()[1], ["3", "true"]);
        assert_eq!(table.rows()[2], ["", "1.5"]);
    }

    #[test]
    fn test_ragged_rows_padded_to_width() {
        let table = TableData::new(vec![
            vec!["A".into(), "B".into(), "C".into()],
            vec!["1".into()],
        ]);
        assert_eq!(table.width(), 3);
        assert_eq!(table.padded(&table.data_rows()[0]), ["1", "", ""]);
    }

    #[test]
    fn test_empty_table() {
        let table = TableData::default();
        assert!(table.header().is_none());
        assert!(table.data_rows().is_empty());
        assert_eq!(table.width(), 0);
    }

    #[test]
    fn test_extract_error_detail() {
        assert_eq!(
            extract_error_detail(r#"{"detail": "Only image files are allowed"}"#).as_deref(),
            Some("Only image files are allowed")
        );
        assert_eq!(
            extract_error_detail(r#"{"detail": [{"msg": "field required"}, {"msg": "bad"}]}"#)
                .as_deref(),
            Some("field required; bad")
        );
        assert_eq!(extract_error_detail("Internal Server Error"), None);
        assert_eq!(extract_error_detail(r#"{"detail": ""}"#), None);
    }

    #[test]
    fn test_endpoint_url() {
        assert_eq!(
            endpoint_url("http://localhost:8000/", UPLOAD_IMAGE_PATH),
            "http://localhost:8000/api/upload-image"
        );
        let id = ProcessingId::from("abc123");
        assert_eq!(
            endpoint_url("http://h", &generate_excel_path(&id)),
            "http://h/api/generate-excel/abc123"
        );
    }

    #[test]
    fn test_extraction_record_parse() {
        let body = r#"[{"id": "p1", "filename": "a.png",
            "extracted_data": [["H"], ["v"]], "created_at": "2024-01-01T00:00:00"}]"#;
        let records: Vec<ExtractionRecord> = serde_json::from_str(body).unwrap();
        assert_eq!(records[0].id.as_str(), "p1");
        assert_eq!(records[0].extracted_data.data_rows().len(), 1);
    }

    #[test]
    fn test_health_status() {
        let health: HealthStatus =
            serde_json::from_str(r#"{"message": "Handwritten Table Converter API", "status": "running"}"#)
                .unwrap();
        assert!(health.is_running());
    }
}
