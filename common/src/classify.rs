//! エラー分類
//!
//! 通信層の失敗（TransportError）を、画面に出すメッセージと
//! 機械判定用の種別（ErrorKind）の組へ変換する。

use std::fmt;
use thiserror::Error;

pub const INVALID_IMAGE_MESSAGE: &str = "Please select a valid image file (JPG, PNG, GIF)";
pub const CONNECTIVITY_MESSAGE: &str =
    "Cannot connect to backend server. Please make sure the backend is running and reachable.";
pub const SERVER_FAULT_MESSAGE: &str =
    "Server error occurred. Please check the backend logs for details.";
pub const EXTRACTION_FALLBACK_MESSAGE: &str = "Failed to extract table data";
pub const GENERIC_PROCESSING_MESSAGE: &str = "Error processing image";
pub const EXPORT_FAILURE_MESSAGE: &str = "Error downloading Excel file. Please try again.";

const CONNECTIVITY_HINTS: &[&str] = &[
    "Make sure the backend server is running (default: http://localhost:8000)",
    "Make sure the database used by the backend is running",
    "Check that the configured backend URL points to the backend",
];

/// 通信層の失敗
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// 接続拒否・名前解決失敗など、応答が得られなかった
    #[error("{0}")]
    Unreachable(String),

    #[error("timeout of {secs}s exceeded")]
    Timeout { secs: u64 },

    /// HTTPエラーステータス（`detail` があれば保持）
    #[error("Request failed with status code {code}")]
    Status { code: u16, detail: Option<String> },

    /// 応答本文が期待した形ではない
    #[error("Unexpected response from backend: {0}")]
    Malformed(String),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    pub fn is_server_fault(&self) -> bool {
        matches!(self, TransportError::Status { code, .. } if *code >= 500)
    }
}

/// 画面に出すエラーの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 画像以外のファイルが選択された
    Validation,
    /// バックエンドに到達できない
    Connectivity,
    /// 5xx
    ServerFault,
    /// `success: false`
    Application,
    /// その他の通信失敗（4xx・タイムアウト・不正な応答）
    Request,
    /// Excel出力の失敗
    Export,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Connectivity => "connectivity",
            ErrorKind::ServerFault => "server_fault",
            ErrorKind::Application => "application",
            ErrorKind::Request => "request",
            ErrorKind::Export => "export",
        }
    }
}

/// 画面に出すエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl UiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation() -> Self {
        Self::new(ErrorKind::Validation, INVALID_IMAGE_MESSAGE)
    }

    /// バックエンドが `success: false` を返した
    pub fn application(message: Option<String>) -> Self {
        Self::new(
            ErrorKind::Application,
            message.unwrap_or_else(|| EXTRACTION_FALLBACK_MESSAGE.to_string()),
        )
    }

    pub fn export() -> Self {
        Self::new(ErrorKind::Export, EXPORT_FAILURE_MESSAGE)
    }

    /// 処理が決着しないまま中断された
    pub fn interrupted() -> Self {
        Self::new(ErrorKind::Request, GENERIC_PROCESSING_MESSAGE)
    }

    pub fn is_connectivity(&self) -> bool {
        self.kind == ErrorKind::Connectivity
    }

    /// 接続エラー時に添えるトラブルシューティング
    pub fn troubleshooting_hints(&self) -> &'static [&'static str] {
        if self.is_connectivity() {
            CONNECTIVITY_HINTS
        } else {
            &[]
        }
    }
}

impl fmt::Display for UiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// 抽出リクエストの通信失敗を分類
///
/// 優先順位: 接続不可 → 5xx → `detail` → 生のエラーメッセージ → 汎用メッセージ
pub fn classify_extraction_failure(error: &TransportError) -> UiError {
    match error {
        TransportError::Unreachable(_) => {
            UiError::new(ErrorKind::Connectivity, CONNECTIVITY_MESSAGE)
        }
        e if e.is_server_fault() => UiError::new(ErrorKind::ServerFault, SERVER_FAULT_MESSAGE),
        TransportError::Status {
            detail: Some(detail),
            ..
        } if !detail.trim().is_empty() => UiError::new(ErrorKind::Request, detail.clone()),
        other => {
            let raw = other.to_string();
            if raw.trim().is_empty() {
                UiError::new(ErrorKind::Request, GENERIC_PROCESSING_MESSAGE)
            } else {
                UiError::new(ErrorKind::Request, raw)
            }
        }
    }
}
