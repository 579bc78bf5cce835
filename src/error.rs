use thiserror::Error;

#[derive(Error, Debug)]
pub enum HandtableError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("処理中のため新しい画像を受け付けられません")]
    Busy,

    #[error("出力できる抽出結果がありません（先に抽出を実行してください）")]
    NothingToExport,

    #[error("処理IDが履歴に見つかりません: {0}")]
    UnknownProcessingId(String),

    #[error("バックエンド通信エラー: {0}")]
    Transport(#[from] handtable_common::TransportError),

    /// 抽出・出力の失敗（画面向けメッセージ）
    #[error("{0}")]
    Ui(handtable_common::UiError),

    #[error("HTTPクライアントの初期化に失敗: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] handtable_common::Error),
}

pub type Result<T> = std::result::Result<T, HandtableError>;
