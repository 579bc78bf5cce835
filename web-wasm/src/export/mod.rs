//! 出力ファイルの保存

pub mod download;

pub use download::BrowserDownload;
