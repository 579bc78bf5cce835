//! Handtable Common Library
//!
//! CLIとWeb(WASM)で共有される型・状態機械・エラー分類

pub mod types;
pub mod error;
pub mod media;
pub mod classify;
pub mod session;
pub mod orchestrator;

pub use types::{
    TableData, ProcessingId, UploadResponse, Extraction, ExtractionOutcome,
    ExtractionRecord, HealthStatus, endpoint_url, generate_excel_path,
    parse_upload_response, extract_error_detail,
};
pub use error::{Error, Result};
pub use media::{is_image_media_type, media_type_from_path, export_file_name};
pub use classify::{TransportError, ErrorKind, UiError, classify_extraction_failure};
pub use session::{Session, SelectedImage, Selection, Stage, AttemptId};
pub use orchestrator::{TableBackend, SessionStore, FileSink, run_extraction, run_export};
