//! 画像ファイルの読み込み（CLI版のファイル選択）

use crate::error::{HandtableError, Result};
use handtable_common::{media_type_from_path, SelectedImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 拡張子から判定できない場合のMIMEタイプ
const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// ディスクから読み込んだ画像
#[derive(Debug, Clone)]
pub struct DiskImage {
    pub path: PathBuf,
    pub bytes: Arc<[u8]>,
}

impl DiskImage {
    /// 中身を持たない画像（履歴から出力を再開する場合など、ファイル名だけが必要なとき）
    pub fn detached(file_name: &str) -> SelectedImage<DiskImage> {
        let media_type = media_type_from_path(Path::new(file_name)).unwrap_or(UNKNOWN_MEDIA_TYPE);
        SelectedImage::new(
            file_name,
            media_type,
            DiskImage {
                path: PathBuf::from(file_name),
                bytes: Arc::from(Vec::new()),
            },
        )
    }
}

/// 画像ファイルを読み込んで選択候補を作る
///
/// MIMEタイプは拡張子から決める。画像かどうかの判定はセッション側で行う。
pub fn load_image(path: &Path) -> Result<SelectedImage<DiskImage>> {
    if !path.is_file() {
        return Err(HandtableError::FileNotFound(path.display().to_string()));
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let media_type = media_type_from_path(path).unwrap_or(UNKNOWN_MEDIA_TYPE);
    let bytes = std::fs::read(path)?;

    Ok(SelectedImage::new(
        file_name,
        media_type,
        DiskImage {
            path: path.to_path_buf(),
            bytes: bytes.into(),
        },
    ))
}
