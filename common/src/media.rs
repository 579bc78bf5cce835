//! 画像の判定と出力ファイル名

use std::path::Path;

/// 出力ファイル名に付ける接尾辞
pub const EXPORT_SUFFIX: &str = "_extracted";
pub const EXPORT_EXTENSION: &str = "xlsx";

const IMAGE_EXTENSIONS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
];

/// 宣言されたMIMEタイプが画像か
pub fn is_image_media_type(media_type: &str) -> bool {
    media_type
        .trim()
        .to_ascii_lowercase()
        .starts_with("image/")
}

/// 拡張子からMIMEタイプを推定（ブラウザの File.type 相当）
pub fn media_type_from_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

/// 最後の拡張子を除いたファイル名
///
/// `"scan.v2.png"` → `"scan.v2"`、拡張子なしや `".png"` はそのまま
pub fn file_base_name(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((base, _)) if !base.is_empty() => base,
        _ => file_name,
    }
}

/// 画像ファイル名からExcelの保存名を作る
pub fn export_file_name(image_file_name: &str) -> String {
    format!(
        "{}{}.{}",
        file_base_name(image_file_name),
        EXPORT_SUFFIX,
        EXPORT_EXTENSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_image_media_type() {
        assert!(is_image_media_type("image/png"));
        assert!(is_image_media_type("IMAGE/JPEG"));
        assert!(!is_image_media_type("application/pdf"));
        assert!(!is_image_media_type(""));
        assert!(!is_image_media_type("text/plain"));
    }

    #[test]
    fn test_media_type_from_path() {
        assert_eq!(media_type_from_path(Path::new("a/b/table.JPG")), Some("image/jpeg"));
        assert_eq!(media_type_from_path(Path::new("table.gif")), Some("image/gif"));
        assert_eq!(media_type_from_path(Path::new("notes.txt")), None);
        assert_eq!(media_type_from_path(Path::new("README")), None);
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("table.png"), "table_extracted.xlsx");
        assert_eq!(export_file_name("scan.v2.jpeg"), "scan.v2_extracted.xlsx");
        assert_eq!(export_file_name("noext"), "noext_extracted.xlsx");
        assert_eq!(export_file_name(".png"), ".png_extracted.xlsx");
    }
}
