//! ブラウザで選択された画像

use gloo::file::ObjectUrl;
use handtable_common::SelectedImage;
use std::rc::Rc;

/// 選択された File とプレビュー用のObject URL
///
/// Object URL は最後の参照が破棄されたとき（選択し直し・クリア時）に解放される。
#[derive(Clone)]
pub struct BrowserImage {
    pub file: web_sys::File,
    preview: Rc<ObjectUrl>,
}

impl BrowserImage {
    pub fn from_file(file: web_sys::File) -> SelectedImage<BrowserImage> {
        let file_name = file.name();
        let media_type = file.type_();
        let preview = Rc::new(ObjectUrl::from(gloo::file::File::from(file.clone())));
        SelectedImage::new(file_name, media_type, BrowserImage { file, preview })
    }

    pub fn preview_url(&self) -> String {
        self.preview.to_string()
    }
}
