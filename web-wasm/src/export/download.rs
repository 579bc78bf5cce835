//! ブラウザのダウンロードとして保存

use gloo::file::{Blob, ObjectUrl};
use gloo::timers::callback::Timeout;
use handtable_common::FileSink;
use wasm_bindgen::prelude::*;
use web_sys::HtmlAnchorElement;

/// 一時的な `<a download>` をクリックしてファイルを保存する
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserDownload;

impl FileSink for BrowserDownload {
    type Error = String;

    fn save(&self, file_name: &str, media_type: &str, bytes: &[u8]) -> Result<(), String> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| "document is not available".to_string())?;
        let body = document
            .body()
            .ok_or_else(|| "document has no body".to_string())?;

        let blob = Blob::new_with_options(bytes, Some(media_type));
        let url = ObjectUrl::from(blob);

        let anchor: HtmlAnchorElement = document
            .create_element("a")
            .map_err(describe)?
            .dyn_into()
            .map_err(|_| "failed to create download link".to_string())?;
        anchor.set_href(&url);
        anchor.set_download(file_name);

        body.append_child(&anchor).map_err(describe)?;
        anchor.click();
        anchor.remove();

        // URLの解放はクリック処理が終わった次のタスクで
        let release = Timeout::new(0, move || drop(url));
        release.forget();
        Ok(())
    }
}

fn describe(value: JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}
