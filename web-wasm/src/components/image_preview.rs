//! 選択中の画像のプレビュー

use leptos::prelude::*;
use crate::app::SessionSignal;

#[component]
pub fn ImagePreview(session: SessionSignal) -> impl IntoView {
    let preview = move || {
        session.with(|s| {
            s.image()
                .map(|img| (img.handle.preview_url(), img.file_name.clone()))
        })
    };

    move || {
        preview().map(|(url, file_name)| {
            view! {
                <div class="image-preview">
                    <img src=url alt=file_name.clone() />
                    <p class="file-name">{file_name}</p>
                </div>
            }
        })
    }
}
