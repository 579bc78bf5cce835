//! メインアプリケーションコンポーネント

use leptos::prelude::*;
use leptos::task::spawn_local;
use handtable_common::{
    run_export, run_extraction, Selection, Session, SessionStore,
};
use crate::api::ApiBackend;
use crate::components::{
    action_bar::ActionBar,
    error_panel::ErrorPanel,
    header::Header,
    image_preview::ImagePreview,
    recent_extractions::RecentExtractions,
    result_table::ResultTable,
    upload_area::UploadArea,
};
use crate::export::BrowserDownload;
use crate::image::BrowserImage;

/// 画面全体のセッション
///
/// `File` はスレッド間で共有できないためローカルシグナルに載せる。
#[derive(Clone, Copy)]
pub struct SessionSignal(RwSignal<Session<BrowserImage>, LocalStorage>);

impl Default for SessionSignal {
    fn default() -> Self {
        Self(RwSignal::new_local(Session::new()))
    }
}

impl SessionSignal {
    /// 購読しながら読む
    pub fn with<R>(&self, f: impl FnOnce(&Session<BrowserImage>) -> R) -> R {
        self.0.with(f)
    }
}

impl SessionStore<BrowserImage> for SessionSignal {
    fn update<R>(&self, f: impl FnOnce(&mut Session<BrowserImage>) -> R) -> R {
        let mut session = self.0.write();
        f(&mut session)
    }
}

/// メインアプリケーションコンポーネント
#[component]
pub fn App(backend_url: String) -> impl IntoView {
    let session = SessionSignal::default();
    let backend = ApiBackend::new(&backend_url);
    // 抽出が成功するたびに履歴を読み直す
    let (history_version, set_history_version) = signal(0u32);

    let on_file_selected = move |file: web_sys::File| {
        let outcome = session.update(|s| s.select_file(BrowserImage::from_file(file)));
        if outcome != Selection::Accepted {
            gloo::console::warn!(format!("file not accepted: {:?}", outcome));
        }
    };

    let on_extract = {
        let backend = backend.clone();
        move |_: ()| {
            let backend = backend.clone();
            spawn_local(async move {
                if run_extraction(&session, &backend).await
                    && session.with(|s| s.extraction().is_some())
                {
                    set_history_version.update(|v| *v += 1);
                }
            });
        }
    };

    let on_export = {
        let backend = backend.clone();
        move |_: ()| {
            let backend = backend.clone();
            spawn_local(async move {
                run_export(&session, &backend, &BrowserDownload).await;
            });
        }
    };

    let on_clear = move |_: ()| session.update(|s| s.clear());

    view! {
        <div class="container">
            <Header backend=backend.clone() />

            <UploadArea
                session=session
                on_file_selected=on_file_selected
            />

            <ImagePreview session=session />

            <ActionBar
                session=session
                on_extract=on_extract
                on_export=on_export
                on_clear=on_clear
            />

            <ErrorPanel session=session />

            <ResultTable session=session />

            <RecentExtractions backend=backend version=history_version />
        </div>
    }
}
