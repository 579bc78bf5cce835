//! 抽出・出力ボタン

use leptos::prelude::*;
use crate::app::SessionSignal;

#[component]
pub fn ActionBar<FX, FE, FC>(
    session: SessionSignal,
    on_extract: FX,
    on_export: FE,
    on_clear: FC,
) -> impl IntoView
where
    FX: Fn(()) + 'static + Clone,
    FE: Fn(()) + 'static + Clone,
    FC: Fn(()) + 'static + Clone,
{
    let is_processing = move || session.with(|s| s.is_processing());
    let is_exporting = move || session.with(|s| s.is_exporting());
    let can_extract = move || session.with(|s| s.can_extract());
    let can_export = move || session.with(|s| s.can_export());
    let can_clear = move || session.with(|s| s.image().is_some() && !s.is_busy());

    view! {
        <div class="action-bar">
            <button
                class="btn btn-primary"
                disabled=move || !can_extract()
                on:click={
                    let on_extract = on_extract.clone();
                    move |_| on_extract(())
                }
            >
                {move || if is_processing() { "抽出中..." } else { "表を抽出" }}
            </button>

            <button
                class="btn btn-secondary"
                disabled=move || !can_export()
                on:click={
                    let on_export = on_export.clone();
                    move |_| on_export(())
                }
            >
                {move || if is_exporting() { "ダウンロード中..." } else { "Excelをダウンロード" }}
            </button>

            <button
                class="btn btn-link"
                disabled=move || !can_clear()
                on:click={
                    let on_clear = on_clear.clone();
                    move |_| on_clear(())
                }
            >
                "クリア"
            </button>
        </div>
    }
}
