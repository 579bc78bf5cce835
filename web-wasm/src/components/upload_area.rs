//! アップロードエリアコンポーネント
//!
//! クリックでファイル選択、またはドラッグ&ドロップ。
//! 抽出・出力中は受け付けない。

use leptos::prelude::*;
use web_sys::{DragEvent, Event, File, HtmlInputElement};
use crate::app::SessionSignal;

/// ドラッグイベントの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragPhase {
    Enter,
    Over,
    Leave,
    Drop,
}

/// イベント後にドロップ可能表示にするか
fn drag_active(phase: DragPhase, enabled: bool) -> bool {
    enabled && matches!(phase, DragPhase::Enter | DragPhase::Over)
}

#[component]
pub fn UploadArea<F>(
    session: SessionSignal,
    on_file_selected: F,
) -> impl IntoView
where
    F: Fn(File) + 'static + Clone,
{
    let (is_dragover, set_is_dragover) = signal(false);
    let input_ref: NodeRef<leptos::html::Input> = NodeRef::new();
    let is_enabled = move || !session.with(|s| s.is_busy());

    let on_drop = {
        let on_file_selected = on_file_selected.clone();
        move |ev: DragEvent| {
            // ブラウザがファイルを開いてしまうのを常に止める
            ev.prevent_default();
            set_is_dragover.set(drag_active(DragPhase::Drop, is_enabled()));

            if !is_enabled() {
                return;
            }

            let file = ev
                .data_transfer()
                .and_then(|dt| dt.files())
                .and_then(|files| files.get(0));
            if let Some(file) = file {
                on_file_selected(file);
            }
        }
    };

    let on_dragenter = move |ev: DragEvent| {
        ev.prevent_default();
        set_is_dragover.set(drag_active(DragPhase::Enter, is_enabled()));
    };

    let on_dragover = move |ev: DragEvent| {
        ev.prevent_default();
        set_is_dragover.set(drag_active(DragPhase::Over, is_enabled()));
    };

    let on_dragleave = move |ev: DragEvent| {
        ev.prevent_default();
        set_is_dragover.set(drag_active(DragPhase::Leave, is_enabled()));
    };

    let on_click = move |_| {
        if !is_enabled() {
            return;
        }
        if let Some(input) = input_ref.get() {
            input.click();
        }
    };

    let on_change = move |ev: Event| {
        let input: HtmlInputElement = event_target(&ev);
        let file = input.files().and_then(|files| files.get(0));
        // 同じファイルを選び直しても change が発火するように
        input.set_value("");
        if let Some(file) = file {
            on_file_selected(file);
        }
    };

    view! {
        <input
            type="file"
            accept="image/*"
            style="display: none"
            node_ref=input_ref
            on:change=on_change
        />
        <div
            class=move || {
                let mut classes = vec!["upload-area"];
                if is_dragover.get() {
                    classes.push("dragover");
                }
                if !is_enabled() {
                    classes.push("disabled");
                }
                classes.join(" ")
            }
            on:drop=on_drop
            on:dragenter=on_dragenter
            on:dragover=on_dragover
            on:dragleave=on_dragleave
            on:click=on_click
        >
            <Show
                when=is_enabled
                fallback=|| view! {
                    <div class="upload-icon">"⏳"</div>
                    <p>"処理中です..."</p>
                }
            >
                <div class="upload-icon">"📷"</div>
                <p>"表の画像をドラッグ&ドロップ または クリックして選択"</p>
                <p class="text-muted">"対応形式: JPG, PNG, GIF"</p>
            </Show>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_enter_and_over_activate_when_enabled() {
        assert!(drag_active(DragPhase::Enter, true));
        assert!(drag_active(DragPhase::Over, true));
    }

    #[wasm_bindgen_test]
    fn test_leave_and_drop_deactivate() {
        assert!(!drag_active(DragPhase::Leave, true));
        assert!(!drag_active(DragPhase::Drop, true));
    }

    #[wasm_bindgen_test]
    fn test_busy_never_activates() {
        for phase in [DragPhase::Enter, DragPhase::Over, DragPhase::Leave, DragPhase::Drop] {
            assert!(!drag_active(phase, false), "{:?}", phase);
        }
    }
}
