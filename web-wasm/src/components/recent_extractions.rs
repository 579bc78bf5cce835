//! 最近の抽出履歴（`/api/extractions`）

use leptos::prelude::*;
use leptos::task::spawn_local;
use handtable_common::ExtractionRecord;
use crate::api::ApiBackend;

const MAX_RECORDS: usize = 10;

#[component]
pub fn RecentExtractions(backend: ApiBackend, version: ReadSignal<u32>) -> impl IntoView {
    let (records, set_records) = signal(Vec::<ExtractionRecord>::new());
    let (load_error, set_load_error) = signal(None::<String>);

    Effect::new(move |_| {
        version.track();
        let backend = backend.clone();
        spawn_local(async move {
            match backend.list_extractions().await {
                Ok(list) => {
                    set_records.set(list.into_iter().take(MAX_RECORDS).collect());
                    set_load_error.set(None);
                }
                Err(e) => {
                    gloo::console::warn!(format!("failed to load extraction history: {}", e));
                    set_load_error.set(Some(e.to_string()));
                }
            }
        });
    });

    view! {
        <section class="recent-extractions">
            <h2>"最近の抽出"</h2>
            {move || load_error.get().map(|e| view! {
                <p class="text-muted">"履歴を取得できません: " {e}</p>
            })}
            <Show
                when=move || !records.get().is_empty()
                fallback=|| view! { <p class="text-muted">"履歴はありません"</p> }
            >
                <ul>
                    {move || {
                        records
                            .get()
                            .into_iter()
                            .map(|record| {
                                let summary = format!(
                                    "{}行 x {}列",
                                    record.extracted_data.rows().len(),
                                    record.extracted_data.width()
                                );
                                view! {
                                    <li>
                                        <span class="date">{created_label(&record.created_at)}</span>
                                        " "
                                        <span class="file-name">{record.filename.clone()}</span>
                                        " "
                                        <span class="text-muted">{summary}</span>
                                    </li>
                                }
                            })
                            .collect_view()
                    }}
                </ul>
            </Show>
        </section>
    }
}

/// `2024-01-15T10:30:00.123456` → `2024-01-15 10:30`
fn created_label(created_at: &str) -> String {
    let label = created_at.get(..16).unwrap_or(created_at);
    label.replacen('T', " ", 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_created_label_trims_seconds() {
        assert_eq!(created_label("2024-01-15T10:30:00.123456"), "2024-01-15 10:30");
    }

    #[wasm_bindgen_test]
    fn test_created_label_short_value() {
        assert_eq!(created_label("2024-01-15"), "2024-01-15");
        assert_eq!(created_label(""), "");
    }
}
