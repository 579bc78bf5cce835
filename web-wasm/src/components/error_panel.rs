//! エラー表示

use leptos::prelude::*;
use crate::app::SessionSignal;

#[component]
pub fn ErrorPanel(session: SessionSignal) -> impl IntoView {
    let error = move || session.with(|s| s.error().cloned());

    move || {
        error().map(|err| {
            let hints = err.troubleshooting_hints();
            view! {
                <div class="error-panel" data-kind=err.kind.as_str()>
                    <p class="error-message">{err.message.clone()}</p>
                    <Show when=move || !hints.is_empty()>
                        <ul class="error-hints">
                            {hints
                                .iter()
                                .map(|hint| view! { <li>{*hint}</li> })
                                .collect_view()}
                        </ul>
                    </Show>
                </div>
            }
        })
    }
}
