//! ヘッダーコンポーネント

use leptos::prelude::*;
use leptos::task::spawn_local;
use crate::api::ApiBackend;

/// バックエンドの稼働状態
#[derive(Clone, Copy, PartialEq)]
enum BackendState {
    Checking,
    Running,
    Unreachable,
}

impl BackendState {
    fn label(&self) -> &'static str {
        match self {
            BackendState::Checking => "確認中...",
            BackendState::Running => "接続OK",
            BackendState::Unreachable => "未接続",
        }
    }

    fn class(&self) -> &'static str {
        match self {
            BackendState::Checking => "status checking",
            BackendState::Running => "status ok",
            BackendState::Unreachable => "status ng",
        }
    }
}

#[component]
pub fn Header(backend: ApiBackend) -> impl IntoView {
    let (state, set_state) = signal(BackendState::Checking);
    let base_url = backend.base_url().to_string();

    spawn_local(async move {
        let next = match backend.health().await {
            Ok(health) if health.is_running() => BackendState::Running,
            Ok(health) => {
                gloo::console::warn!(format!("backend status: {}", health.status));
                BackendState::Unreachable
            }
            Err(e) => {
                gloo::console::warn!(format!("health check failed: {}", e));
                BackendState::Unreachable
            }
        };
        set_state.set(next);
    });

    view! {
        <header class="header">
            <h1>"Handtable - 手書き表のExcel変換"</h1>
            <p class="text-muted">
                {base_url}
                " "
                <span class=move || state.get().class()>{move || state.get().label()}</span>
            </p>
        </header>
    }
}
