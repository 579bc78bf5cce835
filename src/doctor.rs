//! 接続診断
//!
//! 設定 → バックエンド稼働 → 履歴取得（バックエンドのDB接続）の順に確認する。

use crate::client::HttpBackend;
use crate::config::{Config, BACKEND_URL_ENV};
use handtable_common::{classify_extraction_failure, TransportError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub name: &'static str,
    pub ok: bool,
    pub detail: String,
}

impl Check {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self { name, ok: true, detail: detail.into() }
    }

    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self { name, ok: false, detail: detail.into() }
    }
}

fn failure_detail(err: &TransportError) -> String {
    format!("{} ({})", classify_extraction_failure(err), err)
}

pub async fn run_checks(config: &Config, backend: &HttpBackend) -> Vec<Check> {
    let mut checks = Vec::new();

    let source = if std::env::var(BACKEND_URL_ENV).is_ok() {
        format!("{} (環境変数 {})", config.backend_url, BACKEND_URL_ENV)
    } else {
        config.backend_url.clone()
    };
    checks.push(match config.validate() {
        Ok(()) => Check::pass("設定", source),
        Err(e) => Check::fail("設定", e.to_string()),
    });

    match backend.health().await {
        Ok(health) if health.is_running() => {
            checks.push(Check::pass("バックエンド", health.message));
        }
        Ok(health) => {
            checks.push(Check::fail("バックエンド", format!("status: {}", health.status)));
        }
        Err(e) => {
            checks.push(Check::fail("バックエンド", failure_detail(&e)));
            return checks;
        }
    }

    checks.push(match backend.list_extractions().await {
        Ok(records) => Check::pass("抽出履歴", format!("{}件", records.len())),
        Err(e) => Check::fail("抽出履歴", failure_detail(&e)),
    });

    checks
}
