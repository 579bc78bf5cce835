//! Handtable Web App (Leptos + WASM)

mod app;
mod components;
mod api;
mod export;
mod image;

use wasm_bindgen::prelude::*;
use leptos::prelude::*;
use handtable_common::types::DEFAULT_BACKEND_URL;
use app::App;

/// ビルド時に `HANDTABLE_BACKEND_URL` で接続先を変えられる
const BACKEND_URL: Option<&str> = option_env!("HANDTABLE_BACKEND_URL");

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    let backend_url = BACKEND_URL.unwrap_or(DEFAULT_BACKEND_URL).to_string();
    leptos::mount::mount_to_body(move || view! { <App backend_url=backend_url.clone() /> });
}
