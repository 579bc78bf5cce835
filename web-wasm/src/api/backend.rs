//! バックエンドAPI（fetch）
//!
//! 画像は multipart/form-data の `file` フィールドで送る。
//! タイムアウトは AbortController を gloo のタイマーで中断して実現する。

use gloo::timers::callback::Timeout;
use handtable_common::types::{
    EXPORT_TIMEOUT, EXTRACTIONS_PATH, EXTRACT_TIMEOUT, HEALTH_PATH, UPLOAD_FIELD_NAME,
    UPLOAD_IMAGE_PATH,
};
use handtable_common::{
    endpoint_url, extract_error_detail, generate_excel_path, parse_upload_response,
    ExtractionRecord, HealthStatus, ProcessingId, SelectedImage, TableBackend, TransportError,
    UploadResponse,
};
use serde::de::DeserializeOwned;
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, FormData, Request, RequestInit, RequestMode, Response};

use crate::image::BrowserImage;

#[derive(Debug, Clone)]
pub struct ApiBackend {
    base_url: String,
}

impl ApiBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/`
    pub async fn health(&self) -> Result<HealthStatus, TransportError> {
        self.get_json(HEALTH_PATH).await
    }

    /// `GET /api/extractions`
    pub async fn list_extractions(&self) -> Result<Vec<ExtractionRecord>, TransportError> {
        self.get_json(EXTRACTIONS_PATH).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let deadline = Deadline::start(EXPORT_TIMEOUT)?;
        let resp = self.send("GET", path, None, &deadline).await?;
        check_status(&resp, &deadline).await?;

        let promise = resp.json().map_err(|e| deadline.body_failure(e))?;
        let json = JsFuture::from(promise)
            .await
            .map_err(|e| deadline.body_failure(e))?;
        serde_wasm_bindgen::from_value(json).map_err(|e| TransportError::Malformed(e.to_string()))
    }

    async fn send(
        &self,
        method: &str,
        path: &str,
        body: Option<&FormData>,
        deadline: &Deadline,
    ) -> Result<Response, TransportError> {
        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::Cors);
        opts.set_signal(Some(&deadline.controller.signal()));
        if let Some(body) = body {
            opts.set_body(body);
        }

        let url = endpoint_url(&self.base_url, path);
        let request = Request::new_with_str_and_init(&url, &opts)
            .map_err(|e| TransportError::Other(js_message(&e)))?;

        let window = web_sys::window()
            .ok_or_else(|| TransportError::Other("window is not available".into()))?;
        let resp_value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| deadline.fetch_failure(e))?;
        resp_value
            .dyn_into::<Response>()
            .map_err(|e| TransportError::Other(js_message(&e)))
    }
}

impl TableBackend<BrowserImage> for ApiBackend {
    async fn upload_image(
        &self,
        image: &SelectedImage<BrowserImage>,
    ) -> Result<UploadResponse, TransportError> {
        let form = FormData::new().map_err(|e| TransportError::Other(js_message(&e)))?;
        form.append_with_blob_and_filename(UPLOAD_FIELD_NAME, &image.handle.file, &image.file_name)
            .map_err(|e| TransportError::Other(js_message(&e)))?;

        let deadline = Deadline::start(EXTRACT_TIMEOUT)?;
        let resp = self
            .send("POST", UPLOAD_IMAGE_PATH, Some(&form), &deadline)
            .await?;
        check_status(&resp, &deadline).await?;

        let body = read_text(&resp, &deadline).await?;
        parse_upload_response(&body).map_err(|e| TransportError::Malformed(e.to_string()))
    }

    async fn generate_excel(&self, processing_id: &ProcessingId) -> Result<Vec<u8>, TransportError> {
        let deadline = Deadline::start(EXPORT_TIMEOUT)?;
        let resp = self
            .send("POST", &generate_excel_path(processing_id), None, &deadline)
            .await?;
        check_status(&resp, &deadline).await?;

        let promise = resp.array_buffer().map_err(|e| deadline.body_failure(e))?;
        let buffer = JsFuture::from(promise)
            .await
            .map_err(|e| deadline.body_failure(e))?;
        Ok(js_sys::Uint8Array::new(&buffer).to_vec())
    }
}

/// リクエスト1回分の期限
///
/// 期限が来たら AbortController で fetch（本文の読み込み含む）を中断する。
/// Drop でタイマーも解除される。
struct Deadline {
    controller: AbortController,
    secs: u64,
    _timer: Timeout,
}

impl Deadline {
    fn start(timeout: Duration) -> Result<Self, TransportError> {
        let controller =
            AbortController::new().map_err(|e| TransportError::Other(js_message(&e)))?;
        let timer = {
            let controller = controller.clone();
            Timeout::new(timeout.as_millis() as u32, move || controller.abort())
        };
        Ok(Self {
            controller,
            secs: timeout.as_secs(),
            _timer: timer,
        })
    }

    fn timed_out(&self) -> bool {
        self.controller.signal().aborted()
    }

    /// fetch自体の失敗（応答なし）
    fn fetch_failure(&self, err: JsValue) -> TransportError {
        if self.timed_out() {
            TransportError::Timeout { secs: self.secs }
        } else {
            TransportError::Unreachable(js_message(&err))
        }
    }

    /// 本文の読み込み失敗
    fn body_failure(&self, err: JsValue) -> TransportError {
        if self.timed_out() {
            TransportError::Timeout { secs: self.secs }
        } else {
            TransportError::Malformed(js_message(&err))
        }
    }
}

async fn read_text(resp: &Response, deadline: &Deadline) -> Result<String, TransportError> {
    let promise = resp.text().map_err(|e| deadline.body_failure(e))?;
    let text = JsFuture::from(promise)
        .await
        .map_err(|e| deadline.body_failure(e))?;
    Ok(text.as_string().unwrap_or_default())
}

/// 2xx以外を Status エラーにする（FastAPIの `detail` があれば保持）
async fn check_status(resp: &Response, deadline: &Deadline) -> Result<(), TransportError> {
    if resp.ok() {
        return Ok(());
    }
    let body = read_text(resp, deadline).await.unwrap_or_default();
    Err(TransportError::Status {
        code: resp.status(),
        detail: extract_error_detail(&body),
    })
}

fn js_message(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
