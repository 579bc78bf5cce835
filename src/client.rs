//! バックエンドHTTPクライアント（reqwest）

use crate::config::Config;
use crate::error::Result;
use crate::image::DiskImage;
use handtable_common::types::{
    EXTRACTIONS_PATH, HEALTH_PATH, UPLOAD_FIELD_NAME, UPLOAD_IMAGE_PATH,
};
use handtable_common::{
    endpoint_url, extract_error_detail, generate_excel_path, parse_upload_response,
    ExtractionRecord, HealthStatus, ProcessingId, SelectedImage, TableBackend, TransportError,
    UploadResponse,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    extract_timeout: Duration,
    export_timeout: Duration,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_timeouts(
            &config.backend_url,
            config.extract_timeout(),
            config.export_timeout(),
        )
    }

    pub fn with_timeouts(
        base_url: &str,
        extract_timeout: Duration,
        export_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("handtable/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            extract_timeout,
            export_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        endpoint_url(&self.base_url, path)
    }

    /// `GET /api/` でバックエンドの稼働を確認
    pub async fn health(&self) -> std::result::Result<HealthStatus, TransportError> {
        let timeout = self.export_timeout;
        let resp = self
            .client
            .get(self.url(HEALTH_PATH))
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;
        let resp = check_status(resp).await?;
        resp.json()
            .await
            .map_err(|e| transport_error(e, timeout))
    }

    /// `GET /api/extractions` で最近の抽出履歴を取得（新しい順）
    pub async fn list_extractions(
        &self,
    ) -> std::result::Result<Vec<ExtractionRecord>, TransportError> {
        let timeout = self.export_timeout;
        let resp = self
            .client
            .get(self.url(EXTRACTIONS_PATH))
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;
        let resp = check_status(resp).await?;
        resp.json()
            .await
            .map_err(|e| transport_error(e, timeout))
    }
}

impl TableBackend<DiskImage> for HttpBackend {
    async fn upload_image(
        &self,
        image: &SelectedImage<DiskImage>,
    ) -> std::result::Result<UploadResponse, TransportError> {
        let timeout = self.extract_timeout;
        let part = Part::bytes(image.handle.bytes.to_vec())
            .file_name(image.file_name.clone())
            .mime_str(&image.media_type)
            .map_err(|e| TransportError::Other(e.to_string()))?;
        let form = Form::new().part(UPLOAD_FIELD_NAME, part);

        debug!(
            file = %image.file_name,
            bytes = image.handle.bytes.len(),
            url = %self.url(UPLOAD_IMAGE_PATH),
            "uploading image"
        );

        let resp = self
            .client
            .post(self.url(UPLOAD_IMAGE_PATH))
            .multipart(form)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;
        let resp = check_status(resp).await?;
        let body = resp.text().await.map_err(|e| transport_error(e, timeout))?;

        parse_upload_response(&body).map_err(|e| TransportError::Malformed(e.to_string()))
    }

    async fn generate_excel(
        &self,
        processing_id: &ProcessingId,
    ) -> std::result::Result<Vec<u8>, TransportError> {
        let timeout = self.export_timeout;
        let url = self.url(&generate_excel_path(processing_id));
        debug!(%url, "requesting spreadsheet");

        let resp = self
            .client
            .post(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;
        let resp = check_status(resp).await?;
        let bytes = resp.bytes().await.map_err(|e| transport_error(e, timeout))?;
        Ok(bytes.to_vec())
    }
}

/// エラーステータスなら本文の `detail` を添えて失敗にする
async fn check_status(resp: Response) -> std::result::Result<Response, TransportError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(TransportError::Status {
        code: status.as_u16(),
        detail: extract_error_detail(&body),
    })
}

/// reqwestのエラーを分類
fn transport_error(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            secs: timeout.as_secs(),
        }
    } else if err.is_connect() {
        TransportError::Unreachable(err.to_string())
    } else if err.is_decode() {
        TransportError::Malformed(err.to_string())
    } else if let Some(status) = err.status() {
        TransportError::Status {
            code: status.as_u16(),
            detail: None,
        }
    } else {
        TransportError::Other(err.to_string())
    }
}
