//! 抽出・出力の実行
//!
//! バックエンド呼び出し（TableBackend）とセッションの保持方法（SessionStore）を
//! 抽象化し、CLIとWeb(WASM)で同じ手順を使う。
//! 処理中フラグはガードで管理し、途中で抜けても（Futureが破棄されても）必ず解除する。

use crate::classify::TransportError;
use crate::session::{AttemptId, Session, SelectedImage};
use crate::types::{ProcessingId, UploadResponse, XLSX_MEDIA_TYPE};
use std::cell::RefCell;
use std::fmt::Display;
use std::marker::PhantomData;
use tracing::{debug, warn};

/// 抽出・出力バックエンド
#[allow(async_fn_in_trait)]
pub trait TableBackend<H> {
    /// `POST /api/upload-image`
    async fn upload_image(
        &self,
        image: &SelectedImage<H>,
    ) -> Result<UploadResponse, TransportError>;

    /// `POST /api/generate-excel/{processing_id}`
    async fn generate_excel(
        &self,
        processing_id: &ProcessingId,
    ) -> Result<Vec<u8>, TransportError>;
}

/// セッションの置き場所（RefCell、Leptosのシグナルなど）
pub trait SessionStore<H> {
    fn update<R>(&self, f: impl FnOnce(&mut Session<H>) -> R) -> R;
}

impl<H> SessionStore<H> for RefCell<Session<H>> {
    fn update<R>(&self, f: impl FnOnce(&mut Session<H>) -> R) -> R {
        f(&mut self.borrow_mut())
    }
}

/// 出力ファイルの保存先（ブラウザのダウンロード、ディスクなど）
pub trait FileSink {
    type Error: Display;

    fn save(&self, file_name: &str, media_type: &str, bytes: &[u8]) -> Result<(), Self::Error>;
}

struct AttemptGuard<'a, H, S: SessionStore<H>> {
    store: &'a S,
    attempt: AttemptId,
    settled: bool,
    _image: PhantomData<H>,
}

impl<'a, H, S: SessionStore<H>> AttemptGuard<'a, H, S> {
    fn new(store: &'a S, attempt: AttemptId) -> Self {
        Self {
            store,
            attempt,
            settled: false,
            _image: PhantomData,
        }
    }

    fn settle(mut self, reply: Result<UploadResponse, TransportError>) {
        self.settled = true;
        let attempt = self.attempt;
        self.store
            .update(|s| s.complete_extraction(attempt, reply));
    }
}

impl<H, S: SessionStore<H>> Drop for AttemptGuard<'_, H, S> {
    fn drop(&mut self) {
        if !self.settled {
            let attempt = self.attempt;
            self.store.update(|s| s.abandon_extraction(attempt));
        }
    }
}

struct ExportGuard<'a, H, S: SessionStore<H>> {
    store: &'a S,
    processing_id: ProcessingId,
    settled: bool,
    _image: PhantomData<H>,
}

impl<'a, H, S: SessionStore<H>> ExportGuard<'a, H, S> {
    fn new(store: &'a S, processing_id: ProcessingId) -> Self {
        Self {
            store,
            processing_id,
            settled: false,
            _image: PhantomData,
        }
    }

    fn settle(mut self, saved: bool) {
        self.settled = true;
        let id = &self.processing_id;
        self.store.update(|s| s.complete_export(id, saved));
    }
}

impl<H, S: SessionStore<H>> Drop for ExportGuard<'_, H, S> {
    fn drop(&mut self) {
        if !self.settled {
            let id = &self.processing_id;
            self.store.update(|s| s.complete_export(id, false));
        }
    }
}

/// 選択中の画像を抽出する
///
/// 画像未選択・処理中なら何もせず false を返す。
pub async fn run_extraction<H, S, B>(store: &S, backend: &B) -> bool
where
    H: Clone,
    S: SessionStore<H>,
    B: TableBackend<H>,
{
    let Some(request) = store.update(|s| s.begin_extraction()) else {
        debug!("extraction skipped: no image or busy");
        return false;
    };

    let guard = AttemptGuard::new(store, request.attempt);
    let reply = backend.upload_image(&request.image).await;
    guard.settle(reply);
    true
}

/// 抽出済みの表をExcelとして保存する
///
/// 処理IDが無ければ何もせず（通信もせず）false を返す。
pub async fn run_export<H, S, B, F>(store: &S, backend: &B, sink: &F) -> bool
where
    S: SessionStore<H>,
    B: TableBackend<H>,
    F: FileSink,
{
    let Some(request) = store.update(|s| s.begin_export()) else {
        debug!("export skipped: no processing id");
        return false;
    };

    let guard = ExportGuard::new(store, request.processing_id.clone());
    let saved = match backend.generate_excel(&request.processing_id).await {
        Ok(bytes) => match sink.save(&request.file_name, XLSX_MEDIA_TYPE, &bytes) {
            Ok(()) => true,
            Err(e) => {
                warn!(file = %request.file_name, error = %e, "failed to save spreadsheet");
                false
            }
        },
        Err(e) => {
            warn!(processing_id = %request.processing_id, error = %e, "export request failed");
            false
        }
    };
    guard.settle(saved);
    true
}
