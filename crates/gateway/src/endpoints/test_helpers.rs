//! # エンドポイントテスト用共通ヘルパー
//!
//! multipartリクエストの組み立てと、ルーター経由の送信。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use crate::access_log::AccessLogSink;
use crate::config::{GatewayState, StatusMode, MAX_UPLOAD_SIZE};
use crate::storage::{ArtifactStore, LocalDirStore, StorageError};

pub const BOUNDARY: &str = "----ingest-test-boundary-7MA4YWxkTrZu0gW";

/// 常に指定のエラーを返すモックストア。
pub struct FailingStore(pub fn() -> StorageError);

#[async_trait::async_trait]
impl ArtifactStore for FailingStore {
    async fn persist(&self, _file_name: &str, _bytes: &[u8]) -> Result<PathBuf, StorageError> {
        Err((self.0)())
    }
}

/// ローカルディレクトリに保存するLegacyモードの状態
pub fn test_state(dir: &Path) -> Arc<GatewayState> {
    test_state_with_store(Box::new(LocalDirStore::new(dir)), StatusMode::Legacy)
}

pub fn test_state_with_store(store: Box<dyn ArtifactStore>, mode: StatusMode) -> Arc<GatewayState> {
    Arc::new(GatewayState {
        store,
        status_mode: mode,
        max_upload_size: MAX_UPLOAD_SIZE,
        access_log: AccessLogSink::stderr(),
    })
}

/// PNGシグネチャで始まる `len` バイトのデータ。`seed` で内容を変える。
pub fn png_bytes_seeded(len: usize, seed: u8) -> Vec<u8> {
    let mut data = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR".to_vec();
    let mut x = seed;
    while data.len() < len {
        x = x.wrapping_mul(31).wrapping_add(7);
        data.push(x);
    }
    data.truncate(len.max(8));
    data
}

pub fn png_bytes(len: usize) -> Vec<u8> {
    png_bytes_seeded(len, 1)
}

/// 1ファイルパートのみのmultipartボディ
pub fn multipart_body(field: &str, file_name: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + 256);
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

pub fn multipart_request(field: &str, file_name: &str, data: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(Body::from(multipart_body(field, file_name, data)))
        .unwrap()
}

/// ルーターにリクエストを1件送り、ステータスとボディを返す。
pub async fn send(state: Arc<GatewayState>, req: Request<Body>) -> (StatusCode, String) {
    let response = crate::router(state).oneshot(req).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8_lossy(&body).into_owned())
}

pub fn list_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    files.sort();
    files
}

pub fn count_files(dir: &Path) -> usize {
    list_files(dir).len()
}
