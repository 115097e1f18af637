//! # POST /upload
//!
//! multipart/form-dataの `image` パートを受け取り、内容から種別を判定して
//! `<upload_dir>/<uuid><ext>` に保存する。
//!
//! ## 処理フロー
//! 1. ボディ全体を2 MiBで打ち切りつつmultipartを解析する
//! 2. `image` ファイルパートをメモリに読み込む
//! 3. 先頭バイトからMIMEタイプを判定し、受理対象か確認する
//! 4. 拡張子を解決し、UUID v4 でファイル名を決める
//! 5. 新規ファイルとして書き込み、`SUCCESS` を返す

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use ingest_core::{canonical_extension, detect_content_type, new_artifact_id, AcceptedType};

use crate::config::GatewayState;
use crate::error::UploadError;
use crate::storage::StorageError;

/// ファイルを受け取るフォームフィールド名
pub const IMAGE_FIELD: &str = "image";

/// 成功時のレスポンスボディ（改行なし）
pub const SUCCESS_BODY: &str = "SUCCESS";

/// POST /upload — 画像・PDFのアップロード。
///
/// 失敗時はステータス（Legacyモードでは常に500）と短いメッセージを返す。
pub async fn handle_upload(
    State(state): State<Arc<GatewayState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    match process_upload(&state, multipart).await {
        Ok(()) => (StatusCode::OK, SUCCESS_BODY).into_response(),
        Err(e) => e.into_response_with(state.status_mode),
    }
}

async fn process_upload(
    state: &GatewayState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(), UploadError> {
    let mut multipart = multipart.map_err(UploadError::NotMultipart)?;
    let data = read_image_part(&mut multipart).await?;

    // 判定は先頭512バイトのみ
    let detected = detect_content_type(&data);
    let accepted = AcceptedType::from_mime(detected)
        .ok_or(UploadError::UnsupportedType { detected })?;

    let ext = canonical_extension(accepted.as_mime()).map_err(UploadError::FileType)?;
    let file_name = format!("{}{}", new_artifact_id(), ext);

    let path = state
        .store
        .persist(&file_name, &data)
        .await
        .map_err(|e| match e {
            StorageError::Create(io) => UploadError::CreateFile(io),
            StorageError::Write(io) => UploadError::WriteFile(io),
        })?;

    tracing::info!(
        file_type = accepted.as_mime(),
        path = %path.display(),
        bytes = data.len(),
        "アップロードを保存しました"
    );
    Ok(())
}

/// ボディを最後まで解析し、最初の `image` ファイルパートの内容を返す。
///
/// クライアント申告のファイル名は保存に使わないが、ファイルパートの判定には使う
/// （ファイル名のない `image` 値フィールドはファイルとみなさない）。
/// 上限超過と構文エラーは `FileTooBig`、`image` パート読み取り中のI/O失敗は `NotRead`。
async fn read_image_part(multipart: &mut Multipart) -> Result<Bytes, UploadError> {
    let mut image: Option<Bytes> = None;

    while let Some(field) = multipart.next_field().await.map_err(UploadError::FileTooBig)? {
        // filename="" はファイル名なしと同じく値フィールド扱い
        let is_image_file = image.is_none()
            && field.name() == Some(IMAGE_FIELD)
            && field.file_name().is_some_and(|name| !name.is_empty());

        if !is_image_file {
            // 上限判定のため残りのパートも読み捨てる
            field.bytes().await.map_err(UploadError::FileTooBig)?;
            continue;
        }

        let bytes = field.bytes().await.map_err(|e| {
            // 413/400 はmultipart層の上限・構文エラー、それ以外はボディ読み取りのI/O失敗
            if e.status().is_client_error() {
                UploadError::FileTooBig(e)
            } else {
                UploadError::NotRead(e)
            }
        })?;
        image = Some(bytes);
    }

    image.ok_or(UploadError::NotParse { field: IMAGE_FIELD })
}
