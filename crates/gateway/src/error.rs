//! # Gateway エラー型
//!
//! `POST /upload` の失敗を表す。メッセージ文字列は既存クライアントが
//! 前方一致で判定しているため変更しないこと（`extention` の綴りを含む）。

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::config::StatusMode;

/// 失敗の分類。`StatusMode::Typed` の場合のみステータスコードに反映される。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// ボディ上限超過、またはmultipartとして解釈できない
    Oversize,
    /// 期待するフィールドがない、または読み取れない
    Malformed,
    /// 受理対象外のコンテンツ種別
    Unsupported,
    /// 拡張子解決・ファイル書き込み等の内部エラー
    Internal,
}

/// アップロードエラー型。
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// リクエストがmultipart/form-dataではない
    #[error("File Too Big: {0}")]
    NotMultipart(#[source] MultipartRejection),
    /// multipartの解析失敗（上限超過を含む）
    #[error("File Too Big: {0}")]
    FileTooBig(#[source] MultipartError),
    /// `image` ファイルパートがない
    #[error("Not Parse : no file part named {field:?}")]
    NotParse { field: &'static str },
    /// `image` パートの読み取り中のI/O失敗
    #[error("Not Read : {0}")]
    NotRead(#[source] MultipartError),
    /// 判定したMIMEタイプが受理対象外
    #[error("Not Support this extention")]
    UnsupportedType { detected: &'static str },
    /// MIMEタイプから拡張子を解決できない
    #[error("Can not read file type : {0}")]
    FileType(#[source] ingest_core::CoreError),
    /// 保存先ファイルの作成失敗
    #[error("Can not create file : {0}")]
    CreateFile(#[source] std::io::Error),
    /// 保存先ファイルへの書き込み・同期失敗
    #[error("Can not write file : {0}")]
    WriteFile(#[source] std::io::Error),
}

impl UploadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UploadError::NotMultipart(_) | UploadError::FileTooBig(_) => ErrorKind::Oversize,
            UploadError::NotParse { .. } | UploadError::NotRead(_) => ErrorKind::Malformed,
            UploadError::UnsupportedType { .. } => ErrorKind::Unsupported,
            UploadError::FileType(_) | UploadError::CreateFile(_) | UploadError::WriteFile(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// ステータスコードを決定する。
    ///
    /// Legacyモードでは常に500。Typedモードのmultipart失敗は、
    /// 上限超過なら413、構文エラーなら400とmultipart層の判定に従う。
    pub fn status(&self, mode: StatusMode) -> StatusCode {
        if mode == StatusMode::Legacy {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        match self {
            UploadError::NotMultipart(e) => e.status(),
            UploadError::FileTooBig(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            UploadError::FileTooBig(_) => StatusCode::BAD_REQUEST,
            _ => match self.kind() {
                ErrorKind::Oversize => StatusCode::PAYLOAD_TOO_LARGE,
                ErrorKind::Malformed => StatusCode::BAD_REQUEST,
                ErrorKind::Unsupported => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// ログ出力用の下位エラー表現。
    pub fn underlying(&self) -> String {
        match self {
            UploadError::UnsupportedType { detected } => format!("{detected:?}"),
            other => match std::error::Error::source(other) {
                Some(source) => format!("{source:?}"),
                None => format!("{other:?}"),
            },
        }
    }

    /// エラーをログに記録し、HTTPレスポンスに変換する。
    pub fn into_response_with(self, mode: StatusMode) -> Response {
        let status = self.status(mode);
        let message = self.to_string();
        tracing::error!(
            kind = ?self.kind(),
            "Handler error : status code : {}, message :{}, underlying err : {}",
            status.as_u16(),
            message,
            self.underlying()
        );
        (status, message).into_response()
    }
}
