//! # Ingest Gateway Core
//!
//! アップロードされたバイト列の種別判定と、保存ファイル名の決定を実装する。
//! I/Oは一切行わない。
//!
//! ## 処理フロー
//! 1. 先頭512バイトのマジックバイトからMIMEタイプを判定する（`sniff`）
//! 2. 判定結果が受理対象（JPEG / GIF / PNG / PDF）かを確認する
//! 3. MIMEタイプから拡張子候補を解決し、先頭を正規の拡張子とする（`extension`）
//! 4. UUID v4を生成し、`<id><ext>` をファイル名とする

mod extension;
mod sniff;

pub use extension::{canonical_extension, extensions_by_type};
pub use sniff::{detect_content_type, OCTET_STREAM, SNIFF_LEN};

/// Coreモジュールのエラー型
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// MIMEタイプに対応する拡張子が見つからない
    #[error("mime: no extension registered for type {0:?}")]
    UnknownMimeType(String),
    /// 拡張子リストが空
    #[error("mime: empty extension list for type {0:?}")]
    EmptyExtensionList(String),
}

/// 受理するコンテンツ種別。
///
/// この集合に含まれないMIMEタイプのアップロードは拒否される。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptedType {
    /// `image/jpeg`
    Jpeg,
    /// `image/jpg`（非標準だが受理する）
    Jpg,
    /// `image/gif`
    Gif,
    /// `image/png`
    Png,
    /// `application/pdf`
    Pdf,
}

impl AcceptedType {
    /// 受理対象の全種別
    pub const ALL: [AcceptedType; 5] = [
        AcceptedType::Jpeg,
        AcceptedType::Jpg,
        AcceptedType::Gif,
        AcceptedType::Png,
        AcceptedType::Pdf,
    ];

    /// MIMEタイプ文字列から受理種別を取得する。
    /// 完全一致のみ。パラメータ付き（`; charset=...`）は受理しない。
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" => Some(AcceptedType::Jpeg),
            "image/jpg" => Some(AcceptedType::Jpg),
            "image/gif" => Some(AcceptedType::Gif),
            "image/png" => Some(AcceptedType::Png),
            "application/pdf" => Some(AcceptedType::Pdf),
            _ => None,
        }
    }

    pub fn as_mime(&self) -> &'static str {
        match self {
            AcceptedType::Jpeg => "image/jpeg",
            AcceptedType::Jpg => "image/jpg",
            AcceptedType::Gif => "image/gif",
            AcceptedType::Png => "image/png",
            AcceptedType::Pdf => "application/pdf",
        }
    }
}

/// 保存ファイル名の語幹となる識別子を生成する。
///
/// OSの暗号論的乱数源によるUUID v4をハイフン区切り小文字で返す
/// （例: `0f8fad5b-d9cb-469f-a165-70867728950e`）。
/// 乱数源の取得失敗はpanicとなり、プロセスを停止させる。
pub fn new_artifact_id() -> String {
    uuid::Uuid::new_v4().hyphenated().to_string()
}
