//! MIMEタイプから拡張子候補を解決する。

use crate::CoreError;

/// 受理種別の拡張子表。先頭が正規の拡張子。
/// 保存ファイル名は `jpe?g|gif|png|pdf` のいずれかで終わる必要があるため、
/// システムのMIMEデータベース（`.jfif`, `.jpe` 等を含む）より優先する。
const BUILTIN_EXTENSIONS: &[(&str, &[&str])] = &[
    ("image/jpeg", &[".jpeg", ".jpg"]),
    ("image/jpg", &[".jpg", ".jpeg"]),
    ("image/gif", &[".gif"]),
    ("image/png", &[".png"]),
    ("application/pdf", &[".pdf"]),
];

/// MIMEタイプに対応する拡張子の一覧を返す。各要素は `.` で始まる。
///
/// パラメータ（`; charset=...`）は無視し、大文字小文字を区別しない。
/// 組み込み表にない種別は `mime_guess` のデータベースを辞書順で返す。
pub fn extensions_by_type(mime: &str) -> Result<Vec<String>, CoreError> {
    let essence = mime
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if let Some((_, exts)) = BUILTIN_EXTENSIONS.iter().find(|(ty, _)| *ty == essence) {
        return Ok(exts.iter().map(|e| e.to_string()).collect());
    }

    let mut exts: Vec<String> = mime_guess::get_mime_extensions_str(&essence)
        .ok_or_else(|| CoreError::UnknownMimeType(mime.to_string()))?
        .iter()
        .map(|e| format!(".{e}"))
        .collect();
    exts.sort();
    exts.dedup();
    Ok(exts)
}

/// 正規の拡張子（候補の先頭）を返す。候補が空の場合はエラー。
pub fn canonical_extension(mime: &str) -> Result<String, CoreError> {
    extensions_by_type(mime)?
        .into_iter()
        .next()
        .ok_or_else(|| CoreError::EmptyExtensionList(mime.to_string()))
}
