//! マジックバイトによるコンテンツ種別判定。
//!
//! クライアントが申告する `Content-Type` やファイル名は信用せず、
//! 先頭 [`SNIFF_LEN`] バイトのみからMIMEタイプを決定する。

/// 判定に使用する先頭バイト数
pub const SNIFF_LEN: usize = 512;

/// どのシグネチャにも一致しない場合のMIMEタイプ
pub const OCTET_STREAM: &str = "application/octet-stream";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// 先頭一致で判定するシグネチャ表。上から順に評価する。
const PREFIX_SIGNATURES: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"BM", "image/bmp"),
    (b"\x00\x00\x01\x00", "image/x-icon"),
    (b"\x00\x00\x02\x00", "image/x-icon"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1F\x8B\x08", "application/x-gzip"),
];

/// バイト列のMIMEタイプを判定する。
///
/// 先頭512バイトより短い入力はあるだけのバイトで判定する。
/// 既知のバイナリ形式に一致せず、制御文字を含まない入力は
/// `text/plain; charset=utf-8` を、それ以外は `application/octet-stream` を返す。
pub fn detect_content_type(data: &[u8]) -> &'static str {
    let head = &data[..data.len().min(SNIFF_LEN)];

    if let Some(&(_, mime)) = PREFIX_SIGNATURES
        .iter()
        .find(|(sig, _)| head.starts_with(sig))
    {
        return mime;
    }

    // RIFF....WEBPVP
    if head.len() >= 14 && head.starts_with(b"RIFF") && &head[8..14] == b"WEBPVP" {
        return "image/webp";
    }

    if head.iter().all(|b| !is_binary_byte(*b)) {
        return TEXT_PLAIN;
    }

    OCTET_STREAM
}

/// テキストには現れない制御バイトか
fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}
