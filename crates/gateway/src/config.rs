//! # Gateway設定・共有状態
//!
//! 環境変数からの設定読み込みとGatewayの共有状態の定義。
//!
//! | 変数 | 必須 | デフォルト |
//! |------|------|-----------|
//! | `TMP_DIR` | ○ | — |
//! | `PORT` | | `8000` |
//! | `UPLOAD_STATUS_MODE` | | `legacy` |

use std::path::PathBuf;

use crate::access_log::AccessLogSink;
use crate::storage::ArtifactStore;

/// アップロード最大サイズ（2 MiB）。リクエストボディ全体に適用する。
pub const MAX_UPLOAD_SIZE: usize = 2 * 1024 * 1024;

/// `PORT` 未設定時の待ち受けポート
pub const DEFAULT_PORT: u16 = 8000;

/// 設定読み込みエラー。起動時に発生した場合は致命的。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 必須の環境変数が未設定
    #[error("環境変数 {0} が設定されていません")]
    Missing(&'static str),
    /// 値の形式が不正
    #[error("環境変数 {name} の値が不正です: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
    /// アップロード先ディレクトリが使用できない
    #[error("アップロード先ディレクトリを使用できません: {path}: {reason}")]
    UploadDir { path: PathBuf, reason: String },
}

/// 失敗時のHTTPステータスの決め方。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusMode {
    /// 全ての失敗を500で返す（既存クライアント互換）
    #[default]
    Legacy,
    /// 失敗の分類ごとに 413 / 400 / 415 / 500 を返す
    Typed,
}

impl std::str::FromStr for StatusMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "legacy" => Ok(StatusMode::Legacy),
            "typed" => Ok(StatusMode::Typed),
            other => Err(format!("legacy または typed を指定してください: {other}")),
        }
    }
}

/// 起動時に一度だけ読み込まれる設定。
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// アップロード先ディレクトリ（絶対パス、存在すること）
    pub upload_dir: PathBuf,
    /// 待ち受けポート
    pub port: u16,
    /// 失敗時のステータス決定方式
    pub status_mode: StatusMode,
}

impl GatewayConfig {
    /// プロセス環境変数から構築する。
    ///
    /// `.env` の読み込みは呼び出し側（`main`）で先に行っておくこと。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意の変数ソースから構築する。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let upload_dir = lookup("TMP_DIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing("TMP_DIR"))?;
        validate_upload_dir(&upload_dir)?;

        // 空文字は未設定と同じ扱い
        let port = match lookup("PORT").filter(|v| !v.is_empty()) {
            Some(v) => v.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "PORT",
                value: v.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let status_mode = match lookup("UPLOAD_STATUS_MODE") {
            Some(v) => v.parse::<StatusMode>().map_err(|reason| ConfigError::Invalid {
                name: "UPLOAD_STATUS_MODE",
                value: v.clone(),
                reason,
            })?,
            None => StatusMode::default(),
        };

        Ok(Self {
            upload_dir,
            port,
            status_mode,
        })
    }
}

fn validate_upload_dir(path: &std::path::Path) -> Result<(), ConfigError> {
    let fail = |reason: String| ConfigError::UploadDir {
        path: path.to_path_buf(),
        reason,
    };
    if !path.is_absolute() {
        return Err(fail("絶対パスではありません".to_string()));
    }
    let meta = std::fs::metadata(path).map_err(|e| fail(e.to_string()))?;
    if !meta.is_dir() {
        return Err(fail("ディレクトリではありません".to_string()));
    }
    Ok(())
}

/// Gatewayの共有状態。起動後は読み取り専用。
pub struct GatewayState {
    /// 成果物の保存先
    pub store: Box<dyn ArtifactStore>,
    /// 失敗時のステータス決定方式
    pub status_mode: StatusMode,
    /// リクエストボディの上限（バイト）
    pub max_upload_size: usize,
    /// アクセスログの出力先
    pub access_log: AccessLogSink,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: HashMap<&'static str, String>) -> impl Fn(&str) -> Option<String> {
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let vars = HashMap::from([("TMP_DIR", dir.path().display().to_string())]);

        let config = GatewayConfig::from_lookup(lookup_from(vars)).unwrap();
        assert_eq!(config.upload_dir, dir.path());
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.status_mode, StatusMode::Legacy);
    }

    #[test]
    fn test_empty_port_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let vars = HashMap::from([
            ("TMP_DIR", dir.path().display().to_string()),
            ("PORT", String::new()),
        ]);
        let config = GatewayConfig::from_lookup(lookup_from(vars)).unwrap();
        assert_eq!(config.port, 8000);
    }

    #[test]
    fn test_explicit_values() {
        let dir = tempfile::tempdir().unwrap();
        let vars = HashMap::from([
            ("TMP_DIR", dir.path().display().to_string()),
            ("PORT", "9123".to_string()),
            ("UPLOAD_STATUS_MODE", "Typed".to_string()),
        ]);
        let config = GatewayConfig::from_lookup(lookup_from(vars)).unwrap();
        assert_eq!(config.port, 9123);
        assert_eq!(config.status_mode, StatusMode::Typed);
    }

    #[test]
    fn test_missing_upload_dir() {
        let err = GatewayConfig::from_lookup(lookup_from(HashMap::new())).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("TMP_DIR")));
    }

    #[test]
    fn test_relative_upload_dir() {
        let vars = HashMap::from([("TMP_DIR", "uploads".to_string())]);
        let err = GatewayConfig::from_lookup(lookup_from(vars)).unwrap_err();
        assert!(matches!(err, ConfigError::UploadDir { .. }));
    }

    #[test]
    fn test_upload_dir_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let vars = HashMap::from([("TMP_DIR", missing.display().to_string())]);
        let err = GatewayConfig::from_lookup(lookup_from(vars)).unwrap_err();
        assert!(matches!(err, ConfigError::UploadDir { .. }));
    }

    #[test]
    fn test_upload_dir_must_be_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let vars = HashMap::from([("TMP_DIR", file.path().display().to_string())]);
        let err = GatewayConfig::from_lookup(lookup_from(vars)).unwrap_err();
        assert!(matches!(err, ConfigError::UploadDir { .. }));
    }

    #[test]
    fn test_invalid_port() {
        let dir = tempfile::tempdir().unwrap();
        let vars = HashMap::from([
            ("TMP_DIR", dir.path().display().to_string()),
            ("PORT", "http".to_string()),
        ]);
        let err = GatewayConfig::from_lookup(lookup_from(vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn test_invalid_status_mode() {
        let dir = tempfile::tempdir().unwrap();
        let vars = HashMap::from([
            ("TMP_DIR", dir.path().display().to_string()),
            ("UPLOAD_STATUS_MODE", "strict".to_string()),
        ]);
        let err = GatewayConfig::from_lookup(lookup_from(vars)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "UPLOAD_STATUS_MODE",
                ..
            }
        ));
    }
}
