//! # Artifact Storage
//!
//! アップロードされた成果物の保存先の抽象インターフェース。
//! ローカルディレクトリ実装は `local` サブモジュールを参照。

pub mod local;

pub use local::LocalDirStore;

use std::path::PathBuf;

/// 保存処理のエラー。作成前の失敗と作成後の失敗を区別する。
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// ファイルを作成できない（権限、ディレクトリ不在、同名ファイル存在等）
    #[error("{0}")]
    Create(#[source] std::io::Error),
    /// 作成後の書き込み・フラッシュ・同期に失敗
    #[error("{0}")]
    Write(#[source] std::io::Error),
}

/// 成果物の保存先。
///
/// 実装はファイル名を検証しない。呼び出し側が生成した識別子由来の名前のみを渡すこと。
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    /// `file_name` でバイト列を新規保存し、保存先パスを返す。
    ///
    /// 同名の成果物が既に存在する場合は上書きせず `StorageError::Create` を返す。
    /// `Ok` が返った時点で内容は完全に書き込まれ、ハンドルは閉じられている。
    async fn persist(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, StorageError>;
}
