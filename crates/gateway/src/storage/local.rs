//! ローカルディレクトリへの成果物保存。

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::{ArtifactStore, StorageError};

/// フラットなディレクトリに `<file_name>` として保存する。
pub struct LocalDirStore {
    dir: PathBuf,
}

impl LocalDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

async fn write_and_sync(file: &mut File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await
}

#[async_trait::async_trait]
impl ArtifactStore for LocalDirStore {
    async fn persist(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let path = self.dir.join(file_name);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(StorageError::Create)?;

        let result = write_and_sync(&mut file, bytes).await;
        drop(file);

        if let Err(e) = result {
            // 書きかけのファイルは残さない（削除失敗はログのみ）
            if let Err(rm_err) = tokio::fs::remove_file(&path).await {
                tracing::warn!(
                    path = %path.display(),
                    error = %rm_err,
                    "書きかけファイルの削除に失敗"
                );
            }
            return Err(StorageError::Write(e));
        }

        Ok(path)
    }
}
