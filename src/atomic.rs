//! 临时写入与原子落盘的辅助方法。

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::storage::StorageError;

/// A hidden temp file next to `target`, renamed onto it only once fully written.
///
/// Dropping it before `finalize` succeeds removes the temp file, so a cancelled
/// request leaves nothing behind in the storage root.
pub struct AtomicFile {
    target: PathBuf,
    temp_path: PathBuf,
    file: Option<File>,
    written: u64,
    finished: bool,
}

impl AtomicFile {
    pub async fn new(target: &Path) -> Result<Self, StorageError> {
        let parent = target.parent().ok_or_else(|| {
            StorageError::Io(io::Error::other(format!(
                "target {} has no parent directory",
                target.display()
            )))
        })?;
        let base = target
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_else(|| "upload".into());
        let temp_path = parent.join(format!(".{base}.tmp.{}", Uuid::new_v4()));
        let file = File::create(&temp_path).await?;
        Ok(Self {
            target: target.to_path_buf(),
            temp_path,
            file: Some(file),
            written: 0,
            finished: false,
        })
    }

    /// 追加写入一段数据。
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::other("temp file already closed"))?;
        file.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// 放弃并清理临时文件。
    pub async fn cleanup(mut self) {
        drop(self.file.take());
        let _ = fs::remove_file(&self.temp_path).await;
        self.finished = true;
    }

    /// Syncs the data and moves it under the final name, returning the byte count.
    pub async fn finalize(mut self) -> Result<u64, StorageError> {
        let Some(mut file) = self.file.take() else {
            return Err(StorageError::Io(io::Error::other("temp file already closed")));
        };
        let synced = async {
            file.flush().await?;
            file.sync_all().await
        }
        .await;
        drop(file);
        synced?;

        fs::rename(&self.temp_path, &self.target).await?;
        self.finished = true;

        if let Some(parent) = self.target.parent() {
            let _ = sync_dir(parent).await;
        }
        Ok(self.written)
    }
}

impl Drop for AtomicFile {
    fn drop(&mut self) {
        if !self.finished {
            drop(self.file.take());
            let _ = std::fs::remove_file(&self.temp_path);
        }
    }
}

async fn sync_dir(path: &Path) -> io::Result<()> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let dir = std::fs::File::open(path)?;
        dir.sync_all()
    })
    .await
    .map_err(|err| io::Error::other(err.to_string()))?
}
