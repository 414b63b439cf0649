use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::ErrorKind;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub async fn ensure_root(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root).await
    }

    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// Returns the directory backing `category`, creating it on first use.
    pub async fn resolve_category(&self, category: &str) -> Result<PathBuf, StorageError> {
        validate_category(category)?;
        let target = self.root.join(category);

        match fs::symlink_metadata(&target).await {
            Ok(metadata) => {
                if metadata.file_type().is_symlink() || !metadata.is_dir() {
                    return Err(StorageError::InvalidCategory);
                }
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                fs::create_dir_all(&target).await?;
                debug!(category, path = %target.display(), "created category directory");
            }
            Err(err) => return Err(StorageError::Io(err)),
        }

        Ok(target)
    }
}

/// A category must be exactly one plain path segment.
pub fn validate_category(category: &str) -> Result<(), StorageError> {
    if category.contains(['/', '\\']) {
        return Err(StorageError::InvalidCategory);
    }
    let mut components = Path::new(category).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(segment)), None) if segment == category => Ok(()),
        _ => Err(StorageError::InvalidCategory),
    }
}

#[derive(Debug)]
pub enum StorageError {
    InvalidCategory,
    Io(io::Error),
}

impl From<io::Error> for StorageError {
    fn from(err: io::Error) -> Self {
        StorageError::Io(err)
    }
}
