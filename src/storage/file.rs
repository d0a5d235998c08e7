//! File-backed blob store with atomic replace

use super::traits::BlobStore;
use crate::domain::{CustodiaError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Blob store backed by a directory of flat files
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// concurrent reader sees either the old blob or the new one, never a
/// partial write.
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    /// Create a store rooted at `dir`, creating the directory if needed
    pub async fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await.map_err(|e| {
            CustodiaError::Storage(format!(
                "Failed to create store directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self { dir })
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn get(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(name);
        match fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CustodiaError::Storage(format!(
                "Failed to read blob {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn put(&self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.path_for(name);
        let tmp = self.dir.join(format!("{name}.tmp"));

        fs::write(&tmp, data).await.map_err(|e| {
            CustodiaError::Storage(format!("Failed to write blob {}: {}", tmp.display(), e))
        })?;

        fs::rename(&tmp, &path).await.map_err(|e| {
            CustodiaError::Storage(format!(
                "Failed to replace blob {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(fs::try_exists(self.path_for(name)).await.unwrap_or(false))
    }
}
