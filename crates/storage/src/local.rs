//! Local filesystem storage.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, instrument};

use crate::{Storage, StorageError, StorageResult};

/// Storage rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute-or-relative filesystem path for a storage path.
    pub fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let full = self.resolve(path);
        fs::try_exists(&full)
            .await
            .map_err(|e| StorageError::io(full.display().to_string(), e))
    }

    async fn read(&self, path: &str) -> StorageResult<Bytes> {
        let full = self.resolve(path);
        let data = fs::read(&full)
            .await
            .map_err(|e| StorageError::io(full.display().to_string(), e))?;
        debug!(path = %full.display(), size = data.len(), "Read file");
        Ok(Bytes::from(data))
    }

    /// Writes go to a `.partial` sibling first and are renamed into place, so
    /// an interrupted write never leaves a truncated file at `path`.
    #[instrument(skip(self, data, _content_type), fields(root = %self.root.display(), path = %path))]
    async fn write(&self, path: &str, data: Bytes, _content_type: &str) -> StorageResult<()> {
        let full = self.resolve(path);
        self.ensure_parent(path).await?;

        let mut partial = full.clone().into_os_string();
        partial.push(".partial");
        let partial = PathBuf::from(partial);

        fs::write(&partial, &data)
            .await
            .map_err(|e| StorageError::io(partial.display().to_string(), e))?;
        fs::rename(&partial, &full)
            .await
            .map_err(|e| StorageError::io(full.display().to_string(), e))?;

        debug!(size = data.len(), "Wrote file");
        Ok(())
    }

    async fn ensure_parent(&self, path: &str) -> StorageResult<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(parent.display().to_string(), e))?;
        }
        Ok(())
    }

    fn join_path(&self, path: &str) -> String {
        self.resolve(path).display().to_string()
    }

    fn public_url(&self, path: &str) -> String {
        self.join_path(path)
    }

    fn is_remote(&self) -> bool {
        false
    }
}
