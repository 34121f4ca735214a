//! The storage capability shared by local and object-store backends.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::StorageResult;

/// Storage rooted at an output location. Paths are relative to that root and
/// always use `/` separators.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Check if an object exists.
    async fn exists(&self, path: &str) -> StorageResult<bool>;

    /// Read a whole object.
    async fn read(&self, path: &str) -> StorageResult<Bytes>;

    /// Write a whole object, replacing anything already there.
    async fn write(&self, path: &str, data: Bytes, content_type: &str) -> StorageResult<()>;

    /// Make sure the parent of `path` can be written to.
    async fn ensure_parent(&self, path: &str) -> StorageResult<()>;

    /// Full backend location of `path`, e.g. `/data/out/2023/...` or
    /// `s3://bucket/prefix/2023/...`.
    fn join_path(&self, path: &str) -> String;

    /// Location of `path` as published to catalog readers.
    fn public_url(&self, path: &str) -> String;

    /// True for object storage, false for the local filesystem.
    fn is_remote(&self) -> bool;
}

pub type SharedStorage = Arc<dyn Storage>;
