//! Object storage backend (S3 compatible).

use async_trait::async_trait;
use bytes::Bytes;
use object_store::{
    aws::AmazonS3Builder, path::Path, Attribute, Attributes, ObjectStore, PutOptions,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::{Storage, StorageError, StorageResult};

/// Legacy source.coop bucket. Objects in it are served publicly from
/// `https://data.source.coop/<key>`.
pub const SOURCE_COOP_BUCKET: &str = "us-west-2.opendata.source.coop";
pub const SOURCE_COOP_PUBLIC_BASE: &str = "https://data.source.coop";

/// Configuration for an object storage root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStorageConfig {
    /// Bucket name
    pub bucket: String,
    /// Key prefix all paths are relative to (no leading or trailing `/`)
    pub prefix: String,
    /// Public URL corresponding to the storage root, if objects are served
    /// over HTTP. Catalog hrefs use it instead of `s3://` URLs.
    pub public_root: Option<String>,
}

impl ObjectStorageConfig {
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        let bucket = bucket.into();
        let prefix = prefix.into().trim_matches('/').to_string();
        let public_root = default_public_root(&bucket, &prefix);
        Self {
            bucket,
            prefix,
            public_root,
        }
    }

    pub fn with_public_root(mut self, public_root: Option<String>) -> Self {
        if public_root.is_some() {
            self.public_root = public_root.map(|r| r.trim_end_matches('/').to_string());
        }
        self
    }
}

fn default_public_root(bucket: &str, prefix: &str) -> Option<String> {
    if bucket == SOURCE_COOP_BUCKET {
        Some(sst_common::paths::join(SOURCE_COOP_PUBLIC_BASE, prefix))
    } else {
        None
    }
}

/// Object storage client rooted at `bucket/prefix`.
pub struct ObjectStorage {
    store: Arc<dyn ObjectStore>,
    config: ObjectStorageConfig,
}

impl ObjectStorage {
    /// Create a client from config, taking credentials, region and endpoint
    /// from the current process environment. They are fixed from here on.
    pub fn new(config: ObjectStorageConfig) -> StorageResult<Self> {
        let builder = AmazonS3Builder::from_env().with_bucket_name(&config.bucket);

        let store = builder.build().map_err(|e| StorageError::Backend {
            op: "create client for",
            path: config.bucket.clone(),
            message: e.to_string(),
        })?;

        Ok(Self::with_store(Arc::new(store), config))
    }

    /// Wrap an existing store, e.g. `object_store::memory::InMemory` in tests.
    pub fn with_store(store: Arc<dyn ObjectStore>, config: ObjectStorageConfig) -> Self {
        Self { store, config }
    }

    /// Key within the bucket for a storage path.
    pub fn key(&self, path: &str) -> String {
        sst_common::paths::join(&self.config.prefix, path)
    }

    fn location(&self, path: &str) -> Path {
        Path::from(self.key(path))
    }

    fn backend_error(&self, op: &'static str, path: &str, err: object_store::Error) -> StorageError {
        match err {
            object_store::Error::NotFound { .. } => StorageError::NotFound(self.join_path(path)),
            other => StorageError::Backend {
                op,
                path: self.join_path(path),
                message: other.to_string(),
            },
        }
    }
}

#[async_trait]
impl Storage for ObjectStorage {
    async fn exists(&self, path: &str) -> StorageResult<bool> {
        match self.store.head(&self.location(path)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(self.backend_error("check", path, e)),
        }
    }

    #[instrument(skip(self), fields(bucket = %self.config.bucket, path = %path))]
    async fn read(&self, path: &str) -> StorageResult<Bytes> {
        let result = self
            .store
            .get(&self.location(path))
            .await
            .map_err(|e| self.backend_error("read", path, e))?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| self.backend_error("read", path, e))?;

        debug!(size = bytes.len(), "Read object");
        Ok(bytes)
    }

    #[instrument(skip(self, data), fields(bucket = %self.config.bucket, path = %path))]
    async fn write(&self, path: &str, data: Bytes, content_type: &str) -> StorageResult<()> {
        debug!(size = data.len(), "Writing object");

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        self.store
            .put_opts(&self.location(path), data.into(), options)
            .await
            .map_err(|e| self.backend_error("write", path, e))?;

        Ok(())
    }

    /// Buckets have no directories.
    async fn ensure_parent(&self, _path: &str) -> StorageResult<()> {
        Ok(())
    }

    fn join_path(&self, path: &str) -> String {
        format!("s3://{}/{}", self.config.bucket, self.key(path))
    }

    fn public_url(&self, path: &str) -> String {
        match &self.config.public_root {
            Some(root) => sst_common::paths::join(root, path),
            None => self.join_path(path),
        }
    }

    fn is_remote(&self) -> bool {
        true
    }
}
