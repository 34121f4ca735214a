//! Parsing of user-supplied output locations.

use std::path::PathBuf;
use std::sync::Arc;

use crate::{LocalStorage, ObjectStorage, ObjectStorageConfig, SharedStorage, StorageError, StorageResult};

/// Where a storage root lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Local(PathBuf),
    S3 { bucket: String, prefix: String },
}

impl Location {
    /// Parse `s3://bucket/prefix` (also the single-slash `s3:/bucket/prefix`
    /// form) or a local path.
    pub fn parse(s: &str) -> StorageResult<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(StorageError::InvalidLocation("empty location".to_string()));
        }

        let rest = trimmed
            .strip_prefix("s3://")
            .or_else(|| trimmed.strip_prefix("s3:/"));

        match rest {
            Some(rest) => {
                let rest = rest.trim_matches('/');
                let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
                if bucket.is_empty() {
                    return Err(StorageError::InvalidLocation(format!(
                        "no bucket in {}",
                        s
                    )));
                }
                Ok(Location::S3 {
                    bucket: bucket.to_string(),
                    prefix: prefix.trim_matches('/').to_string(),
                })
            }
            None => Ok(Location::Local(PathBuf::from(trimmed))),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Location::S3 { .. })
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Local(path) => write!(f, "{}", path.display()),
            Location::S3 { bucket, prefix } if prefix.is_empty() => write!(f, "s3://{}", bucket),
            Location::S3 { bucket, prefix } => write!(f, "s3://{}/{}", bucket, prefix),
        }
    }
}

/// Open storage for a location. Object storage clients are configured from
/// the environment at the time of this call.
pub fn open_storage(location: &Location, public_root: Option<String>) -> StorageResult<SharedStorage> {
    match location {
        Location::Local(path) => Ok(Arc::new(LocalStorage::new(path.clone()))),
        Location::S3 { bucket, prefix } => {
            let config = ObjectStorageConfig::new(bucket.clone(), prefix.clone())
                .with_public_root(public_root);
            Ok(Arc::new(ObjectStorage::new(config)?))
        }
    }
}
