//! Storage error types.

use thiserror::Error;

use sst_common::SstError;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Failed to {op} {path}: {message}")]
    Backend {
        op: &'static str,
        path: String,
        message: String,
    },

    #[error("Invalid storage location: {0}")]
    InvalidLocation(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }

    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound(path.into())
        } else {
            StorageError::Io {
                path: path.into(),
                source,
            }
        }
    }
}

impl From<StorageError> for SstError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidLocation(msg) => SstError::Configuration(msg),
            other => SstError::Storage(other.to_string()),
        }
    }
}
