use sst_common::SstError;
use thiserror::Error;

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("STAC error: {0}")]
    Stac(#[from] stac::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid item: {0}")]
    InvalidItem(String),
}

impl From<CatalogError> for SstError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Io(e) => SstError::Io(e),
            other => SstError::Catalog(other.to_string()),
        }
    }
}
