//! Error types for NetCDF parsing operations.

use sst_common::SstError;
use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF parsing.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Missing required variable, dimension or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

impl From<NetCdfError> for SstError {
    fn from(err: NetCdfError) -> Self {
        match err {
            NetCdfError::MissingData(what) => {
                SstError::Configuration(format!("NetCDF file is missing {}", what))
            }
            NetCdfError::IoError(e) => SstError::Io(e),
            other => SstError::Decode(other.to_string()),
        }
    }
}
