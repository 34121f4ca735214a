//! Error types for the GHRSST pipeline.
//!
//! Only a handful of failure modes are "known": a user can fix them by
//! changing configuration, credentials or the requested dates. Everything
//! else is carried through unchanged and should crash the caller loudly.

use thiserror::Error;

/// Result type alias using SstError.
pub type SstResult<T> = Result<T, SstError>;

/// Primary error type for pipeline operations.
#[derive(Debug, Error)]
pub enum SstError {
    // === Known domain failures ===
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Failed to open {path} with error {message}. Please check your EARTHDATA_TOKEN.")]
    SourceAccess { path: String, message: String },

    #[error("Source file not found: {0}")]
    SourceNotFound(String),

    #[error("Nothing to aggregate: {0}")]
    AggregationEmpty(String),

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    // === Unexpected failures ===
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Failed to decode dataset: {0}")]
    Decode(String),

    #[error("Failed to encode raster: {0}")]
    Encode(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tag describing which family an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Authentication,
    SourceAccess,
    SourceNotFound,
    AggregationEmpty,
    Unexpected,
}

impl ErrorKind {
    /// True for failures the user can act on (bad config, bad date,
    /// missing data); false for programming or environment errors.
    pub fn is_domain(&self) -> bool {
        !matches!(self, ErrorKind::Unexpected)
    }
}

impl SstError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SstError::Configuration(_) | SstError::InvalidDate(_) => ErrorKind::Configuration,
            SstError::Authentication(_) => ErrorKind::Authentication,
            SstError::SourceAccess { .. } => ErrorKind::SourceAccess,
            SstError::SourceNotFound(_) => ErrorKind::SourceNotFound,
            SstError::AggregationEmpty(_) => ErrorKind::AggregationEmpty,
            _ => ErrorKind::Unexpected,
        }
    }

    /// Shorthand for `self.kind().is_domain()`.
    pub fn is_domain(&self) -> bool {
        self.kind().is_domain()
    }

    pub fn missing_config(what: impl Into<String>) -> Self {
        SstError::Configuration(what.into())
    }
}
