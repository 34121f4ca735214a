//! Cloud-Optimized GeoTIFF encoding.
//!
//! The [`RasterEncoder`] trait is the seam the pipeline writes through; the
//! GDAL-backed [`GdalCogEncoder`] is the production implementation.

pub mod gdal_cog;
pub mod metadata;

use bytes::Bytes;
use thiserror::Error;

use sst_common::dataset::Variable;
use sst_common::{GridSpec, SstError};

pub use gdal_cog::GdalCogEncoder;
pub use metadata::RasterMetadata;

pub type EncodeResult<T> = Result<T, EncodeError>;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("Invalid raster: {0}")]
    InvalidInput(String),
}

impl From<EncodeError> for SstError {
    fn from(err: EncodeError) -> Self {
        SstError::Encode(err.to_string())
    }
}

/// Creation options for the COG driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CogOptions {
    /// Compression codec name, e.g. "ZSTD"
    pub compression: String,
}

impl Default for CogOptions {
    fn default() -> Self {
        Self {
            compression: "ZSTD".to_string(),
        }
    }
}

/// Everything needed to encode one variable.
///
/// The grid is passed separately from the variable: the encoder must use
/// exactly this grid and never re-derive one from the variable.
#[derive(Debug, Clone, Copy)]
pub struct EncodeRequest<'a> {
    pub variable: &'a Variable,
    pub grid: &'a GridSpec,
    pub nodata: Option<f64>,
    pub metadata: &'a RasterMetadata,
    pub options: &'a CogOptions,
}

impl EncodeRequest<'_> {
    /// Check that the data fills the grid exactly.
    pub fn validate(&self) -> EncodeResult<()> {
        if self.grid.is_empty() {
            return Err(EncodeError::InvalidInput(format!(
                "{}: empty grid",
                self.variable.name
            )));
        }
        if self.variable.data.len() != self.grid.len() {
            return Err(EncodeError::InvalidInput(format!(
                "{}: {} values for a {}x{} grid",
                self.variable.name,
                self.variable.data.len(),
                self.grid.rows,
                self.grid.cols
            )));
        }
        Ok(())
    }
}

/// Encodes one variable as a single-band, georeferenced, compressed raster.
pub trait RasterEncoder: Send + Sync {
    fn encode(&self, request: &EncodeRequest<'_>) -> EncodeResult<Bytes>;
}
