//! Common types and utilities shared across the GHRSST MUR COG pipeline.

pub mod bbox;
pub mod crs;
pub mod dataset;
pub mod env;
pub mod error;
pub mod grid;
pub mod paths;
pub mod product;
pub mod time;

pub use bbox::BoundingBox;
pub use crs::Crs;
pub use dataset::{AttrValue, Attributes, GriddedDataset, RasterData, Variable};
pub use env::EnvScope;
pub use error::{ErrorKind, SstError, SstResult};
pub use grid::{GeoTransform, GridSpec};
pub use time::DateRange;
