//! STAC items and GeoParquet aggregation.
//!
//! [`item`] holds the serde model for a single STAC item with the
//! projection and raster extensions; [`geoparquet`] writes many items into
//! one stac-geoparquet file through the `stac` crate.

pub mod error;
pub mod geoparquet;
pub mod item;

pub use error::{CatalogError, CatalogResult};
pub use geoparquet::{read_parquet_items, to_parquet_bytes, write_parquet_file};
pub use item::{Asset, Geometry, Item, ItemBuilder, Link, Properties, RasterBand};

/// STAC specification version written into every item.
pub const STAC_VERSION: &str = "1.0.0";

pub const PROJECTION_EXTENSION: &str =
    "https://stac-extensions.github.io/projection/v1.1.0/schema.json";
pub const RASTER_EXTENSION: &str = "https://stac-extensions.github.io/raster/v1.1.0/schema.json";
