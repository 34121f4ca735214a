//! GHRSST MUR publication pipeline.
//!
//! Turns one day's MUR NetCDF into five Cloud-Optimized GeoTIFFs and a STAC
//! item, and rolls many days of STAC items into one GeoParquet catalog.
//!
//! # Architecture
//!
//! - [`GridAligner`] snaps a decoded dataset onto the exact 0.01° reference grid
//! - [`ArtifactWriter`] writes one COG per variable, skipping ones that exist
//! - [`CatalogWriter`] builds and persists the day's STAC item
//! - [`DayPipeline`] sequences the above for one date
//! - [`BatchAggregator`] fetches items for a date range into GeoParquet
//!
//! Decoding, encoding, credentials and item fetching sit behind traits
//! ([`DatasetLoader`], [`cog_encoder::RasterEncoder`], [`CredentialProvider`],
//! [`ItemFetcher`]) so the pipeline can run against in-memory fakes.

pub mod aggregate;
pub mod aligner;
pub mod artifacts;
pub mod catalog;
pub mod credentials;
pub mod day;
pub mod source;

pub use aggregate::{
    AggregationReport, BatchAggregator, HttpItemFetcher, ItemFetcher, StorageItemFetcher,
    WriteStrategy, DEFAULT_FETCH_CONCURRENCY,
};
pub use aligner::GridAligner;
pub use artifacts::{Artifact, ArtifactReport, ArtifactStatus, ArtifactWriter};
pub use catalog::CatalogWriter;
pub use credentials::{CredentialProvider, EarthdataCredentials, StaticToken};
pub use day::{run_day, Collaborators, DayOptions, DayOutcome, DayPipeline, DayState};
pub use source::{DatasetLoader, NetCdfLoader, SourceRequest};
