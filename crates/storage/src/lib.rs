//! Storage abstractions for the GHRSST pipeline.
//!
//! Every output goes through the [`Storage`] trait so that pipeline code never
//! branches on where it is writing:
//! - [`LocalStorage`] for a directory on the local filesystem
//! - [`ObjectStorage`] for an S3-compatible bucket (AWS, source.coop, MinIO)

pub mod backend;
pub mod error;
pub mod local;
pub mod location;
pub mod object_store;

pub use self::object_store::{ObjectStorage, ObjectStorageConfig};
pub use backend::{SharedStorage, Storage};
pub use error::{StorageError, StorageResult};
pub use local::LocalStorage;
pub use location::{open_storage, Location};
