//! NetCDF parser for GHRSST MUR Level 4 analyses.
//!
//! MUR files are NetCDF-4 (HDF5) with one time step of several
//! `(time, lat, lon)` variables on a 0.01° global grid. Values are read in
//! their packed integer form; `scale_factor`, `add_offset` and `_FillValue`
//! are kept as attributes rather than applied.
//!
//! Latitude is stored ascending (south to north) and the coordinate arrays
//! are single precision, so the grid recovered from them is close to, but
//! not exactly, the published 0.01° grid.

pub mod error;
pub mod native;

pub use error::{NetCdfError, NetCdfResult};
pub use native::{load_mur_file, load_mur_from_bytes, silence_hdf5_errors, LoadOptions};
