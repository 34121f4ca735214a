//! Native NetCDF parsing using the netcdf library.
//!
//! The netcdf library requires a file path (it wraps libnetcdf/HDF5 which need
//! file handles). When reading from bytes, we write to a temp file first.
//!
//! On Linux, we use `/dev/shm` (memory-backed tmpfs) to minimize I/O latency.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Once;

use netcdf::AttributeValue;
use tracing::{debug, info};

use sst_common::dataset::{AttrValue, Attributes, GriddedDataset, RasterData};
use sst_common::product::EXCLUDED_VARIABLES;
use sst_common::Crs;

use crate::error::{NetCdfError, NetCdfResult};

const LAT: &str = "lat";
const LON: &str = "lon";

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist). This function disables that output by calling
/// H5Eset_auto2 with null handlers. It only needs to be called once per
/// process, but is safe to call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Which variables to read.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Variables never read, even if present
    pub drop_variables: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            drop_variables: EXCLUDED_VARIABLES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Load a MUR NetCDF file from disk.
///
/// Reads the `lat`/`lon` coordinate variables and every `(…, lat, lon)`
/// variable not listed in `options.drop_variables`.
pub fn load_mur_file(path: &Path, options: &LoadOptions) -> NetCdfResult<GriddedDataset> {
    silence_hdf5_errors();

    let nc_file = netcdf::open(path).map_err(|e| {
        NetCdfError::InvalidFormat(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let lat = read_coordinate(&nc_file, LAT)?;
    let lon = read_coordinate(&nc_file, LON)?;
    let grid_len = lat.len() * lon.len();

    let mut variables = Vec::new();
    for var in nc_file.variables() {
        let name = var.name();
        if options.drop_variables.iter().any(|d| *d == name) || !is_raster_variable(&var) {
            continue;
        }

        let data = read_raster(&var)?;
        if data.len() != grid_len {
            return Err(NetCdfError::InvalidFormat(format!(
                "{} has {} values, expected {} (one time step)",
                name,
                data.len(),
                grid_len
            )));
        }

        debug!(variable = %name, dtype = data.dtype_name(), "Read variable");
        variables.push((name, data, read_attributes(var.attributes())));
    }

    info!(
        path = %path.display(),
        rows = lat.len(),
        cols = lon.len(),
        variables = variables.len(),
        "Loaded MUR NetCDF"
    );

    let global_attrs = read_attributes(nc_file.attributes());
    GriddedDataset::from_coords(lat, lon, Crs::WGS84, variables, global_attrs)
        .map_err(|e| NetCdfError::InvalidFormat(e.to_string()))
}

/// Load a MUR NetCDF file from bytes already in memory.
///
/// The buffer is released once it is on disk, before decoding starts.
pub fn load_mur_from_bytes<B: AsRef<[u8]>>(data: B, options: &LoadOptions) -> NetCdfResult<GriddedDataset> {
    let temp_file = get_optimal_temp_dir().join(generate_temp_filename());

    let mut file = std::fs::File::create(&temp_file)?;
    file.write_all(data.as_ref())?;
    drop(file);
    drop(data);

    let result = load_mur_file(&temp_file, options);

    // Clean up
    let _ = std::fs::remove_file(&temp_file);

    result
}

fn read_coordinate(nc_file: &netcdf::File, name: &str) -> NetCdfResult<Vec<f64>> {
    let var = nc_file
        .variable(name)
        .ok_or_else(|| NetCdfError::MissingData(format!("{} coordinate", name)))?;

    var.get_values::<f64, _>(..)
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to read {}: {}", name, e)))
}

/// Variables whose last two dimensions are `(lat, lon)`.
fn is_raster_variable(var: &netcdf::Variable) -> bool {
    let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
    dims.len() >= 2 && dims[dims.len() - 2] == LAT && dims[dims.len() - 1] == LON
}

/// Read packed values in the variable's own type, picked from the type of its
/// fill value.
fn read_raster(var: &netcdf::Variable) -> NetCdfResult<RasterData> {
    let name = var.name();
    let err = |e: netcdf::Error| NetCdfError::InvalidFormat(format!("Failed to read {}: {}", name, e));

    let fill = if has_attr(var, "_FillValue") {
        var.attribute_value("_FillValue").and_then(|v| v.ok())
    } else {
        None
    };

    let data = match fill {
        Some(AttributeValue::Schar(_)) => RasterData::I8(var.get_values::<i8, _>(..).map_err(err)?),
        Some(AttributeValue::Uchar(_)) => RasterData::U8(var.get_values::<u8, _>(..).map_err(err)?),
        Some(AttributeValue::Short(_)) => RasterData::I16(var.get_values::<i16, _>(..).map_err(err)?),
        Some(AttributeValue::Int(_)) => RasterData::I32(var.get_values::<i32, _>(..).map_err(err)?),
        Some(AttributeValue::Double(_)) => RasterData::F64(var.get_values::<f64, _>(..).map_err(err)?),
        _ => RasterData::F32(var.get_values::<f32, _>(..).map_err(err)?),
    };

    Ok(data)
}

/// Convert scalar and string attributes; array-valued ones are skipped.
fn read_attributes<'a>(attributes: impl Iterator<Item = netcdf::Attribute<'a>>) -> Attributes {
    let mut out = Attributes::new();
    for attr in attributes {
        let value = match attr.value() {
            Ok(AttributeValue::Schar(v)) => AttrValue::Int(v as i64),
            Ok(AttributeValue::Uchar(v)) => AttrValue::Int(v as i64),
            Ok(AttributeValue::Short(v)) => AttrValue::Int(v as i64),
            Ok(AttributeValue::Ushort(v)) => AttrValue::Int(v as i64),
            Ok(AttributeValue::Int(v)) => AttrValue::Int(v as i64),
            Ok(AttributeValue::Uint(v)) => AttrValue::Int(v as i64),
            Ok(AttributeValue::Longlong(v)) => AttrValue::Int(v),
            Ok(AttributeValue::Float(v)) => AttrValue::Float(v as f64),
            Ok(AttributeValue::Double(v)) => AttrValue::Float(v),
            Ok(AttributeValue::Str(v)) => AttrValue::Text(v),
            _ => continue,
        };
        out.insert(attr.name().to_string(), value);
    }
    out
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Get the optimal temp directory for NetCDF file operations.
///
/// On Linux, uses /dev/shm (memory-backed tmpfs) if available for faster I/O.
/// Falls back to the system temp directory on other platforms or if /dev/shm is unavailable.
fn get_optimal_temp_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        let shm_path = Path::new("/dev/shm");
        if shm_path.exists() && shm_path.is_dir() {
            // Verify we can write to /dev/shm
            let test_path = shm_path.join(format!(".netcdf_test_{}", std::process::id()));
            if std::fs::write(&test_path, b"test").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return shm_path.to_path_buf();
            }
        }
    }

    std::env::temp_dir()
}

/// Generate a unique temp file name for concurrent safety.
/// Uses process ID, thread ID, and a counter to ensure uniqueness.
fn generate_temp_filename() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let pid = std::process::id();
    let tid = std::thread::current().id();
    let count = COUNTER.fetch_add(1, Ordering::Relaxed);

    format!("mur_native_{}_{:?}_{}.nc", pid, tid, count)
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimal_temp_dir() {
        let dir = get_optimal_temp_dir();
        assert!(dir.exists(), "Temp dir should exist");
    }

    #[test]
    fn test_temp_filename_uniqueness() {
        let name1 = generate_temp_filename();
        let name2 = generate_temp_filename();
        assert_ne!(name1, name2, "Temp filenames should be unique");
    }

    #[test]
    fn test_default_options_drop_time_variable() {
        let options = LoadOptions::default();
        assert_eq!(options.drop_variables, vec!["dt_1km_data".to_string()]);
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = load_mur_file(Path::new("/nonexistent/mur.nc"), &LoadOptions::default());
        assert!(result.is_err());
    }
}
