//! Snap a decoded MUR dataset onto the exact reference grid.
//!
//! The coordinate variables in MUR files are single precision, so the grid
//! recovered from them is off by a few parts in 1e9. Two days' rasters only
//! line up if both are published with the same transform, so the recovered
//! grid is thrown away and replaced with the reference one.

use tracing::{debug, info};

use sst_common::dataset::{attrs, GriddedDataset};
use sst_common::product::{ANALYSED_SST_OFFSET, TEMPERATURE_UNIT, TEMPERATURE_VARIABLES, VARIABLES};
use sst_common::{GeoTransform, GridSpec, SstError, SstResult};

/// Replaces a dataset's grid with a fixed reference transform.
#[derive(Debug, Clone)]
pub struct GridAligner {
    reference: GeoTransform,
}

impl Default for GridAligner {
    fn default() -> Self {
        Self {
            reference: GeoTransform::REFERENCE,
        }
    }
}

impl GridAligner {
    /// Align `dataset` in place.
    ///
    /// Afterwards rows run north to south, `dataset.grid` carries the
    /// reference transform bit for bit, the coordinate arrays are generated
    /// from it, and every product variable observes the same grid.
    pub fn align(&self, dataset: &mut GriddedDataset) -> SstResult<()> {
        let (rows, cols) = dataset.shape();
        if rows < 2 || cols < 2 {
            return Err(SstError::Configuration(format!(
                "dataset needs lat and lon coordinates, got {} x {}",
                rows, cols
            )));
        }
        for name in VARIABLES {
            dataset.require(name)?;
        }

        if dataset.lat[0] < dataset.lat[rows - 1] {
            debug!(rows = rows, "Flipping latitude axis to north-up");
            dataset.lat.reverse();
            for variable in &mut dataset.variables {
                variable.data.flip_rows(rows, cols);
            }
        }

        let grid = GridSpec::new(rows, cols, self.reference, dataset.crs);
        dataset.lat = grid.latitudes();
        dataset.lon = grid.longitudes();

        for name in VARIABLES {
            dataset.require_mut(name)?.grid = grid.clone();
        }
        dataset.grid = grid;

        normalize_temperature_units(dataset)?;

        info!(rows = rows, cols = cols, "Aligned dataset to reference grid");
        Ok(())
    }
}

/// Temperatures are published in celsius: the unit label is overwritten and
/// `analysed_sst` gets an offset so its packed values decode in celsius.
fn normalize_temperature_units(dataset: &mut GriddedDataset) -> SstResult<()> {
    for name in TEMPERATURE_VARIABLES {
        dataset
            .require_mut(name)?
            .set_attr(attrs::UNITS, TEMPERATURE_UNIT);
    }
    dataset
        .require_mut("analysed_sst")?
        .set_attr(attrs::ADD_OFFSET, ANALYSED_SST_OFFSET);
    Ok(())
}
