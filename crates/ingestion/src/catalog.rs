//! The per-day STAC item.

use bytes::Bytes;
use chrono::NaiveDate;
use tracing::{info, instrument};

use sst_common::dataset::{attrs, GriddedDataset, Variable};
use sst_common::paths::{file_stem, input_path, output_key};
use sst_common::product::{
    JPL_SENTINEL, MEDIA_TYPE_COG, MEDIA_TYPE_JSON, MEDIA_TYPE_NETCDF, STAC_ITEM_SUFFIX, VARIABLES,
};
use sst_common::time::{end_of_day, start_of_day};
use sst_common::{SstError, SstResult};
use stac_catalog::item::REL_CANONICAL;
use stac_catalog::{Asset, Item, ItemBuilder, Link, RasterBand};
use storage::SharedStorage;

use crate::artifacts::ArtifactReport;

/// Path of a date's STAC item relative to the output root.
pub fn catalog_key(date: NaiveDate) -> String {
    output_key(date, STAC_ITEM_SUFFIX)
}

/// `raster:bands` for a variable, taken from its attributes. Scale, offset
/// and unit are left out when the variable has none.
///
/// Call this on the aligned dataset: temperatures are then described in
/// celsius with the shifted offset, matching the values written to the COGs,
/// not the kelvin metadata of the source file.
pub fn raster_bands(variable: &Variable) -> SstResult<Vec<RasterBand>> {
    Ok(vec![RasterBand {
        nodata: variable.fill_value()? as i64,
        data_type: variable.data.dtype_name().to_string(),
        scale: variable.attr_f64(attrs::SCALE_FACTOR),
        offset: variable.attr_f64(attrs::ADD_OFFSET),
        unit: variable
            .attr(attrs::UNITS)
            .and_then(|v| v.as_str())
            .map(str::to_string),
    }])
}

/// Builds and persists one STAC item per day.
pub struct CatalogWriter {
    storage: SharedStorage,
}

impl CatalogWriter {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    /// Build the item for `date`. `artifacts` must be in [`VARIABLES`] order.
    pub fn build_item(
        &self,
        dataset: &GriddedDataset,
        artifacts: &ArtifactReport,
        date: NaiveDate,
    ) -> SstResult<Item> {
        if artifacts.artifacts.len() != VARIABLES.len() {
            return Err(SstError::Catalog(format!(
                "expected {} artifacts, got {}",
                VARIABLES.len(),
                artifacts.artifacts.len()
            )));
        }

        let key = catalog_key(date);
        let mut builder = ItemBuilder::new(file_stem(&key), &dataset.grid)
            .datetime(start_of_day(date))
            .time_range(start_of_day(date), end_of_day(date))
            .link(
                Link::new(REL_CANONICAL, input_path(JPL_SENTINEL, date))
                    .with_media_type(MEDIA_TYPE_NETCDF)
                    .with_title("Original NetCDF"),
            );

        for (name, artifact) in VARIABLES.iter().zip(&artifacts.artifacts) {
            if artifact.variable != *name {
                return Err(SstError::Catalog(format!(
                    "artifact for {} found where {} was expected",
                    artifact.variable, name
                )));
            }
            let asset = Asset::new(self.storage.public_url(&artifact.path))
                .with_title(*name)
                .with_media_type(MEDIA_TYPE_COG)
                .with_role("data")
                .with_raster_bands(raster_bands(dataset.require(name)?)?);
            builder = builder.asset(*name, asset);
        }

        let mut item = builder.build()?;
        item.set_self_href(self.storage.public_url(&key));
        Ok(item)
    }

    /// Build the item and write it to its canonical location, replacing any
    /// previous version. Returns the item's self href.
    #[instrument(skip(self, dataset, artifacts), fields(date = %date))]
    pub async fn write(
        &self,
        dataset: &GriddedDataset,
        artifacts: &ArtifactReport,
        date: NaiveDate,
    ) -> SstResult<String> {
        let key = catalog_key(date);
        let item = self.build_item(dataset, artifacts, date)?;
        let body = item.to_json_bytes()?;

        info!(path = %self.storage.join_path(&key), "Writing STAC item");
        self.storage.ensure_parent(&key).await?;
        self.storage.write(&key, Bytes::from(body), MEDIA_TYPE_JSON).await?;

        Ok(item
            .self_href()
            .map(str::to_string)
            .unwrap_or_else(|| self.storage.public_url(&key)))
    }
}
