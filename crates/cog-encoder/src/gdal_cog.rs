//! GDAL-backed COG encoder.
//!
//! The raster is first built in a `MEM` dataset, then copied through the
//! `COG` driver into a `/vsimem/` file whose bytes are returned. Band data
//! is copied into the `MEM` dataset a strip of rows at a time.

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use gdal::raster::{Buffer, GdalType, RasterCreationOptions};
use gdal::spatial_ref::SpatialRef;
use gdal::{DriverManager, Metadata};
use tracing::debug;

use sst_common::dataset::RasterData;

use crate::{EncodeRequest, EncodeResult, RasterEncoder};

/// Rows per strip when filling the `MEM` band.
const STRIP_ROWS: usize = 512;

/// Encodes through GDAL's `COG` driver.
#[derive(Debug, Clone, Default)]
pub struct GdalCogEncoder;

impl GdalCogEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl RasterEncoder for GdalCogEncoder {
    fn encode(&self, request: &EncodeRequest<'_>) -> EncodeResult<Bytes> {
        request.validate()?;

        match &request.variable.data {
            RasterData::I8(values) => encode_typed(values, request),
            RasterData::U8(values) => encode_typed(values, request),
            RasterData::I16(values) => encode_typed(values, request),
            RasterData::I32(values) => encode_typed(values, request),
            RasterData::F32(values) => encode_typed(values, request),
            RasterData::F64(values) => encode_typed(values, request),
        }
    }
}

fn encode_typed<T: GdalType + Copy>(values: &[T], request: &EncodeRequest<'_>) -> EncodeResult<Bytes> {
    let grid = request.grid;
    let (rows, cols) = grid.shape();

    let mem_driver = DriverManager::get_driver_by_name("MEM")?;
    let mut dataset = mem_driver.create_with_band_type::<T, _>("", cols, rows, 1)?;
    dataset.set_geo_transform(&grid.transform.to_gdal())?;
    dataset.set_spatial_ref(&SpatialRef::from_epsg(grid.crs.epsg)?)?;

    {
        let mut band = dataset.rasterband(1)?;
        for (strip, chunk) in values.chunks(STRIP_ROWS * cols).enumerate() {
            let strip_rows = chunk.len() / cols;
            let mut buffer = Buffer::new((cols, strip_rows), chunk.to_vec());
            band.write((0, (strip * STRIP_ROWS) as isize), (cols, strip_rows), &mut buffer)?;
        }

        band.set_no_data_value(request.nodata)?;
        if let Some(scale) = request.metadata.scale {
            band.set_scale(scale)?;
        }
        if let Some(offset) = request.metadata.offset {
            band.set_offset(offset)?;
        }
        if let Some(unit) = &request.metadata.unit {
            band.set_metadata_item("units", unit, "")?;
        }
        band.set_description(&request.variable.name)?;
    }

    let mut options = RasterCreationOptions::new();
    options.set_name_value("COMPRESS", &request.options.compression)?;

    let vsi_path = vsimem_path(&request.variable.name);
    let cog_driver = DriverManager::get_driver_by_name("COG")?;
    let copy = dataset.create_copy(&cog_driver, &vsi_path, &options)?;
    // The COG driver finishes writing when the dataset is closed.
    drop(copy);

    let bytes = gdal::vsi::get_vsi_mem_file_bytes_owned(&vsi_path)?;

    debug!(
        variable = %request.variable.name,
        rows = rows,
        cols = cols,
        size = bytes.len(),
        "Encoded COG"
    );

    Ok(Bytes::from(bytes))
}

/// Unique in-memory path, safe across threads.
fn vsimem_path(name: &str) -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let count = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("/vsimem/cog_{}_{}_{}.tif", std::process::id(), count, name)
}
