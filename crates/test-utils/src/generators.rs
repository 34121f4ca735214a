//! Synthetic MUR-shaped datasets.
//!
//! Values follow `source_row * 1000 + col` (clamped into the variable's type)
//! so row order can be checked after alignment.

use sst_common::dataset::{attrs, AttrValue, Attributes, GriddedDataset, RasterData};
use sst_common::Crs;

/// Resolution of the synthetic coordinates. Slightly off 0.01 the way the
/// real file's single-precision coordinates are.
pub const DRIFTED_RESOLUTION: f64 = 0.009999999728725104;

/// Ascending (south-up) latitudes and longitudes for a `rows x cols` grid
/// starting at the south-west corner of the globe.
pub fn mur_coordinates(rows: usize, cols: usize) -> (Vec<f64>, Vec<f64>) {
    let lat = (0..rows)
        .map(|i| -89.99 + i as f64 * DRIFTED_RESOLUTION)
        .collect();
    let lon = (0..cols)
        .map(|j| -179.99 + j as f64 * DRIFTED_RESOLUTION)
        .collect();
    (lat, lon)
}

/// Pattern value for a source cell.
pub fn cell_value(row: usize, col: usize) -> i64 {
    (row * 1000 + col) as i64
}

fn pattern<T>(rows: usize, cols: usize, convert: impl Fn(i64) -> T) -> Vec<T> {
    let mut data = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            data.push(convert(cell_value(row, col)));
        }
    }
    data
}

fn attributes(entries: &[(&str, AttrValue)]) -> Attributes {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// A MUR-like dataset with all five product variables, packed as in the real
/// file: `analysed_sst`, `analysis_error` and `sst_anomaly` as int16 kelvin,
/// `mask` and `sea_ice_fraction` as int8.
pub fn mur_dataset(rows: usize, cols: usize) -> GriddedDataset {
    let (lat, lon) = mur_coordinates(rows, cols);
    let i16_data = || RasterData::I16(pattern(rows, cols, |v| v.clamp(-32767, 32767) as i16));
    let i8_data = || RasterData::I8(pattern(rows, cols, |v| (v % 100) as i8));

    let variables = vec![
        (
            "analysed_sst".to_string(),
            i16_data(),
            attributes(&[
                (attrs::FILL_VALUE, AttrValue::Int(-32768)),
                (attrs::SCALE_FACTOR, AttrValue::Float(0.001)),
                (attrs::ADD_OFFSET, AttrValue::Float(298.15)),
                (attrs::UNITS, AttrValue::from("kelvin")),
                ("long_name", AttrValue::from("analysed sea surface temperature")),
            ]),
        ),
        (
            "analysis_error".to_string(),
            i16_data(),
            attributes(&[
                (attrs::FILL_VALUE, AttrValue::Int(-32768)),
                (attrs::SCALE_FACTOR, AttrValue::Float(0.01)),
                (attrs::ADD_OFFSET, AttrValue::Float(0.0)),
                (attrs::UNITS, AttrValue::from("kelvin")),
            ]),
        ),
        (
            "mask".to_string(),
            i8_data(),
            attributes(&[
                (attrs::FILL_VALUE, AttrValue::Int(-128)),
                ("flag_masks", AttrValue::from("1, 2, 4, 8, 16")),
            ]),
        ),
        (
            "sea_ice_fraction".to_string(),
            i8_data(),
            attributes(&[
                (attrs::FILL_VALUE, AttrValue::Int(-128)),
                (attrs::SCALE_FACTOR, AttrValue::Float(0.01)),
                (attrs::ADD_OFFSET, AttrValue::Float(0.0)),
                (attrs::UNITS, AttrValue::from("fraction (between 0 and 1)")),
            ]),
        ),
        (
            "sst_anomaly".to_string(),
            i16_data(),
            attributes(&[
                (attrs::FILL_VALUE, AttrValue::Int(-32768)),
                (attrs::SCALE_FACTOR, AttrValue::Float(0.001)),
                (attrs::ADD_OFFSET, AttrValue::Float(0.0)),
                (attrs::UNITS, AttrValue::from("kelvin")),
            ]),
        ),
    ];

    let global = attributes(&[("title", AttrValue::from("Synthetic MUR L4 analysis"))]);

    GriddedDataset::from_coords(lat, lon, Crs::WGS84, variables, global)
        .expect("synthetic coordinates are valid")
}
