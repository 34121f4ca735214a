//! Band metadata carried into the GeoTIFF.

use sst_common::dataset::{AttrValue, Attributes};

/// Attribute names the encoder reads. The pipeline renames the CF attributes
/// (`scale_factor`, `add_offset`, `_FillValue`) to these before encoding.
pub const SCALES: &str = "scales";
pub const OFFSETS: &str = "offsets";
pub const UNITS: &str = "units";
pub const NODATA: &str = "nodata";

/// Per-band scale, offset, unit and nodata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RasterMetadata {
    pub nodata: Option<f64>,
    pub scale: Option<f64>,
    pub offset: Option<f64>,
    pub unit: Option<String>,
}

impl RasterMetadata {
    /// Read the encoder-facing attribute names from an attribute map.
    pub fn from_attributes(attrs: &Attributes) -> Self {
        Self {
            nodata: attrs.get(NODATA).and_then(AttrValue::as_f64),
            scale: attrs.get(SCALES).and_then(AttrValue::as_f64),
            offset: attrs.get(OFFSETS).and_then(AttrValue::as_f64),
            unit: attrs
                .get(UNITS)
                .and_then(|v| v.as_str())
                .map(str::to_string),
        }
    }
}
