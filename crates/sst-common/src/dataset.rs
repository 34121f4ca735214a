//! In-memory representation of a decoded multi-variable gridded dataset.
//!
//! Data is kept in its packed on-disk integer form (no mask-and-scale); the
//! scale, offset and fill value travel alongside as attributes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Crs, GridSpec, SstError, SstResult};

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl AttrValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Int(v) => Some(*v as f64),
            AttrValue::Float(v) => Some(*v),
            AttrValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Text(v.to_string())
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

/// Ordered attribute map.
pub type Attributes = BTreeMap<String, AttrValue>;

/// Well-known CF attribute names.
pub mod attrs {
    pub const FILL_VALUE: &str = "_FillValue";
    pub const SCALE_FACTOR: &str = "scale_factor";
    pub const ADD_OFFSET: &str = "add_offset";
    pub const UNITS: &str = "units";
}

/// Raw raster values for one variable, row-major.
#[derive(Debug, Clone, PartialEq)]
pub enum RasterData {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl RasterData {
    pub fn len(&self) -> usize {
        match self {
            RasterData::I8(v) => v.len(),
            RasterData::U8(v) => v.len(),
            RasterData::I16(v) => v.len(),
            RasterData::I32(v) => v.len(),
            RasterData::F32(v) => v.len(),
            RasterData::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numpy-style dtype name, as used in `raster:bands`.
    pub fn dtype_name(&self) -> &'static str {
        match self {
            RasterData::I8(_) => "int8",
            RasterData::U8(_) => "uint8",
            RasterData::I16(_) => "int16",
            RasterData::I32(_) => "int32",
            RasterData::F32(_) => "float32",
            RasterData::F64(_) => "float64",
        }
    }

    /// Reverse the row order of a `rows x cols` raster in place.
    pub fn flip_rows(&mut self, rows: usize, cols: usize) {
        match self {
            RasterData::I8(v) => flip_rows(v, rows, cols),
            RasterData::U8(v) => flip_rows(v, rows, cols),
            RasterData::I16(v) => flip_rows(v, rows, cols),
            RasterData::I32(v) => flip_rows(v, rows, cols),
            RasterData::F32(v) => flip_rows(v, rows, cols),
            RasterData::F64(v) => flip_rows(v, rows, cols),
        }
    }
}

fn flip_rows<T>(data: &mut [T], rows: usize, cols: usize) {
    for top in 0..rows / 2 {
        let bottom = rows - 1 - top;
        let (head, tail) = data.split_at_mut(bottom * cols);
        head[top * cols..(top + 1) * cols].swap_with_slice(&mut tail[..cols]);
    }
}

/// One data variable together with its cached grid reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub data: RasterData,
    pub attrs: Attributes,
    /// Grid as last observed by this variable. Not updated automatically
    /// when the dataset's coordinates change.
    pub grid: GridSpec,
}

impl Variable {
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    pub fn attr_f64(&self, name: &str) -> Option<f64> {
        self.attrs.get(name).and_then(AttrValue::as_f64)
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<AttrValue>) {
        self.attrs.insert(name.to_string(), value.into());
    }

    /// The fill value, required for every raster variable in the product.
    pub fn fill_value(&self) -> SstResult<f64> {
        self.attr_f64(attrs::FILL_VALUE).ok_or_else(|| {
            SstError::Configuration(format!("variable {} has no _FillValue", self.name))
        })
    }
}

/// A decoded gridded dataset: shared coordinates plus named variables.
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedDataset {
    /// Pixel-center latitudes, one per row
    pub lat: Vec<f64>,
    /// Pixel-center longitudes, one per column
    pub lon: Vec<f64>,
    pub crs: Crs,
    /// Dataset-level grid, the authority for downstream consumers
    pub grid: GridSpec,
    /// Variables in file order
    pub variables: Vec<Variable>,
    pub attrs: Attributes,
}

impl GriddedDataset {
    /// Assemble a dataset from coordinates, deriving the grid from them.
    ///
    /// Every variable starts out observing the derived grid.
    pub fn from_coords(
        lat: Vec<f64>,
        lon: Vec<f64>,
        crs: Crs,
        variables: Vec<(String, RasterData, Attributes)>,
        attrs: Attributes,
    ) -> SstResult<Self> {
        let grid = GridSpec::from_coords(&lat, &lon, crs).ok_or_else(|| {
            SstError::Configuration(
                "lat/lon coordinates need at least two points each".to_string(),
            )
        })?;

        let variables = variables
            .into_iter()
            .map(|(name, data, attrs)| {
                if data.len() != grid.len() {
                    return Err(SstError::Decode(format!(
                        "variable {} has {} values, grid has {}",
                        name,
                        data.len(),
                        grid.len()
                    )));
                }
                Ok(Variable {
                    name,
                    data,
                    attrs,
                    grid: grid.clone(),
                })
            })
            .collect::<SstResult<Vec<_>>>()?;

        Ok(Self {
            lat,
            lon,
            crs,
            grid,
            variables,
            attrs,
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.lat.len(), self.lon.len())
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables.iter_mut().find(|v| v.name == name)
    }

    /// Look up a variable that the product guarantees to exist.
    pub fn require(&self, name: &str) -> SstResult<&Variable> {
        self.variable(name)
            .ok_or_else(|| SstError::Configuration(format!("variable {} not found in dataset", name)))
    }

    pub fn require_mut(&mut self, name: &str) -> SstResult<&mut Variable> {
        self.variable_mut(name)
            .ok_or_else(|| SstError::Configuration(format!("variable {} not found in dataset", name)))
    }
}
