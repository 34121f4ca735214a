//! Grid specifications for regular lat/lon rasters.
//!
//! A grid is a shape plus an affine transform plus a CRS. The MUR product is
//! published on a fixed 0.01° global grid; the coordinate variables stored in
//! the NetCDF files drift from that grid by single-precision rounding, so the
//! transform recovered from them is only approximately right.

use crate::{BoundingBox, Crs};
use serde::{Deserialize, Serialize};

/// Six-coefficient affine transform in `(a, b, c, d, e, f)` order:
///
/// ```text
/// x = a * col + b * row + c
/// y = d * col + e * row + f
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl GeoTransform {
    /// The exact MUR reference grid: 0.01° pixels, top-left corner at
    /// (-180°, 89.995°), latitude decreasing down the rows.
    pub const REFERENCE: GeoTransform = GeoTransform {
        a: 0.01,
        b: 0.0,
        c: -180.0,
        d: 0.0,
        e: -0.01,
        f: 89.995,
    };

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Full 3x3 affine matrix, row-major.
    pub fn to_affine9(&self) -> [f64; 9] {
        [self.a, self.b, self.c, self.d, self.e, self.f, 0.0, 0.0, 1.0]
    }

    /// GDAL ordering: `(c, a, b, f, d, e)`.
    pub fn to_gdal(&self) -> [f64; 6] {
        [self.c, self.a, self.b, self.f, self.d, self.e]
    }

    /// Pixel-center coordinate of a (col, row) index.
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        let x = col as f64 + 0.5;
        let y = row as f64 + 0.5;
        (
            self.a * x + self.b * y + self.c,
            self.d * x + self.e * y + self.f,
        )
    }

    /// Same grid with the row order reversed.
    pub fn flip_rows(&self, rows: usize) -> Self {
        Self {
            e: -self.e,
            f: self.f + self.e * rows as f64,
            ..*self
        }
    }

    pub fn is_north_up(&self) -> bool {
        self.b == 0.0 && self.d == 0.0 && self.e < 0.0
    }
}

/// Specification of a regular lat/lon grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of rows (latitude)
    pub rows: usize,
    /// Number of columns (longitude)
    pub cols: usize,
    pub transform: GeoTransform,
    pub crs: Crs,
}

impl GridSpec {
    pub fn new(rows: usize, cols: usize, transform: GeoTransform, crs: Crs) -> Self {
        Self {
            rows,
            cols,
            transform,
            crs,
        }
    }

    /// The reference grid with the given shape and CRS.
    pub fn reference(rows: usize, cols: usize, crs: Crs) -> Self {
        Self::new(rows, cols, GeoTransform::REFERENCE, crs)
    }

    /// Recover a grid from pixel-center coordinate arrays.
    ///
    /// Resolution is the mean spacing along each axis and the origin sits half
    /// a pixel before the first center. Returns `None` when either axis has
    /// fewer than two points.
    pub fn from_coords(lat: &[f64], lon: &[f64], crs: Crs) -> Option<Self> {
        let (x_res, x_origin) = axis_transform(lon)?;
        let (y_res, y_origin) = axis_transform(lat)?;

        Some(Self::new(
            lat.len(),
            lon.len(),
            GeoTransform::new(x_res, 0.0, x_origin, 0.0, y_res, y_origin),
            crs,
        ))
    }

    /// True when the transform matches the reference transform exactly.
    pub fn is_canonical(&self) -> bool {
        self.transform == GeoTransform::REFERENCE
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Pixel-center longitudes, one per column.
    pub fn longitudes(&self) -> Vec<f64> {
        (0..self.cols)
            .map(|col| self.transform.pixel_center(col, 0).0)
            .collect()
    }

    /// Pixel-center latitudes, one per row.
    pub fn latitudes(&self) -> Vec<f64> {
        (0..self.rows)
            .map(|row| self.transform.pixel_center(0, row).1)
            .collect()
    }

    /// Outer edges of the grid.
    pub fn bbox(&self) -> BoundingBox {
        let t = &self.transform;
        let x0 = t.c;
        let x1 = t.c + t.a * self.cols as f64;
        let y0 = t.f;
        let y1 = t.f + t.e * self.rows as f64;

        BoundingBox {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
        }
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

fn axis_transform(centers: &[f64]) -> Option<(f64, f64)> {
    if centers.len() < 2 {
        return None;
    }
    let first = centers[0];
    let last = centers[centers.len() - 1];
    let res = (last - first) / (centers.len() - 1) as f64;
    Some((res, first - res / 2.0))
}
