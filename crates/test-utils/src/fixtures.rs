//! Known facts about the MUR fixture file.

/// Daily MUR file used by the fixture-backed tests. Not checked in; place it
/// in `crates/netcdf-parser/testdata/` or point `TEST_DATA_DIR` at it.
pub const MUR_FIXTURE_FILE: &str = "20231106090000-JPL-L4_GHRSST-SSTfnd-MUR-GLOB-v02.0-fv04.1.nc";

/// Date of [`MUR_FIXTURE_FILE`] as `(year, month, day)`.
pub const MUR_FIXTURE_DATE: (i32, u32, u32) = (2023, 11, 6);

/// Full-resolution MUR grid shape `(rows, cols)`.
pub const MUR_SHAPE: (usize, usize) = (17999, 36000);

/// Transform recovered from the fixture's stored coordinates, as
/// `(a, b, c, d, e, f)`. Slightly off the reference because the
/// coordinates are stored as single-precision floats.
pub const MUR_NATIVE_TRANSFORM: [f64; 6] = [
    0.009999999728725104,
    0.0,
    -179.99500549302843,
    0.0,
    0.009999999762614682,
    -89.99499786365084,
];
