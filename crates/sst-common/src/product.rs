//! Constants describing the GHRSST MUR v2 product and its outputs.

use chrono::NaiveDate;

/// Remote archive holding the daily NetCDF files (Earthdata login required).
pub const JPL_BASE: &str =
    "https://archive.podaac.earthdata.nasa.gov/podaac-ops-cumulus-protected/MUR-JPL-L4-GLOB-v4.1/";

/// Sentinel accepted in place of a local folder to mean "the JPL archive".
pub const JPL_SENTINEL: &str = "JPL";

/// Raster variables written as COGs, in output order.
pub const VARIABLES: [&str; 5] = [
    "analysed_sst",
    "analysis_error",
    "mask",
    "sea_ice_fraction",
    "sst_anomaly",
];

/// Time-valued variable that is never loaded or written.
pub const EXCLUDED_VARIABLES: [&str; 1] = ["dt_1km_data"];

/// Variables whose unit is overridden to [`TEMPERATURE_UNIT`].
pub const TEMPERATURE_VARIABLES: [&str; 3] = ["analysed_sst", "sst_anomaly", "analysis_error"];

pub const TEMPERATURE_UNIT: &str = "celsius";

/// Offset applied to `analysed_sst` so scaled values read in celsius.
pub const ANALYSED_SST_OFFSET: i64 = 25;

pub const COG_SUFFIX_EXTENSION: &str = ".tif";
pub const STAC_ITEM_SUFFIX: &str = ".stac-item.json";
pub const PARQUET_FILENAME: &str = "ghrsst-mur-v2.parquet";

pub const MEDIA_TYPE_COG: &str = "image/tiff; application=geotiff; profile=cloud-optimized";
pub const MEDIA_TYPE_JSON: &str = "application/json";
pub const MEDIA_TYPE_NETCDF: &str = "application/netcdf";
pub const MEDIA_TYPE_PARQUET: &str = "application/vnd.apache.parquet";

/// Source filename for a date, e.g.
/// `20231106090000-JPL-L4_GHRSST-SSTfnd-MUR-GLOB-v02.0-fv04.1.nc`.
pub fn source_filename(date: NaiveDate) -> String {
    format!(
        "{}090000-JPL-L4_GHRSST-SSTfnd-MUR-GLOB-v02.0-fv04.1.nc",
        date.format("%Y%m%d")
    )
}

/// `YYYY/MM/DD` folder for a date.
pub fn date_folder(date: NaiveDate) -> String {
    date.format("%Y/%m/%d").to_string()
}

/// Artifact suffix for a variable, e.g. `_analysed_sst.tif`.
pub fn cog_suffix(variable: &str) -> String {
    format!("_{}{}", variable, COG_SUFFIX_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_filename() {
        let date = NaiveDate::from_ymd_opt(2023, 11, 6).unwrap();
        assert_eq!(
            source_filename(date),
            "20231106090000-JPL-L4_GHRSST-SSTfnd-MUR-GLOB-v02.0-fv04.1.nc"
        );
        assert_eq!(date_folder(date), "2023/11/06");
    }

    #[test]
    fn test_excluded_not_in_outputs() {
        for excluded in EXCLUDED_VARIABLES {
            assert!(!VARIABLES.contains(&excluded));
        }
    }
}
