//! GeoParquet output read back through the parquet footer and the item reader.

use bytes::Bytes;
use chrono::{NaiveDate, TimeZone, Utc};
use parquet::file::reader::{FileReader, SerializedFileReader};
use sst_common::{Crs, GridSpec};
use stac_catalog::{
    read_parquet_items, to_parquet_bytes, write_parquet_file, Asset, Item, ItemBuilder, RasterBand,
};

fn item_for(day: u32) -> Item {
    let grid = GridSpec::reference(17999, 36000, Crs::WGS84);
    let date = NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
    let start = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap());
    let end = Utc.from_utc_datetime(&date.and_hms_opt(23, 59, 59).unwrap());

    let mut item = ItemBuilder::new(format!("{}090000-item", date.format("%Y%m%d")), &grid)
        .datetime(start)
        .time_range(start, end)
        .asset(
            "analysed_sst",
            Asset::new(format!("https://example.com/{}.tif", day)).with_raster_bands(vec![
                RasterBand {
                    nodata: -32768,
                    data_type: "int16".to_string(),
                    scale: Some(0.001),
                    offset: Some(25.0),
                    unit: Some("celsius".to_string()),
                },
            ]),
        )
        .build()
        .unwrap();
    item.set_self_href(format!("https://example.com/{}.json", day));
    item
}

fn footer_keys(bytes: Vec<u8>) -> Vec<(String, Option<String>)> {
    let reader = SerializedFileReader::new(Bytes::from(bytes)).unwrap();
    reader
        .metadata()
        .file_metadata()
        .key_value_metadata()
        .map(|kv| kv.iter().map(|k| (k.key.clone(), k.value.clone())).collect())
        .unwrap_or_default()
}

#[test]
fn test_geo_key_in_parquet_footer() {
    let items: Vec<Item> = (1..=2).map(item_for).collect();
    let keys = footer_keys(to_parquet_bytes(&items).unwrap());

    let geo = keys
        .iter()
        .find(|(key, _)| key == "geo")
        .and_then(|(_, value)| value.clone())
        .unwrap_or_else(|| panic!("no geo key in footer: {:?}", keys));
    let geo: serde_json::Value = serde_json::from_str(&geo).unwrap();
    assert_eq!(geo["primary_column"], "geometry");
    assert_eq!(geo["columns"]["geometry"]["encoding"], "WKB");
}

#[test]
fn test_staged_file_has_geo_key_too() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ghrsst-mur-v2.parquet");
    write_parquet_file(&path, &[item_for(1)]).unwrap();

    let keys = footer_keys(std::fs::read(&path).unwrap());
    assert!(keys.iter().any(|(key, _)| key == "geo"), "{:?}", keys);
}

#[test]
fn test_items_survive_round_trip() {
    let items: Vec<Item> = (1..=3).map(item_for).collect();
    let read = read_parquet_items(Bytes::from(to_parquet_bytes(&items).unwrap())).unwrap();

    assert_eq!(read.len(), 3);
    let ids: Vec<&str> = read.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["20250101090000-item", "20250102090000-item", "20250103090000-item"]);

    let second = &read[1];
    assert_eq!(
        second.properties.start_datetime,
        Some(Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap())
    );
    assert_eq!(second.assets["analysed_sst"].href, "https://example.com/2.tif");
    assert_eq!(second.assets["analysed_sst"].raster_bands[0].unit.as_deref(), Some("celsius"));
    assert_eq!(second.self_href(), Some("https://example.com/2.json"));
    for (a, b) in second.bbox.iter().zip([-180.0, -89.995, 180.0, 89.995]) {
        assert!((a - b).abs() < 1e-9, "{:?}", second.bbox);
    }
}

#[test]
fn test_bytes_are_deterministic() {
    let items: Vec<Item> = (1..=2).map(item_for).collect();
    assert_eq!(to_parquet_bytes(&items).unwrap(), to_parquet_bytes(&items).unwrap());
}

#[test]
fn test_file_matches_bytes() {
    let items: Vec<Item> = (1..=2).map(item_for).collect();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ghrsst-mur-v2.parquet");

    write_parquet_file(&path, &items).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), to_parquet_bytes(&items).unwrap());
}
