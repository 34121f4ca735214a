//! Many STAC items as one stac-geoparquet file.
//!
//! Encoding goes through the `stac` crate: items are converted to its model
//! and written with [`stac::geoparquet::into_writer`], which produces WKB
//! geometry, nested `assets`/`links` columns and the GeoParquet `geo` key in
//! the Parquet footer.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use bytes::Bytes;
use tracing::debug;

use crate::{CatalogResult, Item};

fn to_stac(item: &Item) -> CatalogResult<stac::Item> {
    Ok(serde_json::from_value(serde_json::to_value(item)?)?)
}

fn from_stac(item: stac::Item) -> CatalogResult<Item> {
    Ok(serde_json::from_value(serde_json::to_value(item)?)?)
}

fn write_items<W: Write + Send>(writer: W, items: &[Item]) -> CatalogResult<()> {
    let items = items.iter().map(to_stac).collect::<CatalogResult<Vec<_>>>()?;
    stac::geoparquet::into_writer(writer, stac::ItemCollection::from(items))?;
    Ok(())
}

/// Serialize items into GeoParquet bytes, one row per item in the order
/// given. Output depends only on the items and their order.
pub fn to_parquet_bytes(items: &[Item]) -> CatalogResult<Vec<u8>> {
    let mut bytes = Vec::new();
    write_items(&mut bytes, items)?;

    debug!(rows = items.len(), size = bytes.len(), "Serialized GeoParquet");
    Ok(bytes)
}

/// Write items to a GeoParquet file on local disk.
pub fn write_parquet_file(path: &Path, items: &[Item]) -> CatalogResult<()> {
    let file = File::create(path)?;
    write_items(file, items)?;

    debug!(rows = items.len(), path = %path.display(), "Wrote GeoParquet file");
    Ok(())
}

/// Read items back out of a GeoParquet file.
pub fn read_parquet_items(data: Bytes) -> CatalogResult<Vec<Item>> {
    let collection = stac::geoparquet::from_reader(data)?;
    collection.items.into_iter().map(from_stac).collect()
}
