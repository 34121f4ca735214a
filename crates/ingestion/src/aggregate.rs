//! Rebuild the GeoParquet catalog from a date range of STAC items.
//!
//! Every run fetches every date in the range and replaces the output file.
//! Dates whose item cannot be fetched or parsed are skipped; a run where
//! nothing survives is an error.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use tracing::{info, instrument};

use sst_common::paths::join;
use sst_common::product::{MEDIA_TYPE_PARQUET, PARQUET_FILENAME};
use sst_common::{DateRange, SstError, SstResult};
use stac_catalog::{to_parquet_bytes, write_parquet_file, Item};
use storage::SharedStorage;

use crate::catalog::catalog_key;

/// Maximum simultaneous item fetches.
pub const DEFAULT_FETCH_CONCURRENCY: usize = 16;

/// Reads one STAC item given its path relative to the item root.
#[async_trait]
pub trait ItemFetcher: Send + Sync {
    /// Where `key` is fetched from, for logging.
    fn href(&self, key: &str) -> String;

    async fn fetch(&self, key: &str) -> SstResult<Item>;
}

/// Fetches items over HTTP from a public base URL.
pub struct HttpItemFetcher {
    client: Client,
    base_url: String,
}

impl HttpItemFetcher {
    pub fn new(base_url: impl Into<String>) -> SstResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| SstError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl ItemFetcher for HttpItemFetcher {
    fn href(&self, key: &str) -> String {
        join(&self.base_url, key)
    }

    async fn fetch(&self, key: &str) -> SstResult<Item> {
        let href = self.href(key);
        let response = self
            .client
            .get(&href)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SstError::Http(e.to_string()))?;
        let body = response
            .bytes()
            .await
            .map_err(|e| SstError::Http(e.to_string()))?;
        Ok(Item::from_json_slice(&body)?)
    }
}

/// Reads items through a storage backend.
pub struct StorageItemFetcher {
    storage: SharedStorage,
}

impl StorageItemFetcher {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl ItemFetcher for StorageItemFetcher {
    fn href(&self, key: &str) -> String {
        self.storage.public_url(key)
    }

    async fn fetch(&self, key: &str) -> SstResult<Item> {
        let body = self.storage.read(key).await?;
        Ok(Item::from_json_slice(&body)?)
    }
}

/// How the output file reaches its destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStrategy {
    /// Serialize in memory and write straight to the destination.
    Direct,
    /// Build the file in a local scratch directory, then copy it over.
    Staged { scratch_dir: PathBuf },
}

impl WriteStrategy {
    /// Staging only applies to remote destinations.
    pub fn for_destination(write_tempfile: bool, remote: bool, scratch_dir: PathBuf) -> Self {
        if write_tempfile && remote {
            WriteStrategy::Staged { scratch_dir }
        } else {
            WriteStrategy::Direct
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationReport {
    pub item_count: usize,
    /// Hrefs that could not be fetched, in date order
    pub skipped: Vec<String>,
    /// Full location of the written file
    pub output: String,
}

pub struct BatchAggregator {
    fetcher: Box<dyn ItemFetcher>,
    destination: SharedStorage,
    strategy: WriteStrategy,
    concurrency: usize,
}

impl BatchAggregator {
    pub fn new(fetcher: Box<dyn ItemFetcher>, destination: SharedStorage, strategy: WriteStrategy) -> Self {
        Self {
            fetcher,
            destination,
            strategy,
            concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fetch every item in `range` and write them as one GeoParquet file.
    #[instrument(skip(self), fields(start = %range.start, end = %range.end))]
    pub async fn aggregate(&self, range: &DateRange) -> SstResult<AggregationReport> {
        info!(
            days = range.len(),
            strategy = ?self.strategy,
            output = %self.destination.join_path(PARQUET_FILENAME),
            "Aggregating STAC items"
        );

        let (mut items, skipped) = self.fetch_all(range).await;
        let output = self.destination.join_path(PARQUET_FILENAME);

        if items.is_empty() {
            return Err(SstError::AggregationEmpty(format!(
                "No items to write to parquet for {} to {}",
                range.start, range.end
            )));
        }

        // Completion order is arbitrary; sort so output depends only on the set.
        items.sort_by(|a, b| a.id.cmp(&b.id));

        info!(items = items.len(), output = %output, "Writing items");
        self.write(items.as_slice()).await?;

        Ok(AggregationReport {
            item_count: items.len(),
            skipped,
            output,
        })
    }

    async fn fetch_all(&self, range: &DateRange) -> (Vec<Item>, Vec<String>) {
        let results = stream::iter(range.dates())
            .map(|date| async move {
                let key = catalog_key(date);
                match self.fetcher.fetch(&key).await {
                    Ok(item) => Ok(item),
                    Err(e) => Err((date, self.fetcher.href(&key), e)),
                }
            })
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        let mut items = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(item) => items.push(item),
                Err((date, href, e)) => {
                    info!(href = %href, error = %e, "Skipping: {}", href);
                    failures.push((date, href));
                }
            }
        }
        failures.sort();

        (items, failures.into_iter().map(|(_, href)| href).collect())
    }

    async fn write(&self, items: &[Item]) -> SstResult<()> {
        let bytes = match &self.strategy {
            WriteStrategy::Direct => Bytes::from(to_parquet_bytes(items)?),
            WriteStrategy::Staged { scratch_dir } => {
                tokio::fs::create_dir_all(scratch_dir).await?;
                let temp_path = scratch_dir.join(PARQUET_FILENAME);
                info!(path = %temp_path.display(), "Writing to tempfile");

                let owned = items.to_vec();
                let path = temp_path.clone();
                tokio::task::spawn_blocking(move || write_parquet_file(&path, &owned))
                    .await
                    .map_err(|e| SstError::Catalog(format!("parquet task failed: {}", e)))??;

                info!(
                    from = %temp_path.display(),
                    to = %self.destination.join_path(PARQUET_FILENAME),
                    "Copying tempfile to destination"
                );
                let staged = Bytes::from(tokio::fs::read(&temp_path).await?);
                tokio::fs::remove_file(&temp_path).await?;
                staged
            }
        };

        self.destination
            .write(PARQUET_FILENAME, bytes, MEDIA_TYPE_PARQUET)
            .await?;
        Ok(())
    }
}
