//! Shared fakes for ingestion integration tests.
//!
//! The pipeline's format-specific pieces are replaced with in-memory
//! versions so tests run without NetCDF, GDAL or network access.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;

use cog_encoder::{EncodeRequest, EncodeResult, RasterEncoder};
use ingestion::{Collaborators, DatasetLoader, ItemFetcher, SourceRequest, StaticToken};
use sst_common::{GriddedDataset, GridSpec, SstError, SstResult};
use stac_catalog::Item;
use test_utils::mur_dataset;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Returns a synthetic MUR dataset and counts how often it was asked.
pub struct CountingLoader {
    rows: usize,
    cols: usize,
    calls: AtomicUsize,
    requests: Mutex<Vec<SourceRequest>>,
    missing: bool,
}

impl CountingLoader {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            missing: false,
        }
    }

    /// A loader for which every source file is absent.
    pub fn missing() -> Self {
        Self {
            missing: true,
            ..Self::new(1, 1)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<SourceRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DatasetLoader for CountingLoader {
    async fn load(&self, request: &SourceRequest) -> SstResult<GriddedDataset> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if self.missing {
            return Err(SstError::SourceNotFound(request.location.clone()));
        }
        Ok(mur_dataset(self.rows, self.cols))
    }
}

/// What the encoder was handed for one variable.
#[derive(Debug, Clone)]
pub struct EncodeCall {
    pub variable: String,
    pub grid: GridSpec,
    pub nodata: Option<f64>,
    pub scale: Option<f64>,
    pub offset: Option<f64>,
    pub unit: Option<String>,
}

/// Records encode calls and returns a small TIFF-looking payload.
#[derive(Default)]
pub struct RecordingEncoder {
    calls: Mutex<Vec<EncodeCall>>,
    fail_on: Option<String>,
}

impl RecordingEncoder {
    pub fn failing_on(variable: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on: Some(variable.to_string()),
        }
    }

    pub fn calls(&self) -> Vec<EncodeCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl RasterEncoder for RecordingEncoder {
    fn encode(&self, request: &EncodeRequest<'_>) -> EncodeResult<Bytes> {
        request.validate()?;
        let name = request.variable.name.clone();
        if self.fail_on.as_deref() == Some(name.as_str()) {
            return Err(cog_encoder::EncodeError::InvalidInput(format!("{}: refused", name)));
        }

        self.calls.lock().unwrap().push(EncodeCall {
            variable: name.clone(),
            grid: request.grid.clone(),
            nodata: request.nodata,
            scale: request.metadata.scale,
            offset: request.metadata.offset,
            unit: request.metadata.unit.clone(),
        });

        let mut payload = b"II*\0".to_vec();
        payload.extend_from_slice(name.as_bytes());
        Ok(Bytes::from(payload))
    }
}

/// Fakes wired together, with handles kept for assertions.
pub struct Fakes {
    pub loader: Arc<CountingLoader>,
    pub encoder: Arc<RecordingEncoder>,
}

impl Fakes {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::with(CountingLoader::new(rows, cols), RecordingEncoder::default())
    }

    pub fn with(loader: CountingLoader, encoder: RecordingEncoder) -> Self {
        Self {
            loader: Arc::new(loader),
            encoder: Arc::new(encoder),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            loader: self.loader.clone(),
            encoder: self.encoder.clone(),
            credentials: Arc::new(StaticToken("test-token".to_string())),
        }
    }
}

/// Serves items from a map keyed by item path; anything else is a 404.
#[derive(Default)]
pub struct MapFetcher {
    items: HashMap<String, Item>,
}

impl MapFetcher {
    pub fn insert(&mut self, key: impl Into<String>, item: Item) {
        self.items.insert(key.into(), item);
    }
}

#[async_trait]
impl ItemFetcher for MapFetcher {
    fn href(&self, key: &str) -> String {
        format!("https://items.test/{}", key)
    }

    async fn fetch(&self, key: &str) -> SstResult<Item> {
        self.items
            .get(key)
            .cloned()
            .ok_or_else(|| SstError::Http(format!("404 Not Found: {}", self.href(key))))
    }
}

/// Serves items after a per-key delay and records the most fetches ever in
/// flight at once.
#[derive(Default)]
pub struct GaugedFetcher {
    items: HashMap<String, (Item, Duration)>,
    in_flight: AtomicUsize,
    peak: Arc<AtomicUsize>,
}

impl GaugedFetcher {
    pub fn insert(&mut self, key: impl Into<String>, item: Item, delay: Duration) {
        self.items.insert(key.into(), (item, delay));
    }

    /// Handle to the peak in-flight count, readable after the fetcher is boxed.
    pub fn peak(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.peak)
    }
}

#[async_trait]
impl ItemFetcher for GaugedFetcher {
    fn href(&self, key: &str) -> String {
        format!("https://items.test/{}", key)
    }

    async fn fetch(&self, key: &str) -> SstResult<Item> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let result = match self.items.get(key) {
            Some((item, delay)) => {
                tokio::time::sleep(*delay).await;
                Ok(item.clone())
            }
            None => {
                tokio::time::sleep(Duration::from_millis(1)).await;
                Err(SstError::Http(format!("404 Not Found: {}", self.href(key))))
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Run the day pipeline with fakes for each date so real items exist under
/// `storage`.
pub async fn publish_days(storage: storage::SharedStorage, dates: &[NaiveDate]) {
    let fakes = Fakes::new(3, 4);
    let options = ingestion::DayOptions {
        input_location: "/data/mur".to_string(),
        ..ingestion::DayOptions::default()
    };
    for day in dates {
        ingestion::DayPipeline::new(storage.clone(), fakes.collaborators(), options.clone())
            .run(*day)
            .await
            .unwrap();
    }
}
