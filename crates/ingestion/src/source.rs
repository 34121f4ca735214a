//! Fetching and decoding a day's source NetCDF.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument};

use netcdf_parser::{load_mur_file, load_mur_from_bytes, LoadOptions};
use sst_common::paths::file_name;
use sst_common::{GriddedDataset, SstError, SstResult};

/// What to load and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRequest {
    /// Local path or remote URL of the NetCDF file
    pub location: String,
    /// Extra request headers for remote locations
    pub headers: Vec<(String, String)>,
    /// Copy the file to local disk before decoding
    pub cache_local: bool,
}

impl SourceRequest {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            headers: Vec::new(),
            cache_local: false,
        }
    }

    pub fn is_remote(&self) -> bool {
        self.location.starts_with("https://") || self.location.starts_with("http://")
    }
}

/// Decodes a source file into a gridded dataset.
#[async_trait]
pub trait DatasetLoader: Send + Sync {
    /// Fails with [`SstError::SourceNotFound`] when the file does not exist.
    async fn load(&self, request: &SourceRequest) -> SstResult<GriddedDataset>;
}

/// Loads MUR NetCDF files from disk or over HTTP.
pub struct NetCdfLoader {
    client: Client,
    cache_dir: PathBuf,
    options: LoadOptions,
}

impl NetCdfLoader {
    pub fn new(cache_dir: impl Into<PathBuf>) -> SstResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(600))
            .build()
            .map_err(|e| SstError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            cache_dir: cache_dir.into(),
            options: LoadOptions::default(),
        })
    }

    /// Staging location for a source file.
    pub fn cache_path(&self, location: &str) -> PathBuf {
        self.cache_dir.join(file_name(location))
    }

    async fn fetch(&self, request: &SourceRequest) -> SstResult<Bytes> {
        let url = &request.location;
        let mut builder = self.client.get(url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let access_error = |message: String| SstError::SourceAccess {
            path: url.clone(),
            message,
        };

        let response = builder.send().await.map_err(|e| access_error(e.to_string()))?;
        match response.status() {
            StatusCode::NOT_FOUND => return Err(SstError::SourceNotFound(url.clone())),
            status if !status.is_success() => {
                return Err(access_error(format!("HTTP {}", status)));
            }
            _ => {}
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| access_error(e.to_string()))?;
        debug!(url = %url, size = bytes.len(), "Downloaded source");
        Ok(bytes)
    }

    async fn decode_file(&self, path: PathBuf) -> SstResult<GriddedDataset> {
        let options = self.options.clone();
        tokio::task::spawn_blocking(move || load_mur_file(&path, &options).map_err(SstError::from))
            .await
            .map_err(|e| SstError::Decode(format!("decoder task failed: {}", e)))?
    }

    async fn decode_bytes(&self, data: Bytes) -> SstResult<GriddedDataset> {
        let options = self.options.clone();
        tokio::task::spawn_blocking(move || load_mur_from_bytes(data, &options).map_err(SstError::from))
            .await
            .map_err(|e| SstError::Decode(format!("decoder task failed: {}", e)))?
    }

    /// Write `data` to the cache directory. The buffer is consumed so it is
    /// freed before the staged copy is decoded.
    async fn stage<B: AsRef<[u8]>>(&self, location: &str, data: B) -> SstResult<PathBuf> {
        let cache_path = self.cache_path(location);
        info!(source = %location, cache = %cache_path.display(), "Caching source locally");
        tokio::fs::create_dir_all(&self.cache_dir).await?;
        tokio::fs::write(&cache_path, data).await?;
        Ok(cache_path)
    }
}

#[async_trait]
impl DatasetLoader for NetCdfLoader {
    #[instrument(skip(self, request), fields(location = %request.location, cache_local = request.cache_local))]
    async fn load(&self, request: &SourceRequest) -> SstResult<GriddedDataset> {
        if request.is_remote() {
            let data = self.fetch(request).await?;
            if request.cache_local {
                let path = self.stage(&request.location, data).await?;
                return self.decode_file(path).await;
            }
            return self.decode_bytes(data).await;
        }

        let path = Path::new(&request.location);
        if !tokio::fs::try_exists(path).await? {
            return Err(SstError::SourceNotFound(request.location.clone()));
        }
        if request.cache_local {
            let data = tokio::fs::read(path).await?;
            let staged = self.stage(&request.location, data).await?;
            return self.decode_file(staged).await;
        }
        self.decode_file(path.to_path_buf()).await
    }
}
