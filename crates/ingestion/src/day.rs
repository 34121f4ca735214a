//! One date, end to end: load, align, write artifacts, write the catalog item.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use cog_encoder::{GdalCogEncoder, RasterEncoder};
use sst_common::env::alternate_storage_overrides;
use sst_common::paths::{input_path, is_remote_source};
use sst_common::product::JPL_SENTINEL;
use sst_common::{EnvScope, GriddedDataset, SstResult};
use storage::{open_storage, Location, SharedStorage};

use crate::aligner::GridAligner;
use crate::artifacts::{ArtifactReport, ArtifactWriter};
use crate::catalog::{catalog_key, CatalogWriter};
use crate::credentials::{bearer_headers, CredentialProvider, EarthdataCredentials};
use crate::source::{DatasetLoader, NetCdfLoader, SourceRequest};

/// Where a day's run is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayState {
    NotStarted,
    AlreadyDone,
    Loading,
    Aligning,
    WritingArtifacts,
    WritingCatalog,
    Done,
    Failed,
}

impl fmt::Display for DayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DayState::NotStarted => "not_started",
            DayState::AlreadyDone => "already_done",
            DayState::Loading => "loading",
            DayState::Aligning => "aligning",
            DayState::WritingArtifacts => "writing_artifacts",
            DayState::WritingCatalog => "writing_catalog",
            DayState::Done => "done",
            DayState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayOptions {
    /// `JPL` for the remote archive, otherwise a local folder
    pub input_location: String,
    pub overwrite: bool,
    pub cache_local: bool,
}

impl Default for DayOptions {
    fn default() -> Self {
        Self {
            input_location: JPL_SENTINEL.to_string(),
            overwrite: false,
            cache_local: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayOutcome {
    /// The catalog item already existed; nothing was read or written.
    AlreadyDone { catalog_href: String },
    Completed {
        catalog_href: String,
        artifacts: ArtifactReport,
    },
}

impl DayOutcome {
    pub fn catalog_href(&self) -> &str {
        match self {
            DayOutcome::AlreadyDone { catalog_href } => catalog_href,
            DayOutcome::Completed { catalog_href, .. } => catalog_href,
        }
    }
}

/// The format-specific pieces a day's run delegates to.
#[derive(Clone)]
pub struct Collaborators {
    pub loader: Arc<dyn DatasetLoader>,
    pub encoder: Arc<dyn RasterEncoder>,
    pub credentials: Arc<dyn CredentialProvider>,
}

impl Collaborators {
    /// NetCDF decoding, GDAL encoding and Earthdata credentials from the
    /// environment. Staged source files go under `cache_dir`.
    pub fn production(cache_dir: impl Into<PathBuf>) -> SstResult<Self> {
        Ok(Self {
            loader: Arc::new(NetCdfLoader::new(cache_dir)?),
            encoder: Arc::new(GdalCogEncoder::new()),
            credentials: Arc::new(EarthdataCredentials::from_env()),
        })
    }
}

/// Sequential processing of one date against one output root.
pub struct DayPipeline {
    storage: SharedStorage,
    collaborators: Collaborators,
    aligner: GridAligner,
    options: DayOptions,
    state: DayState,
}

impl DayPipeline {
    pub fn new(storage: SharedStorage, collaborators: Collaborators, options: DayOptions) -> Self {
        Self {
            storage,
            collaborators,
            aligner: GridAligner::default(),
            options,
            state: DayState::NotStarted,
        }
    }

    pub fn state(&self) -> DayState {
        self.state
    }

    fn transition(&mut self, next: DayState) {
        debug!(from = %self.state, to = %next, "Day pipeline state change");
        self.state = next;
    }

    /// Run the pipeline for `date`. Errors leave the pipeline in
    /// [`DayState::Failed`].
    #[instrument(skip(self), fields(date = %date))]
    pub async fn run(&mut self, date: NaiveDate) -> SstResult<DayOutcome> {
        self.state = DayState::NotStarted;
        let result = self.execute(date).await;
        if result.is_err() {
            self.transition(DayState::Failed);
        }
        result
    }

    async fn execute(&mut self, date: NaiveDate) -> SstResult<DayOutcome> {
        info!(
            input = %self.options.input_location,
            output = %self.storage.join_path(""),
            overwrite = self.options.overwrite,
            cache_local = self.options.cache_local,
            "Processing date"
        );

        let key = catalog_key(date);
        if !self.options.overwrite && self.storage.exists(&key).await? {
            info!(path = %self.storage.join_path(&key), "Day already exists, skipping");
            self.transition(DayState::AlreadyDone);
            return Ok(DayOutcome::AlreadyDone {
                catalog_href: self.storage.public_url(&key),
            });
        }

        self.transition(DayState::Loading);
        let mut dataset = self.load(date).await?;

        self.transition(DayState::Aligning);
        self.aligner.align(&mut dataset)?;
        let dataset = Arc::new(dataset);

        self.transition(DayState::WritingArtifacts);
        let artifacts = ArtifactWriter::new(
            Arc::clone(&self.storage),
            Arc::clone(&self.collaborators.encoder),
            self.options.overwrite,
        )
        .write(Arc::clone(&dataset), date)
        .await?;

        self.transition(DayState::WritingCatalog);
        let catalog_href = CatalogWriter::new(Arc::clone(&self.storage))
            .write(&dataset, &artifacts, date)
            .await?;

        self.transition(DayState::Done);
        info!(href = %catalog_href, "Finished writing STAC item");

        Ok(DayOutcome::Completed {
            catalog_href,
            artifacts,
        })
    }

    async fn load(&self, date: NaiveDate) -> SstResult<GriddedDataset> {
        let mut request = SourceRequest::new(input_path(&self.options.input_location, date));
        request.cache_local = self.options.cache_local;

        if is_remote_source(&self.options.input_location) {
            let token = self.collaborators.credentials.bearer_token().await?;
            request.headers = bearer_headers(&token);
        }

        info!(source = %request.location, "Loading data");
        self.collaborators.loader.load(&request).await
    }
}

/// Run one date against `output`, writing through the alternate storage
/// endpoint when one is configured.
pub async fn run_day(
    date: NaiveDate,
    output: &Location,
    public_root: Option<String>,
    collaborators: Collaborators,
    options: DayOptions,
) -> SstResult<DayOutcome> {
    let storage = open_output_storage(output, public_root)?;
    DayPipeline::new(storage, collaborators, options).run(date).await
}

/// Build the output storage client under the alternate endpoint variables.
///
/// The client captures endpoint and credentials when it is built, so the
/// override only spans this synchronous call. It is undone before any
/// decoding, encoding or network work starts.
pub fn open_output_storage(output: &Location, public_root: Option<String>) -> SstResult<SharedStorage> {
    let _scope = EnvScope::apply(alternate_storage_overrides());
    Ok(open_storage(output, public_root)?)
}
