//! Day pipeline behaviour against local storage with fake decoding and encoding.

mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::{date, CountingLoader, Fakes, RecordingEncoder};
use ingestion::catalog::catalog_key;
use ingestion::{
    run_day, Collaborators, DatasetLoader, DayOptions, DayOutcome, DayPipeline, DayState,
    SourceRequest,
};
use sst_common::paths::output_key;
use sst_common::product::{cog_suffix, JPL_BASE, VARIABLES};
use sst_common::{GeoTransform, GriddedDataset, SstError, SstResult};
use stac_catalog::Item;
use storage::{LocalStorage, Location, SharedStorage};

fn local_options() -> DayOptions {
    DayOptions {
        input_location: "/data/mur".to_string(),
        ..DayOptions::default()
    }
}

fn pipeline(storage: SharedStorage, fakes: &Fakes, options: DayOptions) -> DayPipeline {
    DayPipeline::new(storage, fakes.collaborators(), options)
}

#[tokio::test]
async fn test_day_writes_five_rasters_and_an_item() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(LocalStorage::new(dir.path()));
    let fakes = Fakes::new(6, 8);
    let day = date(2023, 11, 6);

    let mut pipeline = pipeline(storage.clone(), &fakes, local_options());
    let outcome = pipeline.run(day).await.unwrap();

    assert_eq!(pipeline.state(), DayState::Done);
    let DayOutcome::Completed { artifacts, catalog_href } = outcome else {
        panic!("expected a completed day");
    };
    assert_eq!(artifacts.written_count(), 5);
    assert_eq!(catalog_href, storage.resolve(&catalog_key(day)).display().to_string());

    for name in VARIABLES {
        assert!(storage.resolve(&output_key(day, &cog_suffix(name))).exists());
    }
    assert!(storage.resolve(&catalog_key(day)).exists());
}

#[tokio::test]
async fn test_encoder_receives_reference_grid_and_celsius_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(LocalStorage::new(dir.path()));
    let fakes = Fakes::new(6, 8);

    pipeline(storage, &fakes, local_options())
        .run(date(2023, 11, 6))
        .await
        .unwrap();

    let calls = fakes.encoder.calls();
    let names: Vec<&str> = calls.iter().map(|c| c.variable.as_str()).collect();
    assert_eq!(names, VARIABLES.to_vec());

    for call in &calls {
        assert_eq!(call.grid.transform, GeoTransform::REFERENCE);
        assert_eq!(call.grid.shape(), (6, 8));
    }

    let sst = &calls[0];
    assert_eq!(sst.offset, Some(25.0));
    assert_eq!(sst.scale, Some(0.001));
    assert_eq!(sst.unit.as_deref(), Some("celsius"));
    assert_eq!(sst.nodata, Some(-32768.0));

    let ice = calls.iter().find(|c| c.variable == "sea_ice_fraction").unwrap();
    assert_eq!(ice.unit.as_deref(), Some("fraction (between 0 and 1)"));
}

#[tokio::test]
async fn test_second_run_skips_without_loading() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(LocalStorage::new(dir.path()));
    let fakes = Fakes::new(4, 4);
    let day = date(2023, 11, 6);

    pipeline(storage.clone(), &fakes, local_options())
        .run(day)
        .await
        .unwrap();

    let mut again = pipeline(storage.clone(), &fakes, local_options());
    let outcome = again.run(day).await.unwrap();

    assert!(matches!(outcome, DayOutcome::AlreadyDone { .. }));
    assert_eq!(again.state(), DayState::AlreadyDone);
    assert_eq!(fakes.loader.calls(), 1);
    assert_eq!(fakes.encoder.calls().len(), 5);
}

#[tokio::test]
async fn test_existing_artifacts_skipped_when_item_missing() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(LocalStorage::new(dir.path()));
    let fakes = Fakes::new(4, 4);
    let day = date(2023, 11, 6);

    pipeline(storage.clone(), &fakes, local_options())
        .run(day)
        .await
        .unwrap();
    std::fs::remove_file(storage.resolve(&catalog_key(day))).unwrap();

    let outcome = pipeline(storage.clone(), &fakes, local_options())
        .run(day)
        .await
        .unwrap();

    let DayOutcome::Completed { artifacts, .. } = outcome else {
        panic!("expected a completed day");
    };
    assert_eq!(artifacts.skipped_count(), 5);
    assert_eq!(fakes.loader.calls(), 2);
    assert_eq!(fakes.encoder.calls().len(), 5);
    assert!(storage.resolve(&catalog_key(day)).exists());
}

#[tokio::test]
async fn test_overwrite_rewrites_everything() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(LocalStorage::new(dir.path()));
    let fakes = Fakes::new(4, 4);
    let day = date(2023, 11, 6);

    pipeline(storage.clone(), &fakes, local_options())
        .run(day)
        .await
        .unwrap();

    let options = DayOptions {
        overwrite: true,
        ..local_options()
    };
    let outcome = pipeline(storage, &fakes, options).run(day).await.unwrap();

    let DayOutcome::Completed { artifacts, .. } = outcome else {
        panic!("expected a completed day");
    };
    assert_eq!(artifacts.written_count(), 5);
    assert_eq!(fakes.encoder.calls().len(), 10);
}

#[tokio::test]
async fn test_item_assets_match_written_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(LocalStorage::new(dir.path()));
    let fakes = Fakes::new(4, 4);
    let day = date(2023, 11, 6);

    let outcome = pipeline(storage.clone(), &fakes, local_options())
        .run(day)
        .await
        .unwrap();
    let DayOutcome::Completed { artifacts, .. } = outcome else {
        panic!("expected a completed day");
    };

    let body = std::fs::read(storage.resolve(&catalog_key(day))).unwrap();
    let item = Item::from_json_slice(&body).unwrap();

    let asset_keys: Vec<&str> = item.assets.keys().map(String::as_str).collect();
    assert_eq!(asset_keys, VARIABLES.to_vec());
    for artifact in &artifacts.artifacts {
        let asset = &item.assets[&artifact.variable];
        assert_eq!(asset.href, storage.resolve(&artifact.path).display().to_string());
    }
    assert_eq!(item.properties.proj_shape, Some([4, 4]));
}

#[tokio::test]
async fn test_missing_source_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(LocalStorage::new(dir.path()));
    let fakes = Fakes::with(CountingLoader::missing(), RecordingEncoder::default());
    let day = date(2023, 11, 6);

    let mut pipeline = pipeline(storage.clone(), &fakes, local_options());
    let err = pipeline.run(day).await.unwrap_err();

    assert!(matches!(err, SstError::SourceNotFound(_)));
    assert!(err.is_domain());
    assert_eq!(pipeline.state(), DayState::Failed);
    assert!(!storage.resolve(&catalog_key(day)).exists());
    assert!(fakes.encoder.calls().is_empty());
}

#[tokio::test]
async fn test_encoder_failure_stops_before_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(LocalStorage::new(dir.path()));
    let fakes = Fakes::with(CountingLoader::new(4, 4), RecordingEncoder::failing_on("mask"));
    let day = date(2023, 11, 6);

    let mut pipeline = pipeline(storage.clone(), &fakes, local_options());
    let err = pipeline.run(day).await.unwrap_err();

    assert!(matches!(err, SstError::Encode(_)));
    assert_eq!(pipeline.state(), DayState::Failed);
    assert!(storage.resolve(&output_key(day, "_analysis_error.tif")).exists());
    assert!(!storage.resolve(&output_key(day, "_mask.tif")).exists());
    assert!(!storage.resolve(&catalog_key(day)).exists());
}

#[tokio::test]
async fn test_remote_source_sends_bearer_token() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(LocalStorage::new(dir.path()));
    let fakes = Fakes::new(4, 4);

    pipeline(storage, &fakes, DayOptions::default())
        .run(date(2023, 11, 6))
        .await
        .unwrap();

    let request = &fakes.loader.requests()[0];
    assert!(request.location.starts_with(JPL_BASE));
    assert!(request.location.ends_with("20231106090000-JPL-L4_GHRSST-SSTfnd-MUR-GLOB-v02.0-fv04.1.nc"));
    assert_eq!(
        request.headers,
        vec![("Authorization".to_string(), "Bearer test-token".to_string())]
    );
}

#[tokio::test]
async fn test_local_source_has_no_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(LocalStorage::new(dir.path()));
    let fakes = Fakes::new(4, 4);

    pipeline(storage, &fakes, local_options())
        .run(date(2023, 11, 6))
        .await
        .unwrap();

    let request = &fakes.loader.requests()[0];
    assert_eq!(
        request.location,
        "/data/mur/20231106090000-JPL-L4_GHRSST-SSTfnd-MUR-GLOB-v02.0-fv04.1.nc"
    );
    assert!(request.headers.is_empty());
}

/// Records the storage endpoint variable as seen while a source is loaded.
#[derive(Default)]
struct EndpointRecordingLoader {
    seen: Mutex<Vec<Option<String>>>,
}

#[async_trait]
impl DatasetLoader for EndpointRecordingLoader {
    async fn load(&self, request: &SourceRequest) -> SstResult<GriddedDataset> {
        self.seen
            .lock()
            .unwrap()
            .push(std::env::var("AWS_ENDPOINT_URL").ok());
        Err(SstError::SourceNotFound(request.location.clone()))
    }
}

#[tokio::test]
async fn test_run_day_confines_endpoint_override_to_client_setup() {
    let dir = tempfile::tempdir().unwrap();
    let output = Location::parse(&dir.path().display().to_string()).unwrap();
    let loader = Arc::new(EndpointRecordingLoader::default());
    let collaborators = Collaborators {
        loader: loader.clone(),
        ..Fakes::new(1, 1).collaborators()
    };

    std::env::set_var("AWS_ENDPOINT_URL", "https://original.example");
    std::env::set_var("SOURCECOOP_AWS_ENDPOINT_URL", "https://data.source.coop");
    std::env::set_var("SOURCECOOP_AWS_ACCESS_KEY_ID", "key");
    std::env::set_var("SOURCECOOP_AWS_SECRET_ACCESS_KEY", "secret");

    let result = run_day(date(2023, 11, 6), &output, None, collaborators, local_options()).await;

    assert!(matches!(result, Err(SstError::SourceNotFound(_))));
    assert_eq!(
        loader.seen.lock().unwrap().as_slice(),
        &[Some("https://original.example".to_string())]
    );
    assert_eq!(std::env::var("AWS_ENDPOINT_URL").unwrap(), "https://original.example");

    for key in [
        "AWS_ENDPOINT_URL",
        "SOURCECOOP_AWS_ENDPOINT_URL",
        "SOURCECOOP_AWS_ACCESS_KEY_ID",
        "SOURCECOOP_AWS_SECRET_ACCESS_KEY",
    ] {
        std::env::remove_var(key);
    }
}
