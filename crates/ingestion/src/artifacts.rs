//! Per-variable COG output with existence-based skipping.

use std::sync::Arc;

use bytes::Bytes;
use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use cog_encoder::metadata::{NODATA, OFFSETS, SCALES, UNITS};
use cog_encoder::{CogOptions, EncodeRequest, RasterEncoder, RasterMetadata};
use sst_common::dataset::{attrs, Attributes, GriddedDataset, Variable};
use sst_common::paths::output_key;
use sst_common::product::{cog_suffix, MEDIA_TYPE_COG, VARIABLES};
use sst_common::{SstError, SstResult};
use storage::SharedStorage;

/// Whether an artifact was produced by this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStatus {
    Written,
    AlreadyExisted,
}

/// One output raster for (date, variable).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub variable: String,
    /// Path relative to the storage root
    pub path: String,
    pub status: ArtifactStatus,
}

/// Artifacts for one day, in [`VARIABLES`] order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactReport {
    pub artifacts: Vec<Artifact>,
}

impl ArtifactReport {
    pub fn paths(&self) -> Vec<&str> {
        self.artifacts.iter().map(|a| a.path.as_str()).collect()
    }

    pub fn written_count(&self) -> usize {
        self.count(ArtifactStatus::Written)
    }

    pub fn skipped_count(&self) -> usize {
        self.count(ArtifactStatus::AlreadyExisted)
    }

    fn count(&self, status: ArtifactStatus) -> usize {
        self.artifacts.iter().filter(|a| a.status == status).count()
    }
}

/// Writes one COG per product variable.
pub struct ArtifactWriter {
    storage: SharedStorage,
    encoder: Arc<dyn RasterEncoder>,
    options: CogOptions,
    overwrite: bool,
}

impl ArtifactWriter {
    pub fn new(storage: SharedStorage, encoder: Arc<dyn RasterEncoder>, overwrite: bool) -> Self {
        Self {
            storage,
            encoder,
            options: CogOptions::default(),
            overwrite,
        }
    }

    /// Write every product variable of an aligned dataset.
    ///
    /// Existing artifacts are left alone unless overwriting. The first
    /// failure aborts the remaining variables. Variables are handed to the
    /// encoder by reference; the dataset is shared, not copied.
    #[instrument(skip(self, dataset), fields(date = %date, overwrite = self.overwrite))]
    pub async fn write(&self, dataset: Arc<GriddedDataset>, date: NaiveDate) -> SstResult<ArtifactReport> {
        let mut report = ArtifactReport::default();

        for name in VARIABLES {
            let path = output_key(date, &cog_suffix(name));

            if !self.overwrite && self.storage.exists(&path).await? {
                info!(
                    variable = name,
                    path = %self.storage.join_path(&path),
                    "Artifact already exists, skipping"
                );
                report.artifacts.push(Artifact {
                    variable: name.to_string(),
                    path,
                    status: ArtifactStatus::AlreadyExisted,
                });
                continue;
            }

            dataset.require(name)?;
            info!(
                variable = name,
                path = %self.storage.join_path(&path),
                "Writing artifact"
            );

            let bytes = self.encode(Arc::clone(&dataset), name).await?;
            self.storage.ensure_parent(&path).await?;
            self.storage.write(&path, bytes, MEDIA_TYPE_COG).await?;

            info!(variable = name, "Finished writing artifact");
            report.artifacts.push(Artifact {
                variable: name.to_string(),
                path,
                status: ArtifactStatus::Written,
            });
        }

        debug!(
            written = report.written_count(),
            skipped = report.skipped_count(),
            "Artifact stage complete"
        );
        Ok(report)
    }

    /// Encoding is CPU bound; it runs on the blocking pool with the dataset
    /// grid passed alongside the variable.
    async fn encode(&self, dataset: Arc<GriddedDataset>, name: &'static str) -> SstResult<Bytes> {
        let encoder = Arc::clone(&self.encoder);
        let options = self.options.clone();

        tokio::task::spawn_blocking(move || {
            let variable = dataset.require(name)?;
            let metadata = RasterMetadata::from_attributes(&encoding_attributes(variable));
            let request = EncodeRequest {
                variable,
                grid: &dataset.grid,
                nodata: metadata.nodata,
                metadata: &metadata,
                options: &options,
            };
            encoder.encode(&request).map_err(SstError::from)
        })
        .await
        .map_err(|e| SstError::Encode(format!("encoder task failed: {}", e)))?
    }
}

/// The variable's attributes with its CF packing attributes also stored
/// under the names the encoder reads.
pub fn encoding_attributes(variable: &Variable) -> Attributes {
    let mut prepared = variable.attrs.clone();
    let renames = [
        (attrs::SCALE_FACTOR, SCALES),
        (attrs::ADD_OFFSET, OFFSETS),
        (attrs::UNITS, UNITS),
        (attrs::FILL_VALUE, NODATA),
    ];
    for (from, to) in renames {
        if let Some(value) = variable.attr(from) {
            prepared.insert(to.to_string(), value.clone());
        }
    }
    prepared
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use cog_encoder::EncodeResult;
    use sst_common::dataset::{AttrValue, RasterData};
    use storage::LocalStorage;
    use test_utils::mur_dataset;

    fn data_address(data: &RasterData) -> usize {
        match data {
            RasterData::I8(v) => v.as_ptr() as usize,
            RasterData::U8(v) => v.as_ptr() as usize,
            RasterData::I16(v) => v.as_ptr() as usize,
            RasterData::I32(v) => v.as_ptr() as usize,
            RasterData::F32(v) => v.as_ptr() as usize,
            RasterData::F64(v) => v.as_ptr() as usize,
        }
    }

    /// Remembers where each variable's values lived when it was encoded.
    #[derive(Default)]
    struct AddressEncoder {
        seen: Mutex<Vec<(String, usize)>>,
    }

    impl RasterEncoder for AddressEncoder {
        fn encode(&self, request: &EncodeRequest<'_>) -> EncodeResult<Bytes> {
            self.seen.lock().unwrap().push((
                request.variable.name.clone(),
                data_address(&request.variable.data),
            ));
            Ok(Bytes::from_static(b"II*\0"))
        }
    }

    #[tokio::test]
    async fn test_encoder_reads_dataset_values_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = Arc::new(mur_dataset(3, 5));
        let encoder = Arc::new(AddressEncoder::default());

        let report = ArtifactWriter::new(
            Arc::new(LocalStorage::new(dir.path())),
            encoder.clone(),
            false,
        )
        .write(Arc::clone(&dataset), NaiveDate::from_ymd_opt(2023, 11, 6).unwrap())
        .await
        .unwrap();
        assert_eq!(report.written_count(), 5);

        let seen = encoder.seen.lock().unwrap();
        assert_eq!(seen.len(), 5);
        for (name, address) in seen.iter() {
            let source = dataset.require(name).unwrap();
            assert_eq!(*address, data_address(&source.data), "{} was copied", name);
        }
    }

    #[test]
    fn test_encoding_attributes_renamed_without_touching_source() {
        let ds = mur_dataset(2, 2);
        let source = ds.require("analysed_sst").unwrap();
        let prepared = encoding_attributes(source);

        assert_eq!(prepared.get(SCALES), Some(&AttrValue::Float(0.001)));
        assert_eq!(prepared.get(OFFSETS), Some(&AttrValue::Float(298.15)));
        assert_eq!(prepared.get(UNITS), Some(&AttrValue::from("kelvin")));
        assert_eq!(prepared.get(NODATA), Some(&AttrValue::Int(-32768)));
        assert!(source.attr(SCALES).is_none());
    }

    #[test]
    fn test_encoding_attributes_skip_absent() {
        let ds = mur_dataset(2, 2);
        let prepared = encoding_attributes(ds.require("mask").unwrap());
        assert!(prepared.get(SCALES).is_none());
        assert!(prepared.get(OFFSETS).is_none());
        assert_eq!(prepared.get(NODATA), Some(&AttrValue::Int(-128)));
    }

    #[test]
    fn test_report_counts() {
        let report = ArtifactReport {
            artifacts: vec![
                Artifact {
                    variable: "a".into(),
                    path: "a.tif".into(),
                    status: ArtifactStatus::Written,
                },
                Artifact {
                    variable: "b".into(),
                    path: "b.tif".into(),
                    status: ArtifactStatus::AlreadyExisted,
                },
            ],
        };
        assert_eq!(report.written_count(), 1);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(report.paths(), vec!["a.tif", "b.tif"]);
    }
}
