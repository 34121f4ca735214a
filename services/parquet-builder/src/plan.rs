//! Resolving command-line and scheduled settings into one aggregation run.

use std::path::PathBuf;

use chrono::NaiveDate;

use sst_common::paths::join;
use sst_common::time::parse_date;
use sst_common::{DateRange, SstError, SstResult};
use storage::object_store::SOURCE_COOP_PUBLIC_BASE;
use storage::Location;

pub const DEFAULT_INPUT_LOCATION: &str = "s3://ausantarctic/ghrsst-mur-v2";
pub const DEFAULT_SCHEDULED_START: &str = "2025-01-01";

/// Settings before dates and locations are validated.
#[derive(Debug, Clone, Default)]
pub struct PlanInput {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub input_location: String,
    pub output_location: Option<String>,
    pub write_tempfile: bool,
    pub scratch_dir: PathBuf,
    pub public_url: Option<String>,
    pub scheduled: bool,
}

/// A validated aggregation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    pub range: DateRange,
    pub input: Location,
    pub output: Location,
    pub write_tempfile: bool,
    pub scratch_dir: PathBuf,
    pub public_url: Option<String>,
}

impl BuildPlan {
    /// Scheduled runs end today and start at `start_date` or
    /// [`DEFAULT_SCHEDULED_START`]. Manual runs need both dates.
    pub fn resolve(input: PlanInput, today: NaiveDate) -> SstResult<Self> {
        let (start, end) = if input.scheduled {
            let start = input
                .start_date
                .as_deref()
                .unwrap_or(DEFAULT_SCHEDULED_START);
            (parse_date(start)?, today)
        } else {
            let start = input
                .start_date
                .as_deref()
                .ok_or_else(|| SstError::missing_config("--start-date is required"))?;
            let end = input
                .end_date
                .as_deref()
                .ok_or_else(|| SstError::missing_config("--end-date is required"))?;
            (parse_date(start)?, parse_date(end)?)
        };

        let source = Location::parse(&input.input_location)?;
        let output = match input.output_location.as_deref() {
            Some(loc) => Location::parse(loc)?,
            None => source.clone(),
        };
        let public_url = input.public_url.or_else(|| public_url_for(&source));

        Ok(Self {
            range: DateRange::new(start, end)?,
            input: source,
            output,
            write_tempfile: input.write_tempfile,
            scratch_dir: input.scratch_dir,
            public_url,
        })
    }
}

/// Items in a bucket are read from source.coop's public mirror of it,
/// `s3://<account>/<repo>` becoming `https://data.source.coop/<account>/<repo>`.
/// Local roots are read directly.
fn public_url_for(input: &Location) -> Option<String> {
    match input {
        Location::S3 { bucket, prefix } => {
            Some(join(&join(SOURCE_COOP_PUBLIC_BASE, bucket), prefix))
        }
        Location::Local(_) => None,
    }
}
