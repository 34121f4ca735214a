//! GHRSST MUR day converter.
//!
//! Converts one day's MUR NetCDF into five Cloud-Optimized GeoTIFFs and a
//! STAC item, either for a single `--date` or for every date in a queue
//! event file (`--event`).

mod config;
mod event;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use ingestion::{run_day, Collaborators, DayOptions};
use sst_common::time::parse_date;
use sst_common::{SstError, SstResult};
use storage::Location;

use config::EventConfig;
use event::QueueEvent;

#[derive(Parser, Debug)]
#[command(name = "ghrsst-cogger")]
#[command(about = "Convert a day of GHRSST MUR data to COGs and a STAC item")]
struct Args {
    /// Date to process (YYYY-MM-DD)
    #[arg(long)]
    date: Option<String>,

    /// Output root: local folder or s3://bucket/prefix
    #[arg(long)]
    output_location: Option<String>,

    /// JPL for the remote archive, otherwise a local folder of NetCDF files
    #[arg(long, default_value = "JPL")]
    input_location: String,

    /// Rewrite outputs that already exist
    #[arg(long)]
    overwrite: bool,

    /// Copy the source file to local disk before decoding
    #[arg(long)]
    cache_local: bool,

    /// Directory for locally cached source files
    #[arg(long, env = "CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Public URL of the output root, used for catalog hrefs
    #[arg(long, env = "PUBLIC_URL")]
    public_url: Option<String>,

    /// Process a queue event file instead of a single date
    #[arg(long, conflicts_with = "date")]
    event: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let cache_dir = args
        .cache_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("ghrsst-cache"));
    let collaborators = Collaborators::production(cache_dir)?;

    if let Some(event_path) = &args.event {
        return handle_event(event_path, args.public_url.clone(), collaborators).await;
    }

    let date_arg = args.date.as_deref().context("--date is required")?;
    let date = match parse_date(date_arg) {
        Ok(date) => date,
        Err(e) => exit_with(&format!("Failed to process date {} with error {}", date_arg, e)),
    };
    let output = args
        .output_location
        .as_deref()
        .context("--output-location is required")?;

    let options = DayOptions {
        input_location: args.input_location.clone(),
        overwrite: args.overwrite,
        cache_local: args.cache_local,
    };

    match process_date(date, output, args.public_url.clone(), collaborators, options).await {
        Ok(()) => Ok(()),
        Err(SstError::SourceNotFound(path)) => {
            println!("Couldn't find file for date {} from {}", date, path);
            Ok(())
        }
        Err(e) if e.is_domain() => {
            exit_with(&format!("Failed to process date {} with error {}", date, e))
        }
        Err(e) => Err(e.into()),
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn exit_with(message: &str) -> ! {
    println!("{}", message);
    std::process::exit(1);
}

async fn process_date(
    date: NaiveDate,
    output: &str,
    public_url: Option<String>,
    collaborators: Collaborators,
    options: DayOptions,
) -> SstResult<()> {
    let location = Location::parse(output)?;
    let outcome = run_day(date, &location, public_url, collaborators, options).await?;
    info!(date = %date, href = %outcome.catalog_href(), "Day complete");
    Ok(())
}

/// Process every date in a queue event. A missing source file is logged
/// and the next date is tried; any other failure stops the run.
async fn handle_event(
    path: &Path,
    public_url: Option<String>,
    collaborators: Collaborators,
) -> Result<()> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading event file {}", path.display()))?;
    let event = QueueEvent::from_json(&data)?;
    let dates = event.dates()?;

    let config = EventConfig::from_env();
    info!(
        dates = dates.len(),
        output = %config.output_location,
        overwrite = config.overwrite,
        cache_local = config.cache_local,
        "Handling queue event"
    );

    for date in dates {
        let options = DayOptions {
            input_location: config.input_location.clone(),
            overwrite: config.overwrite,
            cache_local: config.cache_local,
        };
        let result = process_date(
            date,
            &config.output_location,
            public_url.clone(),
            collaborators.clone(),
            options,
        )
        .await;

        match result {
            Ok(()) => {}
            Err(SstError::SourceNotFound(source)) => {
                error!(date = %date, source = %source, "Couldn't find file for date");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
