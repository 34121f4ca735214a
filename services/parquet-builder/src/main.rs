//! GHRSST MUR GeoParquet builder.
//!
//! Fetches the STAC item for every day in a date range and replaces the
//! collection's GeoParquet file with one row per item found.

mod plan;

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ingestion::{
    AggregationReport, BatchAggregator, HttpItemFetcher, ItemFetcher, StorageItemFetcher,
    WriteStrategy, DEFAULT_FETCH_CONCURRENCY,
};
use sst_common::SstResult;
use storage::open_storage;

use plan::{BuildPlan, PlanInput, DEFAULT_INPUT_LOCATION};

#[derive(Parser, Debug)]
#[command(name = "create-parquet")]
#[command(about = "Rebuild the GHRSST MUR GeoParquet catalog for a date range")]
struct Args {
    /// First date (YYYY-MM-DD)
    #[arg(long, env = "START_DATE")]
    start_date: Option<String>,

    /// Last date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<String>,

    /// Root holding the daily STAC items
    #[arg(long, env = "INPUT_LOCATION", default_value = DEFAULT_INPUT_LOCATION)]
    input_location: String,

    /// Where to write the parquet file (defaults to the input location)
    #[arg(long, env = "OUTPUT_LOCATION")]
    output_location: Option<String>,

    /// Build the file locally before copying it to object storage
    #[arg(long, env = "WRITE_TEMPFILE", default_value_t = true, action = clap::ArgAction::Set)]
    write_tempfile: bool,

    /// Scratch directory for the staged file
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Public URL of the input root. Defaults to the source.coop mirror of an
    /// s3:// input; items are fetched over HTTP whenever one is known
    #[arg(long, env = "PUBLIC_URL")]
    public_url: Option<String>,

    /// Scheduled run: from START_DATE (default 2025-01-01) to today
    #[arg(long)]
    scheduled: bool,

    /// Maximum simultaneous item fetches
    #[arg(long, default_value_t = DEFAULT_FETCH_CONCURRENCY)]
    concurrency: usize,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_plan_input(self) -> PlanInput {
        PlanInput {
            start_date: self.start_date,
            end_date: self.end_date,
            input_location: self.input_location,
            output_location: self.output_location,
            write_tempfile: self.write_tempfile,
            scratch_dir: self.scratch_dir.unwrap_or_else(std::env::temp_dir),
            public_url: self.public_url,
            scheduled: self.scheduled,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let concurrency = args.concurrency;
    match build(args.into_plan_input(), concurrency).await {
        Ok(report) => {
            println!(
                "Created parquet with {} rows, written to {}",
                report.item_count, report.output
            );
            Ok(())
        }
        Err(e) if e.is_domain() => {
            println!("Failed to create parquet with error {}", e);
            std::process::exit(1);
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

async fn build(input: PlanInput, concurrency: usize) -> SstResult<AggregationReport> {
    let plan = BuildPlan::resolve(input, Utc::now().date_naive())?;
    info!(
        start = %plan.range.start,
        end = %plan.range.end,
        input = %plan.input,
        output = %plan.output,
        write_tempfile = plan.write_tempfile,
        "Building parquet"
    );

    let fetcher: Box<dyn ItemFetcher> = match &plan.public_url {
        Some(url) => Box::new(HttpItemFetcher::new(url.clone())?),
        None => Box::new(StorageItemFetcher::new(open_storage(&plan.input, None)?)),
    };
    let destination = open_storage(&plan.output, None)?;
    let strategy = WriteStrategy::for_destination(
        plan.write_tempfile,
        destination.is_remote(),
        plan.scratch_dir.clone(),
    );

    let report = BatchAggregator::new(fetcher, destination, strategy)
        .with_concurrency(concurrency)
        .aggregate(&plan.range)
        .await?;

    info!(
        items = report.item_count,
        skipped = report.skipped.len(),
        "Replaced parquet file"
    );
    Ok(report)
}
