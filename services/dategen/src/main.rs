//! GHRSST MUR date generator.
//!
//! Puts one message per recent date onto the work queue so each date is
//! converted by an independent cogger run.

mod messages;

use anyhow::{Context, Result};
use aws_sdk_sqs::types::SendMessageBatchRequestEntry;
use chrono::Utc;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use sst_common::time::parse_date;

use messages::{batches, build_messages, DateMessage};

#[derive(Parser, Debug)]
#[command(name = "ghrsst-dategen")]
#[command(about = "Queue the most recent GHRSST MUR dates for processing")]
struct Args {
    /// Number of dates to queue, ending today
    #[arg(long, env = "N_PREVIOUS_DAYS", default_value_t = 7)]
    n_previous_days: u32,

    /// Queue to send date messages to
    #[arg(long, env = "QUEUE_NAME", default_value = "ghrsst-queue")]
    queue_name: String,

    /// Use this date instead of today (YYYY-MM-DD)
    #[arg(long)]
    today: Option<String>,

    /// Print the messages instead of sending them
    #[arg(long)]
    dry_run: bool,

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

    let today = match &args.today {
        Some(s) => parse_date(s)?,
        None => Utc::now().date_naive(),
    };
    info!(date = %today, days = args.n_previous_days, "Working on date");

    let messages = build_messages(today, args.n_previous_days)?;

    if args.dry_run {
        for message in &messages {
            println!("{} {}", message.id, message.body);
        }
        return Ok(());
    }

    send(&args.queue_name, &messages).await
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

async fn send(queue_name: &str, messages: &[DateMessage]) -> Result<()> {
    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .load()
        .await;
    let client = aws_sdk_sqs::Client::new(&aws_config);

    info!(queue = %queue_name, "Getting queue");
    let lookup = client
        .get_queue_url()
        .queue_name(queue_name)
        .send()
        .await
        .with_context(|| format!("looking up queue {}", queue_name))?;
    let queue_url = lookup
        .queue_url()
        .map(str::to_string)
        .with_context(|| format!("queue {} has no URL", queue_name))?;

    info!(count = messages.len(), "Sending messages");
    for batch in batches(messages) {
        let entries = batch
            .iter()
            .map(|m| {
                SendMessageBatchRequestEntry::builder()
                    .id(&m.id)
                    .message_body(&m.body)
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let output = client
            .send_message_batch()
            .queue_url(&queue_url)
            .set_entries(Some(entries))
            .send()
            .await
            .context("sending message batch")?;

        for failed in output.failed() {
            warn!(id = %failed.id(), code = %failed.code(), "Message was not queued");
        }
    }

    Ok(())
}
