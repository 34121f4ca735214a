//! SQS-shaped queue events carrying one date per message.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{error, info};

use sst_common::time::parse_date;
use sst_common::{SstError, SstResult};

pub const SQS_EVENT_SOURCE: &str = "aws:sqs";

#[derive(Debug, Deserialize)]
pub struct QueueEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<QueueRecord>,
}

#[derive(Debug, Deserialize)]
pub struct QueueRecord {
    #[serde(rename = "eventSource")]
    pub event_source: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DateMessage {
    date: String,
}

impl QueueEvent {
    pub fn from_json(data: &[u8]) -> SstResult<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Dates from every SQS record, in message order. Records from other
    /// sources are logged and ignored. An event with no date at all is a
    /// configuration error.
    pub fn dates(&self) -> SstResult<Vec<NaiveDate>> {
        let mut dates = Vec::new();

        for record in &self.records {
            if record.event_source.as_deref() != Some(SQS_EVENT_SOURCE) {
                error!(record = ?record, "No SQS message found");
                continue;
            }
            let body = record.body.as_deref().unwrap_or_default();
            let message: DateMessage = serde_json::from_str(body)?;
            info!(date = %message.date, "Received date");
            dates.push(parse_date(&message.date)?);
        }

        if dates.is_empty() {
            return Err(SstError::Configuration(
                "No date found in event, exiting".to_string(),
            ));
        }
        Ok(dates)
    }
}
