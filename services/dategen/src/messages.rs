//! Queue messages naming one date each.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use sst_common::{SstError, SstResult};

/// Largest batch the queue accepts in one send.
pub const MAX_BATCH_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateMessage {
    /// Batch entry id, the date itself
    pub id: String,
    /// JSON body, `{"date": "YYYY-MM-DD"}`
    pub body: String,
}

#[derive(Serialize)]
struct Body<'a> {
    date: &'a str,
}

impl DateMessage {
    pub fn for_date(date: NaiveDate) -> SstResult<Self> {
        let id = date.format("%Y-%m-%d").to_string();
        let body = serde_json::to_string(&Body { date: &id })?;
        Ok(Self { id, body })
    }
}

/// Messages for `today` and the `days - 1` days before it, newest first.
pub fn build_messages(today: NaiveDate, days: u32) -> SstResult<Vec<DateMessage>> {
    if days == 0 {
        return Err(SstError::Configuration(
            "N_PREVIOUS_DAYS must be at least 1".to_string(),
        ));
    }
    (0..days as i64)
        .map(|i| DateMessage::for_date(today - Duration::days(i)))
        .collect()
}

/// Split messages into sendable batches.
pub fn batches(messages: &[DateMessage]) -> impl Iterator<Item = &[DateMessage]> {
    messages.chunks(MAX_BATCH_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_seven_days_back_from_today() {
        let messages = build_messages(date(2025, 3, 2), 7).unwrap();
        assert_eq!(messages.len(), 7);
        assert_eq!(messages[0].id, "2025-03-02");
        assert_eq!(messages[1].id, "2025-03-01");
        assert_eq!(messages[6].id, "2025-02-24");
        assert_eq!(messages[0].body, r#"{"date":"2025-03-02"}"#);
    }

    #[test]
    fn test_body_round_trips_date() {
        let message = DateMessage::for_date(date(2024, 2, 29)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&message.body).unwrap();
        assert_eq!(value["date"], "2024-02-29");
    }

    #[test]
    fn test_batches_respect_queue_limit() {
        let messages = build_messages(date(2025, 1, 31), 23).unwrap();
        let sizes: Vec<usize> = batches(&messages).map(|b| b.len()).collect();
        assert_eq!(sizes, vec![10, 10, 3]);
    }

    #[test]
    fn test_zero_days_rejected() {
        assert!(build_messages(date(2025, 1, 1), 0).is_err());
    }
}
