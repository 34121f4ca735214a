//! Date handling for daily products.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{SstError, SstResult};

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> SstResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| SstError::InvalidDate(s.to_string()))
}

/// Midnight UTC at the start of the day.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

/// Last whole second of the day, 23:59:59 UTC.
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::seconds(86_399)
}

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> SstResult<Self> {
        if end < start {
            return Err(SstError::Configuration(format!(
                "end date {} is before start date {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// The `days` dates ending at (and including) `end`.
    pub fn trailing(end: NaiveDate, days: u32) -> SstResult<Self> {
        if days == 0 {
            return Err(SstError::Configuration("day count must be at least 1".to_string()));
        }
        Self::new(end - Duration::days(days as i64 - 1), end)
    }

    pub fn len(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take(self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2023-11-06").unwrap(),
            NaiveDate::from_ymd_opt(2023, 11, 6).unwrap()
        );
        assert!(matches!(parse_date("06/11/2023"), Err(SstError::InvalidDate(_))));
        assert!(parse_date("2023-02-30").is_err());
    }

    #[test]
    fn test_day_bounds() {
        let date = NaiveDate::from_ymd_opt(2023, 11, 6).unwrap();
        assert_eq!(start_of_day(date).to_rfc3339(), "2023-11-06T00:00:00+00:00");
        assert_eq!(end_of_day(date).to_rfc3339(), "2023-11-06T23:59:59+00:00");
    }

    #[test]
    fn test_range_is_inclusive() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 2, 27).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        )
        .unwrap();
        let dates: Vec<_> = range.dates().map(|d| d.to_string()).collect();
        assert_eq!(dates, ["2024-02-27", "2024-02-28", "2024-02-29", "2024-03-01"]);
    }

    #[test]
    fn test_range_rejects_reversed() {
        let a = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(DateRange::new(a, b).is_err());
    }

    #[test]
    fn test_trailing() {
        let end = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let range = DateRange::trailing(end, 7).unwrap();
        assert_eq!(range.len(), 7);
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2023, 12, 28).unwrap());
    }
}
