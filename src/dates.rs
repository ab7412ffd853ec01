//! Date-range resolution for transaction questions
//!
//! When a caller omits explicit bounds, questions are scoped to the trailing
//! twelve months ending today.

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoachError;
use crate::Result;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn start_str(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

/// Default window: today back to the same day one calendar year earlier.
pub fn default_range() -> DateRange {
    default_range_from(Local::now().date_naive())
}

/// Default window ending on `today`.
///
/// The start date only changes the year field. Feb 29 has no counterpart in
/// the previous year and clamps to Feb 28.
pub fn default_range_from(today: NaiveDate) -> DateRange {
    let start = today
        .with_year(today.year() - 1)
        .or_else(|| NaiveDate::from_ymd_opt(today.year() - 1, today.month(), 28))
        .unwrap_or(today);

    DateRange { start, end: today }
}

/// Fill missing bounds from the default window and validate supplied ones.
pub fn resolve_range(start: Option<&str>, end: Option<&str>) -> Result<DateRange> {
    resolve_range_from(start, end, Local::now().date_naive())
}

pub fn resolve_range_from(
    start: Option<&str>,
    end: Option<&str>,
    today: NaiveDate,
) -> Result<DateRange> {
    let default = default_range_from(today);
    let range = DateRange {
        start: parse_bound("startDate", start)?.unwrap_or(default.start),
        end: parse_bound("endDate", end)?.unwrap_or(default.end),
    };

    if range.start > range.end {
        return Err(CoachError::InvalidRequest(format!(
            "startDate {} is after endDate {}",
            range.start_str(),
            range.end_str()
        )));
    }

    Ok(range)
}

fn parse_bound(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map(Some)
            .map_err(|_| {
                CoachError::InvalidRequest(format!(
                    "{} must be a date in YYYY-MM-DD format, got '{}'",
                    field, raw
                ))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_range_subtracts_one_year() {
        let range = default_range_from(date(2025, 6, 15));
        assert_eq!(range.start, date(2024, 6, 15));
        assert_eq!(range.end, date(2025, 6, 15));
        assert_eq!(range.start_str(), "2024-06-15");
        assert_eq!(range.end_str(), "2025-06-15");
    }

    #[test]
    fn test_default_range_across_leap_year() {
        // 2024-03-01 minus 365 days would land on 2023-03-02
        let range = default_range_from(date(2024, 3, 1));
        assert_eq!(range.start, date(2023, 3, 1));

        let range = default_range_from(date(2025, 2, 28));
        assert_eq!(range.start, date(2024, 2, 28));
    }

    #[test]
    fn test_default_range_on_leap_day() {
        let range = default_range_from(date(2024, 2, 29));
        assert_eq!(range.start, date(2023, 2, 28));
    }

    #[test]
    fn test_default_range_is_stable() {
        let a = default_range();
        let b = default_range();
        assert!(a == b || a.end < b.end);
        assert_eq!(a.start.year(), a.end.year() - 1);
    }

    #[test]
    fn test_resolve_fills_missing_bounds() {
        let today = date(2025, 1, 10);
        let range = resolve_range_from(Some("2024-12-01"), None, today).unwrap();
        assert_eq!(range.start, date(2024, 12, 1));
        assert_eq!(range.end, today);

        let range = resolve_range_from(None, Some(""), today).unwrap();
        assert_eq!(range, default_range_from(today));
    }

    #[test]
    fn test_resolve_rejects_bad_format() {
        let err = resolve_range_from(Some("01/12/2024"), None, date(2025, 1, 10)).unwrap_err();
        assert!(err.is_invalid_request());
        assert!(err.to_string().contains("startDate"));
    }

    #[test]
    fn test_resolve_rejects_inverted_window() {
        let today = date(2025, 1, 10);

        let err = resolve_range_from(Some("2025-06-01"), None, today).unwrap_err();
        assert!(err.is_invalid_request());
        assert!(err.to_string().contains("after endDate"));

        let err = resolve_range_from(Some("2024-05-02"), Some("2024-05-01"), today).unwrap_err();
        assert!(err.is_invalid_request());

        let range = resolve_range_from(Some("2024-05-01"), Some("2024-05-01"), today).unwrap();
        assert_eq!(range.start, range.end);
    }
}
