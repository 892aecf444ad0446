//! Date-boundary normalization for range queries.
//!
//! Callers may pass either a full RFC 3339 timestamp or a bare `YYYY-MM-DD`
//! date. Bare dates expand to the start of the day for `from` bounds and to
//! the end of the day for `to` bounds, both in UTC.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

/// Parses a `from` bound, expanding a bare date to start of day (UTC).
#[must_use]
pub fn parse_from_bound(value: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts);
    }
    let date = value.parse::<NaiveDate>().ok()?;
    let start = date.and_time(NaiveTime::MIN);
    Some(Utc.from_utc_datetime(&start).fixed_offset())
}

/// Parses a `to` bound, expanding a bare date to end of day (UTC).
///
/// End of day is `23:59:59.999999`, the finest granularity stored in
/// microsecond-resolution timestamp columns.
#[must_use]
pub fn parse_to_bound(value: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts);
    }
    let date = value.parse::<NaiveDate>().ok()?;
    let end = date.and_time(NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)?);
    Some(Utc.from_utc_datetime(&end).fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bound_full_timestamp() {
        let ts = parse_from_bound("2024-01-01T10:30:00+07:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-01T10:30:00+07:00");
    }

    #[test]
    fn test_from_bound_bare_date() {
        let ts = parse_from_bound("2024-01-01").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_to_bound_bare_date_is_end_of_day() {
        let ts = parse_to_bound("2024-01-01").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-01T23:59:59.999999+00:00");
    }

    #[test]
    fn test_invalid_input() {
        assert!(parse_from_bound("yesterday").is_none());
        assert!(parse_to_bound("2024-13-40").is_none());
    }
}
