//! # Time Utilities
//!
//! Utilities for time formatting and manipulation using chrono.

use chrono::{DateTime, NaiveDate, Utc};

/// Date layouts accepted on statement rows, tried in order.
const US_DATE_LAYOUTS: &[&str] = &["%m/%d/%Y", "%-m/%-d/%Y"];

/// Get current UTC time.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Format time as RFC3339 string.
pub fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339()
}

/// Parse RFC3339 string to UTC DateTime.
pub fn parse_utc(moment: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(moment)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::FailToDateParse(moment.to_string()))
}

/// Parse a US style `M/D/YYYY` or `MM/DD/YYYY` date.
pub fn parse_us_date(date: &str) -> Result<NaiveDate, Error> {
    let date = date.trim();
    US_DATE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDate::parse_from_str(date, layout).ok())
        .ok_or_else(|| Error::FailToDateParse(date.to_string()))
}

/// Format a timestamp as `MM/DD/YYYY`.
pub fn format_us_date(time: DateTime<Utc>) -> String {
    time.format("%m/%d/%Y").to_string()
}

// region:    --- Error
#[derive(Debug)]
pub enum Error {
    FailToDateParse(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "{self:?}")
    }
}

impl std::error::Error for Error {}
// endregion: --- Error

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_us_date_single_and_double_digits() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(parse_us_date("3/7/2024").unwrap(), expected);
        assert_eq!(parse_us_date("03/07/2024").unwrap(), expected);
    }

    #[test]
    fn test_parse_us_date_rejects_other_layouts() {
        assert!(parse_us_date("2024-03-07").is_err());
        assert!(parse_us_date("13/40/2024").is_err());
        assert!(parse_us_date("").is_err());
    }

    #[test]
    fn test_format_us_date() {
        let time = Utc.with_ymd_and_hms(2024, 1, 5, 14, 30, 0).unwrap();
        assert_eq!(format_us_date(time), "01/05/2024");
    }

    #[test]
    fn test_rfc3339_round_trip() {
        let time = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_utc(&format_time(time)).unwrap(), time);
    }
}
