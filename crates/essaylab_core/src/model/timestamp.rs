//! Storage encoding for UTC timestamps.
//!
//! Timestamps are written as RFC 3339 text with microsecond precision and a
//! `Z` suffix. Rows written by older tooling may lack an offset; those are
//! read as UTC, never as local time.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Drops sub-microsecond digits so in-memory values equal what storage
/// reads back.
pub fn to_storage_precision(value: DateTime<Utc>) -> DateTime<Utc> {
    value.trunc_subsecs(6)
}

/// Encodes a UTC instant for storage.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Decodes a stored timestamp, treating offset-less values as UTC.
///
/// Returns `None` for blank or unparseable input.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::{format_timestamp, parse_timestamp, to_storage_precision};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn storage_precision_matches_round_trip() {
        let precise = Utc.with_ymd_and_hms(2025, 9, 11, 16, 0, 0).unwrap()
            + Duration::nanoseconds(123_456_789);
        let truncated = to_storage_precision(precise);
        assert_eq!(
            truncated,
            Utc.with_ymd_and_hms(2025, 9, 11, 16, 0, 0).unwrap() + Duration::microseconds(123_456)
        );
        assert_eq!(parse_timestamp(&format_timestamp(precise)), Some(truncated));
    }

    #[test]
    fn offset_less_values_are_read_as_utc() {
        let expected = Utc.with_ymd_and_hms(2025, 9, 11, 14, 30, 5).unwrap();
        assert_eq!(parse_timestamp("2025-09-11 14:30:05"), Some(expected));
        assert_eq!(parse_timestamp("2025-09-11T14:30:05.000000"), Some(expected));
    }

    #[test]
    fn explicit_offsets_are_converted_to_utc() {
        let expected = Utc.with_ymd_and_hms(2025, 9, 11, 14, 30, 5).unwrap();
        assert_eq!(parse_timestamp("2025-09-11T07:30:05-07:00"), Some(expected));
    }

    #[test]
    fn formatted_values_parse_back() {
        let now = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap();
        let text = format_timestamp(now);
        assert!(text.ends_with('Z'));
        assert_eq!(parse_timestamp(&text), Some(now));
    }

    #[test]
    fn blank_and_garbage_values_are_rejected() {
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
