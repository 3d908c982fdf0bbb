//! Essay text normalization and derived metrics.

use chrono::{DateTime, Utc};

/// Upper bound on essay length, in characters, after trimming.
pub const MAX_ESSAY_CHARS: usize = 20_000;

/// Trims surrounding whitespace; absent text becomes empty.
pub fn normalize_essay_text(raw: Option<&str>) -> String {
    raw.map(str::trim).unwrap_or_default().to_string()
}

/// Counts whitespace-delimited tokens.
pub fn word_count(text: &str) -> u32 {
    saturating_u32(text.split_whitespace().count())
}

/// Counts characters (Unicode scalar values), not bytes.
pub fn char_count(text: &str) -> u32 {
    saturating_u32(text.chars().count())
}

/// Whole seconds elapsed between `started_at` and `now`.
///
/// Missing start yields 0; clock skew (`now < started_at`) clamps to 0.
pub fn duration_seconds(started_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    match started_at {
        Some(started_at) => (now - started_at).num_seconds().max(0),
        None => 0,
    }
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{char_count, duration_seconds, normalize_essay_text, word_count};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn word_count_splits_on_any_whitespace() {
        assert_eq!(word_count("  "), 0);
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("a b  c"), 3);
        assert_eq!(word_count("one\ttwo\nthree\r\nfour"), 4);
    }

    #[test]
    fn char_count_uses_trimmed_characters() {
        let text = normalize_essay_text(Some(" hi "));
        assert_eq!(char_count(&text), 2);
        assert_eq!(char_count("naïve café"), 10);
    }

    #[test]
    fn absent_text_normalizes_to_empty() {
        assert_eq!(normalize_essay_text(None), "");
    }

    #[test]
    fn duration_floors_partial_seconds() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let now = start + Duration::milliseconds(125_900);
        assert_eq!(duration_seconds(Some(start), now), 125);
    }

    #[test]
    fn duration_clamps_clock_skew_and_missing_start() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 10).unwrap();
        let now = start - Duration::seconds(10);
        assert_eq!(duration_seconds(Some(start), now), 0);
        assert_eq!(duration_seconds(None, now), 0);
    }
}
