//! Calendar helpers for epoch timestamps.

use std::path::Path;

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};

/// Timestamps in calendar years up to and including this one are treated as relative.
pub const ABSOLUTE_YEAR_THRESHOLD: i32 = 2000;

/// Heuristic: a raw µs timestamp is absolute if it falls after the year 2000.
pub fn is_absolute_time(timestamp_us: i64) -> bool {
    DateTime::<Utc>::from_timestamp_micros(timestamp_us)
        .map(|dt| dt.year() > ABSOLUTE_YEAR_THRESHOLD)
        .unwrap_or(false)
}

/// Epoch µs as `YYYY-MM-DD HH:MM:SS` UTC, or the raw number if out of range.
pub fn format_epoch_us(epoch_us: i64) -> String {
    DateTime::<Utc>::from_timestamp_micros(epoch_us)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| format!("{epoch_us} us"))
}

/// Start time encoded in a log file name such as `2014-04-10 15-41-26.jsonl`.
///
/// The stem is read as UTC; anything that does not parse yields `None`.
pub fn starttime_from_filename(path: &Path) -> Option<i64> {
    let stem = path.file_stem()?.to_str()?;
    NaiveDateTime::parse_from_str(stem.trim(), "%Y-%m-%d %H-%M-%S")
        .ok()
        .map(|dt| dt.and_utc().timestamp_micros())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_absolute_time() {
        // 2023-11-14
        assert!(is_absolute_time(1_700_000_000_000_000));
        // boot-relative: a few minutes after 1970
        assert!(!is_absolute_time(300_000_000));
        // 2000-06-01 is still relative by the rule
        assert!(!is_absolute_time(959_817_600_000_000));
        assert!(!is_absolute_time(-5));
    }

    #[test]
    fn test_starttime_from_filename() {
        let path = Path::new("/logs/2014-04-10 15-41-26.jsonl");
        assert_eq!(starttime_from_filename(path), Some(1_397_144_486_000_000));
        assert_eq!(starttime_from_filename(Path::new("flight.jsonl")), None);
        assert_eq!(starttime_from_filename(Path::new("2014-04-10.jsonl")), None);
    }

    #[test]
    fn test_format() {
        assert_eq!(format_epoch_us(0), "1970-01-01 00:00:00");
        assert_eq!(format_epoch_us(1_700_000_000_000_000), "2023-11-14 22:13:20");
    }
}
