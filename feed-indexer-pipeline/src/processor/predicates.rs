//! Boolean tests applied to post records.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use crate::errors::PipelineError;
use feed_indexer_shared::PostRecord;

/// Posts older than this are considered archived (typically imports from
/// other networks carrying their original dates).
pub const ARCHIVE_THRESHOLD_HOURS: i64 = 24;

const OFFSET_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M%#z",
    "%Y%m%dT%H%M%S%.f%#z",
    "%Y%m%dT%H%M%#z",
];

const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%S%.f",
    "%Y%m%dT%H%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y%m%d"];

/// Parse an ISO-8601 creation timestamp.
///
/// Accepts the extended and basic forms, with or without seconds and
/// fractional seconds. Offsets may be `Z`, `+hh:mm`, `+hhmm` or `+hh` and
/// are converted to UTC; timestamps without one are taken to be UTC
/// already. A bare date means midnight.
pub fn parse_created_at(value: &str) -> Result<DateTime<Utc>, PipelineError> {
    let value = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    let with_offset = match value.strip_suffix('Z').or_else(|| value.strip_suffix('z')) {
        Some(local) => format!("{}+00:00", local),
        None => value.to_string(),
    };
    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(&with_offset, format) {
            return Ok(parsed.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed.and_utc());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return Ok(midnight.and_utc());
            }
        }
    }

    Err(PipelineError::parse(format!(
        "Invalid created_at timestamp: {:?}",
        value
    )))
}

/// Whether a post created at `created_at` is older than the archive
/// threshold at `now`. A post exactly at the threshold is not archived.
pub fn is_archive_post(created_at: &str, now: DateTime<Utc>) -> Result<bool, PipelineError> {
    let created_at = parse_created_at(created_at)?;
    Ok(now - created_at > Duration::hours(ARCHIVE_THRESHOLD_HOURS))
}

/// Whether the record replies to another post.
pub fn is_reply(record: &PostRecord) -> bool {
    record.reply.is_some()
}

/// Interpret a configuration flag.
///
/// `true`, `yes` and `y` in any case are enabled; everything else,
/// including an unset value, is disabled.
pub fn is_enabled(setting: Option<&str>) -> bool {
    match setting {
        Some(value) => matches!(value.to_lowercase().as_str(), "true" | "yes" | "y"),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 2, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_archive_boundary_is_exclusive() {
        assert!(!is_archive_post("2024-06-01T12:00:00Z", now()).unwrap());
        assert!(is_archive_post("2024-06-01T11:59:59Z", now()).unwrap());
        assert!(!is_archive_post("2024-06-02T11:00:00Z", now()).unwrap());
    }

    #[test]
    fn test_archive_honours_offset() {
        // 2024-06-01T13:00:00+02:00 is 11:00 UTC, 25h before now.
        assert!(is_archive_post("2024-06-01T13:00:00+02:00", now()).unwrap());
        // 2024-06-01T08:00:00-04:00 is 12:00 UTC, exactly 24h before now.
        assert!(!is_archive_post("2024-06-01T08:00:00-04:00", now()).unwrap());
    }

    #[test]
    fn test_naive_timestamp_is_utc() {
        let parsed = parse_created_at("2024-06-01T12:00:00.123").unwrap();
        assert_eq!(parsed.timestamp(), now().timestamp() - 86_400);
        assert!(parse_created_at("2024-06-01 12:00:00").is_ok());
        assert!(parse_created_at("2024-06-01").is_ok());
    }

    #[test]
    fn test_other_iso_8601_forms() {
        let expected = now().timestamp() - 86_400;
        for value in [
            "2024-06-01T12:00:00+0000",
            "2024-06-01T12:00Z",
            "2024-06-01T12:00:00.000+00",
            "20240601T120000Z",
            "2024-06-01T14:00+02",
            "2024-06-01T12:00",
            "20240601T1200",
        ] {
            let parsed = parse_created_at(value).unwrap();
            assert_eq!(parsed.timestamp(), expected, "{}", value);
        }
        assert_eq!(
            parse_created_at("20240602").unwrap().timestamp(),
            expected + 43_200
        );
    }

    #[test]
    fn test_future_timestamp_is_not_archived() {
        assert!(!is_archive_post("2030-01-01T00:00:00Z", now()).unwrap());
    }

    #[test]
    fn test_malformed_timestamp_is_parse_error() {
        let result = is_archive_post("yesterday-ish", now());
        assert!(matches!(result, Err(PipelineError::ParseError(_))));
    }

    #[test]
    fn test_is_enabled() {
        assert!(is_enabled(Some("true")));
        assert!(is_enabled(Some("True")));
        assert!(is_enabled(Some("YES")));
        assert!(is_enabled(Some("y")));
        assert!(!is_enabled(Some("")));
        assert!(!is_enabled(Some("1")));
        assert!(!is_enabled(Some("no")));
        assert!(!is_enabled(None));
    }

    #[test]
    fn test_is_reply() {
        let record = PostRecord::new("hi", "2024-06-01T12:00:00Z");
        assert!(!is_reply(&record));
        assert!(is_reply(&record.with_reply("at://root", "at://parent")));
    }
}
