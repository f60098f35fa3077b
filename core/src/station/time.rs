use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Naive layouts seen in Grape1 filenames and `UTC` columns, tried in order.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H%M%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y%m%dT%H%M%S",
];

/// Parse a UTC timestamp. A trailing `Z` is optional on naive layouts.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    let naive = value.strip_suffix('Z').unwrap_or(value);
    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(Utc.from_utc_datetime(&parsed));
        }
    }

    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| Utc.from_utc_datetime(&midnight))
}

pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Signed seconds from `origin` to `instant`.
pub fn seconds_between(origin: DateTime<Utc>, instant: DateTime<Utc>) -> f64 {
    let delta = instant - origin;
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 * 1e-9,
        None => delta.num_milliseconds() as f64 * 1e-3,
    }
}

pub fn duration_seconds(duration: Duration) -> f64 {
    match duration.num_nanoseconds() {
        Some(ns) => ns as f64 * 1e-9,
        None => duration.num_milliseconds() as f64 * 1e-3,
    }
}

/// Positive, finite seconds to a nanosecond-resolution duration.
pub fn duration_from_seconds(seconds: f64) -> Option<Duration> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    let nanos = (seconds * 1e9).round();
    if nanos < 1.0 || nanos >= i64::MAX as f64 {
        return None;
    }
    Some(Duration::nanoseconds(nanos as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parses_grape_filename_timestamp() {
        let parsed = parse_timestamp("2021-10-25T000000Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2021, 10, 25, 0, 0, 0).unwrap());
    }

    #[test]
    fn parses_column_timestamps_with_fractional_seconds() {
        let rfc = parse_timestamp("2021-10-25T01:02:03.250Z").unwrap();
        assert_eq!(rfc.nanosecond(), 250_000_000);
        let spaced = parse_timestamp("2021-10-25 01:02:03.5").unwrap();
        assert_eq!(spaced.second(), 3);
        assert_eq!(spaced.nanosecond(), 500_000_000);
        let date_only = parse_timestamp("2021-10-25").unwrap();
        assert_eq!(date_only.hour(), 0);
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn converts_between_seconds_and_durations() {
        let origin = Utc.with_ymd_and_hms(2021, 10, 25, 0, 0, 0).unwrap();
        let later = origin + Duration::milliseconds(1_500);
        assert!((seconds_between(origin, later) - 1.5).abs() < 1e-12);
        assert_eq!(duration_from_seconds(0.25), Some(Duration::milliseconds(250)));
        assert_eq!(duration_from_seconds(-1.0), None);
        assert_eq!(duration_from_seconds(f64::NAN), None);
        assert!((duration_seconds(Duration::seconds(60)) - 60.0).abs() < 1e-12);
    }

    #[test]
    fn formats_whole_seconds_without_fraction() {
        let instant = Utc.with_ymd_and_hms(2021, 10, 25, 12, 0, 0).unwrap();
        assert_eq!(format_timestamp(instant), "2021-10-25T12:00:00Z");
    }
}
