use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a numeric cell. Surrounding whitespace is ignored.
///
/// `NaN`, `Inf` and `-Inf` are the only accepted non-finite spellings; other
/// words such as `nan` or `infinity` are text.
pub fn parse_numeric(s: &str) -> Option<f64> {
    let s = s.trim();
    match s {
        "" => None,
        "NaN" => Some(f64::NAN),
        "Inf" => Some(f64::INFINITY),
        "-Inf" => Some(f64::NEG_INFINITY),
        _ if s.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') => None,
        _ => s.parse::<f64>().ok(),
    }
}

/// Parse a temporal cell: ISO dates, date-times and RFC 3339 timestamps.
pub fn parse_temporal(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.naive_utc())
}

/// Shortest text form of a number (`3` rather than `3.0`)
pub fn format_number(v: f64) -> String {
    if v.is_infinite() {
        if v > 0.0 {
            "Inf".to_string()
        } else {
            "-Inf".to_string()
        }
    } else {
        format!("{}", v)
    }
}

/// Date-only form at midnight, full date-time otherwise
pub fn format_temporal(t: &NaiveDateTime) -> String {
    if t.num_seconds_from_midnight() == 0 && t.nanosecond() == 0 {
        t.format("%Y-%m-%d").to_string()
    } else if t.nanosecond() == 0 {
        t.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        t.format("%Y-%m-%d %H:%M:%S%.f").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric() {
        assert_eq!(parse_numeric(" 4.5 "), Some(4.5));
        assert_eq!(parse_numeric("1e3"), Some(1000.0));
        assert_eq!(parse_numeric("-Inf"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_numeric("a"), None);
        assert!(parse_numeric("NaN").unwrap().is_nan());
        assert_eq!(parse_numeric("Inf"), Some(f64::INFINITY));
        for word in ["Nan", "nan", "inf", "infinity", "-infinity", "+inf"] {
            assert_eq!(parse_numeric(word), None, "{}", word);
        }
        assert_eq!(parse_numeric(""), None);
    }

    #[test]
    fn test_parse_temporal_round_trip() {
        let date = parse_temporal("2023-04-05").unwrap();
        assert_eq!(format_temporal(&date), "2023-04-05");

        let datetime = parse_temporal("2023-04-05 13:14:15").unwrap();
        assert_eq!(format_temporal(&datetime), "2023-04-05 13:14:15");

        assert!(parse_temporal("2023-04-05T13:14:15Z").is_some());

        let fractional = parse_temporal("2023-04-05T13:14:15.250Z").unwrap();
        let text = format_temporal(&fractional);
        assert_eq!(text, "2023-04-05 13:14:15.250");
        assert_eq!(parse_temporal(&text), Some(fractional));
        assert!(parse_temporal("yesterday").is_none());
    }
}
