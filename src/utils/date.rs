//! Publication date parsing for front matter.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parse a front matter date.
///
/// Accepts RFC 3339 (offset converted to UTC), a local datetime, or a bare
/// `YYYY-MM-DD` date (midnight).
pub fn parse(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Parse a TOML value that is either a native datetime or a string.
pub fn from_toml(value: &toml::Value) -> Option<NaiveDateTime> {
    match value {
        toml::Value::Datetime(dt) => parse(&dt.to_string()),
        toml::Value::String(s) => parse(s),
        _ => None,
    }
}
