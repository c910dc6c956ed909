//! Cell values as seen by the feature engine.
//!
//! The host hands us whatever its data source holds; this enum is the narrow
//! set of shapes the features care about. Date-like values keep their own
//! variants so rule evaluation and edit normalization can treat them apart
//! from plain text.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// A cell value.
///
/// Serializes untagged, so JSON sees `null`, numbers, booleans and strings.
/// Dates serialize as `YYYY-MM-DD`, datetimes as RFC 3339 with milliseconds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Text(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Numeric view of the value. Text is parsed after trimming.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            CellValue::Text(s) if s.eq_ignore_ascii_case("true") => Some(true),
            CellValue::Text(s) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    /// Timestamp view of the value. Dates are taken at UTC midnight; text is
    /// parsed as RFC 3339, then as a naive ISO datetime, then as an ISO date.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            CellValue::DateTime(dt) => Some(*dt),
            CellValue::Date(d) => Some(date_at_midnight(*d)),
            CellValue::Text(s) => parse_datetime(s),
            _ => None,
        }
    }

    /// Calendar date in `YYYY-MM-DD` form, if the value is date-like.
    pub fn to_iso_date(&self) -> Option<String> {
        match self {
            CellValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            other => other
                .as_datetime()
                .map(|dt| dt.date_naive().format("%Y-%m-%d").to_string()),
        }
    }

    /// Full timestamp in RFC 3339 form with milliseconds and a `Z` suffix.
    pub fn to_iso_datetime(&self) -> Option<String> {
        self.as_datetime()
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Drop seconds and sub-seconds from a timestamp. Other values pass through.
    pub fn trim_seconds(&self) -> CellValue {
        match self {
            CellValue::DateTime(dt) => CellValue::DateTime(
                dt.with_second(0)
                    .and_then(|dt| dt.with_nanosecond(0))
                    .unwrap_or(*dt),
            ),
            CellValue::Text(s) => CellValue::Text(trim_seconds(s)),
            other => other.clone(),
        }
    }

    /// The string form used by text comparisons and display.
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
            CellValue::Text(s) => s.clone(),
        }
    }
}

/// Integers print without a fractional part, everything else as Rust prints f64.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn date_at_midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

/// Parse an ISO-ish timestamp into UTC.
///
/// Accepts RFC 3339 (`2024-05-01T13:45:10.250Z`, `...+02:00`), naive datetimes
/// (`2024-05-01T13:45:10`, `2024-05-01 13:45`) which are taken as UTC, and bare
/// dates (`2024-05-01`) which land on UTC midnight.
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(date_at_midnight)
}

/// Reset the seconds of an ISO timestamp string to `00`, dropping any fraction.
///
/// `2024-05-01T13:45:10.250Z` becomes `2024-05-01T13:45:00Z`. Strings without a
/// `THH:MM:SS` part are returned unchanged.
pub fn trim_seconds(iso: &str) -> String {
    let Some(t) = iso.find('T') else {
        return iso.to_string();
    };
    let time = &iso[t + 1..];
    // HH:MM:SS -> the seconds colon sits at offset 5
    if time.len() < 8 || time.as_bytes()[2] != b':' || time.as_bytes()[5] != b':' {
        return iso.to_string();
    }
    let secs_start = t + 1 + 6;
    let rest = &iso[secs_start..];
    let secs_len = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    format!("{}00{}", &iso[..secs_start], &rest[secs_len..])
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

impl From<DateTime<Utc>> for CellValue {
    fn from(dt: DateTime<Utc>) -> Self {
        CellValue::DateTime(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_text_numbers() {
        assert_eq!(CellValue::from(10).display_text(), "10");
        assert_eq!(CellValue::from(2.5).display_text(), "2.5");
        assert_eq!(CellValue::from(-3.0).display_text(), "-3");
        assert_eq!(CellValue::Empty.display_text(), "");
    }

    #[test]
    fn test_as_number() {
        assert_eq!(CellValue::from(" 42 ").as_number(), Some(42.0));
        assert_eq!(CellValue::from("abc").as_number(), None);
        assert_eq!(CellValue::from(true).as_number(), None);
    }

    #[test]
    fn test_parse_datetime_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 13, 45, 10).unwrap();
        assert_eq!(parse_datetime("2024-05-01T13:45:10Z"), Some(expected));
        assert_eq!(parse_datetime("2024-05-01T15:45:10+02:00"), Some(expected));
        assert_eq!(parse_datetime("2024-05-01T13:45:10"), Some(expected));
        assert_eq!(
            parse_datetime("2024-05-01"),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_datetime("not a date"), None);
    }

    #[test]
    fn test_iso_formats() {
        let dt = CellValue::DateTime(Utc.with_ymd_and_hms(2024, 5, 1, 13, 45, 10).unwrap());
        assert_eq!(dt.to_iso_date().as_deref(), Some("2024-05-01"));
        assert_eq!(dt.to_iso_datetime().as_deref(), Some("2024-05-01T13:45:10.000Z"));

        let d = CellValue::Date(NaiveDate::from_ymd_opt(1900, 1, 1).unwrap());
        assert_eq!(d.to_iso_date().as_deref(), Some("1900-01-01"));
        assert_eq!(d.to_iso_datetime().as_deref(), Some("1900-01-01T00:00:00.000Z"));

        assert_eq!(CellValue::from(3).to_iso_date(), None);
    }

    #[test]
    fn test_trim_seconds() {
        assert_eq!(trim_seconds("2024-05-01T13:45:10.250Z"), "2024-05-01T13:45:00Z");
        assert_eq!(trim_seconds("2024-05-01T13:45:10+02:00"), "2024-05-01T13:45:00+02:00");
        assert_eq!(trim_seconds("2024-05-01T13:45:59"), "2024-05-01T13:45:00");
        // No seconds part: untouched (the zone's colon is not a seconds colon)
        assert_eq!(trim_seconds("2024-05-01T13:45+02:00"), "2024-05-01T13:45+02:00");
        assert_eq!(trim_seconds("2024-05-01"), "2024-05-01");

        let dt = CellValue::DateTime(Utc.with_ymd_and_hms(2024, 5, 1, 13, 45, 10).unwrap());
        assert_eq!(
            dt.trim_seconds(),
            CellValue::DateTime(Utc.with_ymd_and_hms(2024, 5, 1, 13, 45, 0).unwrap())
        );
    }

    #[test]
    fn test_untagged_json() {
        let values = vec![
            CellValue::Empty,
            CellValue::from(1.5),
            CellValue::from(true),
            CellValue::from("hi"),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[null,1.5,true,"hi"]"#);

        let parsed: CellValue = serde_json::from_str(r#""2024-05-01""#).unwrap();
        assert_eq!(parsed, CellValue::Date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()));
    }
}
