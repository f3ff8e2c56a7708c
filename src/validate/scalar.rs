//! Runtime checks for the primitive display names the validator knows.
//!
//! JSON has no date or regular-expression values, so those travel as tagged
//! objects: `{"$date": "2023-05-12T10:07:28Z"}`, `{"$date": 1683886048417}`
//! and `{"$regex": "^a+$"}`.
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde_json::Value;

pub const DATE_TAG: &str = "$date";
pub const REGEX_TAG: &str = "$regex";

/// How a value qualified as a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateForm {
    Tagged,
    /// Acceptable, but only after conversion.
    String,
    Timestamp,
}

/// `typeof`-style name of a data value; `undefined` when absent.
pub fn type_of(value: Option<&Value>) -> &'static str {
    match value {
        None => "undefined",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Null | Value::Array(_) | Value::Object(_)) => "object",
    }
}

/// Plain text rendering of a value: strings unquoted, everything else as JSON.
pub fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn matches_primitive(name: &str, value: &Value) -> bool {
    match name {
        "boolean" => value.is_boolean(),
        "string" => value.is_string(),
        "number" => value.is_number(),
        "bigint" => is_integral(value),
        _ => false,
    }
}

/// The number an object key spells, when it is the number's canonical text
/// (`"12"`, `"-0.5"`; not `"+1"`, `"1e3"`, `"NaN"`).
pub fn numeric_key(key: &str) -> Option<f64> {
    let n = key.parse::<f64>().ok().filter(|n| n.is_finite())?;
    (n.to_string() == key).then_some(n)
}

fn is_integral(value: &Value) -> bool {
    value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|f| f.fract() == 0.0)
}

pub fn date_form(value: &Value) -> Option<DateForm> {
    match value {
        Value::String(s) => parse_date(s).map(|_| DateForm::String),
        Value::Number(n) => {
            let ms = n.as_u64()?;
            timestamp_ok(i64::try_from(ms).ok()?).then_some(DateForm::Timestamp)
        }
        Value::Object(map) if map.len() == 1 => match map.get(DATE_TAG)? {
            Value::String(s) => parse_date(s).map(|_| DateForm::Tagged),
            Value::Number(n) => timestamp_ok(n.as_i64()?).then_some(DateForm::Tagged),
            _ => None,
        },
        _ => None,
    }
}

/// A tagged regular expression whose pattern compiles.
pub fn is_tagged_regex(value: &Value) -> bool {
    let Value::Object(map) = value else {
        return false;
    };
    match map.get(REGEX_TAG) {
        Some(Value::String(pattern)) if map.len() == 1 => Regex::new(pattern).is_ok(),
        _ => false,
    }
}

fn timestamp_ok(ms: i64) -> bool {
    DateTime::<Utc>::from_timestamp_millis(ms).is_some()
}

/// Epoch milliseconds of an RFC 3339 date-time, an ISO date-time without
/// offset (read as UTC) or a plain ISO date.
pub fn parse_date(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    let day = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(day.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dates_accept_strings_timestamps_and_tags() {
        assert_eq!(date_form(&json!("2023-05-12T10:07:28.417Z")), Some(DateForm::String));
        assert_eq!(date_form(&json!("2023-05-12")), Some(DateForm::String));
        assert_eq!(date_form(&json!("2023-05-12T10:07:28")), Some(DateForm::String));
        assert_eq!(date_form(&json!(1683886048417u64)), Some(DateForm::Timestamp));
        assert_eq!(date_form(&json!({ "$date": "2023-05-12T10:07:28Z" })), Some(DateForm::Tagged));
        assert_eq!(date_form(&json!({ "$date": -5 })), Some(DateForm::Tagged));
    }

    #[test]
    fn dates_reject_everything_else() {
        for v in [json!("wat"), json!(""), json!(-1), json!(1.5), json!(true), json!({ "$date": "nope" }), json!({})] {
            assert_eq!(date_form(&v), None, "{v}");
        }
    }

    #[test]
    fn parsed_dates_are_utc_millis() {
        assert_eq!(parse_date("1970-01-01T00:00:01Z"), Some(1000));
        assert_eq!(parse_date("1970-01-02"), Some(86_400_000));
    }

    #[test]
    fn bigint_needs_integral_numbers() {
        assert!(matches_primitive("bigint", &json!(12)));
        assert!(matches_primitive("bigint", &json!(12.0)));
        assert!(!matches_primitive("bigint", &json!(1.5)));
        assert!(!matches_primitive("bigint", &json!("12")));
    }

    #[test]
    fn numeric_keys_must_be_canonical() {
        assert_eq!(numeric_key("12"), Some(12.0));
        assert_eq!(numeric_key("-0.5"), Some(-0.5));
        for key in ["NaN", "inf", "+1", "1e3", "01", "1.0", ".5", "", "abc"] {
            assert_eq!(numeric_key(key), None, "{key}");
        }
    }

    #[test]
    fn tagged_regexes_must_compile() {
        assert!(is_tagged_regex(&json!({ "$regex": "(a+)" })));
        assert!(!is_tagged_regex(&json!({ "$regex": "(a+" })));
        assert!(!is_tagged_regex(&json!("(a+)")));
    }

    #[test]
    fn type_names_follow_runtime_tags() {
        assert_eq!(type_of(None), "undefined");
        assert_eq!(type_of(Some(&json!(null))), "object");
        assert_eq!(type_of(Some(&json!([1]))), "object");
        assert_eq!(type_of(Some(&json!(1))), "number");
        assert_eq!(text_of(&json!("wat")), "wat");
        assert_eq!(text_of(&json!(5)), "5");
    }
}
