//! Best-effort type coercion ("typeify")
//!
//! Rewrites leaf values towards the type their schema declares, e.g. the
//! string `"yes"` under a `Boolean` field becomes `true`. A value that cannot
//! be coerced unambiguously is kept as it was; coercion never fails.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use tracing::{debug, trace};

use crate::schema::{child_path, FieldType, ScalarKind, Schema};
use crate::value::{Object, Value};

/// Naive layouts tried for date strings, read as UTC
const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// `Thu Jan 02 2014 00:00:00 GMT+0000`, with any `(zone name)` suffix removed
const ZONED_TEXT_FORMAT: &str = "%a %b %d %Y %H:%M:%S GMT%z";

fn integer_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*([+-]?\d+)").expect("valid integer pattern"))
}

fn float_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)")
            .expect("valid float pattern")
    })
}

/// Recursive coercer for one typeify call
pub(crate) struct Coercer {
    coerced: usize,
}

impl Coercer {
    pub(crate) fn new() -> Self {
        Self { coerced: 0 }
    }

    /// Build the coerced copy of `data`. Only fields declared by `schema`
    /// and present in `data` appear in the top-level result.
    pub(crate) fn run(mut self, schema: &Schema, data: &Value) -> Value {
        if data.is_falsy() {
            return data.clone();
        }

        let mut result = Object::new();
        for (key, spec) in schema.fields() {
            let Some(field_type) = &spec.field_type else {
                continue;
            };
            let Some(value) = data.get(key) else {
                continue;
            };
            let path = child_path("", key);
            let coerced = self.coerce_field(&path, field_type, value.clone());
            result.insert(key.to_string(), coerced);
        }

        debug!(coerced = self.coerced, "typeify finished");
        Value::Object(result)
    }

    fn coerce_field(&mut self, path: &str, field_type: &FieldType, value: Value) -> Value {
        if value.is_null() {
            return value;
        }

        match field_type {
            FieldType::Scalar(kind) => {
                let before = value.kind_name();
                match coerce_scalar(*kind, value) {
                    Ok(coerced) => {
                        self.coerced += 1;
                        trace!(path, from = before, to = coerced.kind_name(), "coerced");
                        coerced
                    }
                    Err(original) => original,
                }
            }
            FieldType::Structural(_) => value,
            FieldType::ArrayOf(item_schema) => match value {
                Value::Array(items) => Value::Array(
                    items
                        .into_iter()
                        .enumerate()
                        .map(|(index, item)| {
                            let item_path = child_path(path, &index.to_string());
                            self.coerce_members(&item_path, item_schema, item)
                        })
                        .collect(),
                ),
                other => other,
            },
            FieldType::Nested(nested) => self.coerce_members(path, nested, value),
        }
    }

    /// Coerce the declared members of an object within its own container.
    /// Undeclared members are kept; non-objects are returned unchanged.
    fn coerce_members(&mut self, path: &str, schema: &Schema, value: Value) -> Value {
        let mut members = match value {
            Value::Object(members) => members,
            other => return other,
        };

        for (key, spec) in schema.fields() {
            let Some(field_type) = &spec.field_type else {
                continue;
            };
            if let Some(slot) = members.get_mut(key) {
                let current = std::mem::take(slot);
                *slot = self.coerce_field(&child_path(path, key), field_type, current);
            }
        }

        Value::Object(members)
    }
}

/// Coerce a non-null leaf. `Ok` carries a replaced value, `Err` hands back
/// the original when it already has the kind or cannot be coerced.
fn coerce_scalar(kind: ScalarKind, value: Value) -> Result<Value, Value> {
    match kind {
        ScalarKind::String => match value {
            Value::String(_) => Err(value),
            other => Ok(Value::String(other.to_display_string())),
        },
        ScalarKind::Boolean => {
            let parsed = match &value {
                Value::String(_) | Value::Number(_) => parse_bool(&value.to_display_string()),
                _ => None,
            };
            parsed.map(Value::Bool).ok_or(value)
        }
        ScalarKind::Number => {
            let parsed = match &value {
                Value::Number(_) | Value::Date(_) => None,
                other => parse_number(&other.to_display_string()),
            };
            parsed.map(Value::Number).ok_or(value)
        }
        ScalarKind::Date => {
            let parsed = match &value {
                Value::Number(n) => date_from_millis(n),
                Value::Bool(b) => Utc.timestamp_millis_opt(i64::from(*b)).single(),
                Value::String(s) => parse_date(s),
                Value::Array(_) => parse_date(&value.to_display_string()),
                _ => None,
            };
            match parsed {
                Some(date) if date.timestamp_millis() > 0 => Ok(Value::Date(date)),
                _ => Err(value),
            }
        }
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_lowercase().as_str() {
        "false" | "0" | "no" => Some(false),
        "true" | "1" | "yes" => Some(true),
        _ => None,
    }
}

/// Parse the leading number of `text`: as a float when the text contains a
/// `.`, otherwise as an integer. Trailing garbage is ignored.
fn parse_number(text: &str) -> Option<serde_json::Number> {
    if text.contains('.') {
        let digits = float_prefix().captures(text)?.get(1)?.as_str();
        let parsed: f64 = digits.parse().ok()?;
        serde_json::Number::from_f64(parsed)
    } else {
        let digits = integer_prefix().captures(text)?.get(1)?.as_str();
        match digits.parse::<i64>() {
            Ok(n) => Some(n.into()),
            Err(_) => digits.parse::<f64>().ok().and_then(serde_json::Number::from_f64),
        }
    }
}

fn date_from_millis(n: &serde_json::Number) -> Option<DateTime<Utc>> {
    let millis = match n.as_i64() {
        Some(i) => i,
        None => {
            let f = n.as_f64()?;
            if !f.is_finite() || f.abs() > i64::MAX as f64 {
                return None;
            }
            f.trunc() as i64
        }
    };
    Utc.timestamp_millis_opt(millis).single()
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(text) {
        return Some(date.with_timezone(&Utc));
    }

    let without_zone_name = match text.find(" (") {
        Some(idx) if text.ends_with(')') => &text[..idx],
        _ => text,
    };
    if let Ok(date) = DateTime::parse_from_str(without_zone_name, ZONED_TEXT_FORMAT) {
        return Some(date.with_timezone(&Utc));
    }

    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for format in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan_2_2014() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, 1, 2, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_bool_table() {
        for text in ["false", "FALSE", "0", "no", "No"] {
            assert_eq!(parse_bool(text), Some(false), "{}", text);
        }
        for text in ["true", "TRUE", "1", "yes", "YES"] {
            assert_eq!(parse_bool(text), Some(true), "{}", text);
        }
        for text in ["blabla", "2323", "", "y"] {
            assert_eq!(parse_bool(text), None, "{}", text);
        }
    }

    #[test]
    fn test_parse_number_integer_and_float() {
        assert_eq!(parse_number("234"), Some(serde_json::Number::from(234i64)));
        assert_eq!(parse_number(" -17"), Some(serde_json::Number::from(-17i64)));
        assert_eq!(parse_number("12abc"), Some(serde_json::Number::from(12i64)));
        assert_eq!(parse_number("234.2"), serde_json::Number::from_f64(234.2));
        assert_eq!(parse_number(".5"), serde_json::Number::from_f64(0.5));
        assert_eq!(parse_number("1.5e3"), serde_json::Number::from_f64(1500.0));
        assert_eq!(parse_number("blabla"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("."), None);
    }

    #[test]
    fn test_parse_number_integer_overflow_falls_back_to_float() {
        let parsed = parse_number("99999999999999999999").unwrap();
        assert!(parsed.is_f64());
        assert_eq!(parsed.as_f64(), Some(1e20));
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2014-01-02 00:00:00"), Some(jan_2_2014()));
        assert_eq!(parse_date("2014-01-02T00:00:00Z"), Some(jan_2_2014()));
        assert_eq!(parse_date("2014-01-02"), Some(jan_2_2014()));
        assert_eq!(
            parse_date("Thu Jan 02 2014 00:00:00 GMT+0000 (Coordinated Universal Time)"),
            Some(jan_2_2014())
        );
        assert_eq!(parse_date("Thu, 02 Jan 2014 00:00:00 +0000"), Some(jan_2_2014()));
        assert_eq!(parse_date("blabla"), None);
    }

    #[test]
    fn test_date_coercion_requires_positive_timestamp() {
        let epoch = Value::from(0);
        assert_eq!(coerce_scalar(ScalarKind::Date, epoch.clone()), Err(epoch));

        let before_epoch = Value::from("1969-12-31");
        assert_eq!(
            coerce_scalar(ScalarKind::Date, before_epoch.clone()),
            Err(before_epoch)
        );

        let millis = Value::from(jan_2_2014().timestamp_millis());
        assert_eq!(
            coerce_scalar(ScalarKind::Date, millis),
            Ok(Value::Date(jan_2_2014()))
        );
    }

    #[test]
    fn test_number_coercion_goes_through_string_form() {
        let single = Value::from(serde_json::json!(["12"]));
        assert_eq!(
            coerce_scalar(ScalarKind::Number, single),
            Ok(Value::Number(serde_json::Number::from(12i64)))
        );

        for value in [
            Value::from(serde_json::json!([])),
            Value::from(serde_json::json!(["bla"])),
            Value::from(serde_json::json!({ "a": 1 })),
            Value::from(true),
            Value::Date(jan_2_2014()),
        ] {
            assert_eq!(coerce_scalar(ScalarKind::Number, value.clone()), Err(value));
        }
    }

    #[test]
    fn test_date_coercion_from_booleans_and_arrays() {
        let one_milli = Utc.timestamp_millis_opt(1).single().unwrap();
        assert_eq!(
            coerce_scalar(ScalarKind::Date, Value::from(true)),
            Ok(Value::Date(one_milli))
        );
        assert_eq!(
            coerce_scalar(ScalarKind::Date, Value::from(false)),
            Err(Value::from(false))
        );
        assert_eq!(
            coerce_scalar(ScalarKind::Date, Value::from(serde_json::json!(["2014-01-02"]))),
            Ok(Value::Date(jan_2_2014()))
        );

        let object = Value::from(serde_json::json!({ "a": 123 }));
        assert_eq!(coerce_scalar(ScalarKind::Date, object.clone()), Err(object));
    }

    #[test]
    fn test_string_coercion_stringifies() {
        assert_eq!(
            coerce_scalar(ScalarKind::String, Value::from(12)),
            Ok(Value::from("12"))
        );
        assert_eq!(
            coerce_scalar(ScalarKind::String, Value::from(false)),
            Ok(Value::from("false"))
        );
        assert_eq!(
            coerce_scalar(ScalarKind::String, Value::from("same")),
            Err(Value::from("same"))
        );
    }
}
