//! Helpers for document values.
//!
//! Documents are plain [`serde_json::Value`] trees. Dates use the MongoDB
//! extended-JSON shape `{"$date": ...}` holding either an RFC 3339 string or
//! integer milliseconds since the Unix epoch. A date object is a scalar: it is
//! never an `Object` and never descended into.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{json, Value};

/// Key used by the extended-JSON date wrapper.
pub const DATE_KEY: &str = "$date";

/// Builds a date value.
///
/// # Example
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use docschema::value;
///
/// let when = Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap();
/// let v = value::date(when);
/// assert_eq!(value::as_date(&v), Some(when));
/// ```
pub fn date(when: DateTime<Utc>) -> Value {
    json!({ DATE_KEY: when.to_rfc3339_opts(SecondsFormat::Millis, true) })
}

/// Returns the date held by a `{"$date": ...}` value.
pub fn as_date(value: &Value) -> Option<DateTime<Utc>> {
    let obj = value.as_object()?;
    if obj.len() != 1 {
        return None;
    }
    match obj.get(DATE_KEY)? {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|d| d.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

/// Returns true if the value has the date wrapper shape, valid or not.
pub fn is_date_shaped(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| obj.len() == 1 && obj.contains_key(DATE_KEY))
}

/// Returns true if the value is an object that is not a date.
pub fn is_plain_object(value: &Value) -> bool {
    value.is_object() && !is_date_shaped(value)
}

/// Returns true if a number has no fractional part.
pub fn is_integral(value: &Value) -> bool {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => true,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.fract() == 0.0),
        _ => false,
    }
}

/// Returns the type name for a value, as used in violation details.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) if is_date_shaped(value) => "date",
        Value::Object(_) => "object",
    }
}

/// Compares two values the way `allowedValues` membership needs.
///
/// Numbers compare numerically (`1 == 1.0`) and dates compare by instant;
/// everything else uses structural equality.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => match (as_date(a), as_date(b)) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
    }
}
