//! Normalizing documents and modifiers before validation.
//!
//! Cleaning never fails and never touches its input. It runs three passes per
//! value, each switchable through [`CleanOptions`]:
//!
//! - **filter**: drop keys the schema does not declare (and objects left empty)
//! - **trim**: strip surrounding whitespace from strings
//! - **auto-convert**: coerce scalars toward the declared type
//!
//! Coercion is narrow. Booleans, numbers, dates, and plain
//! objects become strings for `String` keys; numeric strings become numbers
//! for `Number`/`Integer` keys. Arrays are never coerced, so an array under a
//! scalar key still fails the type check.

use chrono::SecondsFormat;
use serde_json::{Map, Number, Value};

use crate::path::KeyPath;
use crate::resolver;
use crate::schema::{ExpectedType, SimpleSchema};
use crate::value;

/// Switches for [`SimpleSchema::clean_with`]. All passes are on by default.
///
/// # Example
///
/// ```rust
/// use docschema::CleanOptions;
///
/// let opts = CleanOptions::default().auto_convert(false);
/// assert!(opts.filter);
/// assert!(!opts.auto_convert);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanOptions {
    pub filter: bool,
    pub trim_strings: bool,
    pub auto_convert: bool,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            filter: true,
            trim_strings: true,
            auto_convert: true,
        }
    }
}

impl CleanOptions {
    pub fn filter(mut self, on: bool) -> Self {
        self.filter = on;
        self
    }

    pub fn trim_strings(mut self, on: bool) -> Self {
        self.trim_strings = on;
        self
    }

    pub fn auto_convert(mut self, on: bool) -> Self {
        self.auto_convert = on;
        self
    }
}

impl SimpleSchema {
    /// Returns a cleaned copy of a document or modifier with default options.
    ///
    /// # Example
    ///
    /// ```rust
    /// use docschema::{FieldRule, SimpleSchema};
    /// use serde_json::json;
    ///
    /// let schema = SimpleSchema::new([
    ///     ("name", FieldRule::string()),
    ///     ("age", FieldRule::integer()),
    /// ])
    /// .unwrap();
    ///
    /// let cleaned = schema.clean(&json!({"name": "  Ada ", "age": "36", "extra": true}));
    /// assert_eq!(cleaned, json!({"name": "Ada", "age": 36}));
    /// ```
    pub fn clean(&self, input: &Value) -> Value {
        self.clean_with(input, CleanOptions::default())
    }

    /// Returns a cleaned copy using the given options.
    ///
    /// Modifiers are detected from their top-level keys. Inside `$set` and
    /// `$setOnInsert` each dotted key is cleaned against the rule it names;
    /// `$unset` loses undeclared keys; other operators pass through.
    pub fn clean_with(&self, input: &Value, options: CleanOptions) -> Value {
        let cleaner = Cleaner {
            schema: self,
            options,
        };
        match input.as_object() {
            Some(ops) if resolver::is_modifier(input) => Value::Object(cleaner.modifier(ops)),
            Some(members) if value::is_plain_object(input) => {
                Value::Object(cleaner.members(&KeyPath::root(), members))
            }
            _ => input.clone(),
        }
    }
}

struct Cleaner<'s> {
    schema: &'s SimpleSchema,
    options: CleanOptions,
}

impl Cleaner<'_> {
    fn modifier(&self, ops: &Map<String, Value>) -> Map<String, Value> {
        ops.iter()
            .map(|(op, body)| {
                let cleaned = match (op.as_str(), body.as_object()) {
                    ("$set" | "$setOnInsert", Some(fields)) => Value::Object(
                        fields
                            .iter()
                            .filter_map(|(key, v)| {
                                self.value(&KeyPath::parse(key), v).map(|v| (key.clone(), v))
                            })
                            .collect(),
                    ),
                    ("$unset", Some(fields)) => Value::Object(
                        fields
                            .iter()
                            .filter(|(key, _)| self.keep_unknown(&KeyPath::parse(key)))
                            .map(|(key, v)| (key.clone(), v.clone()))
                            .collect(),
                    ),
                    _ => body.clone(),
                };
                (op.clone(), cleaned)
            })
            .collect()
    }

    fn members(&self, base: &KeyPath, members: &Map<String, Value>) -> Map<String, Value> {
        members
            .iter()
            .filter_map(|(key, v)| {
                self.value(&base.push_field(key.as_str()), v)
                    .map(|v| (key.clone(), v))
            })
            .collect()
    }

    fn keep_unknown(&self, path: &KeyPath) -> bool {
        let keep = !self.options.filter || self.schema.knows(path);
        if !keep {
            tracing::trace!(key = %path, "dropping key not in schema");
        }
        keep
    }

    fn value(&self, path: &KeyPath, v: &Value) -> Option<Value> {
        match v {
            Value::Array(items) => self.array(path, v, items),
            Value::Object(members) if value::is_plain_object(v) => self.object(path, v, members),
            _ => self.scalar(path, v),
        }
    }

    fn array(&self, path: &KeyPath, v: &Value, items: &[Value]) -> Option<Value> {
        match self.schema.expected_type_at(path) {
            Some(ExpectedType::Array(_)) => {}
            Some(_) => return Some(v.clone()),
            None if !self.keep_unknown(path) => return None,
            None => {}
        }
        Some(Value::Array(
            items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| self.value(&path.push_index(i), item))
                .collect(),
        ))
    }

    fn object(&self, path: &KeyPath, v: &Value, members: &Map<String, Value>) -> Option<Value> {
        match self.schema.expected_type_at(path) {
            Some(ExpectedType::Object) if !self.schema.has_descendants(path) => Some(v.clone()),
            Some(ExpectedType::Object) => Some(Value::Object(self.members(path, members))),
            Some(expected) => Some(self.convert(expected, v.clone())),
            None => {
                let cleaned = self.members(path, members);
                if cleaned.is_empty() && !members.is_empty() && self.options.filter {
                    tracing::trace!(key = %path, "dropping object emptied by filtering");
                    return None;
                }
                if cleaned.is_empty() && !self.keep_unknown(path) {
                    return None;
                }
                Some(Value::Object(cleaned))
            }
        }
    }

    fn scalar(&self, path: &KeyPath, v: &Value) -> Option<Value> {
        let Some(expected) = self.schema.expected_type_at(path) else {
            return self.keep_unknown(path).then(|| v.clone());
        };
        let v = match v {
            Value::String(s) if self.options.trim_strings => Value::String(s.trim().to_string()),
            other => other.clone(),
        };
        Some(self.convert(expected, v))
    }

    fn convert(&self, expected: &ExpectedType, v: Value) -> Value {
        if self.options.auto_convert {
            coerce(expected, v)
        } else {
            v
        }
    }
}

/// Coerces a scalar toward `expected`, returning it unchanged when no
/// conversion applies.
pub(crate) fn coerce(expected: &ExpectedType, v: Value) -> Value {
    match (expected, v) {
        (ExpectedType::String, Value::Bool(b)) => Value::String(b.to_string()),
        (ExpectedType::String, Value::Number(n)) => Value::String(n.to_string()),
        (ExpectedType::String, Value::Object(members)) => {
            let v = Value::Object(members);
            match value::as_date(&v) {
                Some(d) => Value::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
                None if value::is_date_shaped(&v) => v,
                None => Value::String(v.to_string()),
            }
        }
        (ExpectedType::Number | ExpectedType::Integer, Value::String(s)) => {
            parse_number(&s).unwrap_or(Value::String(s))
        }
        (_, v) => v,
    }
}

fn parse_number(s: &str) -> Option<Value> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::from(i));
    }
    let f = s.parse::<f64>().ok().filter(|f| f.is_finite())?;
    Number::from_f64(f).map(Value::Number)
}
