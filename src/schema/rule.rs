//! Per-key rules.
//!
//! A [`FieldRule`] holds everything the engine checks for one schema key: the
//! [`ExpectedType`], requiredness, bounds, counts, allowed values, a custom
//! predicate, and a pattern.

use std::fmt::{self, Display};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::resolver::Operation;
use crate::value;

use super::pattern::Pattern;

/// Custom predicate: `(candidate value, whole input, operation) -> allowed`.
///
/// The second argument is the full document or modifier passed to
/// `validate`, so the predicate can read sibling fields.
pub type CustomCheck = Arc<dyn Fn(&Value, &Value, Operation) -> bool + Send + Sync>;

/// The declared type of a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedType {
    /// A string.
    String,
    /// `true` or `false`.
    Boolean,
    /// Any number; fractional values are governed by [`FieldRule::decimal`].
    Number,
    /// A number without a fractional part.
    Integer,
    /// A `{"$date": ...}` value.
    Date,
    /// A plain (non-date) object.
    Object,
    /// An array whose elements all have the inner type.
    Array(Box<ExpectedType>),
}

impl ExpectedType {
    /// Shorthand for `ExpectedType::Array(Box::new(element))`.
    pub fn array_of(element: ExpectedType) -> Self {
        ExpectedType::Array(Box::new(element))
    }

    /// The element type for arrays, the type itself otherwise.
    pub fn element(&self) -> &ExpectedType {
        match self {
            ExpectedType::Array(inner) => &**inner,
            other => other,
        }
    }

    /// Returns true for `Array(_)`.
    pub fn is_array(&self) -> bool {
        matches!(self, ExpectedType::Array(_))
    }

    /// Structural type check. Arrays check every element.
    pub fn accepts(&self, v: &Value) -> bool {
        match self {
            ExpectedType::String => v.is_string(),
            ExpectedType::Boolean => v.is_boolean(),
            ExpectedType::Number | ExpectedType::Integer => v.is_number(),
            ExpectedType::Date => value::as_date(v).is_some(),
            ExpectedType::Object => value::is_plain_object(v),
            ExpectedType::Array(inner) => v
                .as_array()
                .is_some_and(|items| items.iter().all(|item| inner.accepts(item))),
        }
    }

    /// Message code for a type violation (`expectedString`, ...).
    pub fn code(&self) -> &'static str {
        match self {
            ExpectedType::String => "expectedString",
            ExpectedType::Boolean => "expectedBoolean",
            ExpectedType::Number | ExpectedType::Integer => "expectedNumber",
            ExpectedType::Date => "expectedDate",
            ExpectedType::Object => "expectedObject",
            ExpectedType::Array(_) => "expectedArray",
        }
    }
}

impl Display for ExpectedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedType::String => write!(f, "String"),
            ExpectedType::Boolean => write!(f, "Boolean"),
            ExpectedType::Number => write!(f, "Number"),
            ExpectedType::Integer => write!(f, "Integer"),
            ExpectedType::Date => write!(f, "Date"),
            ExpectedType::Object => write!(f, "Object"),
            ExpectedType::Array(inner) => write!(f, "[{}]", inner),
        }
    }
}

/// A `min`/`max` bound.
///
/// Numbers bound string lengths and numeric values; dates bound dates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// A numeric bound (or a character count for strings).
    Number(f64),
    /// A chronological bound.
    Date(DateTime<Utc>),
}

impl Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Number(n) => write!(f, "{}", n),
            Bound::Date(d) => write!(f, "{}", d.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

impl From<i32> for Bound {
    fn from(n: i32) -> Self {
        Bound::Number(f64::from(n))
    }
}

impl From<u32> for Bound {
    fn from(n: u32) -> Self {
        Bound::Number(f64::from(n))
    }
}

impl From<i64> for Bound {
    fn from(n: i64) -> Self {
        Bound::Number(n as f64)
    }
}

impl From<usize> for Bound {
    fn from(n: usize) -> Self {
        Bound::Number(n as f64)
    }
}

impl From<f64> for Bound {
    fn from(n: f64) -> Self {
        Bound::Number(n)
    }
}

impl From<DateTime<Utc>> for Bound {
    fn from(d: DateTime<Utc>) -> Self {
        Bound::Date(d)
    }
}

/// The rule set for one schema key.
///
/// Keys are required by default.
///
/// # Example
///
/// ```rust
/// use docschema::{ExpectedType, FieldRule, Pattern};
///
/// let tags = FieldRule::array_of(ExpectedType::String)
///     .optional()
///     .min(10)
///     .max(20)
///     .min_count(1)
///     .max_count(2);
///
/// let email = FieldRule::string().regex(Pattern::email());
/// assert!(!email.is_optional());
/// ```
#[derive(Clone)]
pub struct FieldRule {
    pub(crate) expected_type: ExpectedType,
    pub(crate) optional: bool,
    pub(crate) min: Option<Bound>,
    pub(crate) max: Option<Bound>,
    pub(crate) min_count: Option<usize>,
    pub(crate) max_count: Option<usize>,
    pub(crate) allowed_values: Option<Vec<Value>>,
    pub(crate) value_is_allowed: Option<CustomCheck>,
    pub(crate) regex: Option<Pattern>,
    pub(crate) decimal: bool,
    pub(crate) label: Option<String>,
}

impl FieldRule {
    /// Creates a required rule for the given type with no constraints.
    pub fn new(expected_type: ExpectedType) -> Self {
        Self {
            expected_type,
            optional: false,
            min: None,
            max: None,
            min_count: None,
            max_count: None,
            allowed_values: None,
            value_is_allowed: None,
            regex: None,
            decimal: false,
            label: None,
        }
    }

    pub fn string() -> Self {
        Self::new(ExpectedType::String)
    }

    pub fn boolean() -> Self {
        Self::new(ExpectedType::Boolean)
    }

    pub fn number() -> Self {
        Self::new(ExpectedType::Number)
    }

    pub fn integer() -> Self {
        Self::new(ExpectedType::Integer)
    }

    pub fn date() -> Self {
        Self::new(ExpectedType::Date)
    }

    pub fn object() -> Self {
        Self::new(ExpectedType::Object)
    }

    pub fn array_of(element: ExpectedType) -> Self {
        Self::new(ExpectedType::array_of(element))
    }

    /// Marks the key optional: absent, null, and empty values are accepted.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Inclusive lower bound. For arrays it applies to every element.
    pub fn min(mut self, bound: impl Into<Bound>) -> Self {
        self.min = Some(bound.into());
        self
    }

    /// Inclusive upper bound. For arrays it applies to every element.
    pub fn max(mut self, bound: impl Into<Bound>) -> Self {
        self.max = Some(bound.into());
        self
    }

    /// Inclusive lower bound on the number of array elements.
    pub fn min_count(mut self, count: usize) -> Self {
        self.min_count = Some(count);
        self
    }

    /// Inclusive upper bound on the number of array elements.
    pub fn max_count(mut self, count: usize) -> Self {
        self.max_count = Some(count);
        self
    }

    /// Restricts the value (every element, for arrays) to the given set.
    pub fn allowed_values<I>(mut self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Adds a custom predicate. Returning `false` records a `NotAllowed` violation.
    ///
    /// # Example
    ///
    /// ```rust
    /// use docschema::FieldRule;
    ///
    /// let confirm = FieldRule::string().value_is_allowed(|val, doc, _op| {
    ///     let password = doc
    ///         .get("$set")
    ///         .map_or_else(|| doc.get("password"), |set| set.get("password"));
    ///     password == Some(val)
    /// });
    /// ```
    pub fn value_is_allowed<F>(mut self, check: F) -> Self
    where
        F: Fn(&Value, &Value, Operation) -> bool + Send + Sync + 'static,
    {
        self.value_is_allowed = Some(Arc::new(check));
        self
    }

    /// Requires string values to match the pattern.
    pub fn regex(mut self, pattern: Pattern) -> Self {
        self.regex = Some(pattern);
        self
    }

    /// Allows fractional numbers on a `Number` key.
    pub fn decimal(mut self) -> Self {
        self.decimal = true;
        self
    }

    /// Sets the label used when rendering messages.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn expected_type(&self) -> &ExpectedType {
        &self.expected_type
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn min_bound(&self) -> Option<&Bound> {
        self.min.as_ref()
    }

    pub fn max_bound(&self) -> Option<&Bound> {
        self.max.as_ref()
    }

    pub fn count_bounds(&self) -> (Option<usize>, Option<usize>) {
        (self.min_count, self.max_count)
    }

    pub fn allowed(&self) -> Option<&[Value]> {
        self.allowed_values.as_deref()
    }

    pub fn pattern(&self) -> Option<&Pattern> {
        self.regex.as_ref()
    }

    pub fn allows_decimal(&self) -> bool {
        self.decimal
    }

    pub fn label_text(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The rule a single element of an `Array(T)` field is held to: the
    /// element type with the field's per-element constraints. Elements are
    /// optional, and counts and custom checks stay with the whole field.
    pub(crate) fn element_rule(&self) -> Option<FieldRule> {
        let ExpectedType::Array(element) = &self.expected_type else {
            return None;
        };
        Some(FieldRule {
            expected_type: (**element).clone(),
            optional: true,
            min: self.min,
            max: self.max,
            min_count: None,
            max_count: None,
            allowed_values: self.allowed_values.clone(),
            value_is_allowed: None,
            regex: self.regex.clone(),
            decimal: self.decimal,
            label: self.label.clone(),
        })
    }
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRule")
            .field("expected_type", &self.expected_type)
            .field("optional", &self.optional)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("min_count", &self.min_count)
            .field("max_count", &self.max_count)
            .field("allowed_values", &self.allowed_values)
            .field("value_is_allowed", &self.value_is_allowed.is_some())
            .field("regex", &self.regex)
            .field("decimal", &self.decimal)
            .field("label", &self.label)
            .finish()
    }
}
