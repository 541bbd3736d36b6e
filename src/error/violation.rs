//! Violation types.
//!
//! This module provides [`Violation`] for a single rule failure and
//! [`Violations`] for a non-empty collection of them.

use std::fmt::{self, Display};

use serde_json::Value;
use stillwater::prelude::*;

use crate::path::KeyPath;

/// The class of rule a value failed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// The key is required but absent, null, empty, or being unset.
    Required,
    /// The value does not have the declared type.
    Type,
    /// The value (or string length) is outside `min`/`max`.
    MinMax,
    /// The array element count is outside `minCount`/`maxCount`.
    Count,
    /// The value is not in `allowedValues` or was refused by the custom check.
    NotAllowed,
    /// The number has a fractional part but decimals are not allowed.
    NotAllowedDecimal,
    /// The string does not match the named pattern.
    NotValidRegEx(String),
}

impl ViolationKind {
    /// The default message code for this kind.
    pub fn default_code(&self) -> &'static str {
        match self {
            ViolationKind::Required => "required",
            ViolationKind::Type => "expectedType",
            ViolationKind::MinMax => "minMax",
            ViolationKind::Count => "count",
            ViolationKind::NotAllowed => "notAllowed",
            ViolationKind::NotAllowedDecimal => "noDecimal",
            ViolationKind::NotValidRegEx(_) => "regEx",
        }
    }
}

impl Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Required => write!(f, "required"),
            ViolationKind::Type => write!(f, "type"),
            ViolationKind::MinMax => write!(f, "min/max"),
            ViolationKind::Count => write!(f, "count"),
            ViolationKind::NotAllowed => write!(f, "not allowed"),
            ViolationKind::NotAllowedDecimal => write!(f, "decimal not allowed"),
            ViolationKind::NotValidRegEx(name) => write!(f, "does not match {}", name),
        }
    }
}

/// A single rule failure.
///
/// - **key**: the concrete dotted path that failed (`items.2.name`)
/// - **kind**: which class of rule failed
/// - **value**: the offending value; `None` when the key was absent or unset
/// - **code**: message code used to look up a template (`minString`, `regEx`, ...)
/// - **expected**: the rule parameter that was violated, for rendering
///
/// # Example
///
/// ```rust
/// use docschema::{KeyPath, Violation, ViolationKind};
/// use serde_json::json;
///
/// let violation = Violation::new(KeyPath::parse("minMaxString"), ViolationKind::MinMax)
///     .with_code("minString")
///     .with_value(json!("short"))
///     .with_expected("10");
///
/// assert_eq!(violation.code, "minString");
/// assert_eq!(violation.key.to_string(), "minMaxString");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// The path of the value that failed.
    pub key: KeyPath,
    /// The class of rule that failed.
    pub kind: ViolationKind,
    /// The offending value, if one was present.
    pub value: Option<Value>,
    /// Message code (e.g. `minString`).
    pub code: String,
    /// The violated rule parameter, formatted for display.
    pub expected: Option<String>,
}

impl Violation {
    /// Creates a violation with the kind's default code and no value.
    pub fn new(key: KeyPath, kind: ViolationKind) -> Self {
        let code = kind.default_code().to_string();
        Self {
            key,
            kind,
            value: None,
            code,
            expected: None,
        }
    }

    /// Sets the message code and returns self for chaining.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Sets the offending value and returns self for chaining.
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    /// Sets the optional offending value and returns self for chaining.
    pub fn with_value_opt(mut self, value: Option<&Value>) -> Self {
        self.value = value.cloned();
        self
    }

    /// Sets the "expected" parameter and returns self for chaining.
    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }
}

impl Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.key, self.kind, self.code)?;

        if let Some(ref expected) = self.expected {
            write!(f, " (expected: {})", expected)?;
        }
        if let Some(ref value) = self.value {
            write!(f, " (got: {})", value)?;
        }

        Ok(())
    }
}

impl std::error::Error for Violation {}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<Violation>();
    assert_sync::<Violation>();
};

/// A non-empty collection of violations.
///
/// `Violations` wraps a `NonEmptyVec<Violation>` so that a failed
/// `Validation<T, Violations>` always carries at least one violation.
///
/// ```rust
/// use docschema::{KeyPath, Violation, ViolationKind, Violations};
/// use stillwater::prelude::*;
///
/// let a = Violations::single(Violation::new(KeyPath::parse("name"), ViolationKind::Required));
/// let b = Violations::single(Violation::new(KeyPath::parse("email"), ViolationKind::Type));
///
/// let combined = a.combine(b);
/// assert_eq!(combined.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Violations(NonEmptyVec<Violation>);

impl Violations {
    /// Creates a collection containing a single violation.
    pub fn single(violation: Violation) -> Self {
        Self(NonEmptyVec::singleton(violation))
    }

    /// Creates a collection from a `NonEmptyVec`.
    pub fn from_non_empty(violations: NonEmptyVec<Violation>) -> Self {
        Self(violations)
    }

    /// Creates a collection from a `Vec`, or `None` if it is empty.
    pub fn from_vec(violations: Vec<Violation>) -> Option<Self> {
        NonEmptyVec::from_vec(violations).map(Self)
    }

    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; the collection is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns an iterator over the violations.
    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    /// Returns all violations recorded against a dotted key.
    pub fn at_key(&self, key: &str) -> Vec<&Violation> {
        let key = KeyPath::parse(key);
        self.0.iter().filter(|v| v.key == key).collect()
    }

    /// Returns all violations of the given kind.
    pub fn of_kind(&self, kind: &ViolationKind) -> Vec<&Violation> {
        self.0.iter().filter(|v| &v.kind == kind).collect()
    }

    /// Returns the first violation.
    pub fn first(&self) -> &Violation {
        self.0.head()
    }

    /// Converts this collection into a `Vec<Violation>`.
    pub fn into_vec(self) -> Vec<Violation> {
        self.0.into_vec()
    }
}

impl Semigroup for Violations {
    fn combine(self, other: Self) -> Self {
        Violations(self.0.combine(other.0))
    }
}

impl Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation failed with {} violation(s):", self.len())?;
        for (i, violation) in self.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_vec().into_iter()
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a Violation;
    type IntoIter = Box<dyn Iterator<Item = &'a Violation> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.0.iter())
    }
}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<Violations>();
    assert_sync::<Violations>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn at(key: &str, kind: ViolationKind) -> Violation {
        Violation::new(KeyPath::parse(key), kind)
    }

    #[test]
    fn test_violation_creation() {
        let violation = at("name", ViolationKind::Required);

        assert_eq!(violation.key.to_string(), "name");
        assert_eq!(violation.code, "required");
        assert!(violation.value.is_none());
        assert!(violation.expected.is_none());
    }

    #[test]
    fn test_violation_builder() {
        let violation = at("age", ViolationKind::MinMax)
            .with_code("minNumber")
            .with_value(json!(9))
            .with_expected("10");

        assert_eq!(violation.code, "minNumber");
        assert_eq!(violation.value, Some(json!(9)));
        assert_eq!(violation.expected, Some("10".to_string()));
    }

    #[test]
    fn test_violation_display() {
        let violation = at("email", ViolationKind::NotValidRegEx("email".into()))
            .with_value(json!("blah"));

        let display = violation.to_string();
        assert!(display.contains("email: does not match email"));
        assert!(display.contains("got: \"blah\""));
    }

    #[test]
    fn test_violations_combine() {
        let combined = Violations::single(at("a", ViolationKind::Type))
            .combine(Violations::single(at("b", ViolationKind::Type)))
            .combine(Violations::single(at("a", ViolationKind::Required)));

        assert_eq!(combined.len(), 3);
        assert_eq!(combined.at_key("a").len(), 2);
        assert_eq!(combined.of_kind(&ViolationKind::Type).len(), 2);
        assert_eq!(combined.first().key.to_string(), "a");
    }

    #[test]
    fn test_violations_from_vec() {
        assert!(Violations::from_vec(Vec::new()).is_none());

        let violations = Violations::from_vec(vec![at("x", ViolationKind::Count)]).unwrap();
        assert_eq!(violations.len(), 1);
        assert!(!violations.is_empty());

        let ordered = Violations::from_vec(vec![
            at("a", ViolationKind::Required),
            at("b", ViolationKind::Type),
            at("c", ViolationKind::Count),
        ])
        .unwrap();
        let keys: Vec<String> = ordered.iter().map(|v| v.key.to_string()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_violations_display() {
        let violations = Violations::single(at("name", ViolationKind::Required))
            .combine(Violations::single(at("email", ViolationKind::Type)));
        let display = violations.to_string();

        assert!(display.contains("2 violation(s)"));
        assert!(display.contains("name: required"));
        assert!(display.contains("email: type"));
    }

    #[test]
    fn test_into_iter_preserves_order() {
        let violations = Violations::single(at("z", ViolationKind::Required))
            .combine(Violations::single(at("a", ViolationKind::Required)));

        let keys: Vec<String> = violations.into_iter().map(|v| v.key.to_string()).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }
}
