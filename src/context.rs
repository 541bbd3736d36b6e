//! Validation contexts.
//!
//! A [`ValidationContext`] is a named result slot bound to one schema. Each
//! `validate` call replaces the slot's violations, so a form can keep a
//! context around and query it between submissions. Contexts are independent:
//! validating through one never affects another.

use serde_json::Value;
use stillwater::Validation;

use crate::engine;
use crate::error::{Violation, Violations};
use crate::path::KeyPath;
use crate::schema::SimpleSchema;

/// Options for [`ValidationContext::validate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Treat the input as a `$set`/`$unset` modifier instead of a full document.
    pub modifier: bool,
}

impl ValidateOptions {
    /// Options for validating a full document.
    pub fn document() -> Self {
        Self { modifier: false }
    }

    /// Options for validating an update modifier.
    pub fn modifier() -> Self {
        Self { modifier: true }
    }
}

/// The violations from the most recent validation against a schema.
///
/// # Example
///
/// ```rust
/// use docschema::{FieldRule, SimpleSchema, ValidateOptions};
/// use serde_json::json;
///
/// let schema = SimpleSchema::new([
///     ("title", FieldRule::string()),
///     ("pages", FieldRule::integer().min(1)),
/// ])
/// .unwrap();
///
/// let mut context = schema.new_context();
/// context.validate(&json!({"pages": 0}), ValidateOptions::document());
///
/// assert!(!context.is_valid());
/// assert!(context.is_key_invalid("title"));
/// assert_eq!(context.key_error_message("pages").unwrap(), "Pages must be at least 1");
///
/// context.validate(&json!({"$set": {"pages": 3}}), ValidateOptions::modifier());
/// assert!(context.is_valid());
/// ```
#[derive(Debug, Clone)]
pub struct ValidationContext<'s> {
    schema: &'s SimpleSchema,
    violations: Vec<Violation>,
}

impl<'s> ValidationContext<'s> {
    pub(crate) fn new(schema: &'s SimpleSchema) -> Self {
        Self {
            schema,
            violations: Vec::new(),
        }
    }

    /// Validates a document or modifier, replacing any earlier violations.
    ///
    /// Input is validated as given; call [`SimpleSchema::clean`] first to
    /// normalize it.
    pub fn validate(&mut self, input: &Value, options: ValidateOptions) {
        self.violations = engine::validate(self.schema, input, options.modifier);
        tracing::debug!(
            modifier = options.modifier,
            violations = self.violations.len(),
            "validated input"
        );
    }

    /// Every violation from the last validation, in discovery order.
    pub fn invalid_keys(&self) -> &[Violation] {
        &self.violations
    }

    /// Returns true if the dotted key has a violation.
    pub fn is_key_invalid(&self, key: &str) -> bool {
        self.violation_at(key).is_some()
    }

    /// Returns true if the last validation found nothing.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// The rendered message for a key's violation, if it has one.
    pub fn key_error_message(&self, key: &str) -> Option<String> {
        self.violation_at(key).map(|violation| self.message(violation))
    }

    /// Renders a violation with the schema's templates and labels.
    pub fn message(&self, violation: &Violation) -> String {
        let label = self.schema.label_for(&violation.key);
        self.schema.message_table().render(violation, &label)
    }

    /// Clears the violations.
    pub fn reset(&mut self) {
        self.violations.clear();
    }

    /// The schema this context validates against.
    pub fn schema(&self) -> &'s SimpleSchema {
        self.schema
    }

    /// The last result as a `Validation`.
    pub fn result(&self) -> Validation<(), Violations> {
        match Violations::from_vec(self.violations.clone()) {
            Some(violations) => Validation::Failure(violations),
            None => Validation::Success(()),
        }
    }

    fn violation_at(&self, key: &str) -> Option<&Violation> {
        let key = KeyPath::parse(key);
        self.violations.iter().find(|v| v.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldRule;
    use serde_json::json;

    fn schema() -> SimpleSchema {
        SimpleSchema::new([
            ("a", FieldRule::string()),
            ("b", FieldRule::number().optional()),
        ])
        .unwrap()
    }

    #[test]
    fn test_fresh_context_is_valid() {
        let s = schema();
        let context = s.new_context();
        assert!(context.is_valid());
        assert!(context.invalid_keys().is_empty());
        assert!(context.result().is_success());
    }

    #[test]
    fn test_validate_replaces_previous() {
        let s = schema();
        let mut context = s.new_context();

        context.validate(&json!({}), ValidateOptions::document());
        assert_eq!(context.invalid_keys().len(), 1);

        context.validate(&json!({"a": "x", "b": "nope"}), ValidateOptions::document());
        assert_eq!(context.invalid_keys().len(), 1);
        assert!(context.is_key_invalid("b"));
        assert!(!context.is_key_invalid("a"));
    }

    #[test]
    fn test_reset() {
        let s = schema();
        let mut context = s.new_context();
        context.validate(&json!({}), ValidateOptions::document());
        context.reset();
        assert!(context.is_valid());
    }

    #[test]
    fn test_result_carries_violations() {
        let s = schema();
        let mut context = s.new_context();
        context.validate(&json!({"b": true}), ValidateOptions::document());

        let violations = context.result().into_result().unwrap_err();
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn test_key_error_message() {
        let s = schema();
        let mut context = s.new_context();
        context.validate(&json!({}), ValidateOptions::document());

        assert_eq!(context.key_error_message("a"), Some("A is required".to_string()));
        assert_eq!(context.key_error_message("b"), None);
    }
}
