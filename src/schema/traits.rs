//! Traits for treating schemas as values.
//!
//! [`SchemaLike`] is the one-shot "clean and validate" entry point, and
//! [`Matcher`] the boolean pattern-match view on top of it. Both are object
//! safe so heterogeneous schemas can sit behind `Box<dyn Matcher>`.

use serde_json::Value;
use stillwater::Validation;

use crate::error::Violations;

/// A schema that can check a value in one call.
///
/// The `Send + Sync` bounds allow schemas to be shared across threads and
/// used in trait objects.
///
/// # Example
///
/// ```rust
/// use docschema::{FieldRule, SchemaLike, SimpleSchema};
/// use serde_json::json;
///
/// let schema = SimpleSchema::new([("title", FieldRule::string())]).unwrap();
///
/// let result = schema.check(&json!({"title": "  Dune  ", "junk": 1}));
/// assert_eq!(result.into_result().unwrap(), json!({"title": "Dune"}));
///
/// assert!(schema.check(&json!({})).is_failure());
/// ```
pub trait SchemaLike: Send + Sync {
    /// The output produced by a successful check.
    type Output;

    /// Checks a value, returning the accepted output or every violation.
    fn check(&self, value: &Value) -> Validation<Self::Output, Violations>;
}

/// Boolean "does this value match" view of a schema.
///
/// Every [`SchemaLike`] is a `Matcher`.
///
/// # Example
///
/// ```rust
/// use docschema::{FieldRule, Matcher, SimpleSchema};
/// use serde_json::json;
///
/// let schema = SimpleSchema::new([("n", FieldRule::integer())]).unwrap();
/// let matchers: Vec<Box<dyn Matcher>> = vec![Box::new(schema)];
///
/// assert!(matchers[0].test(&json!({"n": 3})));
/// assert!(!matchers[0].test(&json!({"n": 3.5})));
/// ```
pub trait Matcher: Send + Sync {
    fn test(&self, value: &Value) -> bool;
}

impl<S: SchemaLike> Matcher for S {
    fn test(&self, value: &Value) -> bool {
        self.check(value).is_success()
    }
}
