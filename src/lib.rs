//! # Docschema
//!
//! Declarative validation for JSON documents and MongoDB-style update
//! modifiers that reports every violation instead of stopping at the first.
//!
//! ## Overview
//!
//! A [`SimpleSchema`] maps dotted keys (`name`, `address.city`, `items.$.sku`)
//! to [`FieldRule`]s. The same schema validates a full document on insert and
//! a `$set`/`$unset` modifier on update: both are resolved into a flat list of
//! concrete keys before any rule runs. A cleaning pass can filter unknown keys,
//! trim strings, and coerce scalars toward their declared types first.
//!
//! ## Core Types
//!
//! - [`SimpleSchema`]: the validated key → rule map, built with [`SimpleSchema::builder`]
//! - [`FieldRule`]: type, requiredness, bounds, counts, allowed values, patterns
//! - [`ValidationContext`]: holds the violations from the latest validation
//! - [`Violation`]: one failure with its key, kind, offending value, and message code
//! - [`KeyPath`]: dotted paths with `$` wildcards for array elements
//!
//! ## Example
//!
//! ```rust
//! use docschema::{FieldRule, Pattern, SimpleSchema, ValidateOptions, ViolationKind};
//! use serde_json::json;
//!
//! let schema = SimpleSchema::builder()
//!     .field("name", FieldRule::string().max(50))
//!     .field("email", FieldRule::string().regex(Pattern::email()))
//!     .field("age", FieldRule::integer().min(0).optional())
//!     .build()
//!     .unwrap();
//!
//! let mut context = schema.new_context();
//!
//! let doc = schema.clean(&json!({"name": " Ada ", "email": "nope", "age": "36"}));
//! context.validate(&doc, ValidateOptions::document());
//! assert_eq!(context.invalid_keys().len(), 1);
//! assert!(matches!(context.invalid_keys()[0].kind, ViolationKind::NotValidRegEx(_)));
//!
//! let update = json!({"$unset": {"name": ""}});
//! context.validate(&update, ValidateOptions::modifier());
//! assert!(context.is_key_invalid("name"));
//! ```

mod batch;
pub mod clean;
pub mod context;
mod engine;
pub mod error;
pub mod messages;
pub mod path;
pub mod resolver;
pub mod schema;
pub mod value;

pub use clean::CleanOptions;
pub use context::{ValidateOptions, ValidationContext};
pub use error::{SchemaConfigError, Violation, ViolationKind, Violations};
pub use messages::MessageTable;
pub use path::{KeyPath, PathSegment};
pub use resolver::{KeyResolver, Operation, ResolvedKey};
pub use schema::{
    Bound, CustomCheck, ExpectedType, FieldRule, Matcher, Pattern, SchemaBuilder, SchemaLike,
    SimpleSchema,
};

/// Type alias for validation results carrying violations.
pub type ValidationResult<T> = stillwater::Validation<T, Violations>;
