//! Schema configuration errors.

/// Errors raised while building a schema.
///
/// These describe a programming mistake in the schema definition, not bad
/// data, so they are returned immediately from construction instead of being
/// collected like violations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaConfigError {
    /// The key is empty, has an empty segment, or starts with `$`.
    #[error("invalid schema key '{0}'")]
    InvalidKey(String),

    /// The key was declared more than once.
    #[error("schema key '{0}' declared more than once")]
    DuplicateKey(String),

    /// `min`/`max` were given for a type that has no ordering.
    #[error("'{key}': min/max are not supported for {type_name}")]
    BoundNotSupported { key: String, type_name: String },

    /// The bound's kind does not fit the type (a date bound on a number, a
    /// fractional string length, ...).
    #[error("'{key}': {detail}")]
    BoundTypeMismatch { key: String, detail: String },

    /// A lower bound exceeds its upper bound.
    #[error("'{key}': {lower} is greater than {upper}")]
    InvalidRange {
        key: String,
        lower: String,
        upper: String,
    },

    /// `minCount`/`maxCount` on a type that is not an array.
    #[error("'{0}': minCount/maxCount only apply to array types")]
    CountOnNonArray(String),

    /// An allowed value does not have the declared type.
    #[error("'{key}': allowed value {value} is not a {type_name}")]
    AllowedValueType {
        key: String,
        value: String,
        type_name: String,
    },

    /// A pattern was attached to a non-string type.
    #[error("'{0}': regEx only applies to string types")]
    PatternOnNonString(String),

    /// `decimal` was set on a type other than Number.
    #[error("'{0}': decimal only applies to the Number type")]
    DecimalOnNonNumber(String),

    /// An array whose elements are arrays.
    #[error("'{0}': arrays of arrays are not supported")]
    NestedArray(String),

    /// A declared ancestor key cannot contain this key.
    #[error("'{key}': ancestor '{ancestor}' is declared as {type_name}")]
    ParentTypeConflict {
        key: String,
        ancestor: String,
        type_name: String,
    },
}
