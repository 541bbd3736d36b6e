//! Schema definitions.
//!
//! A [`SimpleSchema`] is an ordered map from dotted keys (`name`,
//! `address.city`, `items.$.sku`) to [`FieldRule`]s. Construction checks the
//! definition for internal consistency and fails with a [`SchemaConfigError`]
//! instead of misbehaving later during validation.
//!
//! # Example
//!
//! ```rust
//! use docschema::{ExpectedType, FieldRule, Pattern, SimpleSchema};
//!
//! let schema = SimpleSchema::builder()
//!     .field("name", FieldRule::string().max(200))
//!     .field("email", FieldRule::string().regex(Pattern::email()))
//!     .field("tags", FieldRule::array_of(ExpectedType::String).optional().max_count(5))
//!     .field("items", FieldRule::array_of(ExpectedType::Object).optional())
//!     .field("items.$.sku", FieldRule::string())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(schema.len(), 5);
//! assert!(schema.rule("items.$.sku").is_some());
//! ```

mod pattern;
mod rule;
mod traits;

pub use pattern::Pattern;
pub use rule::{Bound, CustomCheck, ExpectedType, FieldRule};
pub use traits::{Matcher, SchemaLike};

use indexmap::IndexMap;
use serde_json::Value;
use stillwater::Validation;

use crate::context::{ValidateOptions, ValidationContext};
use crate::error::{SchemaConfigError, Violations};
use crate::messages::{humanize, MessageTable};
use crate::path::{KeyPath, PathSegment};
use crate::resolver;

/// A declared key together with its parsed path.
#[derive(Debug, Clone)]
pub(crate) struct SchemaEntry {
    pub(crate) path: KeyPath,
    pub(crate) rule: FieldRule,
}

/// A validated, immutable set of key rules plus a message table.
///
/// Build one with [`SimpleSchema::builder`] or [`SimpleSchema::new`]. The
/// schema is `Send + Sync` and may be shared by any number of
/// [`ValidationContext`]s across threads.
#[derive(Debug)]
pub struct SimpleSchema {
    entries: IndexMap<String, SchemaEntry>,
    messages: MessageTable,
}

impl SimpleSchema {
    /// Starts a schema definition.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Builds a schema from `(key, rule)` pairs.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaConfigError`] found in the definition.
    pub fn new<I, K>(fields: I) -> Result<Self, SchemaConfigError>
    where
        I: IntoIterator<Item = (K, FieldRule)>,
        K: Into<String>,
    {
        fields
            .into_iter()
            .fold(SchemaBuilder::new(), |builder, (key, rule)| builder.field(key, rule))
            .build()
    }

    /// Returns the rule declared for exactly this key.
    pub fn rule(&self, key: &str) -> Option<&FieldRule> {
        self.entries.get(key).map(|entry| &entry.rule)
    }

    /// Iterates over declared keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds the rule governing a concrete path.
    ///
    /// An exact declaration wins over a wildcard one (`grid.2` over `grid.$`).
    pub fn rule_for_path(&self, path: &KeyPath) -> Option<&FieldRule> {
        self.entry_index(path)
            .and_then(|i| self.entries.get_index(i))
            .map(|(_, entry)| &entry.rule)
    }

    /// The type a value at `path` is expected to have.
    ///
    /// Falls back to the element type of an `Array(T)` parent for array
    /// elements that have no rule of their own.
    pub fn expected_type_at(&self, path: &KeyPath) -> Option<&ExpectedType> {
        if let Some(rule) = self.rule_for_path(path) {
            return Some(&rule.expected_type);
        }
        match path.last() {
            Some(PathSegment::Index(_)) => {
                let parent = path.parent()?;
                match self.expected_type_at(&parent)? {
                    ExpectedType::Array(element) => Some(&**element),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Returns true if any declared key lies below `path`.
    pub fn has_descendants(&self, path: &KeyPath) -> bool {
        self.entries.values().any(|entry| entry.path.is_below(path))
    }

    /// Returns true if `path` is declared, or is an array element or ancestor
    /// of something declared.
    pub fn knows(&self, path: &KeyPath) -> bool {
        self.expected_type_at(path).is_some() || self.has_descendants(path)
    }

    /// The label for a concrete path: the rule's label, or a humanized form
    /// of the last field name.
    pub fn label_for(&self, path: &KeyPath) -> String {
        if let Some(label) = self.rule_for_path(path).and_then(|r| r.label.as_deref()) {
            return label.to_string();
        }
        path.as_slice()
            .iter()
            .rev()
            .find_map(|segment| match segment {
                PathSegment::Field(name) => Some(humanize(name)),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Registers message templates, keyed by code (`"minString"`) or by
    /// code and generic key (`"regEx requiredEmail"`).
    ///
    /// # Example
    ///
    /// ```rust
    /// use docschema::{FieldRule, SimpleSchema};
    ///
    /// let schema = SimpleSchema::new([("title", FieldRule::string())]).unwrap();
    /// schema.messages([("required title", "Give it a title")]);
    /// ```
    pub fn messages<I, K, T>(&self, templates: I) -> &Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: Into<String>,
    {
        self.messages.extend(templates);
        self
    }

    /// The schema's message table.
    pub fn message_table(&self) -> &MessageTable {
        &self.messages
    }

    /// Creates an empty validation context bound to this schema.
    pub fn new_context(&self) -> ValidationContext<'_> {
        ValidationContext::new(self)
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &SchemaEntry> {
        self.entries.values()
    }

    /// Entries are matched segment by segment, so a literal `"a.b"` field
    /// name never stands in for the declared key `a.b`.
    pub(crate) fn entry_index(&self, path: &KeyPath) -> Option<usize> {
        self.entries
            .get_full(&path.to_string())
            .filter(|(_, _, entry)| entry.path.matches(path))
            .map(|(i, _, _)| i)
            .or_else(|| self.entries.values().position(|entry| entry.path.matches(path)))
    }
}

impl SchemaLike for SimpleSchema {
    type Output = Value;

    /// Cleans the value, then validates it. Modifiers are detected from the
    /// value's top-level keys.
    fn check(&self, value: &Value) -> Validation<Value, Violations> {
        let options = ValidateOptions {
            modifier: resolver::is_modifier(value),
        };
        let cleaned = self.clean(value);
        let mut context = self.new_context();
        context.validate(&cleaned, options);
        context.result().map(|()| cleaned)
    }
}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<SimpleSchema>();
    assert_sync::<SimpleSchema>();
};

/// Builder for [`SimpleSchema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<(String, FieldRule)>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a key. Declaration order is kept.
    pub fn field(mut self, key: impl Into<String>, rule: FieldRule) -> Self {
        self.fields.push((key.into(), rule));
        self
    }

    /// Checks the definition and produces the schema.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaConfigError`] found.
    pub fn build(self) -> Result<SimpleSchema, SchemaConfigError> {
        let mut entries: IndexMap<String, SchemaEntry> = IndexMap::new();

        for (key, rule) in self.fields {
            check_key(&key)?;
            check_rule(&key, &rule)?;
            if entries.contains_key(&key) {
                return Err(SchemaConfigError::DuplicateKey(key));
            }
            let path = KeyPath::parse(&key);
            entries.insert(key, SchemaEntry { path, rule });
        }

        for (key, entry) in &entries {
            check_ancestors(key, &entry.path, &entries)?;
        }

        tracing::debug!(keys = entries.len(), "built schema");

        Ok(SimpleSchema {
            entries,
            messages: MessageTable::new(),
        })
    }
}

fn check_key(key: &str) -> Result<(), SchemaConfigError> {
    let malformed = key.is_empty()
        || key.starts_with('$')
        || key.split('.').any(|segment| {
            segment.is_empty() || (segment != "$" && segment.contains('$'))
        });
    if malformed {
        return Err(SchemaConfigError::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn check_rule(key: &str, rule: &FieldRule) -> Result<(), SchemaConfigError> {
    let element = rule.expected_type.element();

    if element.is_array() {
        return Err(SchemaConfigError::NestedArray(key.to_string()));
    }

    for bound in [&rule.min, &rule.max].into_iter().flatten() {
        check_bound(key, element, bound)?;
    }
    if let (Some(min), Some(max)) = (&rule.min, &rule.max) {
        let inverted = match (min, max) {
            (Bound::Number(lo), Bound::Number(hi)) => lo > hi,
            (Bound::Date(lo), Bound::Date(hi)) => lo > hi,
            _ => false,
        };
        if inverted {
            return Err(SchemaConfigError::InvalidRange {
                key: key.to_string(),
                lower: min.to_string(),
                upper: max.to_string(),
            });
        }
    }

    if rule.min_count.is_some() || rule.max_count.is_some() {
        if !rule.expected_type.is_array() {
            return Err(SchemaConfigError::CountOnNonArray(key.to_string()));
        }
        if let (Some(lo), Some(hi)) = (rule.min_count, rule.max_count) {
            if lo > hi {
                return Err(SchemaConfigError::InvalidRange {
                    key: key.to_string(),
                    lower: lo.to_string(),
                    upper: hi.to_string(),
                });
            }
        }
    }

    if let Some(allowed) = &rule.allowed_values {
        let misfit = allowed.iter().find(|v| {
            !element.accepts(v) || (*element == ExpectedType::Integer && !crate::value::is_integral(v))
        });
        if let Some(v) = misfit {
            return Err(SchemaConfigError::AllowedValueType {
                key: key.to_string(),
                value: v.to_string(),
                type_name: element.to_string(),
            });
        }
    }

    if rule.regex.is_some() && *element != ExpectedType::String {
        return Err(SchemaConfigError::PatternOnNonString(key.to_string()));
    }

    if rule.decimal && *element != ExpectedType::Number {
        return Err(SchemaConfigError::DecimalOnNonNumber(key.to_string()));
    }

    Ok(())
}

fn check_bound(key: &str, element: &ExpectedType, bound: &Bound) -> Result<(), SchemaConfigError> {
    let mismatch = |detail: &str| SchemaConfigError::BoundTypeMismatch {
        key: key.to_string(),
        detail: detail.to_string(),
    };
    match (element, bound) {
        (ExpectedType::Boolean | ExpectedType::Object, _) => {
            Err(SchemaConfigError::BoundNotSupported {
                key: key.to_string(),
                type_name: element.to_string(),
            })
        }
        (ExpectedType::String, Bound::Number(n)) if *n < 0.0 || n.fract() != 0.0 => {
            Err(mismatch("string length bounds must be non-negative integers"))
        }
        (ExpectedType::String | ExpectedType::Number | ExpectedType::Integer, Bound::Date(_)) => {
            Err(mismatch("date bound on a non-date type"))
        }
        (ExpectedType::Date, Bound::Number(_)) => Err(mismatch("numeric bound on a Date")),
        _ => Ok(()),
    }
}

/// A declared ancestor must be able to contain the key below it: an `Object`
/// before a field segment, an `Array` before `$`, and `Array(Object)` when the
/// key continues past the `$`.
fn check_ancestors(
    key: &str,
    path: &KeyPath,
    entries: &IndexMap<String, SchemaEntry>,
) -> Result<(), SchemaConfigError> {
    let segments = path.as_slice();

    for depth in 1..segments.len() {
        let ancestor = KeyPath::from_segments(segments[..depth].to_vec());
        let Some(entry) = entries.get(&ancestor.to_string()) else {
            continue;
        };
        let declared = &entry.rule.expected_type;
        let fits = match &segments[depth] {
            PathSegment::Wildcard | PathSegment::Index(_) if declared.is_array() => {
                depth + 1 == segments.len() || *declared.element() == ExpectedType::Object
            }
            PathSegment::Wildcard => false,
            _ => *declared == ExpectedType::Object,
        };
        if !fits {
            return Err(SchemaConfigError::ParentTypeConflict {
                key: key.to_string(),
                ancestor: ancestor.to_string(),
                type_name: declared.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(fields: Vec<(&str, FieldRule)>) -> Result<SimpleSchema, SchemaConfigError> {
        SimpleSchema::new(fields)
    }

    #[test]
    fn test_declaration_order_preserved() {
        let s = schema(vec![
            ("zeta", FieldRule::string()),
            ("alpha", FieldRule::string()),
            ("mid", FieldRule::number()),
        ])
        .unwrap();

        let keys: Vec<&str> = s.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_duplicate_key() {
        let err = schema(vec![("a", FieldRule::string()), ("a", FieldRule::number())]).unwrap_err();
        assert_eq!(err, SchemaConfigError::DuplicateKey("a".into()));
    }

    #[test]
    fn test_invalid_keys() {
        for key in ["", "$set", "a..b", "a.", "a$b"] {
            let err = schema(vec![(key, FieldRule::string())]).unwrap_err();
            assert!(matches!(err, SchemaConfigError::InvalidKey(_)), "key {:?}", key);
        }
    }

    #[test]
    fn test_rule_for_path_prefers_exact_key() {
        let s = schema(vec![
            ("grid", FieldRule::array_of(ExpectedType::Number)),
            ("grid.$", FieldRule::number().min(0)),
            ("grid.2", FieldRule::number().max(5)),
        ])
        .unwrap();

        let exact = s.rule_for_path(&KeyPath::parse("grid.2")).unwrap();
        assert_eq!(exact.max_bound(), Some(&Bound::Number(5.0)));

        let wild = s.rule_for_path(&KeyPath::parse("grid.0")).unwrap();
        assert_eq!(wild.min_bound(), Some(&Bound::Number(0.0)));
    }

    #[test]
    fn test_expected_type_of_array_element() {
        let s = schema(vec![("tags", FieldRule::array_of(ExpectedType::String))]).unwrap();

        assert_eq!(
            s.expected_type_at(&KeyPath::parse("tags.3")),
            Some(&ExpectedType::String)
        );
        assert_eq!(s.expected_type_at(&KeyPath::parse("tags.x")), None);
    }

    #[test]
    fn test_has_descendants() {
        let s = schema(vec![("items.$.sku", FieldRule::string())]).unwrap();

        assert!(s.has_descendants(&KeyPath::parse("items")));
        assert!(s.has_descendants(&KeyPath::parse("items.0")));
        assert!(!s.has_descendants(&KeyPath::parse("items.0.sku")));
        assert!(s.knows(&KeyPath::parse("items.4.sku")));
    }

    #[test]
    fn test_bounds_on_boolean_rejected() {
        let err = schema(vec![("flag", FieldRule::boolean().min(1))]).unwrap_err();
        assert!(matches!(err, SchemaConfigError::BoundNotSupported { .. }));
    }

    #[test]
    fn test_bound_kind_mismatch() {
        use chrono::{TimeZone, Utc};
        let when = Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap();

        let err = schema(vec![("n", FieldRule::number().min(when))]).unwrap_err();
        assert!(matches!(err, SchemaConfigError::BoundTypeMismatch { .. }));

        let err = schema(vec![("d", FieldRule::date().max(3))]).unwrap_err();
        assert!(matches!(err, SchemaConfigError::BoundTypeMismatch { .. }));

        let err = schema(vec![("s", FieldRule::string().min(1.5))]).unwrap_err();
        assert!(matches!(err, SchemaConfigError::BoundTypeMismatch { .. }));
    }

    #[test]
    fn test_inverted_range() {
        let err = schema(vec![("n", FieldRule::number().min(20).max(10))]).unwrap_err();
        assert!(matches!(err, SchemaConfigError::InvalidRange { .. }));

        let err = schema(vec![(
            "tags",
            FieldRule::array_of(ExpectedType::String).min_count(3).max_count(1),
        )])
        .unwrap_err();
        assert!(matches!(err, SchemaConfigError::InvalidRange { .. }));
    }

    #[test]
    fn test_count_on_scalar() {
        let err = schema(vec![("n", FieldRule::number().min_count(1))]).unwrap_err();
        assert_eq!(err, SchemaConfigError::CountOnNonArray("n".into()));
    }

    #[test]
    fn test_allowed_value_type() {
        let err = schema(vec![("n", FieldRule::number().allowed_values(["one"]))]).unwrap_err();
        assert!(matches!(err, SchemaConfigError::AllowedValueType { .. }));

        let err = schema(vec![("i", FieldRule::integer().allowed_values([1.5]))]).unwrap_err();
        assert!(matches!(err, SchemaConfigError::AllowedValueType { .. }));

        assert!(schema(vec![(
            "tags",
            FieldRule::array_of(ExpectedType::String).allowed_values(["a", "b"])
        )])
        .is_ok());
    }

    #[test]
    fn test_pattern_and_decimal_placement() {
        let err = schema(vec![("n", FieldRule::number().regex(Pattern::email()))]).unwrap_err();
        assert_eq!(err, SchemaConfigError::PatternOnNonString("n".into()));

        let err = schema(vec![("s", FieldRule::string().decimal())]).unwrap_err();
        assert_eq!(err, SchemaConfigError::DecimalOnNonNumber("s".into()));

        assert!(schema(vec![(
            "prices",
            FieldRule::array_of(ExpectedType::Number).decimal()
        )])
        .is_ok());
    }

    #[test]
    fn test_nested_array_rejected() {
        let err = schema(vec![(
            "grid",
            FieldRule::array_of(ExpectedType::array_of(ExpectedType::Number)),
        )])
        .unwrap_err();
        assert_eq!(err, SchemaConfigError::NestedArray("grid".into()));
    }

    #[test]
    fn test_parent_type_conflicts() {
        let err = schema(vec![
            ("name", FieldRule::string()),
            ("name.first", FieldRule::string()),
        ])
        .unwrap_err();
        assert!(matches!(err, SchemaConfigError::ParentTypeConflict { .. }));

        let err = schema(vec![
            ("tags", FieldRule::array_of(ExpectedType::String)),
            ("tags.$.label", FieldRule::string()),
        ])
        .unwrap_err();
        assert!(matches!(err, SchemaConfigError::ParentTypeConflict { .. }));

        let err = schema(vec![
            ("address", FieldRule::object()),
            ("address.$", FieldRule::string()),
        ])
        .unwrap_err();
        assert!(matches!(err, SchemaConfigError::ParentTypeConflict { .. }));
    }

    #[test]
    fn test_consistent_nesting_accepted() {
        let s = schema(vec![
            ("address", FieldRule::object()),
            ("address.city", FieldRule::string()),
            ("items", FieldRule::array_of(ExpectedType::Object)),
            ("items.$.sku", FieldRule::string()),
            ("tags", FieldRule::array_of(ExpectedType::String)),
            ("tags.$", FieldRule::string().max(10)),
        ]);
        assert!(s.is_ok());
    }

    #[test]
    fn test_label_for() {
        let s = schema(vec![
            ("requiredString", FieldRule::string()),
            ("items.$.unitPrice", FieldRule::number()),
            ("zip", FieldRule::string().label("ZIP code")),
        ])
        .unwrap();

        assert_eq!(s.label_for(&KeyPath::parse("requiredString")), "Required string");
        assert_eq!(s.label_for(&KeyPath::parse("items.3.unitPrice")), "Unit price");
        assert_eq!(s.label_for(&KeyPath::parse("zip")), "ZIP code");
    }
}
