//! Key resolution.
//!
//! Turns a document or an update modifier into a flat, ordered sequence of
//! [`ResolvedKey`]s: every concrete dotted path with the value it will hold
//! and the [`Operation`] producing it. The engine only ever looks at this
//! sequence, so documents and modifiers share one validation path.
//!
//! # Example
//!
//! ```rust
//! use docschema::{KeyResolver, Operation};
//! use serde_json::json;
//!
//! let modifier = json!({"$set": {"a.b": 1}, "$unset": {"c": ""}});
//! let keys: Vec<(String, Operation)> = KeyResolver::new(&modifier, true)
//!     .map(|k| (k.path.to_string(), k.operation))
//!     .collect();
//!
//! assert_eq!(keys, vec![
//!     ("a.b".to_string(), Operation::Set),
//!     ("c".to_string(), Operation::Unset),
//! ]);
//! ```

use std::fmt::{self, Display};

use serde_json::{Map, Value};

use crate::path::{KeyPath, PathSegment};
use crate::value;

/// How a resolved key gets its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// The key is present in a full document.
    Insert,
    /// The key is written by `$set` or `$setOnInsert`.
    Set,
    /// The key is removed by `$unset`.
    Unset,
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Insert => write!(f, "insert"),
            Operation::Set => write!(f, "set"),
            Operation::Unset => write!(f, "unset"),
        }
    }
}

/// One concrete key produced by a document or modifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedKey<'a> {
    /// The concrete path, e.g. `items.2.name`.
    pub path: KeyPath,
    /// The value the key will hold; `None` for `$unset`.
    pub value: Option<&'a Value>,
    pub operation: Operation,
}

struct Pending<'a> {
    path: KeyPath,
    value: Option<&'a Value>,
    operation: Operation,
}

/// Lazy, depth-first iterator over the keys of a document or modifier.
///
/// Keys come out in document order, parents before children. Containers are
/// yielded as well as their contents; dates are leaves. Modifier operators
/// other than `$set`, `$setOnInsert`, and `$unset` are ignored.
pub struct KeyResolver<'a> {
    stack: Vec<Pending<'a>>,
}

impl<'a> KeyResolver<'a> {
    /// Starts resolving `input`, treating it as a modifier when `modifier` is true.
    pub fn new(input: &'a Value, modifier: bool) -> Self {
        let mut roots = Vec::new();
        if let Some(obj) = input.as_object() {
            if modifier {
                for (op, body) in obj {
                    Self::operator_roots(op, body, &mut roots);
                }
            } else {
                roots.extend(obj.iter().map(|(key, v)| Pending {
                    path: KeyPath::from_field(key.as_str()),
                    value: Some(v),
                    operation: Operation::Insert,
                }));
            }
        }
        roots.reverse();
        Self { stack: roots }
    }

    fn operator_roots(op: &str, body: &'a Value, roots: &mut Vec<Pending<'a>>) {
        let Some(fields) = body.as_object() else {
            tracing::trace!(operator = op, "ignoring non-object operator body");
            return;
        };
        match op {
            "$set" | "$setOnInsert" => roots.extend(fields.iter().map(|(key, v)| Pending {
                path: KeyPath::parse(key),
                value: Some(v),
                operation: Operation::Set,
            })),
            "$unset" => roots.extend(fields.keys().map(|key| Pending {
                path: KeyPath::parse(key),
                value: None,
                operation: Operation::Unset,
            })),
            _ => tracing::trace!(operator = op, "ignoring unsupported operator"),
        }
    }

    fn push_children(&mut self, parent: &KeyPath, value: &'a Value, operation: Operation) {
        match value {
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate().rev() {
                    self.stack.push(Pending {
                        path: parent.push_index(i),
                        value: Some(item),
                        operation,
                    });
                }
            }
            Value::Object(members) if value::is_plain_object(value) => {
                for (key, item) in members.iter().rev() {
                    self.stack.push(Pending {
                        path: parent.push_field(key.as_str()),
                        value: Some(item),
                        operation,
                    });
                }
            }
            _ => {}
        }
    }
}

impl<'a> Iterator for KeyResolver<'a> {
    type Item = ResolvedKey<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let Pending {
            path,
            value,
            operation,
        } = self.stack.pop()?;
        if let Some(v) = value {
            self.push_children(&path, v, operation);
        }
        Some(ResolvedKey {
            path,
            value,
            operation,
        })
    }
}

/// Returns true if the value looks like an update modifier: a non-empty
/// object whose top-level keys all start with `$`.
pub fn is_modifier(input: &Value) -> bool {
    input
        .as_object()
        .is_some_and(|obj| !obj.is_empty() && obj.keys().all(|k| k.starts_with('$')))
}

/// Concrete paths matching a schema key that are absent from a document.
///
/// `$` segments expand over the array elements that are present, so
/// `items.$.name` against `{"items": [{}, {"name": "x"}]}` yields only
/// `items.0.name`. A `$` under a missing or non-array parent yields nothing.
/// A non-object parent counts as absent.
pub fn missing_paths(key: &KeyPath, doc: &Value) -> Vec<KeyPath> {
    let mut out = Vec::new();
    collect_missing(key.as_slice(), Some(doc), KeyPath::root(), &mut out);
    out
}

fn collect_missing(
    segments: &[PathSegment],
    node: Option<&Value>,
    at: KeyPath,
    out: &mut Vec<KeyPath>,
) {
    let Some((first, rest)) = segments.split_first() else {
        if node.is_none() {
            out.push(at);
        }
        return;
    };
    match first {
        PathSegment::Field(name) => {
            let child = node.and_then(plain_members).and_then(|m| m.get(name));
            collect_missing(rest, child, at.push_field(name.as_str()), out);
        }
        PathSegment::Index(i) => {
            let child = match node {
                Some(Value::Array(items)) => items.get(*i),
                Some(other) => plain_members(other).and_then(|m| m.get(&i.to_string())),
                None => None,
            };
            collect_missing(rest, child, at.push_index(*i), out);
        }
        PathSegment::Wildcard => {
            if let Some(Value::Array(items)) = node {
                for (i, item) in items.iter().enumerate() {
                    collect_missing(rest, Some(item), at.push_index(i), out);
                }
            }
        }
    }
}

fn plain_members(v: &Value) -> Option<&Map<String, Value>> {
    if value::is_plain_object(v) {
        v.as_object()
    } else {
        None
    }
}
