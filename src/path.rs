//! Dotted key paths for locating values in documents and modifiers.
//!
//! This module provides [`KeyPath`] and [`PathSegment`]. A path is written the
//! MongoDB way, `items.2.name`, and schema keys may use a `$` segment to stand for
//! any array index (`items.$.name`).

use std::fmt::{self, Display};

/// A segment of a key path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A field access (e.g., `subdoc`, `name`).
    Field(String),
    /// A concrete array index (e.g., `0`, `42`).
    Index(usize),
    /// The `$` placeholder matching any array index. Only appears in schema keys.
    Wildcard,
}

impl PathSegment {
    /// Creates a new field segment.
    pub fn field(name: impl Into<String>) -> Self {
        PathSegment::Field(name.into())
    }

    /// Creates a new index segment.
    pub fn index(idx: usize) -> Self {
        PathSegment::Index(idx)
    }

    /// Returns true if this schema segment accepts the given concrete segment.
    ///
    /// A wildcard accepts indices (and another wildcard) only, so an object key
    /// that happens to be numeric never satisfies `$`. A field segment accepts
    /// the same field, or an index whose decimal form equals the field name
    /// (dotted modifier keys cannot tell the two apart).
    pub fn accepts(&self, concrete: &PathSegment) -> bool {
        match (self, concrete) {
            (PathSegment::Wildcard, PathSegment::Index(_) | PathSegment::Wildcard) => true,
            (PathSegment::Wildcard, _) => false,
            (PathSegment::Field(a), PathSegment::Field(b)) => a == b,
            (PathSegment::Field(a), PathSegment::Index(i)) => a.parse::<usize>() == Ok(*i),
            (PathSegment::Index(a), PathSegment::Index(b)) => a == b,
            (PathSegment::Index(a), PathSegment::Field(b)) => b.parse::<usize>() == Ok(*a),
            (_, PathSegment::Wildcard) => false,
        }
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, "{}", name),
            PathSegment::Index(idx) => write!(f, "{}", idx),
            PathSegment::Wildcard => write!(f, "$"),
        }
    }
}

/// A dotted path to a value in a document.
///
/// `KeyPath` is used both for concrete document paths (`items.2.name`) and for
/// schema keys (`items.$.name`).
///
/// # Example
///
/// ```rust
/// use docschema::KeyPath;
///
/// let path = KeyPath::root()
///     .push_field("items")
///     .push_index(2)
///     .push_field("name");
///
/// assert_eq!(path.to_string(), "items.2.name");
/// assert!(KeyPath::parse("items.$.name").matches(&path));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct KeyPath {
    segments: Vec<PathSegment>,
}

impl KeyPath {
    /// Creates an empty path representing the document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a dotted path.
    ///
    /// `$` becomes [`PathSegment::Wildcard`], all-digit segments become
    /// [`PathSegment::Index`], everything else is a field. Use this for schema
    /// keys and for dotted keys found inside modifiers.
    pub fn parse(dotted: &str) -> Self {
        if dotted.is_empty() {
            return Self::root();
        }
        let segments = dotted
            .split('.')
            .map(|s| match s {
                "$" => PathSegment::Wildcard,
                _ if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s
                    .parse::<usize>()
                    .map(PathSegment::Index)
                    .unwrap_or_else(|_| PathSegment::field(s)),
                _ => PathSegment::field(s),
            })
            .collect();
        Self { segments }
    }

    /// Creates a path from a single field segment.
    pub fn from_field(name: impl Into<String>) -> Self {
        Self {
            segments: vec![PathSegment::Field(name.into())],
        }
    }

    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Returns a new path with a field segment appended.
    pub fn push_field(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Field(name.into()));
        Self { segments }
    }

    /// Returns a new path with an index segment appended.
    pub fn push_index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    /// Returns a new path with a segment appended.
    pub fn push(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// Returns true if this is the root path (no segments).
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the number of segments in this path.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if this path has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns an iterator over the path segments.
    pub fn segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.segments.iter()
    }

    /// Returns the segments as a slice.
    pub fn as_slice(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns the parent path, or None if this is root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            None
        } else {
            Some(Self {
                segments: self.segments[..self.segments.len() - 1].to_vec(),
            })
        }
    }

    /// Returns the last segment, or None if this is root.
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Returns true if any segment is a `$` wildcard.
    pub fn has_wildcard(&self) -> bool {
        self.segments.iter().any(|s| *s == PathSegment::Wildcard)
    }

    /// Returns the schema form of a concrete path: every index becomes `$`.
    ///
    /// `items.2.name` becomes `items.$.name`. This is the form message
    /// templates are keyed by.
    pub fn generic(&self) -> Self {
        Self {
            segments: self
                .segments
                .iter()
                .map(|s| match s {
                    PathSegment::Index(_) => PathSegment::Wildcard,
                    other => other.clone(),
                })
                .collect(),
        }
    }

    /// Returns true if this schema key matches the concrete path segment by segment.
    pub fn matches(&self, concrete: &KeyPath) -> bool {
        self.segments.len() == concrete.segments.len()
            && self
                .segments
                .iter()
                .zip(&concrete.segments)
                .all(|(pattern, seg)| pattern.accepts(seg))
    }

    /// Returns true if this schema key lies strictly below `ancestor`.
    pub fn is_below(&self, ancestor: &KeyPath) -> bool {
        self.segments.len() > ancestor.segments.len()
            && self
                .segments
                .iter()
                .zip(&ancestor.segments)
                .all(|(pattern, seg)| pattern.accepts(seg))
    }
}

impl Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl From<&str> for KeyPath {
    fn from(dotted: &str) -> Self {
        KeyPath::parse(dotted)
    }
}
