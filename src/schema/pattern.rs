//! Named string patterns.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$"#,
    )
    .expect("email pattern compiles")
});

static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?|ftp)://[^\s/$.?#][^\s]*$").expect("url pattern compiles")
});

static DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,}$")
        .expect("domain pattern compiles")
});

static IPV4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)$",
    )
    .expect("ipv4 pattern compiles")
});

/// A regular expression with a name.
///
/// The name travels with `NotValidRegEx` violations so messages can differ per
/// pattern (`"regEx email"` vs `"regEx url"`).
///
/// # Example
///
/// ```rust
/// use docschema::Pattern;
///
/// assert!(Pattern::email().is_match("test123@sub.example.edu"));
/// assert!(!Pattern::url().is_match("blah"));
///
/// let zip = Pattern::new("zip", r"^\d{5}$").unwrap();
/// assert_eq!(zip.name(), "zip");
/// ```
#[derive(Clone)]
pub struct Pattern {
    name: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles a custom pattern.
    pub fn new(name: impl Into<String>, source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            regex: Regex::new(source)?,
        })
    }

    pub fn email() -> Self {
        Self::named("email", &EMAIL)
    }

    pub fn url() -> Self {
        Self::named("url", &URL)
    }

    pub fn domain() -> Self {
        Self::named("domain", &DOMAIN)
    }

    pub fn ipv4() -> Self {
        Self::named("ipv4", &IPV4)
    }

    fn named(name: &str, regex: &Regex) -> Self {
        Self {
            name: name.to_string(),
            regex: regex.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, s: &str) -> bool {
        self.regex.is_match(s)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("name", &self.name)
            .field("regex", &self.regex.as_str())
            .finish()
    }
}
