//! Message templates for violations.
//!
//! A [`MessageTable`] maps message codes to templates. Lookups try the code
//! qualified by the generic key first (`"regEx requiredEmail"`), then the bare
//! code (`"regEx"`), then a built-in default. Templates may contain the tokens
//! `[label]`, `[value]`, `[min]`, `[max]`, `[minCount]`, `[maxCount]`, and
//! `[type]`.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;

use crate::error::Violation;

/// Thread-safe template store.
///
/// Registration takes a write lock; rendering only reads, so many contexts
/// can render concurrently.
///
/// # Example
///
/// ```rust
/// use docschema::MessageTable;
///
/// let table = MessageTable::new();
/// table.set("minCount", "Pick at least [minCount]");
/// table.set("regEx email", "That does not look like an email");
///
/// assert_eq!(table.template("regEx", "email"), "That does not look like an email");
/// assert_eq!(table.template("regEx", "website"), "[label] failed regular expression validation");
/// ```
#[derive(Debug, Default)]
pub struct MessageTable {
    templates: RwLock<HashMap<String, String>>,
}

impl MessageTable {
    /// Creates a table holding only the built-in defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces one template.
    pub fn set(&self, key: impl Into<String>, template: impl Into<String>) {
        self.templates.write().insert(key.into(), template.into());
    }

    /// Registers many templates under a single write lock.
    pub fn extend<I, K, T>(&self, templates: I)
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: Into<String>,
    {
        let mut map = self.templates.write();
        for (key, template) in templates {
            map.insert(key.into(), template.into());
        }
    }

    /// Returns a registered template, ignoring defaults.
    pub fn get(&self, key: &str) -> Option<String> {
        self.templates.read().get(key).cloned()
    }

    /// Resolves the template for a code and generic key.
    pub fn template(&self, code: &str, generic_key: &str) -> String {
        let map = self.templates.read();
        map.get(&format!("{} {}", code, generic_key))
            .or_else(|| map.get(code))
            .cloned()
            .unwrap_or_else(|| default_template(code).to_string())
    }

    /// Renders the message for a violation.
    pub fn render(&self, violation: &Violation, label: &str) -> String {
        let generic = violation.key.generic().to_string();
        let template = self.template(&violation.code, &generic);

        let expected = violation.expected.as_deref().unwrap_or_default();
        let value = violation.value.as_ref().map(display_value).unwrap_or_default();

        template
            .replace("[label]", label)
            .replace("[value]", &value)
            .replace("[minCount]", expected)
            .replace("[maxCount]", expected)
            .replace("[min]", expected)
            .replace("[max]", expected)
            .replace("[type]", expected)
    }
}

fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn default_template(code: &str) -> &'static str {
    match code {
        "required" => "[label] is required",
        "minString" => "[label] must be at least [min] characters",
        "maxString" => "[label] cannot exceed [max] characters",
        "minNumber" => "[label] must be at least [min]",
        "maxNumber" => "[label] cannot exceed [max]",
        "minDate" => "[label] must be on or after [min]",
        "maxDate" => "[label] cannot be after [max]",
        "minCount" => "You must specify at least [minCount] values",
        "maxCount" => "You cannot specify more than [maxCount] values",
        "noDecimal" => "[label] must be an integer",
        "notAllowed" => "[value] is not an allowed value",
        "expectedString" => "[label] must be a string",
        "expectedNumber" => "[label] must be a number",
        "expectedBoolean" => "[label] must be a boolean",
        "expectedDate" => "[label] must be a date",
        "expectedObject" => "[label] must be an object",
        "expectedArray" => "[label] must be an array",
        "regEx" => "[label] failed regular expression validation",
        _ => "[label] is invalid",
    }
}

/// Turns a key like `requiredString` or `first_name` into `Required string`
/// or `First name`.
pub fn humanize(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in key.chars() {
        if c == '_' || c == '-' || c == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    let sentence = words
        .iter()
        .enumerate()
        .map(|(i, w)| if i == 0 { w.clone() } else { w.to_lowercase() })
        .collect::<Vec<_>>()
        .join(" ");

    let mut chars = sentence.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
