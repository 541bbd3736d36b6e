//! The validation engine.
//!
//! Resolves the input into concrete keys, assigns each key to the schema rule
//! governing it, and runs the rule checks in a fixed order. The first failing
//! check decides the single violation recorded for a concrete path:
//!
//! 1. required
//! 2. type
//! 3. decimal, then min/max
//! 4. element count
//! 5. allowed values
//! 6. custom predicate
//! 7. pattern
//!
//! Keys with no rule are not reported; removing them is the cleaner's job.

use std::collections::HashSet;

use serde_json::Value;

use crate::error::{Violation, ViolationKind};
use crate::path::{KeyPath, PathSegment};
use crate::resolver::{self, KeyResolver, Operation, ResolvedKey};
use crate::schema::{Bound, ExpectedType, FieldRule, SimpleSchema};
use crate::value;

/// Validates `input` against `schema`, returning every violation found.
pub(crate) fn validate(schema: &SimpleSchema, input: &Value, modifier: bool) -> Vec<Violation> {
    let mut owned: Vec<Vec<ResolvedKey>> = vec![Vec::new(); schema.len()];
    let mut elements: Vec<Vec<ResolvedKey>> = vec![Vec::new(); schema.len()];
    for key in KeyResolver::new(input, modifier) {
        if let Some(i) = schema.entry_index(&key.path) {
            owned[i].push(key);
        } else if let Some(i) = array_entry_of_element(schema, &key.path) {
            elements[i].push(key);
        }
    }

    let mut seen: HashSet<KeyPath> = HashSet::new();
    let mut violations = Vec::new();

    for ((entry, keys), element_keys) in schema.entries().zip(owned).zip(elements) {
        let rule = &entry.rule;

        // Elements written on their own, e.g. `{"$set": {"tags.1": "x"}}`.
        // Elements of an array resolved as a whole are covered by its checks.
        let element_keys: Vec<ResolvedKey> = element_keys
            .into_iter()
            .filter(|element| {
                let parent = element.path.parent();
                !keys.iter().any(|key| parent.as_ref() == Some(&key.path))
            })
            .collect();

        for key in &keys {
            if seen.contains(&key.path) {
                continue;
            }
            if let Some(violation) = check_key(rule, key, input) {
                seen.insert(key.path.clone());
                violations.push(violation);
            }
        }

        if let Some(element_rule) = rule.element_rule().filter(|_| !element_keys.is_empty()) {
            for key in &element_keys {
                if seen.contains(&key.path) {
                    continue;
                }
                if let Some(violation) = check_key(&element_rule, key, input) {
                    seen.insert(key.path.clone());
                    violations.push(violation);
                }
            }
        }

        if !modifier && !rule.optional {
            for path in resolver::missing_paths(&entry.path, input) {
                if seen.insert(path.clone()) {
                    violations.push(Violation::new(path, ViolationKind::Required));
                }
            }
        }
    }

    violations
}

/// The index of the `Array(T)` entry governing an element path such as
/// `tags.1` that has no entry of its own.
fn array_entry_of_element(schema: &SimpleSchema, path: &KeyPath) -> Option<usize> {
    if !matches!(path.last(), Some(PathSegment::Index(_))) {
        return None;
    }
    let i = schema.entry_index(&path.parent()?)?;
    let entry = schema.entries().nth(i)?;
    entry.rule.expected_type.is_array().then_some(i)
}

fn check_key(rule: &FieldRule, key: &ResolvedKey, input: &Value) -> Option<Violation> {
    let path = &key.path;
    let absent = key.operation == Operation::Unset || key.value.map_or(true, is_blank);
    if absent {
        return (!rule.optional)
            .then(|| Violation::new(path.clone(), ViolationKind::Required).with_value_opt(key.value));
    }
    let value = key.value?;

    check_type(rule, path, value)
        .or_else(|| check_decimal(rule, path, value))
        .or_else(|| check_range(rule, path, value))
        .or_else(|| check_count(rule, path, value))
        .or_else(|| check_allowed(rule, path, value))
        .or_else(|| check_custom(rule, path, value, input, key.operation))
        .or_else(|| check_pattern(rule, path, value))
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// The values scalar checks apply to: the elements of an array, or the value.
fn scalars<'v>(rule: &FieldRule, v: &'v Value) -> Vec<&'v Value> {
    match (rule.expected_type.is_array(), v) {
        (true, Value::Array(items)) => items.iter().collect(),
        _ => vec![v],
    }
}

fn check_type(rule: &FieldRule, path: &KeyPath, v: &Value) -> Option<Violation> {
    let mismatch = |expected: &ExpectedType, got: &Value| {
        Violation::new(path.clone(), ViolationKind::Type)
            .with_code(expected.code())
            .with_expected(expected.to_string())
            .with_value(got.clone())
    };

    match &rule.expected_type {
        ExpectedType::Array(element) => match v.as_array() {
            None => Some(mismatch(&rule.expected_type, v)),
            Some(items) => items
                .iter()
                .find(|item| !element.accepts(item))
                .map(|item| mismatch(&**element, item)),
        },
        scalar => (!scalar.accepts(v)).then(|| mismatch(scalar, v)),
    }
}

fn check_decimal(rule: &FieldRule, path: &KeyPath, v: &Value) -> Option<Violation> {
    let integral_only = match rule.expected_type.element() {
        ExpectedType::Integer => true,
        ExpectedType::Number => !rule.decimal,
        _ => false,
    };
    if !integral_only {
        return None;
    }
    scalars(rule, v)
        .into_iter()
        .find(|n| !value::is_integral(n))
        .map(|n| Violation::new(path.clone(), ViolationKind::NotAllowedDecimal).with_value(n.clone()))
}

fn check_range(rule: &FieldRule, path: &KeyPath, v: &Value) -> Option<Violation> {
    if rule.min.is_none() && rule.max.is_none() {
        return None;
    }
    let element = rule.expected_type.element();
    let suffix = match element {
        ExpectedType::String => "String",
        ExpectedType::Number | ExpectedType::Integer => "Number",
        ExpectedType::Date => "Date",
        _ => return None,
    };

    scalars(rule, v).into_iter().find_map(|item| {
        let too_low = rule.min.as_ref().filter(|min| below(element, item, min));
        let too_high = rule.max.as_ref().filter(|max| above(element, item, max));
        let (code, bound) = match (too_low, too_high) {
            (Some(min), _) => (format!("min{}", suffix), min),
            (None, Some(max)) => (format!("max{}", suffix), max),
            (None, None) => return None,
        };
        Some(
            Violation::new(path.clone(), ViolationKind::MinMax)
                .with_code(code)
                .with_expected(bound.to_string())
                .with_value(item.clone()),
        )
    })
}

/// The quantity a bound is compared with: character count for strings, the
/// number itself for numbers.
fn measure(element: &ExpectedType, v: &Value) -> Option<f64> {
    match element {
        ExpectedType::String => v.as_str().map(|s| s.chars().count() as f64),
        _ => v.as_f64(),
    }
}

fn below(element: &ExpectedType, v: &Value, bound: &Bound) -> bool {
    match bound {
        Bound::Number(min) => measure(element, v).is_some_and(|m| m < *min),
        Bound::Date(min) => value::as_date(v).is_some_and(|d| d < *min),
    }
}

fn above(element: &ExpectedType, v: &Value, bound: &Bound) -> bool {
    match bound {
        Bound::Number(max) => measure(element, v).is_some_and(|m| m > *max),
        Bound::Date(max) => value::as_date(v).is_some_and(|d| d > *max),
    }
}

fn check_count(rule: &FieldRule, path: &KeyPath, v: &Value) -> Option<Violation> {
    let len = v.as_array()?.len();
    let violation = |code: &str, bound: usize| {
        Violation::new(path.clone(), ViolationKind::Count)
            .with_code(code)
            .with_expected(bound.to_string())
            .with_value(v.clone())
    };

    match (rule.min_count, rule.max_count) {
        (Some(min), _) if len < min => Some(violation("minCount", min)),
        (_, Some(max)) if len > max => Some(violation("maxCount", max)),
        _ => None,
    }
}

fn check_allowed(rule: &FieldRule, path: &KeyPath, v: &Value) -> Option<Violation> {
    let allowed = rule.allowed_values.as_ref()?;
    let rejected = scalars(rule, v)
        .into_iter()
        .any(|item| !allowed.iter().any(|a| value::values_equal(a, item)));

    rejected.then(|| {
        Violation::new(path.clone(), ViolationKind::NotAllowed)
            .with_expected(
                allowed
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            )
            .with_value(v.clone())
    })
}

fn check_custom(
    rule: &FieldRule,
    path: &KeyPath,
    v: &Value,
    input: &Value,
    operation: Operation,
) -> Option<Violation> {
    let check = rule.value_is_allowed.as_ref()?;
    (!check(v, input, operation))
        .then(|| Violation::new(path.clone(), ViolationKind::NotAllowed).with_value(v.clone()))
}

fn check_pattern(rule: &FieldRule, path: &KeyPath, v: &Value) -> Option<Violation> {
    let pattern = rule.regex.as_ref()?;
    scalars(rule, v)
        .into_iter()
        .find(|item| item.as_str().is_some_and(|s| !pattern.is_match(s)))
        .map(|item| {
            Violation::new(path.clone(), ViolationKind::NotValidRegEx(pattern.name().to_string()))
                .with_expected(pattern.name())
                .with_value(item.clone())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(schema: &SimpleSchema, input: Value) -> Vec<Violation> {
        let modifier = resolver::is_modifier(&input);
        validate(schema, &input, modifier)
    }

    #[test]
    fn test_one_violation_per_path() {
        let schema = SimpleSchema::new([(
            "code",
            FieldRule::string().min(5).allowed_values(["abcdef"]),
        )])
        .unwrap();

        let violations = run(&schema, json!({"code": "abc"}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::MinMax);
        assert_eq!(violations[0].code, "minString");
    }

    #[test]
    fn test_type_beats_range() {
        let schema = SimpleSchema::new([("n", FieldRule::number().min(10))]).unwrap();

        let violations = run(&schema, json!({"n": "5"}));
        assert_eq!(violations[0].kind, ViolationKind::Type);
        assert_eq!(violations[0].code, "expectedNumber");
    }

    #[test]
    fn test_decimal_before_range() {
        let schema = SimpleSchema::new([("n", FieldRule::number().min(10))]).unwrap();

        let violations = run(&schema, json!({"n": 1.5}));
        assert_eq!(violations[0].kind, ViolationKind::NotAllowedDecimal);
    }

    #[test]
    fn test_inclusive_bounds() {
        let schema = SimpleSchema::new([("n", FieldRule::number().min(10).max(20))]).unwrap();

        assert!(run(&schema, json!({"n": 10})).is_empty());
        assert!(run(&schema, json!({"n": 20})).is_empty());
        assert_eq!(run(&schema, json!({"n": 21}))[0].code, "maxNumber");
    }

    #[test]
    fn test_string_length_counts_chars() {
        let schema = SimpleSchema::new([("s", FieldRule::string().max(3))]).unwrap();
        assert!(run(&schema, json!({"s": "äöü"})).is_empty());
    }

    #[test]
    fn test_required_only_when_absent() {
        let schema = SimpleSchema::new([
            ("a", FieldRule::string()),
            ("b", FieldRule::string().optional()),
        ])
        .unwrap();

        let violations = run(&schema, json!({}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].key.to_string(), "a");
        assert_eq!(violations[0].kind, ViolationKind::Required);
    }

    #[test]
    fn test_modifier_does_not_require_absent_keys() {
        let schema = SimpleSchema::new([("a", FieldRule::string())]).unwrap();
        assert!(run(&schema, json!({"$set": {"b": 1}})).is_empty());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let schema = SimpleSchema::new([("a", FieldRule::string().optional())]).unwrap();
        assert!(run(&schema, json!({"zzz": 1})).is_empty());
    }

    #[test]
    fn test_custom_predicate_sees_operation() {
        let schema = SimpleSchema::new([(
            "n",
            FieldRule::number().value_is_allowed(|_, _, op| op == Operation::Set),
        )])
        .unwrap();

        assert_eq!(run(&schema, json!({"n": 1})).len(), 1);
        assert!(run(&schema, json!({"$set": {"n": 1}})).is_empty());
    }

    #[test]
    fn test_pattern_per_element() {
        let schema = SimpleSchema::new([(
            "emails",
            FieldRule::array_of(ExpectedType::String).regex(crate::Pattern::email()),
        )])
        .unwrap();

        let violations = run(&schema, json!({"emails": ["a@example.com", "nope"]}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].value, Some(json!("nope")));
        assert_eq!(
            violations[0].kind,
            ViolationKind::NotValidRegEx("email".into())
        );
    }

    #[test]
    fn test_same_path_twice_in_modifier() {
        let schema = SimpleSchema::new([("a", FieldRule::string())]).unwrap();
        let violations = run(&schema, json!({"$set": {"a": 1}, "$unset": {"a": ""}}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::Type);
    }
}
