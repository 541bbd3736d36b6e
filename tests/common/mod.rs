//! Shared schemas and helpers for integration tests.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use docschema::{value, ExpectedType, FieldRule, Pattern, SimpleSchema, ValidateOptions, ValidationContext};
use serde_json::{json, Value};

/// Every key required except `anOptionalOne`.
pub fn required_schema() -> SimpleSchema {
    let schema = SimpleSchema::builder()
        .field("requiredString", FieldRule::string())
        .field("requiredBoolean", FieldRule::boolean())
        .field("requiredNumber", FieldRule::number())
        .field("requiredDate", FieldRule::date())
        .field("requiredEmail", FieldRule::string().regex(Pattern::email()))
        .field("requiredUrl", FieldRule::string().regex(Pattern::url()))
        .field("requiredObject", FieldRule::object())
        .field("subdoc.requiredString", FieldRule::string())
        .field("anOptionalOne", FieldRule::string().optional())
        .build()
        .unwrap();

    schema.messages([
        ("regEx requiredEmail", "[label] is not a valid e-mail address"),
        ("regEx requiredUrl", "[label] is not a valid URL"),
    ]);
    schema
}

/// Every key optional; one key per kind of constraint.
pub fn constraint_schema() -> SimpleSchema {
    let schema = SimpleSchema::builder()
        .field("string", FieldRule::string().optional())
        .field("minMaxString", FieldRule::string().optional().min(10).max(20))
        .field(
            "minMaxStringArray",
            FieldRule::array_of(ExpectedType::String)
                .optional()
                .min(10)
                .max(20)
                .min_count(1)
                .max_count(2),
        )
        .field(
            "allowedStrings",
            FieldRule::string()
                .optional()
                .allowed_values(["tuna", "fish", "salad"]),
        )
        .field(
            "valueIsAllowedString",
            FieldRule::string()
                .optional()
                .value_is_allowed(|val, _, _| val == "pumpkin"),
        )
        .field(
            "allowedStringsArray",
            FieldRule::array_of(ExpectedType::String)
                .optional()
                .allowed_values(["tuna", "fish", "salad"]),
        )
        .field("boolean", FieldRule::boolean().optional())
        .field("number", FieldRule::number().optional())
        .field("minMaxNumber", FieldRule::number().optional().min(10).max(20))
        .field(
            "allowedNumbers",
            FieldRule::number().optional().allowed_values([1, 2, 3]),
        )
        .field(
            "valueIsAllowedNumber",
            FieldRule::number()
                .optional()
                .value_is_allowed(|val, _, _| val.as_f64() == Some(1.0)),
        )
        .field(
            "allowedNumbersArray",
            FieldRule::array_of(ExpectedType::Number)
                .optional()
                .allowed_values([1, 2, 3]),
        )
        .field("decimal", FieldRule::number().optional().decimal())
        .field("date", FieldRule::date().optional())
        .field(
            "minMaxDate",
            FieldRule::date()
                .optional()
                .min(Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap())
                .max(Utc.with_ymd_and_hms(2013, 12, 31, 0, 0, 0).unwrap()),
        )
        .field("email", FieldRule::string().optional().regex(Pattern::email()))
        .field("url", FieldRule::string().optional().regex(Pattern::url()))
        .build()
        .unwrap();

    schema.messages([
        ("minCount", "blah"),
        ("regEx email", "[label] is not a valid e-mail address"),
        ("regEx url", "[label] is not a valid URL"),
    ]);
    schema
}

/// `confirmPassword` must equal `password`, read from `$set` or the document.
pub fn password_schema() -> SimpleSchema {
    SimpleSchema::builder()
        .field("password", FieldRule::string())
        .field(
            "confirmPassword",
            FieldRule::string().value_is_allowed(|val, doc, _| {
                let password = match doc.get("$set") {
                    Some(set) => set.get("password"),
                    None => doc.get("password"),
                };
                password == Some(val)
            }),
        )
        .build()
        .unwrap()
}

/// Cleans with defaults, then validates in a fresh context.
pub fn clean_and_validate<'s>(schema: &'s SimpleSchema, input: Value) -> ValidationContext<'s> {
    let modifier = input
        .as_object()
        .is_some_and(|obj| obj.keys().any(|k| k.starts_with('$')));
    let cleaned = schema.clean(&input);
    let mut context = schema.new_context();
    context.validate(&cleaned, ValidateOptions { modifier });
    context
}

/// Number of violations after cleaning and validating.
pub fn count(schema: &SimpleSchema, input: Value) -> usize {
    clean_and_validate(schema, input).invalid_keys().len()
}

/// Number of violations when validating without cleaning.
pub fn raw_count(schema: &SimpleSchema, input: Value) -> usize {
    let modifier = input
        .as_object()
        .is_some_and(|obj| obj.keys().any(|k| k.starts_with('$')));
    let mut context = schema.new_context();
    context.validate(&input, ValidateOptions { modifier });
    context.invalid_keys().len()
}

pub fn now() -> Value {
    value::date(Utc::now())
}

pub fn utc_date(y: i32, m: u32, d: u32) -> Value {
    value::date(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap())
}

/// A document satisfying every rule of [`required_schema`].
pub fn valid_required_doc() -> Value {
    json!({
        "requiredString": "test",
        "requiredBoolean": true,
        "requiredNumber": 1,
        "requiredDate": now(),
        "requiredEmail": "test123@sub.example.edu",
        "requiredUrl": "http://google.com",
        "requiredObject": {},
        "subdoc": {"requiredString": "test"}
    })
}
