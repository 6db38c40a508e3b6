//! Request validation from per-resource field rules.
//!
//! Fields are checked in declaration order and the first failing field is reported; clients
//! branch on the returned code, so the order is part of the contract.

use crate::config::{EnumValue, FieldKind, FieldRule, ResolvedResource};
use crate::error::{AppError, FieldError};
use crate::store::Record;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a create payload. Every declared field ends up in the output: supplied values
    /// normalized, absent fields take their default or null. Required fields without a default
    /// must be supplied.
    pub fn validate_create(resource: &ResolvedResource, body: &Record) -> Result<Record, AppError> {
        let mut out = Record::new();
        for rule in &resource.fields {
            let value = match body.get(&rule.name) {
                Some(v) => normalize(rule, v),
                None => match &rule.default {
                    Some(d) => Ok(d.clone()),
                    None if rule.required => Err(missing(rule)),
                    None => Ok(Value::Null),
                },
            }
            .map_err(AppError::Validation)?;
            out.insert(rule.name.clone(), value);
        }
        Ok(out)
    }

    /// Validate only the fields present in body (for PUT). Absent fields are left untouched;
    /// supplied fields must still satisfy their rule, including required-ness.
    pub fn validate_update(resource: &ResolvedResource, body: &Record) -> Result<Record, AppError> {
        let mut out = Record::new();
        for rule in &resource.fields {
            if let Some(v) = body.get(&rule.name) {
                let value = normalize(rule, v).map_err(AppError::Validation)?;
                out.insert(rule.name.clone(), value);
            }
        }
        Ok(out)
    }

    /// Normalize a single supplied value against its rule.
    pub fn check_value(rule: &FieldRule, value: &Value) -> Result<Value, FieldError> {
        normalize(rule, value)
    }
}

fn missing(rule: &FieldRule) -> FieldError {
    FieldError {
        field: rule.name.clone(),
        code: rule.missing_code.clone(),
        message: format!("{} is required", rule.label),
    }
}

fn invalid(rule: &FieldRule, message: String) -> FieldError {
    FieldError {
        field: rule.name.clone(),
        code: rule.invalid_code.clone(),
        message,
    }
}

/// Null or blank input: required fields fail, optional fields store null.
fn blank(rule: &FieldRule) -> Result<Value, FieldError> {
    if rule.required {
        Err(missing(rule))
    } else {
        Ok(Value::Null)
    }
}

fn normalize(rule: &FieldRule, v: &Value) -> Result<Value, FieldError> {
    if v.is_null() {
        return blank(rule);
    }
    if let Value::String(s) = v {
        if s.trim().is_empty() {
            return blank(rule);
        }
    }
    match &rule.kind {
        FieldKind::Text | FieldKind::NonEmptyText | FieldKind::Email => {
            let s = v
                .as_str()
                .ok_or_else(|| invalid(rule, format!("{} must be a string", rule.label)))?
                .trim();
            if let Some(max) = rule.max_length {
                if s.chars().count() > max {
                    return Err(invalid(
                        rule,
                        format!("{} must be at most {} characters", rule.label, max),
                    ));
                }
            }
            if rule.kind == FieldKind::Email && !is_email(s) {
                return Err(invalid(rule, format!("{} must be a valid email address", rule.label)));
            }
            Ok(Value::String(s.to_string()))
        }
        FieldKind::Integer => coerce_integer(v)
            .map(|n| Value::Number(n.into()))
            .ok_or_else(|| invalid(rule, format!("{} must be a valid integer", rule.label))),
        FieldKind::PositiveInteger => coerce_integer(v)
            .filter(|n| *n > 0)
            .map(|n| Value::Number(n.into()))
            .ok_or_else(|| invalid(rule, format!("{} must be a positive integer", rule.label))),
        FieldKind::Boolean => coerce_bool(v)
            .map(Value::Bool)
            .ok_or_else(|| invalid(rule, format!("{} must be a boolean", rule.label))),
        FieldKind::Enum(allowed) => {
            let candidate = if rule.kind.is_integer() {
                coerce_integer(v).map(EnumValue::Int)
            } else {
                v.as_str().map(|s| EnumValue::Text(s.trim().to_string()))
            };
            match candidate {
                Some(c) if allowed.contains(&c) => Ok(c.to_json()),
                _ => Err(invalid(
                    rule,
                    format!(
                        "{} must be one of: {}",
                        rule.label,
                        allowed.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ")
                    ),
                )),
            }
        }
    }
}

/// Integers from JSON numbers or numeric strings. Fractional, non-finite or out-of-range input
/// yields None.
pub(crate) fn coerce_integer(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() <= i64::MAX as f64 / 2.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

pub(crate) fn coerce_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::String(s) => {
            let s = s.trim();
            if s.eq_ignore_ascii_case("true") {
                Some(true)
            } else if s.eq_ignore_ascii_case("false") {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn is_email(s: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(EMAIL_PATTERN).ok())
        .as_ref()
        .map_or(false, |re| re.is_match(s))
}
