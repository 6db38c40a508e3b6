//! Identity, existence and uniqueness checks run before any mutation.

use crate::config::{FieldRule, ResolvedModel, ResolvedResource};
use crate::error::{AppError, FieldError};
use crate::filter::{Page, Predicate};
use crate::store::{Record, Store};
use serde_json::Value;

/// Ids are positive decimal integers without sign or whitespace.
pub fn parse_id(raw: Option<&str>) -> Result<i64, AppError> {
    let raw = raw.ok_or_else(|| AppError::InvalidId("Missing id".into()))?;
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::InvalidId(format!("Invalid id: {}", raw)));
    }
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::InvalidId(format!("Invalid id: {}", raw))),
    }
}

pub fn duplicate_key(resource: &ResolvedResource, rule: &FieldRule) -> AppError {
    AppError::DuplicateKey(FieldError {
        field: rule.name.clone(),
        code: rule.duplicate_code.clone(),
        message: format!(
            "A {} with this {} already exists",
            resource.label.to_lowercase(),
            rule.label.to_lowercase()
        ),
    })
}

/// The record with `id`, or `NotFound`.
pub async fn ensure_exists(
    store: &dyn Store,
    resource: &ResolvedResource,
    id: i64,
) -> Result<Record, AppError> {
    store
        .select_where(resource, &Predicate::id(id), &[], Some(Page { limit: 1, offset: 0 }))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("{} not found", resource.label)))
}

/// Fails with `DuplicateKey` when another record holds `value` in the uniqueness key.
/// `exclude` is the id being updated; matching itself is not a conflict.
pub async fn ensure_unique(
    store: &dyn Store,
    resource: &ResolvedResource,
    value: &Value,
    exclude: Option<i64>,
) -> Result<(), AppError> {
    let Some(rule) = resource.unique_field() else {
        return Ok(());
    };
    if value.is_null() {
        return Ok(());
    }
    let matches = store
        .select_where(
            resource,
            &Predicate::eq(rule.name.clone(), value.clone()),
            &[],
            Some(Page { limit: 2, offset: 0 }),
        )
        .await?;
    let conflict = matches
        .iter()
        .any(|r| exclude.is_none() || r.get("id").and_then(Value::as_i64) != exclude);
    if conflict {
        return Err(duplicate_key(resource, rule));
    }
    Ok(())
}

/// Every supplied reference field must point at an existing parent record.
pub async fn ensure_references(
    store: &dyn Store,
    model: &ResolvedModel,
    resource: &ResolvedResource,
    values: &Record,
) -> Result<(), AppError> {
    for rule in &resource.fields {
        let Some(parent_name) = &rule.references else { continue };
        let Some(parent_id) = values.get(&rule.name).and_then(Value::as_i64) else {
            continue;
        };
        let parent = model.resource(parent_name).ok_or_else(|| {
            AppError::Internal(format!("{} references unknown resource {}", resource.name, parent_name))
        })?;
        match ensure_exists(store, parent, parent_id).await {
            Ok(_) => {}
            Err(AppError::NotFound(_)) => {
                return Err(AppError::Validation(FieldError {
                    field: rule.name.clone(),
                    code: rule.invalid_code.clone(),
                    message: format!("{} {} does not exist", parent.label, parent_id),
                }))
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_positive_integers_only() {
        assert_eq!(parse_id(Some("42")).unwrap(), 42);
        for bad in ["", "0", "-1", "+1", "1.5", "abc", " 7", "99999999999999999999"] {
            assert!(matches!(parse_id(Some(bad)), Err(AppError::InvalidId(_))), "{bad}");
        }
        assert!(matches!(parse_id(None), Err(AppError::InvalidId(_))));
    }
}
