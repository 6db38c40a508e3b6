//! Generic CRUD orchestration over an injected [`Store`].
//!
//! Every operation is a short pipeline that exits on the first failure. Validation, reference
//! and uniqueness checks all happen before the store is written, so a rejected request leaves
//! the store untouched.

use crate::config::{ResolvedModel, ResolvedResource, CREATED_AT_FIELD, UPDATED_AT_FIELD};
use crate::error::AppError;
use crate::filter::{build_list_plan, Predicate};
use crate::service::guard::{ensure_exists, ensure_references, ensure_unique, parse_id};
use crate::service::RequestValidator;
use crate::store::{Record, Store};
use crate::timestamp;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct CrudService {
    store: Arc<dyn Store>,
    model: Arc<ResolvedModel>,
}

/// Request body as a JSON object.
pub fn parse_payload(body: &[u8]) -> Result<Record, AppError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(m)) => Ok(m),
        Ok(_) => Err(AppError::InvalidBody("Request body must be a JSON object".into())),
        Err(e) => Err(AppError::InvalidBody(format!("Invalid JSON body: {}", e))),
    }
}

impl CrudService {
    pub fn new(store: Arc<dyn Store>, model: Arc<ResolvedModel>) -> Self {
        CrudService { store, model }
    }

    pub fn model(&self) -> &ResolvedModel {
        &self.model
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn resource(&self, name: &str) -> Result<&ResolvedResource, AppError> {
        self.model
            .resource(name)
            .ok_or_else(|| AppError::UnknownResource(name.to_string()))
    }

    /// Page of records matching search and filters.
    pub async fn list(
        &self,
        resource: &ResolvedResource,
        params: &HashMap<String, String>,
    ) -> Result<Vec<Record>, AppError> {
        let plan = build_list_plan(resource, params);
        self.store
            .select_where(resource, &plan.predicate, &plan.order, Some(plan.page))
            .await
    }

    pub async fn read(&self, resource: &ResolvedResource, raw_id: Option<&str>) -> Result<Record, AppError> {
        let id = parse_id(raw_id)?;
        ensure_exists(self.store(), resource, id).await
    }

    /// Validate the full payload, check references and the uniqueness key, then insert with
    /// `createdAt == updatedAt`.
    pub async fn create(&self, resource: &ResolvedResource, body: &[u8]) -> Result<Record, AppError> {
        let payload = parse_payload(body)?;
        let mut values = RequestValidator::validate_create(resource, &payload)?;
        ensure_references(self.store(), &self.model, resource, &values).await?;
        if let Some(rule) = resource.unique_field() {
            if let Some(v) = values.get(&rule.name) {
                ensure_unique(self.store(), resource, v, None).await?;
            }
        }
        let now = Value::String(timestamp::format(timestamp::now()));
        values.insert(CREATED_AT_FIELD.into(), now.clone());
        values.insert(UPDATED_AT_FIELD.into(), now);

        let record = self.store.insert(resource, values).await?;
        tracing::info!(resource = %resource.name, id = ?record.get("id"), "created");
        Ok(record)
    }

    /// Partial update: existence is confirmed before the body is looked at; only supplied
    /// fields change and `updatedAt` always moves forward.
    pub async fn update(
        &self,
        resource: &ResolvedResource,
        raw_id: Option<&str>,
        body: &[u8],
    ) -> Result<Record, AppError> {
        let id = parse_id(raw_id)?;
        let existing = ensure_exists(self.store(), resource, id).await?;

        let payload = parse_payload(body)?;
        let mut patch = RequestValidator::validate_update(resource, &payload)?;
        ensure_references(self.store(), &self.model, resource, &patch).await?;
        if let Some(rule) = resource.unique_field() {
            if let Some(v) = patch.get(&rule.name) {
                if existing.get(&rule.name) != Some(v) {
                    ensure_unique(self.store(), resource, v, Some(id)).await?;
                }
            }
        }
        let updated_at = timestamp::after(existing.get(UPDATED_AT_FIELD));
        patch.insert(UPDATED_AT_FIELD.into(), Value::String(timestamp::format(updated_at)));

        let record = self
            .store
            .update_where(resource, &Predicate::id(id), patch)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("{} not found", resource.label)))?;
        tracing::info!(resource = %resource.name, id, "updated");
        Ok(record)
    }

    /// Delete dependents first, then the record; returns the record's prior state. Postgres
    /// foreign keys also cascade, covering a dependent inserted between the two deletes.
    pub async fn delete(&self, resource: &ResolvedResource, raw_id: Option<&str>) -> Result<Record, AppError> {
        let id = parse_id(raw_id)?;
        ensure_exists(self.store(), resource, id).await?;

        for child in &resource.children {
            let child_resource = self.resource(&child.resource)?;
            let removed = self
                .store
                .delete_where(
                    child_resource,
                    &Predicate::eq(child.foreign_key.clone(), Value::Number(id.into())),
                )
                .await?;
            tracing::info!(
                resource = %child_resource.name,
                parent = %resource.name,
                parent_id = id,
                count = removed.len(),
                "deleted dependents"
            );
        }

        let record = self
            .store
            .delete_where(resource, &Predicate::id(id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("{} not found", resource.label)))?;
        tracing::info!(resource = %resource.name, id, "deleted");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_must_be_an_object() {
        assert!(parse_payload(br#"{"a":1}"#).is_ok());
        assert!(matches!(parse_payload(b"[1,2]"), Err(AppError::InvalidBody(_))));
        assert!(matches!(parse_payload(b""), Err(AppError::InvalidBody(_))));
        assert!(matches!(parse_payload(b"{oops"), Err(AppError::InvalidBody(_))));
    }
}
