//! Load resource definitions from the built-in catalog or a JSON file, and resolve them.

use crate::case::{to_code_segment, to_label, to_snake_case};
use crate::config::resolved::{ChildSpec, FieldKind, FieldRule, ResolvedModel, ResolvedResource};
use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use crate::service::RequestValidator;
use std::collections::HashMap;
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../../resources/agency.json");

/// The agency site's resource catalog compiled into the binary.
pub fn builtin_config() -> Result<FullConfig, ConfigError> {
    serde_json::from_str(BUILTIN_CATALOG).map_err(|e| ConfigError::Load(format!("built-in catalog: {}", e)))
}

/// Read a definitions document (`{ "resources": [...] }`) from disk.
pub async fn load_from_path(path: &Path) -> Result<FullConfig, ConfigError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))
}

/// Build resolved model from definitions (validates first).
pub fn resolve(config: &FullConfig) -> Result<ResolvedModel, ConfigError> {
    validate(config)?;

    let mut resources = Vec::with_capacity(config.resources.len());
    let mut by_name = HashMap::new();
    for r in &config.resources {
        let fields = r
            .fields
            .iter()
            .map(|f| resolve_field(r, f))
            .collect::<Result<Vec<_>, _>>()?;
        let children = r
            .children
            .iter()
            .map(|c| ChildSpec {
                resource: c.resource.clone(),
                foreign_key: c.foreign_key.clone(),
            })
            .collect();
        by_name.insert(r.name.clone(), resources.len());
        resources.push(ResolvedResource {
            name: r.name.clone(),
            table: r.table.clone(),
            label: r.label.clone(),
            fields,
            unique_key: r.unique_key.clone(),
            search: r.search.clone(),
            filters: r.filters.clone(),
            display_order: r.display_order.clone(),
            children,
        });
    }

    Ok(ResolvedModel { resources, by_name })
}

fn resolve_field(resource: &ResourceConfig, f: &FieldConfig) -> Result<FieldRule, ConfigError> {
    let kind = match f.kind {
        FieldKindConfig::String => FieldKind::Text,
        FieldKindConfig::NonEmptyString => FieldKind::NonEmptyText,
        FieldKindConfig::Email => FieldKind::Email,
        FieldKindConfig::Integer => FieldKind::Integer,
        FieldKindConfig::PositiveInteger => FieldKind::PositiveInteger,
        FieldKindConfig::Boolean => FieldKind::Boolean,
        FieldKindConfig::Enum => FieldKind::Enum(f.values.clone()),
    };
    let segment = to_code_segment(&f.name);
    let mut rule = FieldRule {
        name: f.name.clone(),
        column: f.column.clone().unwrap_or_else(|| to_snake_case(&f.name)),
        label: to_label(&f.name),
        kind,
        required: f.required,
        default: None,
        max_length: f.max_length.map(|n| n as usize),
        references: f.references.clone(),
        missing_code: f.missing_code.clone().unwrap_or_else(|| format!("MISSING_{}", segment)),
        invalid_code: f.invalid_code.clone().unwrap_or_else(|| format!("INVALID_{}", segment)),
        duplicate_code: f.duplicate_code.clone().unwrap_or_else(|| format!("DUPLICATE_{}", segment)),
    };
    if let Some(default) = &f.default {
        let normalized = RequestValidator::check_value(&rule, default).map_err(|e| ConfigError::InvalidField {
            resource: resource.name.clone(),
            field: f.name.clone(),
            reason: format!("default value rejected: {}", e.message),
        })?;
        rule.default = Some(normalized);
    }
    Ok(rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnType;

    #[test]
    fn builtin_catalog_resolves() {
        let model = resolve(&builtin_config().unwrap()).unwrap();
        assert_eq!(model.resources.len(), 9);
        let posts = model.resource("blog-posts").unwrap();
        assert_eq!(posts.unique_key.as_deref(), Some("slug"));
        let author = posts.field("authorId").unwrap();
        assert_eq!(author.column, "author_id");
        assert_eq!(author.missing_code, "MISSING_AUTHOR_ID");
        assert_eq!(posts.column("createdAt"), Some(("created_at", ColumnType::Timestamptz)));
        let services = model.resource("services").unwrap();
        assert_eq!(services.children[0].resource, "service-items");
        assert_eq!(services.display_order.as_deref(), Some("displayOrder"));
    }

    #[test]
    fn invalid_default_is_rejected() {
        let config: FullConfig = serde_json::from_value(serde_json::json!({
            "resources": [{
                "name": "a", "table": "a", "label": "A",
                "fields": [{ "name": "status", "kind": "enum", "values": ["new"], "default": "old" }]
            }]
        }))
        .unwrap();
        assert!(matches!(resolve(&config), Err(ConfigError::InvalidField { .. })));
    }
}
