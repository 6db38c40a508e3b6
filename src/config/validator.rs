//! Definition validation: referential integrity and rule consistency.

use crate::config::{EnumValue, FieldConfig, FieldKindConfig, FullConfig, ResourceConfig, SYSTEM_FIELDS};
use crate::error::ConfigError;
use std::collections::HashSet;

fn invalid(resource: &ResourceConfig, field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidField {
        resource: resource.name.clone(),
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn is_text_kind(f: &FieldConfig) -> bool {
    match f.kind {
        FieldKindConfig::String | FieldKindConfig::NonEmptyString | FieldKindConfig::Email => true,
        FieldKindConfig::Enum => f.values.iter().all(|v| matches!(v, EnumValue::Text(_))),
        _ => false,
    }
}

fn is_integer_kind(f: &FieldConfig) -> bool {
    match f.kind {
        FieldKindConfig::Integer | FieldKindConfig::PositiveInteger => true,
        FieldKindConfig::Enum => f.values.iter().all(|v| matches!(v, EnumValue::Int(_))),
        _ => false,
    }
}

pub fn validate(config: &FullConfig) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    let mut tables = HashSet::new();
    for r in &config.resources {
        if !names.insert(r.name.as_str()) {
            return Err(ConfigError::Duplicate {
                kind: "resource",
                name: r.name.clone(),
            });
        }
        if !tables.insert(r.table.as_str()) {
            return Err(ConfigError::Duplicate {
                kind: "table",
                name: r.table.clone(),
            });
        }
    }

    for r in &config.resources {
        validate_resource(config, r, &names)?;
    }
    Ok(())
}

fn validate_resource(
    config: &FullConfig,
    r: &ResourceConfig,
    resource_names: &HashSet<&str>,
) -> Result<(), ConfigError> {
    let mut field_names = HashSet::new();
    for f in &r.fields {
        if SYSTEM_FIELDS.contains(&f.name.as_str()) {
            return Err(invalid(r, &f.name, "reserved field name"));
        }
        if !field_names.insert(f.name.as_str()) {
            return Err(ConfigError::Duplicate {
                kind: "field",
                name: format!("{}.{}", r.name, f.name),
            });
        }
        if f.kind == FieldKindConfig::Enum {
            if f.values.is_empty() {
                return Err(invalid(r, &f.name, "enum field without values"));
            }
            if !is_text_kind(f) && !is_integer_kind(f) {
                return Err(invalid(r, &f.name, "enum values must all be text or all be integers"));
            }
        } else if !f.values.is_empty() {
            return Err(invalid(r, &f.name, "values are only allowed on enum fields"));
        }
        if let Some(parent) = &f.references {
            if !resource_names.contains(parent.as_str()) {
                return Err(ConfigError::MissingReference {
                    kind: "resource",
                    id: parent.clone(),
                });
            }
            if !is_integer_kind(f) {
                return Err(invalid(r, &f.name, "reference fields must be integers"));
            }
        }
    }

    let field = |name: &str| r.fields.iter().find(|f| f.name == name);

    if let Some(key) = &r.unique_key {
        if field(key).is_none() {
            return Err(ConfigError::MissingReference {
                kind: "unique key field",
                id: format!("{}.{}", r.name, key),
            });
        }
    }
    for s in &r.search {
        let f = field(s).ok_or_else(|| ConfigError::MissingReference {
            kind: "search field",
            id: format!("{}.{}", r.name, s),
        })?;
        if !is_text_kind(f) {
            return Err(invalid(r, s, "search fields must be text"));
        }
    }
    for name in &r.filters {
        if field(name).is_none() {
            return Err(ConfigError::MissingReference {
                kind: "filter field",
                id: format!("{}.{}", r.name, name),
            });
        }
    }
    if let Some(order) = &r.display_order {
        let f = field(order).ok_or_else(|| ConfigError::MissingReference {
            kind: "display order field",
            id: format!("{}.{}", r.name, order),
        })?;
        if !is_integer_kind(f) {
            return Err(invalid(r, order, "display order field must be an integer"));
        }
    }
    for child in &r.children {
        let child_def = config
            .resources
            .iter()
            .find(|c| c.name == child.resource)
            .ok_or_else(|| ConfigError::MissingReference {
                kind: "child resource",
                id: child.resource.clone(),
            })?;
        if !child_def.fields.iter().any(|f| f.name == child.foreign_key) {
            return Err(ConfigError::MissingReference {
                kind: "child foreign key",
                id: format!("{}.{}", child.resource, child.foreign_key),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(resources: serde_json::Value) -> FullConfig {
        serde_json::from_value(json!({ "resources": resources })).unwrap()
    }

    #[test]
    fn accepts_consistent_definitions() {
        let c = config(json!([{
            "name": "services", "table": "services", "label": "Service",
            "fields": [
                { "name": "title", "kind": "nonEmptyString", "required": true },
                { "name": "displayOrder", "kind": "integer", "default": 0 }
            ],
            "search": ["title"],
            "displayOrder": "displayOrder"
        }]));
        assert!(validate(&c).is_ok());
    }

    #[test]
    fn rejects_reserved_field_names() {
        let c = config(json!([{
            "name": "a", "table": "a", "label": "A",
            "fields": [{ "name": "createdAt", "kind": "string" }]
        }]));
        assert!(matches!(validate(&c), Err(ConfigError::InvalidField { .. })));
    }

    #[test]
    fn rejects_unknown_unique_key() {
        let c = config(json!([{
            "name": "a", "table": "a", "label": "A",
            "fields": [{ "name": "title", "kind": "string" }],
            "uniqueKey": "slug"
        }]));
        assert!(matches!(validate(&c), Err(ConfigError::MissingReference { .. })));
    }

    #[test]
    fn rejects_non_text_search_field() {
        let c = config(json!([{
            "name": "a", "table": "a", "label": "A",
            "fields": [{ "name": "count", "kind": "integer" }],
            "search": ["count"]
        }]));
        assert!(matches!(validate(&c), Err(ConfigError::InvalidField { .. })));
    }

    #[test]
    fn rejects_mixed_enum_values() {
        let c = config(json!([{
            "name": "a", "table": "a", "label": "A",
            "fields": [{ "name": "rating", "kind": "enum", "values": [1, "two"] }]
        }]));
        assert!(validate(&c).is_err());
    }

    #[test]
    fn rejects_child_with_unknown_foreign_key() {
        let c = config(json!([
            {
                "name": "services", "table": "services", "label": "Service",
                "fields": [{ "name": "title", "kind": "string" }],
                "children": [{ "resource": "service-items", "foreignKey": "parentId" }]
            },
            {
                "name": "service-items", "table": "service_items", "label": "Service item",
                "fields": [{ "name": "serviceId", "kind": "positiveInteger" }]
            }
        ]));
        assert!(matches!(validate(&c), Err(ConfigError::MissingReference { .. })));
    }

    #[test]
    fn rejects_duplicate_resource_names() {
        let c = config(json!([
            { "name": "a", "table": "a", "label": "A", "fields": [] },
            { "name": "a", "table": "b", "label": "B", "fields": [] }
        ]));
        assert!(matches!(validate(&c), Err(ConfigError::Duplicate { .. })));
    }
}
