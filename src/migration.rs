//! Apply resource definitions to the database: one table per resource, then indexes and foreign keys.

use crate::config::{FieldKind, FieldRule, ResolvedModel, ResolvedResource};
use crate::error::{AppError, ConfigError};
use crate::sql::quoted;
use sqlx::PgPool;

fn literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn column_def(field: &FieldRule) -> String {
    let mut def = format!(
        "{} {}",
        quoted(&field.column),
        field.kind.column_type().sql_name().to_uppercase()
    );
    if field.required {
        def.push_str(" NOT NULL");
    }
    if let FieldKind::Enum(values) = &field.kind {
        let values: Vec<String> = values
            .iter()
            .map(|v| match v {
                crate::config::EnumValue::Int(n) => n.to_string(),
                crate::config::EnumValue::Text(s) => literal(s),
            })
            .collect();
        def.push_str(&format!(" CHECK ({} IN ({}))", quoted(&field.column), values.join(", ")));
    }
    def
}

/// CREATE TABLE statement for one resource.
pub fn create_table_sql(resource: &ResolvedResource) -> String {
    let mut col_defs = vec![format!("{} BIGSERIAL PRIMARY KEY", quoted("id"))];
    col_defs.extend(resource.fields.iter().map(column_def));
    col_defs.push(format!("{} TIMESTAMPTZ NOT NULL DEFAULT NOW()", quoted("created_at")));
    col_defs.push(format!("{} TIMESTAMPTZ NOT NULL DEFAULT NOW()", quoted("updated_at")));
    if let Some(rule) = resource.unique_field() {
        col_defs.push(format!(
            "CONSTRAINT {} UNIQUE ({})",
            quoted(&format!("{}_{}_key", resource.table, rule.column)),
            quoted(&rule.column)
        ));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        quoted(&resource.table),
        col_defs.join(",\n  ")
    )
}

/// Foreign key for a `references` field. Children go with their parent, so a child inserted
/// while the parent is being deleted cannot block the delete.
pub fn foreign_key_sql(resource: &ResolvedResource, rule: &FieldRule, parent: &ResolvedResource) -> String {
    format!(
        "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE CASCADE",
        quoted(&resource.table),
        quoted(&format!("{}_{}_fkey", resource.table, rule.column)),
        quoted(&rule.column),
        quoted(&parent.table),
        quoted("id")
    )
}

/// Create tables, filter/order indexes and reference constraints. Idempotent: tables and
/// indexes use IF NOT EXISTS; an already-present foreign key is skipped.
pub async fn apply_migrations(pool: &PgPool, model: &ResolvedModel) -> Result<(), AppError> {
    for r in &model.resources {
        let sql = create_table_sql(r);
        tracing::debug!(sql = %sql, "migration");
        sqlx::query(&sql).execute(pool).await?;
    }

    for r in &model.resources {
        let indexed = r.filters.iter().chain(r.display_order.iter());
        for field in indexed {
            let Some(rule) = r.field(field) else { continue };
            let sql = format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                quoted(&format!("{}_{}_idx", r.table, rule.column)),
                quoted(&r.table),
                quoted(&rule.column)
            );
            tracing::debug!(sql = %sql, "migration");
            sqlx::query(&sql).execute(pool).await?;
        }
    }

    for r in &model.resources {
        for rule in &r.fields {
            let Some(parent_name) = &rule.references else { continue };
            let parent = model.resource(parent_name).ok_or_else(|| {
                AppError::Config(ConfigError::MissingReference {
                    kind: "resource",
                    id: parent_name.clone(),
                })
            })?;
            let sql = foreign_key_sql(r, rule, parent);
            if let Err(e) = sqlx::query(&sql).execute(pool).await {
                tracing::debug!(error = %e, table = %r.table, "foreign key not added (likely present)");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{builtin_config, resolve};

    #[test]
    fn table_ddl_carries_constraints() {
        let model = resolve(&builtin_config().unwrap()).unwrap();
        let sql = create_table_sql(model.resource("testimonials").unwrap());
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"testimonials\""));
        assert!(sql.contains("\"client_name\" TEXT NOT NULL"));
        assert!(sql.contains("\"rating\" BIGINT NOT NULL CHECK (\"rating\" IN (1, 2, 3, 4, 5))"));
        assert!(sql.contains("\"avatar_url\" TEXT,"));

        let sql = create_table_sql(model.resource("blog-posts").unwrap());
        assert!(sql.contains("CONSTRAINT \"blog_posts_slug_key\" UNIQUE (\"slug\")"));
    }

    #[test]
    fn references_cascade_on_parent_delete() {
        let model = resolve(&builtin_config().unwrap()).unwrap();
        let items = model.resource("service-items").unwrap();
        let rule = items.field("serviceId").unwrap();
        let sql = foreign_key_sql(items, rule, model.resource("services").unwrap());
        assert_eq!(
            sql,
            "ALTER TABLE \"service_items\" ADD CONSTRAINT \"service_items_service_id_fkey\" \
             FOREIGN KEY (\"service_id\") REFERENCES \"services\" (\"id\") ON DELETE CASCADE"
        );
    }
}
