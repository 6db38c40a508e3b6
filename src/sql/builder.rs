//! Builds parameterized SELECT, INSERT, UPDATE, DELETE from a resolved resource and a predicate.
//! Identifiers come from resource definitions only; values are always bound parameters with an
//! explicit cast to the column type.

use crate::config::{ColumnType, ResolvedResource, ID_FIELD};
use crate::filter::{Direction, OrderBy, Page, Predicate};
use crate::store::Record;
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: only from definitions).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }

    fn placeholder(&mut self, v: Value, ty: ColumnType) -> String {
        let n = self.push_param(v);
        format!("${}::{}", n, ty.sql_name())
    }
}

/// Column list in `stored_fields` order; row decoding relies on the same order.
fn select_column_list(resource: &ResolvedResource) -> String {
    resource
        .stored_fields()
        .into_iter()
        .filter_map(|f| resource.column(f))
        .map(|(col, _)| quoted(col))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Escape LIKE wildcards so the needle matches literally.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Render a predicate as a WHERE expression, pushing its values onto `q`.
/// Fields unknown to the resource render as FALSE.
fn render_predicate(resource: &ResolvedResource, predicate: &Predicate, q: &mut QueryBuf) -> String {
    match predicate {
        Predicate::All => "TRUE".into(),
        Predicate::Nothing => "FALSE".into(),
        Predicate::Eq { field, value } => match resource.column(field) {
            Some((col, _)) if value.is_null() => format!("{} IS NULL", quoted(col)),
            Some((col, ty)) => format!("{} = {}", quoted(col), q.placeholder(value.clone(), ty)),
            None => "FALSE".into(),
        },
        Predicate::Contains { field, needle } => match resource.column(field) {
            Some((col, _)) => {
                let n = q.push_param(Value::String(like_pattern(needle)));
                format!("{} ILIKE ${}::text ESCAPE '\\'", quoted(col), n)
            }
            None => "FALSE".into(),
        },
        Predicate::And(parts) if parts.is_empty() => "TRUE".into(),
        Predicate::Or(parts) if parts.is_empty() => "FALSE".into(),
        Predicate::And(parts) => format!(
            "({})",
            parts
                .iter()
                .map(|p| render_predicate(resource, p, q))
                .collect::<Vec<_>>()
                .join(" AND ")
        ),
        Predicate::Or(parts) => format!(
            "({})",
            parts
                .iter()
                .map(|p| render_predicate(resource, p, q))
                .collect::<Vec<_>>()
                .join(" OR ")
        ),
    }
}

fn order_clause(resource: &ResolvedResource, order: &[OrderBy]) -> String {
    let parts: Vec<String> = order
        .iter()
        .filter_map(|o| {
            resource.column(&o.field).map(|(col, _)| {
                let dir = match o.direction {
                    Direction::Asc => "ASC",
                    Direction::Desc => "DESC",
                };
                format!("{} {}", quoted(col), dir)
            })
        })
        .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ORDER BY {}", parts.join(", "))
    }
}

/// SELECT matching rows with ordering and optional LIMIT/OFFSET.
pub fn select_where(
    resource: &ResolvedResource,
    predicate: &Predicate,
    order: &[OrderBy],
    page: Option<Page>,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = render_predicate(resource, predicate, &mut q);
    let page_clause = page
        .map(|p| format!(" LIMIT {} OFFSET {}", p.limit, p.offset))
        .unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {} WHERE {}{}{}",
        select_column_list(resource),
        quoted(&resource.table),
        where_clause,
        order_clause(resource, order),
        page_clause
    );
    q
}

/// INSERT one record; the id is assigned by the database.
pub fn insert(resource: &ResolvedResource, record: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for field in resource.stored_fields() {
        if field == ID_FIELD {
            continue;
        }
        let Some((col, ty)) = resource.column(field) else { continue };
        let value = record.get(field).cloned().unwrap_or(Value::Null);
        cols.push(quoted(col));
        placeholders.push(q.placeholder(value, ty));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quoted(&resource.table),
        cols.join(", "),
        placeholders.join(", "),
        select_column_list(resource)
    );
    q
}

/// UPDATE matching rows: SET only fields present in the patch (never the id).
pub fn update_where(resource: &ResolvedResource, predicate: &Predicate, patch: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for field in resource.stored_fields() {
        if field == ID_FIELD {
            continue;
        }
        let (Some(value), Some((col, ty))) = (patch.get(field), resource.column(field)) else {
            continue;
        };
        sets.push(format!("{} = {}", quoted(col), q.placeholder(value.clone(), ty)));
    }
    if sets.is_empty() {
        return select_where(resource, predicate, &[], None);
    }
    let where_clause = render_predicate(resource, predicate, &mut q);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} RETURNING {}",
        quoted(&resource.table),
        sets.join(", "),
        where_clause,
        select_column_list(resource)
    );
    q
}

/// DELETE matching rows, returning their prior state.
pub fn delete_where(resource: &ResolvedResource, predicate: &Predicate) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = render_predicate(resource, predicate, &mut q);
    q.sql = format!(
        "DELETE FROM {} WHERE {} RETURNING {}",
        quoted(&resource.table),
        where_clause,
        select_column_list(resource)
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{builtin_config, resolve, ResolvedModel};
    use crate::filter::default_order;
    use serde_json::json;

    fn model() -> ResolvedModel {
        resolve(&builtin_config().unwrap()).unwrap()
    }

    #[test]
    fn select_renders_search_and_filters() {
        let m = model();
        let r = m.resource("testimonials").unwrap();
        let predicate = Predicate::And(vec![
            Predicate::Or(vec![
                Predicate::Contains {
                    field: "clientName".into(),
                    needle: "50%_off".into(),
                },
                Predicate::Contains {
                    field: "quote".into(),
                    needle: "x".into(),
                },
            ]),
            Predicate::eq("rating", json!(5)),
        ]);
        let q = select_where(r, &predicate, &default_order(r), Some(Page { limit: 5, offset: 10 }));
        assert_eq!(
            q.sql,
            "SELECT \"id\", \"client_name\", \"company_name\", \"quote\", \"rating\", \"avatar_url\", \"featured\", \"created_at\", \"updated_at\" \
             FROM \"testimonials\" \
             WHERE ((\"client_name\" ILIKE $1::text ESCAPE '\\' OR \"quote\" ILIKE $2::text ESCAPE '\\') AND \"rating\" = $3::bigint) \
             ORDER BY \"created_at\" DESC, \"id\" DESC LIMIT 5 OFFSET 10"
        );
        assert_eq!(q.params, vec![json!("%50\\%\\_off%"), json!("%x%"), json!(5)]);
    }

    #[test]
    fn insert_skips_id_and_casts_every_column() {
        let m = model();
        let r = m.resource("service-items").unwrap();
        let record: Record = serde_json::from_value(json!({
            "id": 99, "serviceId": 1, "title": "Audit", "description": null, "displayOrder": 0,
            "createdAt": "2024-01-01T00:00:00.000000Z", "updatedAt": "2024-01-01T00:00:00.000000Z"
        }))
        .unwrap();
        let q = insert(r, &record);
        assert!(q.sql.starts_with(
            "INSERT INTO \"service_items\" (\"service_id\", \"title\", \"description\", \"display_order\", \"created_at\", \"updated_at\") \
             VALUES ($1::bigint, $2::text, $3::text, $4::bigint, $5::timestamptz, $6::timestamptz) RETURNING "
        ));
        assert_eq!(q.params.len(), 6);
        assert_eq!(q.params[0], json!(1));
    }

    #[test]
    fn update_sets_only_patched_fields() {
        let m = model();
        let r = m.resource("blog-posts").unwrap();
        let patch: Record = serde_json::from_value(json!({
            "title": "New", "updatedAt": "2024-01-01T00:00:00.000000Z"
        }))
        .unwrap();
        let q = update_where(r, &Predicate::id(3), &patch);
        assert!(q.sql.starts_with(
            "UPDATE \"blog_posts\" SET \"title\" = $1::text, \"updated_at\" = $2::timestamptz WHERE \"id\" = $3::bigint RETURNING "
        ));
        assert_eq!(q.params[2], json!(3));
    }

    #[test]
    fn delete_and_null_equality() {
        let m = model();
        let r = m.resource("service-items").unwrap();
        let q = delete_where(r, &Predicate::eq("description", Value::Null));
        assert!(q.sql.starts_with("DELETE FROM \"service_items\" WHERE \"description\" IS NULL RETURNING "));
        assert!(q.params.is_empty());
    }

    #[test]
    fn unknown_fields_render_false() {
        let m = model();
        let r = m.resource("blog-posts").unwrap();
        let q = select_where(r, &Predicate::eq("password", json!("x")), &[], None);
        assert!(q.sql.ends_with("WHERE FALSE"));
    }
}
