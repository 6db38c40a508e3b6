//! PostgreSQL adapter over a sqlx pool, plus database bootstrap.

use super::{Record, Store};
use crate::config::{ColumnType, ResolvedResource};
use crate::error::AppError;
use crate::filter::{OrderBy, Page, Predicate};
use crate::service::duplicate_key;
use crate::sql::{self, PgBindValue, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{ConnectOptions, PgPool, Row};
use std::str::FromStr;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_all(&self, resource: &ResolvedResource, q: &QueryBuf) -> Result<Vec<Record>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error(resource, e))?;
        rows.iter().map(|r| row_to_record(resource, r)).collect()
    }
}

/// A unique violation on a resource table can only come from its uniqueness key.
fn map_db_error(resource: &ResolvedResource, e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            if let Some(rule) = resource.unique_field() {
                return duplicate_key(resource, rule);
            }
        }
    }
    AppError::Db(e)
}

fn row_to_record(resource: &ResolvedResource, row: &PgRow) -> Result<Record, AppError> {
    let mut record = Record::new();
    for field in resource.stored_fields() {
        let Some((col, ty)) = resource.column(field) else { continue };
        let value = match ty {
            ColumnType::Text => row.try_get::<Option<String>, _>(col)?.map(Value::String),
            ColumnType::BigInt => row
                .try_get::<Option<i64>, _>(col)?
                .map(|n| Value::Number(n.into())),
            ColumnType::Boolean => row.try_get::<Option<bool>, _>(col)?.map(Value::Bool),
            ColumnType::Timestamptz => row
                .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(col)?
                .map(|d| Value::String(crate::timestamp::format(d))),
        };
        record.insert(field.to_string(), value.unwrap_or(Value::Null));
    }
    Ok(record)
}

#[async_trait]
impl Store for PgStore {
    async fn select_where(
        &self,
        resource: &ResolvedResource,
        predicate: &Predicate,
        order: &[OrderBy],
        page: Option<Page>,
    ) -> Result<Vec<Record>, AppError> {
        let q = sql::select_where(resource, predicate, order, page);
        self.fetch_all(resource, &q).await
    }

    async fn insert(&self, resource: &ResolvedResource, record: Record) -> Result<Record, AppError> {
        let q = sql::insert(resource, &record);
        self.fetch_all(resource, &q)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal(format!("insert into {} returned no row", resource.table)))
    }

    async fn update_where(
        &self,
        resource: &ResolvedResource,
        predicate: &Predicate,
        patch: Record,
    ) -> Result<Vec<Record>, AppError> {
        let q = sql::update_where(resource, predicate, &patch);
        self.fetch_all(resource, &q).await
    }

    async fn delete_where(
        &self,
        resource: &ResolvedResource,
        predicate: &Predicate,
    ) -> Result<Vec<Record>, AppError> {
        let q = sql::delete_where(resource, predicate);
        self.fetch_all(resource, &q).await
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::Internal(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", sql::quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| AppError::Internal("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    let admin_url = format!("{}postgres", base);
    Ok((admin_url, db_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_url_swaps_database_name() {
        let (admin, db) = parse_db_name_from_url("postgres://u:p@localhost:5432/agency?sslmode=disable").unwrap();
        assert_eq!(admin, "postgres://u:p@localhost:5432/postgres");
        assert_eq!(db, "agency");
    }
}
