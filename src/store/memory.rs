//! In-process store with the same semantics as the PostgreSQL adapter: ids are never reused,
//! the uniqueness key is enforced, ordering puts nulls last on ascending sorts.

use super::{Record, Store};
use crate::config::{ResolvedResource, ID_FIELD};
use crate::error::AppError;
use crate::filter::{Direction, OrderBy, Page, Predicate};
use crate::service::duplicate_key;
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Table {
    last_id: i64,
    rows: Vec<Record>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Table>>, AppError> {
        self.tables
            .lock()
            .map_err(|_| AppError::Internal("memory store lock poisoned".into()))
    }
}

fn record_id(r: &Record) -> Option<i64> {
    r.get(ID_FIELD).and_then(Value::as_i64)
}

/// Reject `candidate` when another row (by id) already holds its unique key value.
fn check_unique(
    resource: &ResolvedResource,
    rows: &[Record],
    candidate: &Record,
    self_id: Option<i64>,
) -> Result<(), AppError> {
    let Some(rule) = resource.unique_field() else {
        return Ok(());
    };
    let value = match candidate.get(&rule.name) {
        None | Some(Value::Null) => return Ok(()),
        Some(v) => v,
    };
    let taken = rows
        .iter()
        .filter(|r| self_id.is_none() || record_id(r) != self_id)
        .any(|r| r.get(&rule.name).map_or(false, |v| value_eq(v, value)));
    if taken {
        return Err(duplicate_key(resource, rule));
    }
    Ok(())
}

#[async_trait]
impl Store for MemoryStore {
    async fn select_where(
        &self,
        resource: &ResolvedResource,
        predicate: &Predicate,
        order: &[OrderBy],
        page: Option<Page>,
    ) -> Result<Vec<Record>, AppError> {
        let tables = self.lock()?;
        let mut rows: Vec<Record> = tables
            .get(&resource.table)
            .map(|t| t.rows.iter().filter(|r| matches(predicate, r)).cloned().collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| compare_records(a, b, order));
        Ok(match page {
            Some(p) => rows
                .into_iter()
                .skip(p.offset as usize)
                .take(p.limit as usize)
                .collect(),
            None => rows,
        })
    }

    async fn insert(&self, resource: &ResolvedResource, mut record: Record) -> Result<Record, AppError> {
        let mut tables = self.lock()?;
        let table = tables.entry(resource.table.clone()).or_default();
        check_unique(resource, &table.rows, &record, None)?;
        table.last_id += 1;
        record.insert(ID_FIELD.into(), Value::Number(table.last_id.into()));
        table.rows.push(record.clone());
        Ok(record)
    }

    async fn update_where(
        &self,
        resource: &ResolvedResource,
        predicate: &Predicate,
        patch: Record,
    ) -> Result<Vec<Record>, AppError> {
        let mut tables = self.lock()?;
        let Some(table) = tables.get_mut(&resource.table) else {
            return Ok(Vec::new());
        };
        let mut staged = Vec::new();
        for (i, row) in table.rows.iter().enumerate() {
            if !matches(predicate, row) {
                continue;
            }
            let mut next = row.clone();
            for (k, v) in &patch {
                if k != ID_FIELD {
                    next.insert(k.clone(), v.clone());
                }
            }
            check_unique(resource, &table.rows, &next, record_id(row))?;
            staged.push((i, next));
        }
        let mut updated = Vec::with_capacity(staged.len());
        for (i, next) in staged {
            table.rows[i] = next.clone();
            updated.push(next);
        }
        Ok(updated)
    }

    async fn delete_where(
        &self,
        resource: &ResolvedResource,
        predicate: &Predicate,
    ) -> Result<Vec<Record>, AppError> {
        let mut tables = self.lock()?;
        let Some(table) = tables.get_mut(&resource.table) else {
            return Ok(Vec::new());
        };
        let (deleted, kept): (Vec<Record>, Vec<Record>) =
            std::mem::take(&mut table.rows).into_iter().partition(|r| matches(predicate, r));
        table.rows = kept;
        Ok(deleted)
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.lock().map(|_| ())
    }
}

fn matches(predicate: &Predicate, record: &Record) -> bool {
    match predicate {
        Predicate::All => true,
        Predicate::Nothing => false,
        Predicate::Eq { field, value } => value_eq(record.get(field).unwrap_or(&Value::Null), value),
        Predicate::Contains { field, needle } => record
            .get(field)
            .and_then(Value::as_str)
            .map_or(false, |s| s.to_lowercase().contains(&needle.to_lowercase())),
        Predicate::And(parts) => parts.iter().all(|p| matches(p, record)),
        Predicate::Or(parts) => parts.iter().any(|p| matches(p, record)),
    }
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

fn compare_records(a: &Record, b: &Record, order: &[OrderBy]) -> Ordering {
    for o in order {
        let ord = compare_values(
            a.get(&o.field).unwrap_or(&Value::Null),
            b.get(&o.field).unwrap_or(&Value::Null),
        );
        let ord = match o.direction {
            Direction::Asc => ord,
            Direction::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Null sorts after every value, as in PostgreSQL.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(n), Value::Number(m)) => n
            .as_f64()
            .partial_cmp(&m.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(s), Value::String(t)) => s.cmp(t),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}
