//! Persistence adapters. The controller only talks to [`Store`]; PostgreSQL and in-memory
//! implementations live in the submodules.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, PgStore};

use crate::config::ResolvedResource;
use crate::error::AppError;
use crate::filter::{OrderBy, Page, Predicate};
use async_trait::async_trait;

/// A flat record keyed by API field name (`id`, declared fields, `createdAt`, `updatedAt`).
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Four primitives over one resource's table.
///
/// Implementations enforce the resource's uniqueness key themselves and report a violation as
/// [`AppError::DuplicateKey`]; the controller's own check is only a fast path.
#[async_trait]
pub trait Store: Send + Sync {
    /// Records matching `predicate`, sorted by `order`, optionally paged.
    async fn select_where(
        &self,
        resource: &ResolvedResource,
        predicate: &Predicate,
        order: &[OrderBy],
        page: Option<Page>,
    ) -> Result<Vec<Record>, AppError>;

    /// Insert a record without `id`; returns it with the assigned id.
    async fn insert(&self, resource: &ResolvedResource, record: Record) -> Result<Record, AppError>;

    /// Apply `patch` to every matching record; returns the updated records.
    async fn update_where(
        &self,
        resource: &ResolvedResource,
        predicate: &Predicate,
        patch: Record,
    ) -> Result<Vec<Record>, AppError>;

    /// Delete every matching record; returns their prior state.
    async fn delete_where(
        &self,
        resource: &ResolvedResource,
        predicate: &Predicate,
    ) -> Result<Vec<Record>, AppError>;

    /// Readiness probe.
    async fn ping(&self) -> Result<(), AppError>;
}
