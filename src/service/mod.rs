//! CrudService: generic validated CRUD over the store adapters.

mod crud;
mod guard;
pub(crate) mod validation;
pub use crud::{parse_payload, CrudService};
pub use guard::{duplicate_key, ensure_exists, ensure_references, ensure_unique, parse_id};
pub use validation::RequestValidator;
