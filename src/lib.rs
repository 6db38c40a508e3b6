//! Agency resources: definition-driven validated CRUD over a pluggable store.

pub mod case;
pub mod config;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod migration;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod timestamp;

pub use config::{builtin_config, load_from_path, resolve, FullConfig, ResolvedModel, ResolvedResource};
pub use error::{AppError, ConfigError, FieldError};
pub use migration::apply_migrations;
pub use routes::{app, probe_routes, resource_routes};
pub use service::CrudService;
pub use settings::{Settings, StoreBackend};
pub use state::AppState;
pub use store::{ensure_database_exists, MemoryStore, PgStore, Record, Store};
