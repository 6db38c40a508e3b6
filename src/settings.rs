//! Process settings from the environment. `.env` is loaded first when present.

use crate::error::ConfigError;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(ConfigError::Settings(format!(
                "STORE_BACKEND must be postgres or memory, got {}",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: String,
    pub store_backend: StoreBackend,
    pub resources_path: Option<PathBuf>,
    pub max_body_bytes: usize,
    pub db_max_connections: u32,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_backend = match lookup("STORE_BACKEND") {
            Some(v) => v.parse()?,
            None => StoreBackend::Postgres,
        };
        Ok(Settings {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "postgres://localhost/agency".into()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into()),
            store_backend,
            resources_path: lookup("RESOURCES_PATH").filter(|p| !p.trim().is_empty()).map(PathBuf::from),
            max_body_bytes: parse_number(&lookup, "MAX_BODY_BYTES", 1024 * 1024)?,
            db_max_connections: parse_number(&lookup, "DB_MAX_CONNECTIONS", 5)?,
        })
    }
}

fn parse_number<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Settings(format!("{} must be a number, got {}", key, v))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.database_url, "postgres://localhost/agency");
        assert_eq!(s.bind_addr, "0.0.0.0:3000");
        assert_eq!(s.store_backend, StoreBackend::Postgres);
        assert_eq!(s.max_body_bytes, 1024 * 1024);
        assert_eq!(s.db_max_connections, 5);
        assert!(s.resources_path.is_none());
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(matches!(settings(&[("STORE_BACKEND", "sqlite")]), Err(ConfigError::Settings(_))));
        assert!(matches!(settings(&[("MAX_BODY_BYTES", "lots")]), Err(ConfigError::Settings(_))));
        let s = settings(&[("STORE_BACKEND", "Memory"), ("DB_MAX_CONNECTIONS", "12")]).unwrap();
        assert_eq!(s.store_backend, StoreBackend::Memory);
        assert_eq!(s.db_max_connections, 12);
    }
}
