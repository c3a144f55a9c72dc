//! Load config from environment variables (a `.env` file is read first when present).

use crate::config::{validate, AppConfig, OpenApiServers, StorageKind};
use crate::error::ConfigError;
use std::str::FromStr;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/user_admin";
pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;
pub const DEFAULT_OPENAPI_DEV_URL: &str = "http://localhost:3000";

impl FromStr for StorageKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageKind::Postgres),
            "memory" => Ok(StorageKind::Memory),
            other => Err(ConfigError::UnknownStorage(other.to_string())),
        }
    }
}

impl AppConfig {
    /// Read `.env` (if any) then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset or blank keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let storage = match get("USER_ADMIN_STORAGE") {
            Some(s) => s.parse::<StorageKind>()?,
            None => StorageKind::Postgres,
        };
        let config = AppConfig {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            schema: get("USER_ADMIN_SCHEMA").unwrap_or_else(|| DEFAULT_SCHEMA.into()),
            storage,
            bind_addr: get("USER_ADMIN_BIND").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            max_connections: parse_or("USER_ADMIN_MAX_CONNECTIONS", get("USER_ADMIN_MAX_CONNECTIONS"), DEFAULT_MAX_CONNECTIONS)?,
            body_limit: parse_or("USER_ADMIN_BODY_LIMIT", get("USER_ADMIN_BODY_LIMIT"), DEFAULT_BODY_LIMIT)?,
            openapi: OpenApiServers {
                dev_url: Some(get("USER_ADMIN_OPENAPI_DEV_URL").unwrap_or_else(|| DEFAULT_OPENAPI_DEV_URL.into())),
                prod_url: get("USER_ADMIN_OPENAPI_PROD_URL"),
            },
        };
        validate(&config)?;
        Ok(config)
    }
}

fn parse_or<T>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
