//! Config validation: identifiers, limits and URLs.

use crate::config::AppConfig;
use crate::error::ConfigError;
use regex::Regex;

/// Unquoted PostgreSQL identifier, at most 63 bytes.
const SCHEMA_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]{0,62}$";

pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    let schema_re = Regex::new(SCHEMA_PATTERN).map_err(|e| ConfigError::InvalidValue {
        key: "USER_ADMIN_SCHEMA",
        reason: e.to_string(),
    })?;
    if !schema_re.is_match(&config.schema) {
        return Err(ConfigError::InvalidSchema(config.schema.clone()));
    }
    if config.max_connections == 0 {
        return Err(ConfigError::InvalidValue {
            key: "USER_ADMIN_MAX_CONNECTIONS",
            reason: "must be greater than zero".into(),
        });
    }
    if config.body_limit == 0 {
        return Err(ConfigError::InvalidValue {
            key: "USER_ADMIN_BODY_LIMIT",
            reason: "must be greater than zero".into(),
        });
    }
    for (key, url) in [
        ("USER_ADMIN_OPENAPI_DEV_URL", &config.openapi.dev_url),
        ("USER_ADMIN_OPENAPI_PROD_URL", &config.openapi.prod_url),
    ] {
        if let Some(url) = url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue {
                    key,
                    reason: format!("'{}' is not an http(s) URL", url),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OpenApiServers, StorageKind};

    fn config() -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/user_admin".into(),
            schema: "public".into(),
            storage: StorageKind::Postgres,
            bind_addr: "127.0.0.1:0".into(),
            max_connections: 5,
            body_limit: 1024,
            openapi: OpenApiServers::default(),
        }
    }

    #[test]
    fn accepts_plain_identifiers() {
        for schema in ["public", "user_admin", "_private", "Admin2"] {
            let c = AppConfig {
                schema: schema.into(),
                ..config()
            };
            assert!(validate(&c).is_ok(), "{}", schema);
        }
    }

    #[test]
    fn rejects_schema_that_needs_quoting() {
        for schema in ["2fast", "user-admin", "a;drop", ""] {
            let c = AppConfig {
                schema: schema.into(),
                ..config()
            };
            assert!(matches!(validate(&c), Err(ConfigError::InvalidSchema(_))), "{}", schema);
        }
    }

    #[test]
    fn rejects_zero_pool_size() {
        let c = AppConfig {
            max_connections: 0,
            ..config()
        };
        assert!(matches!(validate(&c), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn rejects_non_http_server_url() {
        let c = AppConfig {
            openapi: OpenApiServers {
                dev_url: Some("localhost:3000".into()),
                prod_url: None,
            },
            ..config()
        };
        assert!(matches!(
            validate(&c),
            Err(ConfigError::InvalidValue {
                key: "USER_ADMIN_OPENAPI_DEV_URL",
                ..
            })
        ));
    }
}
