//! Shared application state for all routes.

use crate::config::{AppConfig, StorageKind};
use crate::error::AppError;
use crate::repo::{MemoryStore, PgStore};
use crate::service::{Argon2Encoder, UserService};
use crate::store::{ensure_database_exists, ensure_tables};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<UserService>,
    /// Present when backed by PostgreSQL; used by the readiness probe.
    pub pool: Option<PgPool>,
}

impl AppState {
    /// State over an in-process store.
    pub fn in_memory() -> Self {
        AppState {
            service: Arc::new(UserService::with_store(
                Arc::new(MemoryStore::new()),
                Arc::new(Argon2Encoder::new()),
            )),
            pool: None,
        }
    }

    /// State over PostgreSQL. Tables are created if missing.
    pub async fn postgres(pool: PgPool, schema: &str) -> Result<Self, AppError> {
        ensure_tables(&pool, schema).await?;
        let store = Arc::new(PgStore::new(pool.clone(), schema));
        Ok(AppState {
            service: Arc::new(UserService::with_store(store, Arc::new(Argon2Encoder::new()))),
            pool: Some(pool),
        })
    }

    /// Build the configured backend, creating the database first when needed.
    pub async fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        match config.storage {
            StorageKind::Memory => {
                tracing::warn!("using in-memory storage; data is lost on restart");
                Ok(Self::in_memory())
            }
            StorageKind::Postgres => {
                ensure_database_exists(&config.database_url).await?;
                let pool = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .connect(&config.database_url)
                    .await?;
                Self::postgres(pool, &config.schema).await
            }
        }
    }
}
