//! Runtime configuration: storage, listener and API documentation settings.

pub mod loader;
pub mod validator;

pub use loader::*;
pub use validator::*;

/// Which gateway backs the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    /// In-process tables; contents are lost on restart.
    Memory,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    /// PostgreSQL schema holding the tables.
    pub schema: String,
    pub storage: StorageKind,
    pub bind_addr: String,
    pub max_connections: u32,
    /// Maximum accepted request body, in bytes.
    pub body_limit: usize,
    pub openapi: OpenApiServers,
}

/// Server URLs advertised in the OpenAPI document.
#[derive(Clone, Debug, Default)]
pub struct OpenApiServers {
    pub dev_url: Option<String>,
    pub prod_url: Option<String>,
}
