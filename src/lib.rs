//! User Admin: REST management of users, roles and privileges over PostgreSQL.

pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
pub mod repo;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

pub use config::{AppConfig, OpenApiServers, StorageKind};
pub use error::{AppError, ConfigError};
pub use model::{Id, Privilege, Role, User};
pub use repo::{MemoryStore, PgStore, Repository};
pub use response::{success_many, success_one, success_one_ok};
pub use routes::{app_router, common_routes, docs_routes, user_routes, ApiDoc};
pub use service::{Argon2Encoder, PasswordEncoder, UserService};
pub use state::AppState;
pub use store::{ensure_database_exists, ensure_tables};
