//! Route tables and the assembled application router.

pub mod common;
pub mod docs;
pub mod user;

pub use common::common_routes;
pub use docs::{docs_routes, ApiDoc, OPENAPI_PATH};
pub use user::user_routes;

use crate::config::AppConfig;
use crate::state::AppState;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Common, user and documentation routes with request tracing and a body size limit.
pub fn app_router(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(user_routes(state))
        .merge(docs_routes(&config.openapi))
        .layer(RequestBodyLimitLayer::new(config.body_limit))
        .layer(TraceLayer::new_for_http())
}
