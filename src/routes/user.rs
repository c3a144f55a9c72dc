//! User, role and privilege routes under `/api/user`.
//! Static segments (`role`, `privilege`) take precedence over `:id`.

use crate::handlers::user::{
    create_privilege, create_role, create_user, delete_user, get_user, list_privileges, list_roles,
    list_users, update_user,
};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn user_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/user", get(list_users).post(create_user))
        .route("/api/user/role", get(list_roles).post(create_role))
        .route("/api/user/privilege", get(list_privileges).post(create_privilege))
        .route(
            "/api/user/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .with_state(state)
}
