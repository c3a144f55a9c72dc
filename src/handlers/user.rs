//! Handlers for users, roles and privileges under `/api/user`.

use crate::error::AppError;
use crate::model::{Id, Privilege, Role, User};
use crate::response::{success_many, success_one, success_one_ok, SuccessMany, SuccessOne};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

/// Body of a successful delete, sent whether or not the user existed.
pub const DELETED_MESSAGE: &str = "User successfully deleted!";

/// Retrieve all users
///
/// Every user with its roles. Passwords are returned hashed.
#[utoipa::path(
    get,
    path = "/api/user",
    tag = "App User",
    responses(
        (status = 200, description = "All users", body = SuccessMany<User>),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users = state.service.get_all_users().await?;
    Ok(success_many(users))
}

/// Retrieve all roles
#[utoipa::path(
    get,
    path = "/api/user/role",
    tag = "App User",
    responses(
        (status = 200, description = "All roles with their privileges", body = SuccessMany<Role>),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn list_roles(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let roles = state.service.get_roles().await?;
    Ok(success_many(roles))
}

/// Retrieve all privileges
#[utoipa::path(
    get,
    path = "/api/user/privilege",
    tag = "App User",
    responses(
        (status = 200, description = "All privileges", body = SuccessMany<Privilege>),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn list_privileges(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let privileges = state.service.get_privileges().await?;
    Ok(success_many(privileges))
}

/// Create a user
///
/// The password is hashed and the creation date set by the server. Roles are referenced by id.
#[utoipa::path(
    post,
    path = "/api/user",
    tag = "App User",
    request_body = User,
    responses(
        (status = 201, description = "User created", body = SuccessOne<User>,
            headers(("Location" = String, description = "URL of the new user"))),
        (status = 400, description = "Missing password or unsaved role reference"),
        (status = 409, description = "User name taken or role does not exist")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(user): Json<User>,
) -> Result<impl IntoResponse, AppError> {
    let created = state.service.add_user(user).await?;
    let location = format!("/api/user/{}", created.id.unwrap_or_default());
    let (status, body) = success_one(created);
    Ok((status, [(header::LOCATION, location)], body))
}

/// Create a role
///
/// Privileges are referenced by id.
#[utoipa::path(
    post,
    path = "/api/user/role",
    tag = "App User",
    request_body = Role,
    responses(
        (status = 201, description = "Role created", body = SuccessOne<Role>,
            headers(("Location" = String, description = "Role collection URL"))),
        (status = 400, description = "Unsaved privilege reference"),
        (status = 409, description = "Role name taken or privilege does not exist")
    )
)]
pub async fn create_role(
    State(state): State<AppState>,
    Json(role): Json<Role>,
) -> Result<impl IntoResponse, AppError> {
    let created = state.service.save_role(role).await?;
    let (status, body) = success_one(created);
    Ok((status, [(header::LOCATION, "/api/user/role")], body))
}

/// Create a privilege
#[utoipa::path(
    post,
    path = "/api/user/privilege",
    tag = "App User",
    request_body = Privilege,
    responses(
        (status = 201, description = "Privilege created", body = SuccessOne<Privilege>,
            headers(("Location" = String, description = "Privilege collection URL"))),
        (status = 409, description = "Privilege type taken")
    )
)]
pub async fn create_privilege(
    State(state): State<AppState>,
    Json(privilege): Json<Privilege>,
) -> Result<impl IntoResponse, AppError> {
    let created = state.service.save_privilege(privilege).await?;
    let (status, body) = success_one(created);
    Ok((status, [(header::LOCATION, "/api/user/privilege")], body))
}

/// Retrieve one user
#[utoipa::path(
    get,
    path = "/api/user/{id}",
    tag = "App User",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "The user", body = SuccessOne<User>),
        (status = 404, description = "No such user")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.service.get_user_by_id(id).await?;
    Ok(success_one_ok(user))
}

/// Update a user
///
/// Only first name, last name and email are taken from the body; the path id wins over any body id.
#[utoipa::path(
    put,
    path = "/api/user/{id}",
    tag = "App User",
    params(("id" = i64, Path, description = "User id")),
    request_body = User,
    responses(
        (status = 200, description = "The updated user", body = SuccessOne<User>),
        (status = 404, description = "No such user")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Json(mut user): Json<User>,
) -> Result<impl IntoResponse, AppError> {
    user.id = Some(id);
    let updated = state.service.update_user(user).await?;
    Ok(success_one_ok(updated))
}

/// Delete a user
///
/// Succeeds whether or not the user existed.
#[utoipa::path(
    delete,
    path = "/api/user/{id}",
    tag = "App User",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "Confirmation message", body = String, content_type = "text/plain")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, AppError> {
    state.service.delete_user(id).await?;
    Ok((StatusCode::OK, DELETED_MESSAGE))
}
