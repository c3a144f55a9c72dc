//! User management: creation with password hashing, listing, partial update, deletion.

use crate::error::AppError;
use crate::model::{Id, Privilege, Role, User};
use crate::repo::Repository;
use crate::service::PasswordEncoder;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

pub struct UserService {
    users: Arc<dyn Repository<User>>,
    roles: Arc<dyn Repository<Role>>,
    privileges: Arc<dyn Repository<Privilege>>,
    encoder: Arc<dyn PasswordEncoder>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn Repository<User>>,
        roles: Arc<dyn Repository<Role>>,
        privileges: Arc<dyn Repository<Privilege>>,
        encoder: Arc<dyn PasswordEncoder>,
    ) -> Self {
        UserService {
            users,
            roles,
            privileges,
            encoder,
        }
    }

    /// Build a service whose three gateways are the same store.
    pub fn with_store<S>(store: Arc<S>, encoder: Arc<dyn PasswordEncoder>) -> Self
    where
        S: Repository<User> + Repository<Role> + Repository<Privilege> + 'static,
    {
        UserService::new(store.clone(), store.clone(), store, encoder)
    }

    /// Hash the password, stamp the creation time and insert. Any caller-supplied id or
    /// creation date is ignored.
    pub async fn add_user(&self, mut user: User) -> Result<User, AppError> {
        info!(user_name = ?user.user_name, "saving new user");
        let raw = user
            .password
            .take()
            .ok_or_else(|| AppError::BadRequest("password is required".into()))?;
        user.password = Some(self.encoder.encode(&raw)?);
        user.created_date = Some(Utc::now());
        user.id = None;
        self.users.save(user).await
    }

    pub async fn save_role(&self, role: Role) -> Result<Role, AppError> {
        info!(role_name = ?role.role_name, "saving new role");
        self.roles.save(role).await
    }

    pub async fn save_privilege(&self, privilege: Privilege) -> Result<Privilege, AppError> {
        info!(privilege_type = ?privilege.privilege_type, "saving new privilege");
        self.privileges.save(privilege).await
    }

    pub async fn get_user_by_id(&self, id: Id) -> Result<User, AppError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))
    }

    pub async fn get_all_users(&self) -> Result<Vec<User>, AppError> {
        info!("listing users");
        self.users.find_all().await
    }

    pub async fn get_roles(&self) -> Result<Vec<Role>, AppError> {
        info!("listing roles");
        self.roles.find_all().await
    }

    pub async fn get_privileges(&self) -> Result<Vec<Privilege>, AppError> {
        info!("listing privileges");
        self.privileges.find_all().await
    }

    /// Merge `first_name`, `last_name` and `email` from `patch` into the stored user, reading
    /// and writing in one storage operation. User name, password, roles and creation date
    /// cannot change through this path.
    pub async fn update_user(&self, patch: User) -> Result<User, AppError> {
        let id = patch
            .id
            .ok_or_else(|| AppError::BadRequest("user id is required".into()))?;
        info!(id, "updating user");
        let User {
            first_name,
            last_name,
            email,
            ..
        } = patch;
        self.users
            .update_with(
                id,
                Box::new(move |existing: &mut User| {
                    existing.first_name = first_name;
                    existing.last_name = last_name;
                    existing.email = email;
                }),
            )
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))
    }

    pub async fn delete_user(&self, id: Id) -> Result<(), AppError> {
        info!(id, "deleting user");
        self.users.delete_by_id(id).await
    }
}
