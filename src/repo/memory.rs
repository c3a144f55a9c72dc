//! In-process store with the same constraint semantics as the PostgreSQL tables:
//! per-table id sequences, unique names, reference checks on join rows and
//! cascading removal of join rows on delete.

use super::{Change, Repository};
use crate::error::AppError;
use crate::model::{Id, Privilege, Role, User};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<Id, UserRow>,
    roles: BTreeMap<Id, RoleRow>,
    privileges: BTreeMap<Id, Privilege>,
    user_seq: Id,
    role_seq: Id,
    privilege_seq: Id,
}

/// User columns plus its `user_roles` join rows.
struct UserRow {
    user: User,
    role_ids: Vec<Id>,
}

/// Role columns plus its `roles_privileges` join rows.
struct RoleRow {
    role_name: Option<String>,
    privilege_ids: Vec<Id>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn next(seq: &mut Id) -> Id {
    *seq += 1;
    *seq
}

/// Resolve the row id for a save: existing rows must be present, new rows draw from the sequence.
fn claim_id<V>(rows: &BTreeMap<Id, V>, seq: &mut Id, id: Option<Id>, kind: &str) -> Result<Id, AppError> {
    match id {
        Some(id) if rows.contains_key(&id) => Ok(id),
        Some(id) => Err(AppError::NotFound(format!("{} {}", kind, id))),
        None => Ok(next(seq)),
    }
}

impl Tables {
    fn resolve_role(&self, id: Id, row: &RoleRow) -> Role {
        Role {
            id: Some(id),
            role_name: row.role_name.clone(),
            privileges: row
                .privilege_ids
                .iter()
                .filter_map(|pid| self.privileges.get(pid).cloned())
                .collect(),
        }
    }

    fn resolve_user(&self, row: &UserRow) -> User {
        let mut user = row.user.clone();
        user.roles = row
            .role_ids
            .iter()
            .filter_map(|rid| self.roles.get(rid).map(|r| self.resolve_role(*rid, r)))
            .collect();
        user
    }
}

impl Tables {
    /// Insert or update a user row and its `user_roles` rows.
    fn save_user(&mut self, mut user: User) -> Result<User, AppError> {
        let role_ids = user.role_ids()?;
        if let Some(missing) = role_ids.iter().find(|rid| !self.roles.contains_key(*rid)) {
            return Err(AppError::Conflict(format!("role {} does not exist", missing)));
        }
        if let Some(name) = user.user_name.as_deref() {
            let taken = self
                .users
                .iter()
                .any(|(id, row)| Some(*id) != user.id && row.user.user_name.as_deref() == Some(name));
            if taken {
                return Err(AppError::Conflict(format!("user name '{}' already exists", name)));
            }
        }
        let id = claim_id(&self.users, &mut self.user_seq, user.id, "user")?;
        user.id = Some(id);
        user.roles.clear();
        self.users.insert(id, UserRow { user, role_ids });
        Ok(self.resolve_user(&self.users[&id]))
    }
}

#[async_trait]
impl Repository<User> for MemoryStore {
    async fn save(&self, user: User) -> Result<User, AppError> {
        self.write().save_user(user)
    }

    async fn update_with(&self, id: Id, change: Change<User>) -> Result<Option<User>, AppError> {
        let mut t = self.write();
        let Some(row) = t.users.get(&id) else {
            return Ok(None);
        };
        let mut user = t.resolve_user(row);
        change(&mut user);
        user.id = Some(id);
        t.save_user(user).map(Some)
    }

    async fn find_all(&self) -> Result<Vec<User>, AppError> {
        let t = self.read();
        Ok(t.users.values().map(|row| t.resolve_user(row)).collect())
    }

    async fn find_by_id(&self, id: Id) -> Result<Option<User>, AppError> {
        let t = self.read();
        Ok(t.users.get(&id).map(|row| t.resolve_user(row)))
    }

    async fn delete_by_id(&self, id: Id) -> Result<(), AppError> {
        self.write().users.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl Repository<Role> for MemoryStore {
    async fn save(&self, role: Role) -> Result<Role, AppError> {
        let privilege_ids = role.privilege_ids()?;
        let mut t = self.write();
        if let Some(missing) = privilege_ids.iter().find(|pid| !t.privileges.contains_key(*pid)) {
            return Err(AppError::Conflict(format!("privilege {} does not exist", missing)));
        }
        if let Some(name) = role.role_name.as_deref() {
            let taken = t
                .roles
                .iter()
                .any(|(id, row)| Some(*id) != role.id && row.role_name.as_deref() == Some(name));
            if taken {
                return Err(AppError::Conflict(format!("role name '{}' already exists", name)));
            }
        }
        let tables = &mut *t;
        let id = claim_id(&tables.roles, &mut tables.role_seq, role.id, "role")?;
        t.roles.insert(
            id,
            RoleRow {
                role_name: role.role_name,
                privilege_ids,
            },
        );
        Ok(t.resolve_role(id, &t.roles[&id]))
    }

    async fn find_all(&self) -> Result<Vec<Role>, AppError> {
        let t = self.read();
        Ok(t.roles.iter().map(|(id, row)| t.resolve_role(*id, row)).collect())
    }

    async fn find_by_id(&self, id: Id) -> Result<Option<Role>, AppError> {
        let t = self.read();
        Ok(t.roles.get(&id).map(|row| t.resolve_role(id, row)))
    }

    async fn delete_by_id(&self, id: Id) -> Result<(), AppError> {
        let mut t = self.write();
        if t.roles.remove(&id).is_some() {
            for row in t.users.values_mut() {
                row.role_ids.retain(|rid| *rid != id);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Repository<Privilege> for MemoryStore {
    async fn save(&self, mut privilege: Privilege) -> Result<Privilege, AppError> {
        let mut t = self.write();
        if let Some(kind) = privilege.privilege_type.as_deref() {
            let taken = t
                .privileges
                .iter()
                .any(|(id, p)| Some(*id) != privilege.id && p.privilege_type.as_deref() == Some(kind));
            if taken {
                return Err(AppError::Conflict(format!("privilege type '{}' already exists", kind)));
            }
        }
        let tables = &mut *t;
        let id = claim_id(&tables.privileges, &mut tables.privilege_seq, privilege.id, "privilege")?;
        privilege.id = Some(id);
        t.privileges.insert(id, privilege.clone());
        Ok(privilege)
    }

    async fn find_all(&self) -> Result<Vec<Privilege>, AppError> {
        Ok(self.read().privileges.values().cloned().collect())
    }

    async fn find_by_id(&self, id: Id) -> Result<Option<Privilege>, AppError> {
        Ok(self.read().privileges.get(&id).cloned())
    }

    async fn delete_by_id(&self, id: Id) -> Result<(), AppError> {
        let mut t = self.write();
        if t.privileges.remove(&id).is_some() {
            for row in t.roles.values_mut() {
                row.privilege_ids.retain(|pid| *pid != id);
            }
        }
        Ok(())
    }
}
