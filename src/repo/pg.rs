//! PostgreSQL gateway. Table names are schema-qualified from config; values are always bound parameters.
//! Each save writes the row and its join rows in one transaction.

use super::{Change, Repository};
use crate::error::AppError;
use crate::model::{Id, Privilege, Role, User};
use crate::store::qualified_table;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;

const USER_COLUMNS: &str = "id, user_name, first_name, last_name, email, password, created_date";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    schema: String,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    user_name: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    created_date: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow)]
struct RoleRow {
    id: i64,
    role_name: Option<String>,
}

#[derive(sqlx::FromRow)]
struct PrivilegeRow {
    id: i64,
    privilege_type: Option<String>,
}

/// A role reached through `user_roles`, keyed by the owning user.
#[derive(sqlx::FromRow)]
struct UserRoleRow {
    owner_id: i64,
    id: i64,
    role_name: Option<String>,
}

/// A privilege reached through `roles_privileges`, keyed by the owning role.
#[derive(sqlx::FromRow)]
struct RolePrivilegeRow {
    owner_id: i64,
    id: i64,
    privilege_type: Option<String>,
}

impl From<PrivilegeRow> for Privilege {
    fn from(r: PrivilegeRow) -> Self {
        Privilege {
            id: Some(r.id),
            privilege_type: r.privilege_type,
        }
    }
}

impl UserRow {
    fn into_user(self, roles: Vec<Role>) -> User {
        User {
            id: Some(self.id),
            user_name: self.user_name,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password: self.password,
            created_date: self.created_date,
            roles,
        }
    }
}

impl PgStore {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgStore {
            pool,
            schema: schema.into(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn table(&self, name: &str) -> String {
        qualified_table(&self.schema, name)
    }

    /// Privileges granted by each of `role_ids`, grouped by role.
    async fn privileges_of(
        &self,
        conn: &mut PgConnection,
        role_ids: &[Id],
    ) -> Result<HashMap<Id, Vec<Privilege>>, AppError> {
        if role_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let sql = format!(
            "SELECT rp.role_id AS owner_id, p.id, p.privilege_type FROM {} rp JOIN {} p ON p.id = rp.privilege_id \
             WHERE rp.role_id = ANY($1) ORDER BY p.id",
            self.table("roles_privileges"),
            self.table("privilege")
        );
        tracing::debug!(sql = %sql, "query");
        let rows: Vec<RolePrivilegeRow> = sqlx::query_as(&sql)
            .bind(role_ids)
            .fetch_all(&mut *conn)
            .await?;
        let mut out: HashMap<Id, Vec<Privilege>> = HashMap::new();
        for r in rows {
            out.entry(r.owner_id).or_default().push(Privilege {
                id: Some(r.id),
                privilege_type: r.privilege_type,
            });
        }
        Ok(out)
    }

    /// Attach privileges to role rows.
    async fn load_roles(&self, conn: &mut PgConnection, rows: Vec<RoleRow>) -> Result<Vec<Role>, AppError> {
        let ids: Vec<Id> = rows.iter().map(|r| r.id).collect();
        let mut privileges = self.privileges_of(conn, &ids).await?;
        Ok(rows
            .into_iter()
            .map(|r| Role {
                id: Some(r.id),
                role_name: r.role_name,
                privileges: privileges.remove(&r.id).unwrap_or_default(),
            })
            .collect())
    }

    /// Attach roles (with their privileges) to user rows.
    async fn load_users(&self, conn: &mut PgConnection, rows: Vec<UserRow>) -> Result<Vec<User>, AppError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let user_ids: Vec<Id> = rows.iter().map(|r| r.id).collect();
        let sql = format!(
            "SELECT ur.user_id AS owner_id, r.id, r.role_name FROM {} ur JOIN {} r ON r.id = ur.role_id \
             WHERE ur.user_id = ANY($1) ORDER BY r.id",
            self.table("user_roles"),
            self.table("role")
        );
        tracing::debug!(sql = %sql, "query");
        let links: Vec<UserRoleRow> = sqlx::query_as(&sql)
            .bind(&user_ids)
            .fetch_all(&mut *conn)
            .await?;
        let mut role_ids: Vec<Id> = links.iter().map(|l| l.id).collect();
        role_ids.sort_unstable();
        role_ids.dedup();
        let privileges = self.privileges_of(conn, &role_ids).await?;

        let mut roles_by_user: HashMap<Id, Vec<Role>> = HashMap::new();
        for l in links {
            roles_by_user.entry(l.owner_id).or_default().push(Role {
                id: Some(l.id),
                role_name: l.role_name,
                privileges: privileges.get(&l.id).cloned().unwrap_or_default(),
            });
        }
        Ok(rows
            .into_iter()
            .map(|r| {
                let roles = roles_by_user.remove(&r.id).unwrap_or_default();
                r.into_user(roles)
            })
            .collect())
    }

    /// Insert or update a user row and rewrite its `user_roles` rows on `conn`.
    async fn save_user(&self, conn: &mut PgConnection, user: User) -> Result<User, AppError> {
        let role_ids = user.role_ids()?;
        let table = self.table("app_user");
        let sql = match user.id {
            None => format!(
                "INSERT INTO {} (user_name, first_name, last_name, email, password, created_date) \
                 VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
                table, USER_COLUMNS
            ),
            Some(_) => format!(
                "UPDATE {} SET user_name = $1, first_name = $2, last_name = $3, email = $4, password = $5, \
                 created_date = $6 WHERE id = $7 RETURNING {}",
                table, USER_COLUMNS
            ),
        };
        tracing::debug!(sql = %sql, "query (tx)");
        let mut query = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.user_name)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(&user.password)
            .bind(user.created_date);
        if let Some(id) = user.id {
            query = query.bind(id);
        }
        let row = query
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", user.id.unwrap_or_default())))?;
        let id = row.id;
        self.replace_links(conn, "user_roles", "user_id", "role_id", id, &role_ids)
            .await?;
        self.load_users(conn, vec![row])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))
    }

    /// Replace the join rows of `owner` in `join_table` with `targets`.
    async fn replace_links(
        &self,
        conn: &mut PgConnection,
        join_table: &str,
        owner_column: &str,
        target_column: &str,
        owner: Id,
        targets: &[Id],
    ) -> Result<(), AppError> {
        let table = self.table(join_table);
        sqlx::query(&format!("DELETE FROM {} WHERE {} = $1", table, owner_column))
            .bind(owner)
            .execute(&mut *conn)
            .await?;
        if targets.is_empty() {
            return Ok(());
        }
        let sql = format!(
            "INSERT INTO {} ({}, {}) SELECT $1, UNNEST($2::bigint[])",
            table, owner_column, target_column
        );
        tracing::debug!(sql = %sql, owner, targets = ?targets, "query (tx)");
        sqlx::query(&sql)
            .bind(owner)
            .bind(targets)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Repository<User> for PgStore {
    async fn save(&self, user: User) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;
        let saved = self.save_user(&mut tx, user).await?;
        tx.commit().await?;
        Ok(saved)
    }

    async fn update_with(&self, id: Id, change: Change<User>) -> Result<Option<User>, AppError> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1 FOR UPDATE",
            USER_COLUMNS,
            self.table("app_user")
        );
        tracing::debug!(sql = %sql, id, "query (tx)");
        let row: Option<UserRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&mut *tx).await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let Some(mut user) = self.load_users(&mut tx, vec![row]).await?.into_iter().next() else {
            return Ok(None);
        };
        change(&mut user);
        user.id = Some(id);
        let saved = self.save_user(&mut tx, user).await?;
        tx.commit().await?;
        Ok(Some(saved))
    }

    async fn find_all(&self) -> Result<Vec<User>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let sql = format!("SELECT {} FROM {} ORDER BY id", USER_COLUMNS, self.table("app_user"));
        tracing::debug!(sql = %sql, "query");
        let rows: Vec<UserRow> = sqlx::query_as(&sql).fetch_all(&mut *conn).await?;
        self.load_users(&mut conn, rows).await
    }

    async fn find_by_id(&self, id: Id) -> Result<Option<User>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let sql = format!("SELECT {} FROM {} WHERE id = $1", USER_COLUMNS, self.table("app_user"));
        tracing::debug!(sql = %sql, id, "query");
        let row: Option<UserRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&mut *conn).await?;
        match row {
            Some(row) => Ok(self.load_users(&mut conn, vec![row]).await?.into_iter().next()),
            None => Ok(None),
        }
    }

    async fn delete_by_id(&self, id: Id) -> Result<(), AppError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table("app_user"));
        tracing::debug!(sql = %sql, id, "query");
        sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Repository<Role> for PgStore {
    async fn save(&self, role: Role) -> Result<Role, AppError> {
        let privilege_ids = role.privilege_ids()?;
        let table = self.table("role");
        let mut tx = self.pool.begin().await?;
        let row: Option<RoleRow> = match role.id {
            None => {
                sqlx::query_as(&format!(
                    "INSERT INTO {} (role_name) VALUES ($1) RETURNING id, role_name",
                    table
                ))
                .bind(&role.role_name)
                .fetch_optional(&mut *tx)
                .await?
            }
            Some(id) => {
                sqlx::query_as(&format!(
                    "UPDATE {} SET role_name = $1 WHERE id = $2 RETURNING id, role_name",
                    table
                ))
                .bind(&role.role_name)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
            }
        };
        let row = row.ok_or_else(|| AppError::NotFound(format!("role {}", role.id.unwrap_or_default())))?;
        let id = row.id;
        self.replace_links(&mut tx, "roles_privileges", "role_id", "privilege_id", id, &privilege_ids)
            .await?;
        let saved = self.load_roles(&mut tx, vec![row]).await?;
        tx.commit().await?;
        saved
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("role {}", id)))
    }

    async fn find_all(&self) -> Result<Vec<Role>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let sql = format!("SELECT id, role_name FROM {} ORDER BY id", self.table("role"));
        tracing::debug!(sql = %sql, "query");
        let rows: Vec<RoleRow> = sqlx::query_as(&sql).fetch_all(&mut *conn).await?;
        self.load_roles(&mut conn, rows).await
    }

    async fn find_by_id(&self, id: Id) -> Result<Option<Role>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let sql = format!("SELECT id, role_name FROM {} WHERE id = $1", self.table("role"));
        tracing::debug!(sql = %sql, id, "query");
        let row: Option<RoleRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&mut *conn).await?;
        match row {
            Some(row) => Ok(self.load_roles(&mut conn, vec![row]).await?.into_iter().next()),
            None => Ok(None),
        }
    }

    async fn delete_by_id(&self, id: Id) -> Result<(), AppError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table("role"));
        tracing::debug!(sql = %sql, id, "query");
        sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Repository<Privilege> for PgStore {
    async fn save(&self, privilege: Privilege) -> Result<Privilege, AppError> {
        let table = self.table("privilege");
        let row: Option<PrivilegeRow> = match privilege.id {
            None => {
                sqlx::query_as(&format!(
                    "INSERT INTO {} (privilege_type) VALUES ($1) RETURNING id, privilege_type",
                    table
                ))
                .bind(&privilege.privilege_type)
                .fetch_optional(&self.pool)
                .await?
            }
            Some(id) => {
                sqlx::query_as(&format!(
                    "UPDATE {} SET privilege_type = $1 WHERE id = $2 RETURNING id, privilege_type",
                    table
                ))
                .bind(&privilege.privilege_type)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
            }
        };
        row.map(Privilege::from)
            .ok_or_else(|| AppError::NotFound(format!("privilege {}", privilege.id.unwrap_or_default())))
    }

    async fn find_all(&self) -> Result<Vec<Privilege>, AppError> {
        let sql = format!("SELECT id, privilege_type FROM {} ORDER BY id", self.table("privilege"));
        tracing::debug!(sql = %sql, "query");
        let rows: Vec<PrivilegeRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Privilege::from).collect())
    }

    async fn find_by_id(&self, id: Id) -> Result<Option<Privilege>, AppError> {
        let sql = format!("SELECT id, privilege_type FROM {} WHERE id = $1", self.table("privilege"));
        tracing::debug!(sql = %sql, id, "query");
        let row: Option<PrivilegeRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(Privilege::from))
    }

    async fn delete_by_id(&self, id: Id) -> Result<(), AppError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table("privilege"));
        tracing::debug!(sql = %sql, id, "query");
        sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(())
    }
}
