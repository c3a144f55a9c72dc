//! Database bootstrap: create the target database and the user/role/privilege tables.

use crate::error::AppError;
use sqlx::postgres::PgConnectOptions;
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

/// Returns schema-qualified table name (e.g. "public"."app_user").
pub fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

/// Create the schema, entity tables and join tables if they do not exist.
/// Join rows cascade when either side is deleted.
pub async fn ensure_tables(pool: &PgPool, schema: &str) -> Result<(), AppError> {
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema)))
        .execute(pool)
        .await?;

    let user = qualified_table(schema, "app_user");
    let role = qualified_table(schema, "role");
    let privilege = qualified_table(schema, "privilege");

    let ddl = [
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                user_name TEXT UNIQUE,
                first_name TEXT,
                last_name TEXT,
                email TEXT,
                password TEXT,
                created_date TIMESTAMPTZ
            )
            "#,
            user
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                role_name TEXT UNIQUE
            )
            "#,
            role
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                privilege_type TEXT UNIQUE
            )
            "#,
            privilege
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                user_id BIGINT NOT NULL REFERENCES {} (id) ON DELETE CASCADE,
                role_id BIGINT NOT NULL REFERENCES {} (id) ON DELETE CASCADE,
                PRIMARY KEY (user_id, role_id)
            )
            "#,
            qualified_table(schema, "user_roles"),
            user,
            role
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                role_id BIGINT NOT NULL REFERENCES {} (id) ON DELETE CASCADE,
                privilege_id BIGINT NOT NULL REFERENCES {} (id) ON DELETE CASCADE,
                PRIMARY KEY (role_id, privilege_id)
            )
            "#,
            qualified_table(schema, "roles_privileges"),
            role,
            privilege
        ),
    ];
    for sql in &ddl {
        sqlx::query(sql).execute(pool).await?;
    }
    tracing::info!(schema = %schema, "tables ready");
    Ok(())
}

/// Create the database named in `database_url` if it does not exist, connecting through the `postgres` database.
/// A URL without a database path names the server default and is left alone.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let Some((admin, db_name)) = admin_options(database_url)? else {
        return Ok(());
    };
    let mut conn: sqlx::PgConnection = admin.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

/// Options for the `postgres` maintenance database on the same server, and the database to create.
/// `None` when the URL names no database or names `postgres` itself.
fn admin_options(database_url: &str) -> Result<Option<(PgConnectOptions, String)>, AppError> {
    let opts = PgConnectOptions::from_str(database_url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {}", e)))?;
    let db_name = match opts.get_database() {
        Some(name) if !name.is_empty() && name != "postgres" => name.to_string(),
        _ => return Ok(None),
    };
    Ok(Some((opts.database("postgres"), db_name)))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_table_quotes_both_parts() {
        assert_eq!(qualified_table("public", "app_user"), "\"public\".\"app_user\"");
        assert_eq!(qualified_table("we\"ird", "role"), "\"we\"\"ird\".\"role\"");
    }

    #[test]
    fn admin_options_switch_to_postgres_database() {
        let (admin, name) = admin_options("postgres://u:p@localhost:5432/user_admin?sslmode=disable")
            .unwrap()
            .unwrap();
        assert_eq!(name, "user_admin");
        assert_eq!(admin.get_database(), Some("postgres"));
        assert_eq!(admin.get_host(), "localhost");
        assert_eq!(admin.get_port(), 5432);
    }

    #[test]
    fn url_without_database_path_creates_nothing() {
        assert!(admin_options("postgres://admin@db.internal:5432").unwrap().is_none());
    }

    #[test]
    fn slash_in_query_parameter_does_not_move_the_database_name() {
        let (admin, name) = admin_options("postgres://u@h/user_admin?sslrootcert=/etc/ssl/ca.pem")
            .unwrap()
            .unwrap();
        assert_eq!(name, "user_admin");
        assert_eq!(admin.get_host(), "h");
        assert_eq!(admin.get_database(), Some("postgres"));
    }

    #[test]
    fn postgres_database_itself_is_left_alone() {
        assert!(admin_options("postgres://u@h/postgres").unwrap().is_none());
    }

    #[test]
    fn non_postgres_url_is_rejected() {
        assert!(admin_options("localhost").is_err());
    }
}
