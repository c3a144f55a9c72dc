//! User, role and privilege shapes shared by storage, service and HTTP layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Store-assigned primary key.
pub type Id = i64;

/// Application user. `password` holds a one-way hash once the user has been created.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub id: Option<Id>,
    pub user_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Assigned by the server at creation; any caller value is ignored.
    pub created_date: Option<DateTime<Utc>>,
    pub roles: Vec<Role>,
}

/// Named bundle of privileges. Holders are derived from `User::roles`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Role {
    pub id: Option<Id>,
    pub role_name: Option<String>,
    pub privileges: Vec<Privilege>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Privilege {
    pub id: Option<Id>,
    pub privilege_type: Option<String>,
}

impl User {
    /// Ids of the referenced roles; every nested role must already carry an id.
    pub fn role_ids(&self) -> Result<Vec<Id>, crate::error::AppError> {
        referenced_ids(self.roles.iter().map(|r| r.id), "role")
    }
}

impl Role {
    /// Ids of the referenced privileges; every nested privilege must already carry an id.
    pub fn privilege_ids(&self) -> Result<Vec<Id>, crate::error::AppError> {
        referenced_ids(self.privileges.iter().map(|p| p.id), "privilege")
    }
}

fn referenced_ids(
    ids: impl Iterator<Item = Option<Id>>,
    kind: &str,
) -> Result<Vec<Id>, crate::error::AppError> {
    let mut out: Vec<Id> = Vec::new();
    for id in ids {
        let id = id.ok_or_else(|| {
            crate::error::AppError::BadRequest(format!("{} reference must carry an id", kind))
        })?;
        if !out.contains(&id) {
            out.push(id);
        }
    }
    Ok(out)
}
