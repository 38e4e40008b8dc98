use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::Role;

/// User row joined with its aggregated role labels. `ra` is the student
/// registration number, `siape` the staff one; both optional.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub ra: Option<String>,
    pub siape: Option<String>,
    pub token_version: i32,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn roles(&self) -> Vec<Role> {
        Role::parse_set(&self.roles)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles().contains(&role)
    }
}
