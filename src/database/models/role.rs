use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of role labels. Stored as text in `user_roles` and carried
/// in JWT claims; anything outside this set is rejected at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Professor,
    Aluno,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Professor => "PROFESSOR",
            Role::Aluno => "ALUNO",
        }
    }

    /// Parse a set of stored role labels, ignoring unknown values
    pub fn parse_set(labels: &[String]) -> Vec<Role> {
        labels.iter().filter_map(|l| l.parse().ok()).collect()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "PROFESSOR" => Ok(Role::Professor),
            "ALUNO" => Ok(Role::Aluno),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);
