//! Capability derivation from a resolved profile.
//!
//! These flags gate the admin API only. They are a convenience for honest clients;
//! access rules on the store itself remain the real boundary.

use serde::{Deserialize, Serialize};

use super::profile::UserProfile;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Superuser,
    Write,
    #[default]
    Read,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Superuser => write!(f, "superuser"),
            Role::Write => write!(f, "write"),
            Role::Read => write!(f, "read"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "superuser" => Ok(Role::Superuser),
            "write" => Ok(Role::Write),
            "read" => Ok(Role::Read),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub can_write: bool,
    pub is_superuser: bool,
}

impl Capabilities {
    pub fn for_role(role: Role) -> Self {
        Self {
            can_write: matches!(role, Role::Write | Role::Superuser),
            is_superuser: role == Role::Superuser,
        }
    }

    /// No profile (anonymous or still resolving) grants nothing.
    pub fn for_profile(profile: Option<&UserProfile>) -> Self {
        profile
            .map(|p| Self::for_role(p.role))
            .unwrap_or_default()
    }
}
