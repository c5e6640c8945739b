use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role carried by an identity claim.
///
/// The set is closed: a token whose payload names any other role fails to
/// decode instead of producing an unknown role.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    /// Regular storefront customer.
    #[default]
    #[serde(rename = "user")]
    Standard,

    /// Administrative staff (catalog management, all orders).
    #[serde(rename = "admin")]
    Privileged,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Standard => "user",
            Role::Privileged => "admin",
        }
    }

    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Privileged)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::Standard),
            "admin" => Ok(Role::Privileged),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}
