//! Account records as seen by the identity layer.

use chrono::{DateTime, Utc};
use serde::Serialize;

use storefront_core::{AccountId, DomainError, DomainResult};

use crate::claims::IdentityClaim;
use crate::Role;

/// A registered storefront account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Claim issued for this account at login/registration.
    pub fn claim(&self) -> IdentityClaim {
        IdentityClaim::new(self.id.to_string(), self.email.clone(), self.role)
    }

    pub fn profile(&self) -> AccountProfile {
        AccountProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Public projection of an account returned alongside issued tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountProfile {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Fields required to create an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: Role,
}

impl NewAccount {
    /// Validated account fields with the standard role.
    pub fn new(
        name: &str,
        email: &str,
        phone: Option<String>,
        password_hash: String,
    ) -> DomainResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        let email = normalize_email(email);
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::validation("invalid email format"));
        }

        Ok(Self {
            name: name.to_string(),
            email,
            phone: phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
            password_hash,
            role: Role::Standard,
        })
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// Canonical form used as the lookup key for accounts and one-time codes.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_defaults_to_standard_role() {
        let acc = NewAccount::new(" Asha ", " Asha@Example.com ", None, "h".into()).unwrap();
        assert_eq!(acc.role, Role::Standard);
        assert_eq!(acc.name, "Asha");
        assert_eq!(acc.email, "asha@example.com");
    }

    #[test]
    fn new_account_validates_fields() {
        assert!(NewAccount::new("", "a@example.com", None, "h".into()).is_err());
        assert!(NewAccount::new("A", "no-at-sign", None, "h".into()).is_err());
    }

    #[test]
    fn claim_carries_account_identity() {
        let now = Utc::now();
        let acc = Account {
            id: AccountId::new(),
            name: "Asha".into(),
            email: "asha@example.com".into(),
            phone: None,
            password_hash: "h".into(),
            role: Role::Privileged,
            address: None,
            created_at: now,
            updated_at: now,
        };

        let claim = acc.claim();
        assert_eq!(claim.subject_id, acc.id.to_string());
        assert_eq!(claim.email, "asha@example.com");
        assert_eq!(claim.role, Role::Privileged);

        let json = serde_json::to_value(&acc).unwrap();
        assert!(json.get("passwordHash").is_none());
    }
}
