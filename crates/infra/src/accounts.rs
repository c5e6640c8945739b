use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::Utc;

use storefront_auth::{Account, NewAccount, normalize_email};
use storefront_core::AccountId;

use crate::error::{StoreError, StoreResult};

/// Account persistence as required by the login/registration flow.
pub trait AccountStore: Send + Sync {
    fn find_by_email(&self, email: &str) -> Option<Account>;
    fn find_by_id(&self, id: &AccountId) -> Option<Account>;
    /// Create an account; fails with `Conflict` when the email is taken.
    fn create(&self, fields: NewAccount) -> StoreResult<Account>;
}

/// In-memory account store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    inner: RwLock<HashMap<AccountId, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccountStore for InMemoryAccountStore {
    fn find_by_email(&self, email: &str) -> Option<Account> {
        let email = normalize_email(email);
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.values().find(|a| a.email == email).cloned()
    }

    fn find_by_id(&self, id: &AccountId) -> Option<Account> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.get(id).cloned()
    }

    fn create(&self, fields: NewAccount) -> StoreResult<Account> {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        let email = normalize_email(&fields.email);
        if map.values().any(|a| a.email == email) {
            return Err(StoreError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let account = Account {
            id: AccountId::new(),
            name: fields.name,
            email,
            phone: fields.phone,
            password_hash: fields.password_hash,
            role: fields.role,
            address: None,
            created_at: now,
            updated_at: now,
        };
        map.insert(account.id, account.clone());
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_auth::Role;

    fn fields(email: &str) -> NewAccount {
        NewAccount::new("Asha", email, None, "hash".into()).unwrap()
    }

    #[test]
    fn create_then_find() {
        let store = InMemoryAccountStore::new();
        let created = store.create(fields("asha@example.com")).unwrap();

        assert_eq!(created.role, Role::Standard);
        assert_eq!(store.find_by_email("ASHA@example.com"), Some(created.clone()));
        assert_eq!(store.find_by_id(&created.id), Some(created));
        assert_eq!(store.find_by_email("nobody@example.com"), None);
    }

    #[test]
    fn duplicate_email_conflicts() {
        let store = InMemoryAccountStore::new();
        store.create(fields("asha@example.com")).unwrap();
        let err = store.create(fields("Asha@Example.com")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn elevated_role_is_kept() {
        let store = InMemoryAccountStore::new();
        let acc = store
            .create(fields("boss@example.com").with_role(Role::Privileged))
            .unwrap();
        assert_eq!(acc.role, Role::Privileged);
    }
}
