//! Short-lived, single-use email verification codes.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use rand::Rng;

use storefront_auth::normalize_email;

/// A stored verification code for one email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneTimeCode {
    pub code: String,
    /// Expiry as milliseconds since epoch.
    pub expires_at_ms: i64,
    /// Set once the code has been presented correctly.
    pub verified: bool,
}

impl OneTimeCode {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at_ms
    }
}

/// Keyed record store with caller-managed expiry.
///
/// Callers own the "read, then delete on success" sequence; the store
/// performs no expiry sweeping of its own.
pub trait OneTimeCodeStore: Send + Sync {
    /// Store a fresh, unverified code, replacing any previous one.
    fn put(&self, email: &str, code: &str, expires_at_ms: i64);
    fn get(&self, email: &str) -> Option<OneTimeCode>;
    /// Returns `false` when no code is stored for `email`.
    fn mark_verified(&self, email: &str) -> bool;
    fn delete(&self, email: &str);

    fn is_verified(&self, email: &str) -> bool {
        self.get(email).is_some_and(|c| c.verified)
    }
}

/// In-memory code store for tests/dev (process-local, lost on restart).
#[derive(Debug, Default)]
pub struct InMemoryOneTimeCodeStore {
    inner: RwLock<HashMap<String, OneTimeCode>>,
}

impl InMemoryOneTimeCodeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OneTimeCodeStore for InMemoryOneTimeCodeStore {
    fn put(&self, email: &str, code: &str, expires_at_ms: i64) {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(
            normalize_email(email),
            OneTimeCode {
                code: code.to_string(),
                expires_at_ms,
                verified: false,
            },
        );
    }

    fn get(&self, email: &str) -> Option<OneTimeCode> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.get(&normalize_email(email)).cloned()
    }

    fn mark_verified(&self, email: &str) -> bool {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        match map.get_mut(&normalize_email(email)) {
            Some(code) => {
                code.verified = true;
                true
            }
            None => false,
        }
    }

    fn delete(&self, email: &str) {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.remove(&normalize_email(email));
    }
}

/// Six-digit numeric code (100000..=999999).
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}
