//! Session validation: bearer credential → trusted identity (or nothing).

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::claims::IdentityClaim;
use crate::codec::ClaimVerifier;

/// Scheme prefix expected in the `Authorization` header.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Turns an inbound `Authorization` header value into an authenticated
/// identity.
///
/// Anonymous requests are a normal outcome: a missing header, an unusable
/// header and a token that fails verification all yield `None`. The failure
/// kind is only logged.
#[derive(Clone)]
pub struct SessionValidator {
    verifier: Arc<dyn ClaimVerifier>,
}

impl SessionValidator {
    pub fn new(verifier: Arc<dyn ClaimVerifier>) -> Self {
        Self { verifier }
    }

    pub fn authenticate(&self, authorization: Option<&str>) -> Option<IdentityClaim> {
        self.authenticate_at(authorization, Utc::now())
    }

    pub fn authenticate_at(
        &self,
        authorization: Option<&str>,
        now: DateTime<Utc>,
    ) -> Option<IdentityClaim> {
        let token = bearer_token(authorization?)?;

        match self.verifier.verify(token, now) {
            Ok(claim) => Some(claim),
            Err(e) => {
                tracing::debug!(reason = e.kind(), "bearer token rejected");
                None
            }
        }
    }
}

impl core::fmt::Debug for SessionValidator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionValidator").finish_non_exhaustive()
    }
}

/// Extract the token from a `Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix(BEARER_PREFIX)?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}
