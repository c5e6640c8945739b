//! Request gate: accept or reject an operation before business logic runs.

use thiserror::Error;

use crate::claims::IdentityClaim;
use crate::policy::is_privileged;

/// Rejection at the request boundary.
///
/// Messages are fixed and never say which token check failed.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GateError {
    /// No valid identity where one is required; the client should
    /// re-authenticate.
    #[error("authentication required")]
    Unauthorized,

    /// A valid identity without the required role; re-authenticating will
    /// not help.
    #[error("admin access required")]
    Forbidden,
}

impl GateError {
    /// Machine-readable code for error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            GateError::Unauthorized => "unauthorized",
            GateError::Forbidden => "forbidden",
        }
    }
}

pub fn require_authenticated(claim: Option<&IdentityClaim>) -> Result<&IdentityClaim, GateError> {
    claim.ok_or(GateError::Unauthorized)
}

/// Rejects with `Forbidden` whenever the identity is not privileged,
/// including when there is no identity at all.
pub fn require_admin(claim: Option<&IdentityClaim>) -> Result<&IdentityClaim, GateError> {
    match claim {
        Some(c) if is_privileged(Some(c)) => Ok(c),
        _ => Err(GateError::Forbidden),
    }
}
