use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Role;

/// Lifetime of every issued token, in seconds (7 days).
pub const TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Identity facts asserted by a token.
///
/// Only trusted once returned by a verifier: the signature matched the
/// server secret and the expiry had not elapsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityClaim {
    /// Account identifier (opaque).
    #[serde(rename = "userId")]
    pub subject_id: String,

    pub email: String,

    pub role: Role,
}

impl IdentityClaim {
    pub fn new(subject_id: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            subject_id: subject_id.into(),
            email: email.into(),
            role,
        }
    }
}

/// Full token payload: the identity plus registered time claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(flatten)]
    pub identity: IdentityClaim,

    /// Issued-at (seconds since epoch).
    pub iat: i64,

    /// Expiry (seconds since epoch).
    pub exp: i64,
}

impl TokenClaims {
    /// Payload for a token issued at `issued_at`, expiring [`TOKEN_TTL_SECS`] later.
    pub fn issue(identity: IdentityClaim, issued_at: DateTime<Utc>) -> Self {
        let iat = issued_at.timestamp();
        Self {
            identity,
            iat,
            exp: iat + TOKEN_TTL_SECS,
        }
    }
}

/// Why a token could not be turned into a trusted claim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    /// Signing failed while issuing (never produced by decoding).
    #[error("failed to encode token: {0}")]
    Encoding(String),
}

impl TokenError {
    /// Stable, non-sensitive label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::Malformed => "malformed",
            TokenError::InvalidSignature => "invalid_signature",
            TokenError::Expired => "expired",
            TokenError::Encoding(_) => "encoding",
        }
    }
}

/// Validate the time window of already signature-checked claims.
///
/// A token stays valid up to and including its `exp` second.
pub fn validate_time_window(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if claims.exp <= claims.iat {
        return Err(TokenError::Malformed);
    }
    if now.timestamp() > claims.exp {
        return Err(TokenError::Expired);
    }
    Ok(())
}
