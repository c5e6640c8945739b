//! Compact signed token encoding for identity claims (JWT, HS256).

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::claims::{IdentityClaim, TokenClaims, TokenError, validate_time_window};

/// Verifies a compact token and yields the claim it carries.
///
/// This is the seam the session layer depends on; [`ClaimCodec`] is the
/// production implementation.
pub trait ClaimVerifier: Send + Sync {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<IdentityClaim, TokenError>;
}

/// HS256 claim codec bound to one process-wide secret.
///
/// Construct once at startup and share (it holds no mutable state).
pub struct ClaimCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl ClaimCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();

        // Expiry is checked by `validate_time_window` against an explicit clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign `claim` with the current time as issued-at.
    pub fn encode(&self, claim: &IdentityClaim) -> Result<String, TokenError> {
        self.encode_at(claim, Utc::now())
    }

    /// Sign `claim` as if issued at `issued_at`.
    ///
    /// Identical claim and instant always produce the identical token.
    pub fn encode_at(
        &self,
        claim: &IdentityClaim,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = TokenClaims::issue(claim.clone(), issued_at);
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify `token` against the wall clock.
    pub fn decode(&self, token: &str) -> Result<IdentityClaim, TokenError> {
        self.decode_at(token, Utc::now())
    }

    /// Verify signature first, then the time window at `now`.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<IdentityClaim, TokenError> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })?;

        validate_time_window(&data.claims, now)?;
        Ok(data.claims.identity)
    }
}

impl ClaimVerifier for ClaimCodec {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<IdentityClaim, TokenError> {
        self.decode_at(token, now)
    }
}

impl core::fmt::Debug for ClaimCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClaimCodec")
            .field("algorithm", &Algorithm::HS256)
            .finish_non_exhaustive()
    }
}
