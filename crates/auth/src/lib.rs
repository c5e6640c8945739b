//! `storefront-auth`: stateless identity tokens and request gating.
//!
//! This crate is intentionally decoupled from HTTP and storage: callers hand
//! it header values and account records, and get back claims, tokens and
//! accept/reject decisions.

pub mod account;
pub mod claims;
pub mod codec;
pub mod gate;
pub mod password;
pub mod policy;
pub mod roles;
pub mod session;

pub use account::{Account, AccountProfile, NewAccount, normalize_email};
pub use claims::{IdentityClaim, TOKEN_TTL_SECS, TokenClaims, TokenError, validate_time_window};
pub use codec::{ClaimCodec, ClaimVerifier};
pub use gate::{GateError, require_admin, require_authenticated};
pub use password::{PasswordError, hash_password, verify_password};
pub use policy::is_privileged;
pub use roles::Role;
pub use session::{BEARER_PREFIX, SessionValidator, bearer_token};
