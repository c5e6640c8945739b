//! API-side request gate.
//!
//! Handlers call this **before** touching any store, so a rejected request
//! never reaches business logic.

use storefront_auth::{IdentityClaim, require_admin, require_authenticated};

use crate::app::errors;
use crate::context::SessionContext;

pub fn authenticated(session: &SessionContext) -> Result<&IdentityClaim, axum::response::Response> {
    require_authenticated(session.claim()).map_err(errors::gate_error_to_response)
}

pub fn admin(session: &SessionContext) -> Result<&IdentityClaim, axum::response::Response> {
    require_admin(session.claim()).map_err(errors::gate_error_to_response)
}
