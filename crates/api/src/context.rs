use storefront_auth::IdentityClaim;

/// Authentication outcome for a request.
///
/// Inserted by the session middleware on every request; anonymous requests
/// carry `None`. Immutable for the lifetime of the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    claim: Option<IdentityClaim>,
}

impl SessionContext {
    pub fn new(claim: Option<IdentityClaim>) -> Self {
        Self { claim }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn claim(&self) -> Option<&IdentityClaim> {
        self.claim.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.claim.is_some()
    }
}
