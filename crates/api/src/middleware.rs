use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use storefront_auth::SessionValidator;

use crate::context::SessionContext;

#[derive(Clone, Debug)]
pub struct AuthState {
    pub sessions: SessionValidator,
}

/// Attach a [`SessionContext`] to every request.
///
/// Never rejects: whether an identity is required is decided per route by
/// the request gate.
pub async fn session_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let session = authenticate(&state.sessions, req.headers());
    req.extensions_mut().insert(session);
    next.run(req).await
}

/// Resolve the session for a set of request headers.
pub fn authenticate(sessions: &SessionValidator, headers: &HeaderMap) -> SessionContext {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    SessionContext::new(sessions.authenticate(header))
}
