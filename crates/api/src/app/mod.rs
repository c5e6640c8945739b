//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: collaborators and the auth/checkout flows
//! - `routes/`: HTTP handlers, one file per area
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use storefront_auth::{ClaimCodec, SessionValidator};

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router with in-memory collaborators.
pub async fn build_app(config: ApiConfig) -> anyhow::Result<Router> {
    build_app_with(config, services::Collaborators::in_memory()).await
}

/// Build the router against the given collaborators.
///
/// The signing secret is read once here; the codec is shared by the session
/// middleware and the token-issuing flows.
pub async fn build_app_with(
    config: ApiConfig,
    deps: services::Collaborators,
) -> anyhow::Result<Router> {
    let codec = Arc::new(ClaimCodec::new(config.jwt_secret.as_bytes()));
    let auth_state = middleware::AuthState {
        sessions: SessionValidator::new(codec.clone()),
    };

    let services = Arc::new(services::AppServices::new(&config, codec, deps));
    if let Some(admin) = &config.bootstrap_admin {
        services.bootstrap_admin(admin).await?;
    }

    let router = Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", routes::router())
        .layer(Extension(services))
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::session_middleware,
        )));

    Ok(router)
}
