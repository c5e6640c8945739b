use axum::Router;

pub mod auth;
pub mod orders;
pub mod products;
pub mod system;

/// Router for everything under `/api`.
///
/// Routes are not gated here: each handler runs the request gate it needs,
/// so public catalog reads share the tree with admin writes.
pub fn router() -> Router {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/sweets", products::router())
        .nest("/orders", orders::router())
}
