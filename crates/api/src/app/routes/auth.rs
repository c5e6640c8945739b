use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::SessionContext;

pub fn router() -> Router {
    Router::new()
        .route("/send-otp", post(send_otp))
        .route("/verify-otp", post(verify_otp))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

pub async fn send_otp(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::SendCodeRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    match services.send_code(body.email.as_deref()).await {
        Ok(()) => Json(json!({ "message": "OTP sent successfully to your email" })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn verify_otp(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::VerifyCodeRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    match services.verify_code(body.email.as_deref(), body.otp.as_deref()) {
        Ok(()) => Json(json!({ "message": "Email verified successfully" })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::RegisterRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    match services.register(body).await {
        Ok(session) => (StatusCode::CREATED, Json(session)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    match services.login(body).await {
        Ok(session) => Json(session).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn me(Extension(session): Extension<SessionContext>) -> axum::response::Response {
    match authz::authenticated(&session) {
        Ok(claim) => Json(claim).into_response(),
        Err(resp) => resp,
    }
}
