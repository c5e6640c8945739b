use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use storefront_catalog::{ProductFilter, ProductPatch};
use storefront_core::ProductId;

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::SessionContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/search", get(search_products))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/:id/restock", post(restock_product))
        .route("/:id/purchase", post(purchase_product))
}

fn invalid_quantity() -> axum::response::Response {
    errors::json_error(
        StatusCode::BAD_REQUEST,
        "validation_error",
        "Quantity must be at least 1",
    )
}

fn parse_id(raw: &str) -> Result<ProductId, axum::response::Response> {
    raw.parse().map_err(|_| errors::invalid_id("sweet"))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    Json(services.products.list_available()).into_response()
}

pub async fn search_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(q): Query<dto::SearchQuery>,
) -> axum::response::Response {
    let category = match q.category.as_deref().filter(|c| !c.is_empty()) {
        None => None,
        Some(raw) => match raw.parse() {
            Ok(c) => Some(c),
            // No product can carry an unknown category.
            Err(_) => return Json(Vec::<storefront_catalog::Product>::new()).into_response(),
        },
    };

    let filter = ProductFilter {
        name: q.name.filter(|n| !n.is_empty()),
        category,
        min_price: q.min_price,
        max_price: q.max_price,
    };
    Json(services.products.search(&filter)).into_response()
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.products.get(&id) {
        Some(p) => Json(p).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "Sweet not found"),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    body: Result<Json<dto::CreateProductRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(resp) = authz::admin(&session) {
        return resp;
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let fields = match body.into_new_product() {
        Ok(f) => f,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.products.create(fields) {
        Ok(p) => {
            tracing::info!(product_id = %p.id, name = %p.name, "sweet created");
            (StatusCode::CREATED, Json(p)).into_response()
        }
        Err(e) => errors::store_error_to_response(e, "Sweet"),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    patch: Result<Json<ProductPatch>, JsonRejection>,
) -> axum::response::Response {
    if let Err(resp) = authz::admin(&session) {
        return resp;
    }
    let Json(patch) = match patch {
        Ok(p) => p,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.products.update(&id, patch) {
        Ok(p) => Json(p).into_response(),
        Err(e) => errors::store_error_to_response(e, "Sweet"),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::admin(&session) {
        return resp;
    }
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.products.delete(&id) {
        Ok(p) => {
            tracing::info!(product_id = %p.id, "sweet deleted");
            Json(serde_json::json!({ "message": "Sweet deleted successfully" })).into_response()
        }
        Err(e) => errors::store_error_to_response(e, "Sweet"),
    }
}

pub async fn restock_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::QuantityRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(resp) = authz::admin(&session) {
        return resp;
    }
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let quantity = match body {
        Ok(Json(dto::QuantityRequest { quantity: Some(q) })) if q >= 1 => q,
        _ => return invalid_quantity(),
    };

    match services.products.restock(&id, quantity) {
        Ok(p) => Json(p).into_response(),
        Err(e) => errors::store_error_to_response(e, "Sweet"),
    }
}

pub async fn purchase_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::QuantityRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(resp) = authz::authenticated(&session) {
        return resp;
    }
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    // Only an absent body or an absent field means "one unit".
    let quantity = match body {
        Ok(Json(dto::QuantityRequest { quantity: None })) => 1,
        Ok(Json(dto::QuantityRequest { quantity: Some(q) })) if q >= 1 => q,
        Err(JsonRejection::MissingJsonContentType(_)) => 1,
        _ => return invalid_quantity(),
    };

    match services.purchase(&id, quantity) {
        Ok((sweet, total_cost)) => Json(dto::PurchaseReceipt {
            message: "Purchase successful",
            sweet,
            total_cost,
        })
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
