use serde::{Deserialize, Serialize};

use storefront_auth::AccountProfile;
use storefront_catalog::{Category, NewProduct, Order, PaymentMethod, Product};
use storefront_core::DomainError;

// -------------------------
// Request DTOs
// -------------------------
//
// Fields are optional so that missing input is reported with the storefront's
// own messages instead of a generic deserialization rejection.

#[derive(Debug, Default, Deserialize)]
pub struct SendCodeRequest {
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VerifyCodeRequest {
    pub email: Option<String>,
    pub otp: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub price: Option<f64>,
    pub quantity: Option<u32>,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl CreateProductRequest {
    pub fn into_new_product(self) -> Result<NewProduct, DomainError> {
        match (self.name, self.category, self.price, self.image) {
            (Some(name), Some(category), Some(price), Some(image))
                if !name.trim().is_empty() && !image.trim().is_empty() =>
            {
                Ok(NewProduct {
                    name,
                    category,
                    price,
                    quantity: self.quantity.unwrap_or(0),
                    description: self.description,
                    image,
                })
            }
            _ => Err(DomainError::validation(
                "Name, category, price, and image are required",
            )),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct QuantityRequest {
    pub quantity: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub name: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub sweet_id: String,
    pub quantity: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Option<Vec<OrderLineRequest>>,
    pub payment_method: Option<PaymentMethod>,
    pub delivery_address: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

/// Returned by login and registration.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub message: &'static str,
    pub token: String,
    pub user: AccountProfile,
}

/// Contact details attached to orders in the admin listing.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerSummary {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    pub message: &'static str,
    pub sweet: Product,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerSummary>,
}
