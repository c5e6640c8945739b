use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, OrderId, ProductId};

use crate::product::Product;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "UPI")]
    Upi,
    #[serde(rename = "Credit Card")]
    CreditCard,
    #[serde(rename = "Debit Card")]
    DebitCard,
    Cash,
}

/// Fulfilment status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// Snapshot of a product line at the time the order was placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(rename = "sweetId")]
    pub product_id: ProductId,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}

impl OrderItem {
    pub fn snapshot(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
            quantity,
        }
    }

    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Subject id of the ordering account.
    #[serde(rename = "userId")]
    pub account_id: String,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub delivery_address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Record a checkout. Payment is settled at checkout, so the order starts
    /// confirmed with a completed payment.
    pub fn place(
        id: OrderId,
        account_id: impl Into<String>,
        items: Vec<OrderItem>,
        payment_method: PaymentMethod,
        delivery_address: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if items.is_empty() {
            return Err(DomainError::validation("Order must have at least one item"));
        }
        if items.iter().any(|i| i.quantity < 1) {
            return Err(DomainError::validation("Quantity must be at least 1"));
        }
        let delivery_address = delivery_address.trim();
        if delivery_address.is_empty() {
            return Err(DomainError::validation("delivery address is required"));
        }

        let total_amount = items.iter().map(OrderItem::line_total).sum();

        Ok(Self {
            id,
            account_id: account_id.into(),
            items,
            total_amount,
            status: OrderStatus::Confirmed,
            payment_method,
            payment_status: PaymentStatus::Completed,
            delivery_address: delivery_address.to_string(),
            created_at: now,
            updated_at: now,
        })
    }
}
