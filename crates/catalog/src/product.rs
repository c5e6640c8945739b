use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, ProductId};

/// Catalog category (closed set shown in the storefront filters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Sweet,
    Snack,
    Namkeen,
    Dessert,
}

impl core::str::FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Sweet" => Ok(Category::Sweet),
            "Snack" => Ok(Category::Snack),
            "Namkeen" => Ok(Category::Namkeen),
            "Dessert" => Ok(Category::Dessert),
            other => Err(DomainError::validation(format!("unknown category '{other}'"))),
        }
    }
}

/// A sellable catalog entry.
///
/// # Invariants
/// - `name` is non-empty (uniqueness is enforced by the store).
/// - `price` is finite and non-negative.
/// - `quantity` never goes below zero (it is unsigned and only decremented
///   through [`Product::take`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: Category,
    pub price: f64,
    pub quantity: u32,
    pub description: Option<String>,
    pub image: String,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn create(id: ProductId, new: NewProduct, now: DateTime<Utc>) -> DomainResult<Self> {
        new.validate()?;
        Ok(Self {
            id,
            name: new.name.trim().to_string(),
            category: new.category,
            price: new.price,
            quantity: new.quantity,
            description: new.description,
            image: new.image.trim().to_string(),
            is_available: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Add `quantity` units of stock.
    pub fn restock(&mut self, quantity: u32, now: DateTime<Utc>) -> DomainResult<()> {
        if quantity < 1 {
            return Err(DomainError::validation("Quantity must be at least 1"));
        }
        self.quantity = self
            .quantity
            .checked_add(quantity)
            .ok_or_else(|| DomainError::invariant("stock overflow"))?;
        self.updated_at = now;
        Ok(())
    }

    /// Conditionally remove `quantity` units; fails without change when stock
    /// is insufficient.
    pub fn take(&mut self, quantity: u32, now: DateTime<Utc>) -> DomainResult<()> {
        if quantity < 1 {
            return Err(DomainError::validation("Quantity must be at least 1"));
        }
        if self.quantity < quantity {
            return Err(DomainError::invariant("Insufficient stock"));
        }
        self.quantity -= quantity;
        self.updated_at = now;
        Ok(())
    }
}

/// Fields for a new catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category: Category,
    pub price: f64,
    #[serde(default)]
    pub quantity: u32,
    pub description: Option<String>,
    pub image: String,
}

impl NewProduct {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name is required"));
        }
        if self.image.trim().is_empty() {
            return Err(DomainError::validation("image is required"));
        }
        validate_price(self.price)
    }
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub price: Option<f64>,
    pub quantity: Option<u32>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_available: Option<bool>,
}

impl ProductPatch {
    /// Apply to `product`, validating first so a rejected patch changes nothing.
    pub fn apply_to(self, product: &mut Product, now: DateTime<Utc>) -> DomainResult<()> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if self.image.as_deref().is_some_and(|i| i.trim().is_empty()) {
            return Err(DomainError::validation("image cannot be empty"));
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }

        if let Some(name) = self.name {
            product.name = name.trim().to_string();
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(quantity) = self.quantity {
            product.quantity = quantity;
        }
        if let Some(description) = self.description {
            product.description = Some(description);
        }
        if let Some(image) = self.image {
            product.image = image.trim().to_string();
        }
        if let Some(is_available) = self.is_available {
            product.is_available = is_available;
        }
        product.updated_at = now;
        Ok(())
    }
}

/// Storefront search criteria. Only available products ever match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    /// Case-insensitive substring of the name.
    pub name: Option<String>,
    pub category: Option<Category>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        product.is_available
            && self
                .name
                .as_ref()
                .is_none_or(|n| product.name.to_lowercase().contains(&n.to_lowercase()))
            && self.category.is_none_or(|c| product.category == c)
            && self.min_price.is_none_or(|min| product.price >= min)
            && self.max_price.is_none_or(|max| product.price <= max)
    }
}

fn validate_price(price: f64) -> DomainResult<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(DomainError::validation("price must be a non-negative number"));
    }
    Ok(())
}
