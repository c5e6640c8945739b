use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::Utc;

use storefront_catalog::{NewProduct, Product, ProductFilter, ProductPatch};
use storefront_core::ProductId;

use crate::error::{StoreError, StoreResult};

/// Catalog persistence.
///
/// Every mutation is applied atomically to a single product record.
pub trait ProductStore: Send + Sync {
    /// Available products, newest first.
    fn list_available(&self) -> Vec<Product>;
    /// Products matching `filter`, newest first.
    fn search(&self, filter: &ProductFilter) -> Vec<Product>;
    fn get(&self, id: &ProductId) -> Option<Product>;
    /// Fails with `Conflict` when the name is already used.
    fn create(&self, fields: NewProduct) -> StoreResult<Product>;
    fn update(&self, id: &ProductId, patch: ProductPatch) -> StoreResult<Product>;
    fn delete(&self, id: &ProductId) -> StoreResult<Product>;
    fn restock(&self, id: &ProductId, quantity: u32) -> StoreResult<Product>;
    /// Conditional decrement: succeeds only when enough stock remains.
    fn take(&self, id: &ProductId, quantity: u32) -> StoreResult<Product>;
}

/// In-memory catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    inner: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn mutate<F>(&self, id: &ProductId, f: F) -> StoreResult<Product>
    where
        F: FnOnce(&mut Product) -> StoreResult<()>,
    {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let product = map.get_mut(id).ok_or(StoreError::NotFound)?;
        f(product)?;
        Ok(product.clone())
    }

    fn collect_sorted(&self, keep: impl Fn(&Product) -> bool) -> Vec<Product> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut items: Vec<Product> = map.values().filter(|p| keep(p)).cloned().collect();
        items.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_uuid().cmp(a.id.as_uuid()))
        });
        items
    }
}

fn name_taken(map: &HashMap<ProductId, Product>, name: &str, except: Option<&ProductId>) -> bool {
    let name = name.trim();
    map.values()
        .any(|p| p.name == name && Some(&p.id) != except)
}

impl ProductStore for InMemoryProductStore {
    fn list_available(&self) -> Vec<Product> {
        self.collect_sorted(|p| p.is_available)
    }

    fn search(&self, filter: &ProductFilter) -> Vec<Product> {
        self.collect_sorted(|p| filter.matches(p))
    }

    fn get(&self, id: &ProductId) -> Option<Product> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.get(id).cloned()
    }

    fn create(&self, fields: NewProduct) -> StoreResult<Product> {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if name_taken(&map, &fields.name, None) {
            return Err(StoreError::Conflict(
                "a product with this name already exists".to_string(),
            ));
        }

        let product = Product::create(ProductId::new(), fields, Utc::now())?;
        map.insert(product.id, product.clone());
        Ok(product)
    }

    fn update(&self, id: &ProductId, patch: ProductPatch) -> StoreResult<Product> {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(name) = &patch.name {
            if name_taken(&map, name, Some(id)) {
                return Err(StoreError::Conflict(
                    "a product with this name already exists".to_string(),
                ));
            }
        }

        let product = map.get_mut(id).ok_or(StoreError::NotFound)?;
        patch.apply_to(product, Utc::now())?;
        Ok(product.clone())
    }

    fn delete(&self, id: &ProductId) -> StoreResult<Product> {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.remove(id).ok_or(StoreError::NotFound)
    }

    fn restock(&self, id: &ProductId, quantity: u32) -> StoreResult<Product> {
        self.mutate(id, |p| Ok(p.restock(quantity, Utc::now())?))
    }

    fn take(&self, id: &ProductId, quantity: u32) -> StoreResult<Product> {
        self.mutate(id, |p| Ok(p.take(quantity, Utc::now())?))
    }
}
