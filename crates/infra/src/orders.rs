use std::sync::{PoisonError, RwLock};

use storefront_catalog::Order;

/// Order persistence (append + list).
pub trait OrderStore: Send + Sync {
    fn insert(&self, order: Order) -> Order;
    /// All orders, newest first.
    fn list_all(&self) -> Vec<Order>;
    /// Orders placed by `account_id`, newest first.
    fn list_for_account(&self, account_id: &str) -> Vec<Order>;
}

/// In-memory order log for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    inner: RwLock<Vec<Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn newest_first(&self, keep: impl Fn(&Order) -> bool) -> Vec<Order> {
        let orders = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<Order> = orders.iter().filter(|o| keep(o)).cloned().collect();
        out.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_uuid().cmp(a.id.as_uuid()))
        });
        out
    }
}

impl OrderStore for InMemoryOrderStore {
    fn insert(&self, order: Order) -> Order {
        let mut orders = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        orders.push(order.clone());
        order
    }

    fn list_all(&self) -> Vec<Order> {
        self.newest_first(|_| true)
    }

    fn list_for_account(&self, account_id: &str) -> Vec<Order> {
        self.newest_first(|o| o.account_id == account_id)
    }
}
