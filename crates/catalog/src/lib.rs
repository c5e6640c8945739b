//! Catalog and order domain types.
//!
//! Plain validated records (no IO, no HTTP, no storage). The only stock rule
//! is that quantity cannot go negative, enforced by [`Product::take`].

pub mod order;
pub mod product;

pub use order::{Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus};
pub use product::{Category, NewProduct, Product, ProductFilter, ProductPatch};
