//! Infrastructure layer: storage collaborators and code delivery.
//!
//! Each collaborator is a trait so the API can be wired against a real
//! document store; the in-memory implementations back dev and tests.

pub mod accounts;
pub mod error;
pub mod mailer;
pub mod one_time_codes;
pub mod orders;
pub mod products;

pub use accounts::{AccountStore, InMemoryAccountStore};
pub use error::{StoreError, StoreResult};
pub use mailer::{CodeMailer, LogMailer, MailError};
pub use one_time_codes::{InMemoryOneTimeCodeStore, OneTimeCode, OneTimeCodeStore, generate_code};
pub use orders::{InMemoryOrderStore, OrderStore};
pub use products::{InMemoryProductStore, ProductStore};
