use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;

use storefront_auth::{
    Account, ClaimCodec, IdentityClaim, NewAccount, Role, hash_password, normalize_email,
    verify_password,
};
use storefront_catalog::{Order, OrderItem, Product};
use storefront_core::{AccountId, DomainError, OrderId, ProductId};
use storefront_infra::{
    AccountStore, CodeMailer, InMemoryAccountStore, InMemoryOneTimeCodeStore, InMemoryOrderStore,
    InMemoryProductStore, LogMailer, OneTimeCodeStore, OrderStore, ProductStore, StoreError,
    generate_code,
};

use crate::app::dto::{
    AuthSession, CreateOrderRequest, CustomerSummary, LoginRequest, OrderView, RegisterRequest,
};
use crate::config::{ApiConfig, BootstrapAdmin};

/// Failure of an application flow, mapped to HTTP in `errors`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvariantViolation(String),

    /// Never shown to clients.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<DomainError> for ServiceError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(m) | DomainError::InvalidId(m) => Self::Validation(m),
            DomainError::InvariantViolation(m) => Self::InvariantViolation(m),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(m) => Self::Conflict(m),
            StoreError::NotFound => Self::NotFound("not found".to_string()),
            StoreError::Domain(d) => d.into(),
        }
    }
}

/// Storage and delivery collaborators behind the API.
#[derive(Clone)]
pub struct Collaborators {
    pub accounts: Arc<dyn AccountStore>,
    pub codes: Arc<dyn OneTimeCodeStore>,
    pub mailer: Arc<dyn CodeMailer>,
    pub products: Arc<dyn ProductStore>,
    pub orders: Arc<dyn OrderStore>,
}

impl Collaborators {
    pub fn in_memory() -> Self {
        Self {
            accounts: Arc::new(InMemoryAccountStore::new()),
            codes: Arc::new(InMemoryOneTimeCodeStore::new()),
            mailer: Arc::new(LogMailer),
            products: Arc::new(InMemoryProductStore::new()),
            orders: Arc::new(InMemoryOrderStore::new()),
        }
    }
}

pub struct AppServices {
    pub codec: Arc<ClaimCodec>,
    pub accounts: Arc<dyn AccountStore>,
    pub codes: Arc<dyn OneTimeCodeStore>,
    pub mailer: Arc<dyn CodeMailer>,
    pub products: Arc<dyn ProductStore>,
    pub orders: Arc<dyn OrderStore>,
    allow_admin_signup: bool,
    otp_ttl: Duration,
}

impl AppServices {
    pub fn new(config: &ApiConfig, codec: Arc<ClaimCodec>, deps: Collaborators) -> Self {
        Self {
            codec,
            accounts: deps.accounts,
            codes: deps.codes,
            mailer: deps.mailer,
            products: deps.products,
            orders: deps.orders,
            allow_admin_signup: config.allow_admin_signup,
            otp_ttl: config.otp_ttl,
        }
    }

    /// Ensure the configured admin account exists.
    pub async fn bootstrap_admin(&self, admin: &BootstrapAdmin) -> Result<(), ServiceError> {
        if let Some(existing) = self.accounts.find_by_email(&admin.email) {
            if !existing.role.is_privileged() {
                tracing::warn!(
                    email = %existing.email,
                    "bootstrap admin email belongs to a non-admin account; leaving it unchanged"
                );
            }
            return Ok(());
        }

        let hash = hash_blocking(admin.password.clone()).await?;
        let fields = NewAccount::new("Admin", &admin.email, None, hash)?.with_role(Role::Privileged);
        let account = self.accounts.create(fields)?;
        tracing::info!(account_id = %account.id, "bootstrap admin created");
        Ok(())
    }

    // -------------------------
    // One-time codes
    // -------------------------

    /// Issue a fresh code for `email`, replacing any previous one.
    pub async fn send_code(&self, email: Option<&str>) -> Result<(), ServiceError> {
        let email = required(email).ok_or_else(|| ServiceError::validation("Email is required"))?;
        let email = normalize_email(email);

        let expires_at_ms = i64::try_from(self.otp_ttl.as_millis())
            .ok()
            .and_then(|ttl| now_ms().checked_add(ttl))
            .ok_or_else(|| ServiceError::Internal("one-time code lifetime out of range".into()))?;
        let code = generate_code();
        self.codes.put(&email, &code, expires_at_ms);

        if let Err(e) = self.mailer.send_code(&email, &code, self.otp_ttl).await {
            self.codes.delete(&email);
            return Err(ServiceError::Internal(e.to_string()));
        }

        tracing::info!(email = %email, "verification code sent");
        Ok(())
    }

    pub fn verify_code(&self, email: Option<&str>, otp: Option<&str>) -> Result<(), ServiceError> {
        let (Some(email), Some(otp)) = (required(email), required(otp)) else {
            return Err(ServiceError::validation("Email and OTP are required"));
        };
        let email = normalize_email(email);

        let stored = self.codes.get(&email).ok_or_else(|| {
            ServiceError::validation("OTP not found or expired. Please request a new code.")
        })?;

        if stored.is_expired(now_ms()) {
            self.codes.delete(&email);
            return Err(ServiceError::validation(
                "OTP has expired. Please request a new code.",
            ));
        }

        if stored.code != otp.trim() {
            return Err(ServiceError::validation("Invalid OTP. Please try again."));
        }

        self.codes.mark_verified(&email);
        Ok(())
    }

    // -------------------------
    // Accounts
    // -------------------------

    pub async fn register(&self, req: RegisterRequest) -> Result<AuthSession, ServiceError> {
        let (Some(name), Some(email), Some(password)) = (
            required(req.name.as_deref()),
            required(req.email.as_deref()),
            required(req.password.as_deref()),
        ) else {
            return Err(ServiceError::validation(
                "Name, email, and password are required",
            ));
        };
        let email = normalize_email(email);

        if !self.codes.is_verified(&email) {
            return Err(ServiceError::validation(
                "Please verify your email before registering",
            ));
        }

        if self.accounts.find_by_email(&email).is_some() {
            return Err(ServiceError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        let role = self.requested_role(req.role.as_deref())?;
        let hash = hash_blocking(password.to_string()).await?;
        let fields = NewAccount::new(name, &email, req.phone, hash)?.with_role(role);
        let account = self.accounts.create(fields)?;

        self.codes.delete(&email);
        tracing::info!(account_id = %account.id, role = %account.role, "account registered");

        self.session_for(&account, "User registered successfully")
    }

    pub async fn login(&self, req: LoginRequest) -> Result<AuthSession, ServiceError> {
        let (Some(email), Some(password)) = (
            required(req.email.as_deref()),
            required(req.password.as_deref()),
        ) else {
            return Err(ServiceError::validation("Email and password are required"));
        };

        let account = self
            .accounts
            .find_by_email(&normalize_email(email))
            .ok_or(ServiceError::InvalidCredentials)?;

        let hash = account.password_hash.clone();
        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || verify_password(&hash, &password))
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        if !matches {
            tracing::debug!(account_id = %account.id, "login rejected");
            return Err(ServiceError::InvalidCredentials);
        }

        self.session_for(&account, "Login successful")
    }

    fn requested_role(&self, role: Option<&str>) -> Result<Role, ServiceError> {
        let Some(raw) = required(role) else {
            return Ok(Role::Standard);
        };
        let role: Role = raw
            .parse()
            .map_err(|_| ServiceError::validation(format!("unknown role '{raw}'")))?;

        if role.is_privileged() && !self.allow_admin_signup {
            tracing::warn!("admin role requested at registration; ignoring");
            return Ok(Role::Standard);
        }
        Ok(role)
    }

    fn session_for(&self, account: &Account, message: &'static str) -> Result<AuthSession, ServiceError> {
        let token = self
            .codec
            .encode(&account.claim())
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(AuthSession {
            message,
            token,
            user: account.profile(),
        })
    }

    // -------------------------
    // Catalog and orders
    // -------------------------

    /// Buy `quantity` units of a single product. Returns the updated product
    /// and the cost of the purchase.
    pub fn purchase(&self, id: &ProductId, quantity: u32) -> Result<(Product, f64), ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::validation("Quantity must be at least 1"));
        }
        let product = self.products.take(id, quantity).map_err(|e| match e {
            StoreError::NotFound => ServiceError::NotFound("Sweet not found".to_string()),
            other => other.into(),
        })?;
        let total = product.price * f64::from(quantity);
        tracing::info!(product_id = %id, quantity, "purchase completed");
        Ok((product, total))
    }

    /// Check out a multi-line order for `claim`.
    ///
    /// Stock is taken line by line; if any line fails, the lines already taken
    /// are restocked before the error is returned.
    pub fn place_order(
        &self,
        claim: &IdentityClaim,
        req: CreateOrderRequest,
    ) -> Result<Order, ServiceError> {
        let lines = req.items.unwrap_or_default();
        if lines.is_empty() {
            return Err(ServiceError::validation("Order must have at least one item"));
        }
        let payment_method = req
            .payment_method
            .ok_or_else(|| ServiceError::validation("Payment method is required"))?;
        let address = req.delivery_address.unwrap_or_default();
        if address.trim().is_empty() {
            return Err(ServiceError::validation("Delivery address is required"));
        }

        let mut taken: Vec<(ProductId, u32)> = Vec::with_capacity(lines.len());
        let mut items = Vec::with_capacity(lines.len());

        for line in &lines {
            match self.take_line(&line.sweet_id, line.quantity) {
                Ok((id, item)) => {
                    taken.push((id, line.quantity));
                    items.push(item);
                }
                Err(e) => {
                    self.release(&taken);
                    return Err(e);
                }
            }
        }

        let order = match Order::place(
            OrderId::new(),
            claim.subject_id.clone(),
            items,
            payment_method,
            &address,
            Utc::now(),
        ) {
            Ok(order) => order,
            Err(e) => {
                self.release(&taken);
                return Err(e.into());
            }
        };

        let order = self.orders.insert(order);
        tracing::info!(
            order_id = %order.id,
            account_id = %claim.subject_id,
            total = order.total_amount,
            "order placed"
        );
        Ok(order)
    }

    fn take_line(&self, raw_id: &str, quantity: u32) -> Result<(ProductId, OrderItem), ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::validation("Quantity must be at least 1"));
        }
        let not_found = || ServiceError::NotFound(format!("Sweet not found: {raw_id}"));
        let id: ProductId = raw_id.parse().map_err(|_| not_found())?;
        let product = self.products.get(&id).ok_or_else(not_found)?;

        let insufficient = || {
            ServiceError::InvariantViolation(format!("Insufficient stock for {}", product.name))
        };
        if product.quantity < quantity {
            return Err(insufficient());
        }

        // Re-checked under the store lock; a concurrent buyer may have won.
        match self.products.take(&id, quantity) {
            Ok(_) => Ok((id, OrderItem::snapshot(&product, quantity))),
            Err(StoreError::NotFound) => Err(not_found()),
            Err(StoreError::Domain(DomainError::InvariantViolation(_))) => Err(insufficient()),
            Err(e) => Err(e.into()),
        }
    }

    fn release(&self, taken: &[(ProductId, u32)]) {
        for (id, quantity) in taken {
            if let Err(e) = self.products.restock(id, *quantity) {
                tracing::error!(product_id = %id, error = %e, "failed to roll back stock");
            }
        }
    }

    /// Admins see every order with the buyer's contact details; everyone else
    /// sees only their own.
    pub fn list_orders(&self, claim: &IdentityClaim) -> Vec<OrderView> {
        if !claim.role.is_privileged() {
            return self
                .orders
                .list_for_account(&claim.subject_id)
                .into_iter()
                .map(|order| OrderView { order, customer: None })
                .collect();
        }

        self.orders
            .list_all()
            .into_iter()
            .map(|order| {
                let customer = order
                    .account_id
                    .parse::<AccountId>()
                    .ok()
                    .and_then(|id| self.accounts.find_by_id(&id))
                    .map(|a| CustomerSummary {
                        name: a.name,
                        email: a.email,
                        phone: a.phone,
                        address: a.address,
                    });
                OrderView { order, customer }
            })
            .collect()
    }
}

fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

async fn hash_blocking(password: String) -> Result<String, ServiceError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?
        .map_err(|e| ServiceError::Internal(e.to_string()))
}
