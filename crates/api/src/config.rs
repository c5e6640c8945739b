//! Process configuration, read once from the environment at startup.

use std::time::Duration;

use anyhow::Context;

/// Insecure fallback used only when `JWT_SECRET` is unset.
pub const DEV_JWT_SECRET: &str = "dev-secret";

/// Upper bound for `OTP_TTL_SECS` (one day).
pub const MAX_OTP_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Clone)]
pub struct ApiConfig {
    /// HS256 signing secret for identity tokens.
    pub jwt_secret: String,
    pub bind_addr: String,
    /// Honour `role: "admin"` in registration requests.
    pub allow_admin_signup: bool,
    /// Lifetime of emailed verification codes.
    pub otp_ttl: Duration,
    /// Account created with the admin role at startup when absent.
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            bind_addr: "0.0.0.0:8080".to_string(),
            allow_admin_signup: false,
            otp_ttl: Duration::from_secs(10 * 60),
            bootstrap_admin: None,
        }
    }
}

impl ApiConfig {
    /// Read `JWT_SECRET`, `BIND_ADDR`, `ALLOW_ADMIN_SIGNUP`, `OTP_TTL_SECS`,
    /// `ADMIN_EMAIL` and `ADMIN_PASSWORD`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => config.jwt_secret = secret,
            None => tracing::warn!("JWT_SECRET not set; using insecure dev default"),
        }

        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr;
        }

        if let Some(flag) = lookup("ALLOW_ADMIN_SIGNUP") {
            config.allow_admin_signup = flag
                .parse()
                .with_context(|| format!("ALLOW_ADMIN_SIGNUP must be true or false, got '{flag}'"))?;
        }

        if let Some(secs) = lookup("OTP_TTL_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("OTP_TTL_SECS must be a number of seconds, got '{secs}'"))?;
            if secs == 0 || secs > MAX_OTP_TTL_SECS {
                anyhow::bail!("OTP_TTL_SECS must be between 1 and {MAX_OTP_TTL_SECS}, got {secs}");
            }
            config.otp_ttl = Duration::from_secs(secs);
        }

        config.bootstrap_admin = match (lookup("ADMIN_EMAIL"), lookup("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            (None, None) => None,
            _ => anyhow::bail!("ADMIN_EMAIL and ADMIN_PASSWORD must be set together"),
        };

        Ok(config)
    }

    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: secret.into(),
            ..Self::default()
        }
    }
}

impl core::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("jwt_secret", &"<redacted>")
            .field("bind_addr", &self.bind_addr)
            .field("allow_admin_signup", &self.allow_admin_signup)
            .field("otp_ttl", &self.otp_ttl)
            .field(
                "bootstrap_admin",
                &self.bootstrap_admin.as_ref().map(|a| a.email.as_str()),
            )
            .finish()
    }
}
