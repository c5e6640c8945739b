//! Delivery of one-time codes (email transport lives outside this workspace).

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("code delivery failed: {0}")]
pub struct MailError(pub String);

#[async_trait]
pub trait CodeMailer: Send + Sync {
    async fn send_code(&self, email: &str, code: &str, valid_for: Duration) -> Result<(), MailError>;
}

/// Dev mailer: writes the code to the log instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl CodeMailer for LogMailer {
    async fn send_code(&self, email: &str, code: &str, valid_for: Duration) -> Result<(), MailError> {
        tracing::info!(
            email,
            code,
            valid_for_secs = valid_for.as_secs(),
            "verification code issued (log delivery)"
        );
        Ok(())
    }
}
