//! Out-of-band delivery of OTP codes.
//!
//! Real SMS providers live outside this crate. The service only needs
//! something that accepts `(phone, code, session_id)`; the result is
//! logged and never changes the outcome of an OTP request.

use crate::error::OtpError;
use async_trait::async_trait;
use tracing::info;

/// Channel that carries a code to the phone's owner.
#[async_trait]
pub trait OtpDelivery: Send + Sync {
    /// Deliver `code` for `session_id` to `phone`.
    async fn deliver(&self, phone: &str, code: &str, session_id: &str) -> Result<(), OtpError>;
}

/// Development channel that writes codes to the log.
#[derive(Debug, Clone, Default)]
pub struct LogDelivery;

#[async_trait]
impl OtpDelivery for LogDelivery {
    async fn deliver(&self, phone: &str, code: &str, session_id: &str) -> Result<(), OtpError> {
        info!(target: "otp_auth::delivery", %phone, %code, %session_id, "[DEV] OTP issued");
        Ok(())
    }
}
