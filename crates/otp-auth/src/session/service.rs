//! OTP request and verification flow.

use super::{mask_phone, validate_phone, OtpSession, SessionStore};
use crate::delivery::OtpDelivery;
use crate::error::OtpError;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Default lifetime of an OTP session, in seconds.
pub const DEFAULT_OTP_TTL_SECS: i64 = 120;

/// Result of a successful OTP request.
#[derive(Debug, Clone)]
pub struct IssuedOtp {
    pub session_id: String,
    /// Plaintext code. Only exposed to clients outside production.
    pub code: String,
}

/// Creates OTP sessions and verifies submitted codes against them.
#[derive(Clone)]
pub struct OtpService {
    store: Arc<dyn SessionStore>,
    delivery: Arc<dyn OtpDelivery>,
    ttl: Duration,
}

impl OtpService {
    pub fn new(store: Arc<dyn SessionStore>, delivery: Arc<dyn OtpDelivery>) -> Self {
        Self::with_ttl(store, delivery, Duration::seconds(DEFAULT_OTP_TTL_SECS))
    }

    pub fn with_ttl(
        store: Arc<dyn SessionStore>,
        delivery: Arc<dyn OtpDelivery>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            delivery,
            ttl,
        }
    }

    /// Start a verification for `phone` and hand the code to the delivery channel.
    #[instrument(skip_all, fields(phone = %mask_phone(phone)))]
    pub async fn create_session(&self, phone: &str) -> Result<IssuedOtp, OtpError> {
        validate_phone(phone)?;

        let session = OtpSession::new(phone.to_string(), self.ttl);
        let issued = IssuedOtp {
            session_id: session.session_id.clone(),
            code: session.code.clone(),
        };
        self.store.insert(session).await?;

        if let Err(e) = self
            .delivery
            .deliver(phone, &issued.code, &issued.session_id)
            .await
        {
            warn!(session_id = %issued.session_id, "OTP delivery failed: {}", e);
        }

        info!(session_id = %issued.session_id, "OTP session created");
        Ok(issued)
    }

    /// Check `code` against the session and consume it, returning the verified phone.
    #[instrument(skip_all, fields(session_id = %session_id))]
    pub async fn verify_session(&self, session_id: &str, code: &str) -> Result<String, OtpError> {
        if session_id.is_empty() || code.is_empty() {
            return Err(OtpError::MissingFields);
        }

        match self.store.consume(session_id, code, Utc::now()).await {
            Ok(session) => {
                info!(phone = %mask_phone(&session.phone), "OTP verified");
                Ok(session.phone)
            }
            Err(e) => {
                warn!("OTP verification rejected: {}", e);
                Err(e)
            }
        }
    }

    /// Number of sessions held by the store.
    pub async fn pending_sessions(&self) -> usize {
        self.store.len().await
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
