//! OTP sessions: records, storage and the verification lifecycle.

mod memory;
mod service;

pub use memory::MemorySessionStore;
pub use service::{IssuedOtp, OtpService, DEFAULT_OTP_TTL_SECS};

use crate::error::OtpError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use uuid::Uuid;

/// E.164: `+`, a non-zero leading digit, 7 to 15 ASCII digits in total.
static E164_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+[1-9][0-9]{6,14}$").expect("E.164 pattern is valid"));

/// One outstanding OTP challenge.
///
/// Sessions are never mutated after creation. They leave the store when
/// verified, or when a reaper sweeps them after expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpSession {
    /// Opaque lookup key
    pub session_id: String,
    /// Phone number in E.164 format
    pub phone: String,
    /// Six-digit numeric code
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl OtpSession {
    /// Create a new session for `phone` with a fresh id and code.
    pub fn new(phone: String, ttl: Duration) -> Self {
        let created_at = Utc::now();
        Self {
            session_id: generate_session_id(),
            phone,
            code: generate_code(),
            created_at,
            expires_at: created_at + ttl,
        }
    }

    /// A session is still valid at the exact instant of `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Storage backend for pending sessions.
///
/// Implementations must make [`SessionStore::consume`] atomic with respect
/// to concurrent callers using the same session id: at most one caller may
/// ever receive `Ok` for a given session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a newly created session.
    async fn insert(&self, session: OtpSession) -> Result<(), OtpError>;

    /// Look up, check and delete a session in one step.
    ///
    /// Unknown id yields `InvalidSession`, an expired session `Expired`
    /// and a mismatched code `InvalidCode`. Only a success removes the
    /// session.
    async fn consume(
        &self,
        session_id: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<OtpSession, OtpError>;

    /// Remove every session expired at `now`, returning how many were dropped.
    async fn purge_expired(&self, now: DateTime<Utc>) -> usize;

    /// Number of sessions currently held, expired or not.
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Check that `phone` is a well-formed E.164 number.
pub fn validate_phone(phone: &str) -> Result<(), OtpError> {
    if E164_REGEX.is_match(phone) {
        Ok(())
    } else {
        Err(OtpError::InvalidPhoneFormat)
    }
}

/// Uniformly random six-digit code.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// 122 random bits, hex encoded.
pub fn generate_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Mask a phone number for logs, keeping the country prefix and last 4 digits.
pub fn mask_phone(phone: &str) -> String {
    let len = phone.chars().count();
    if len <= 7 {
        return "*".repeat(len);
    }
    let head: String = phone.chars().take(3).collect();
    let tail: String = phone.chars().skip(len - 4).collect();
    format!("{}{}{}", head, "*".repeat(len - 7), tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_validate_phone_accepts_e164() {
        for phone in ["+919876543210", "+14155551234", "+1234567", "+123456789012345"] {
            assert!(validate_phone(phone).is_ok(), "{} should be valid", phone);
        }
    }

    #[test]
    fn test_validate_phone_rejects_malformed() {
        for phone in [
            "",
            "+",
            "919876543210",
            "+019876543210",
            "+123456",
            "+1234567890123456",
            "+1 415 555 1234",
            "+1415555123a",
            " +14155551234",
            "+14155551234\n",
            "+١٤١٥٥٥٥١٢٣٤",
        ] {
            assert!(
                matches!(validate_phone(phone), Err(OtpError::InvalidPhoneFormat)),
                "{:?} should be rejected",
                phone
            );
        }
    }

    #[test]
    fn test_generate_code_range() {
        for _ in 0..1000 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            let value: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&value));
        }
    }

    #[test]
    fn test_generate_session_id_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_session_id()).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| id.len() == 32));
    }

    #[test]
    fn test_session_expiry_boundary() {
        let session = OtpSession::new("+14155551234".into(), Duration::seconds(120));

        assert_eq!(session.expires_at - session.created_at, Duration::seconds(120));
        assert!(!session.is_expired(session.created_at));
        assert!(!session.is_expired(session.expires_at));
        assert!(session.is_expired(session.expires_at + Duration::milliseconds(1)));
    }

    #[test]
    fn test_mask_phone() {
        assert_eq!(mask_phone("+919876543210"), "+91******3210");
        assert_eq!(mask_phone("+1234567"), "+12*4567");
        assert_eq!(mask_phone("+12345"), "******");
    }
}
