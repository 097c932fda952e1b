//! Session token issuance.
//!
//! A verified phone number becomes an HS256 JWT. The subject id is the
//! unpadded base64url encoding of the phone number itself, so anyone
//! holding a token can recover the number from `sub`. Downstream services
//! rely on that, so it is kept as is.

use crate::error::OtpError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default token lifetime, in seconds (7 days).
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Shortest accepted signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 16;

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject id derived from the phone number
    pub sub: String,
    /// Verified phone number in E.164 format
    pub phone: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
}

/// A freshly signed token and the subject it was issued for.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub subject: String,
}

/// Derive the subject id for a phone number.
pub fn subject_for_phone(phone: &str) -> String {
    URL_SAFE_NO_PAD.encode(phone.as_bytes())
}

/// Recover the phone number from a subject id.
pub fn phone_for_subject(subject: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(subject).ok()?;
    String::from_utf8(bytes).ok()
}

/// Signs session tokens with a server-held secret.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer from the signing secret.
    ///
    /// An empty or short secret is a configuration error; callers are
    /// expected to fail startup on it.
    pub fn new(secret: &SecretString, ttl: Duration) -> Result<Self, OtpError> {
        let secret = secret.expose_secret().as_bytes();
        if secret.len() < MIN_SECRET_LEN {
            return Err(OtpError::Config(format!(
                "JWT secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        })
    }

    /// Issue a token for a verified phone number.
    pub fn issue(&self, phone: &str) -> Result<IssuedToken, OtpError> {
        let subject = subject_for_phone(phone);
        let now = Utc::now();
        let claims = Claims {
            sub: subject.clone(),
            phone: phone.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        debug!(sub = %subject, exp = claims.exp, "Session token issued");

        Ok(IssuedToken { token, subject })
    }

    /// Validate a token's signature and expiry and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, OtpError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
