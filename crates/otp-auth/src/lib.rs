//! OTP Auth - phone number verification with one-time passcodes.
//!
//! The service:
//! - Issues short-lived six-digit codes bound to an opaque session id
//! - Consumes a session exactly once when the matching code is submitted
//! - Exchanges the verified phone number for a signed session token

pub mod api;
pub mod config;
pub mod delivery;
pub mod error;
pub mod session;
pub mod token;

pub use config::Config;
pub use delivery::{LogDelivery, OtpDelivery};
pub use error::OtpError;
pub use session::{IssuedOtp, MemorySessionStore, OtpService, OtpSession, SessionStore};
pub use token::{Claims, IssuedToken, TokenIssuer};
