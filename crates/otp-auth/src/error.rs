//! Error types for the OTP service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// OTP service error types.
#[derive(Debug, Error)]
pub enum OtpError {
    #[error("Invalid phone (E.164 required, e.g., +91xxxxxxxxxx)")]
    InvalidPhoneFormat,

    #[error("Missing sessionId/code")]
    MissingFields,

    #[error("Invalid session")]
    InvalidSession,

    #[error("OTP expired")]
    Expired,

    #[error("Invalid code")]
    InvalidCode,

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OtpError {
    /// Whether the error was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            OtpError::InvalidPhoneFormat
                | OtpError::MissingFields
                | OtpError::InvalidSession
                | OtpError::Expired
                | OtpError::InvalidCode
        )
    }

    fn code(&self) -> &'static str {
        match self {
            OtpError::InvalidPhoneFormat => "INVALID_PHONE_FORMAT",
            OtpError::MissingFields => "MISSING_FIELDS",
            OtpError::InvalidSession => "INVALID_SESSION",
            OtpError::Expired => "EXPIRED",
            OtpError::InvalidCode => "INVALID_CODE",
            OtpError::Delivery(_) | OtpError::Config(_) | OtpError::Internal(_) => {
                "INTERNAL_ERROR"
            }
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for OtpError {
    fn into_response(self) -> Response {
        let (status, message) = if self.is_client_error() {
            (StatusCode::BAD_REQUEST, self.to_string())
        } else {
            // Internals stay in the log.
            error!(error = %self, "Request failed with internal error");
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
        };

        let body = ErrorResponse {
            error: message,
            code: self.code().to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<jsonwebtoken::errors::Error> for OtpError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        OtpError::Internal(format!("Token error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_bad_request() {
        for err in [
            OtpError::InvalidPhoneFormat,
            OtpError::MissingFields,
            OtpError::InvalidSession,
            OtpError::Expired,
            OtpError::InvalidCode,
        ] {
            assert!(err.is_client_error());
            assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_internal_errors_are_generic() {
        let err = OtpError::Internal("signing key exploded".into());
        assert!(!err.is_client_error());
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages_are_distinguishable() {
        let messages: Vec<String> = [
            OtpError::MissingFields,
            OtpError::InvalidSession,
            OtpError::Expired,
            OtpError::InvalidCode,
        ]
        .iter()
        .map(|e| e.to_string())
        .collect();

        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
