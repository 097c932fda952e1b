//! API request and response types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request to send an OTP to a phone number.
///
/// Fields are kept as raw JSON so a wrongly typed value is reported as
/// an invalid phone rather than rejected by the extractor.
#[derive(Debug, Default, Deserialize)]
pub struct SendOtpRequest {
    /// Phone number in E.164 format
    #[serde(default)]
    pub phone: Option<Value>,
}

/// Response after creating an OTP session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpResponse {
    pub session_id: String,

    /// Plaintext code, only outside production
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
}

/// Request to verify an OTP.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub session_id: Option<Value>,

    #[serde(default)]
    pub code: Option<Value>,
}

/// A request field as the client sent it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field<'a> {
    /// Absent, `null` or the empty string
    Blank,
    Text(&'a str),
    /// Any other JSON type; can never match a stored value
    Other,
}

impl<'a> Field<'a> {
    pub fn of(value: &'a Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) => Field::Blank,
            Some(Value::String(s)) if s.is_empty() => Field::Blank,
            Some(Value::String(s)) => Field::Text(s),
            Some(_) => Field::Other,
        }
    }
}

/// Response after successful verification.
#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub token: String,
    pub user: UserInfo,
}

/// Identity bound to the issued token.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub phone: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}
