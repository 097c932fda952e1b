//! HTTP request handlers.

use super::types::{
    Field, HealthResponse, SendOtpRequest, SendOtpResponse, UserInfo, VerifyOtpRequest,
    VerifyOtpResponse,
};
use super::AppState;
use crate::error::OtpError;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::debug;

/// Unwrap a JSON body, reading an unusable one as an empty request.
///
/// A missing content type or malformed body then fails with the same
/// `{error, code}` 400 as a request that omitted its fields.
fn body_or_default<T: Default>(payload: Result<Json<T>, JsonRejection>) -> T {
    match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Unusable request body: {}", rejection.body_text());
            T::default()
        }
    }
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let pending_sessions = state.otp.pending_sessions().await;
    debug!(pending_sessions, "Health check");
    Json(HealthResponse { ok: true })
}

/// Create an OTP session for a phone number.
pub async fn send_otp(
    State(state): State<AppState>,
    payload: Result<Json<SendOtpRequest>, JsonRejection>,
) -> Result<Json<SendOtpResponse>, OtpError> {
    let request = body_or_default(payload);
    let phone = match Field::of(&request.phone) {
        Field::Text(phone) => phone,
        Field::Blank | Field::Other => return Err(OtpError::InvalidPhoneFormat),
    };

    let issued = state.otp.create_session(phone).await?;

    let debug = (!state.environment.is_production()).then_some(issued.code);

    Ok(Json(SendOtpResponse {
        session_id: issued.session_id,
        debug,
    }))
}

/// Verify an OTP and exchange it for a session token.
pub async fn verify_otp(
    State(state): State<AppState>,
    payload: Result<Json<VerifyOtpRequest>, JsonRejection>,
) -> Result<Json<VerifyOtpResponse>, OtpError> {
    let request = body_or_default(payload);

    let phone = match (Field::of(&request.session_id), Field::of(&request.code)) {
        (Field::Blank, _) | (_, Field::Blank) => return Err(OtpError::MissingFields),
        (Field::Other, _) => return Err(OtpError::InvalidSession),
        (Field::Text(_), Field::Other) => return Err(OtpError::InvalidCode),
        (Field::Text(session_id), Field::Text(code)) => {
            state.otp.verify_session(session_id, code).await?
        }
    };

    let issued = state.tokens.issue(&phone)?;

    Ok(Json(VerifyOtpResponse {
        token: issued.token,
        user: UserInfo {
            id: issued.subject,
            phone,
        },
    }))
}
