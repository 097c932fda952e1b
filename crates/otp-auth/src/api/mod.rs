//! HTTP API for the OTP service.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::logging_middleware;
pub use types::*;

use crate::config::Environment;
use crate::session::OtpService;
use crate::token::TokenIssuer;
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// OTP session lifecycle
    pub otp: OtpService,
    /// Session token signer
    pub tokens: Arc<TokenIssuer>,
    /// Controls whether codes are echoed back to clients
    pub environment: Environment,
}

impl AppState {
    /// Create new application state.
    pub fn new(otp: OtpService, tokens: TokenIssuer, environment: Environment) -> Self {
        Self {
            otp,
            tokens: Arc::new(tokens),
            environment,
        }
    }
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/send-otp", post(handlers::send_otp))
        .route("/auth/verify-otp", post(handlers::verify_otp))
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
