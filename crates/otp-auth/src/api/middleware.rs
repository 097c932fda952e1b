//! Request logging middleware.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{debug, error, info};

/// Log each request with its outcome.
///
/// Rejected codes and malformed numbers are routine for an OTP endpoint,
/// so 4xx responses are logged at info; only 5xx is an error.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let start = Instant::now();

    debug!(%method, %path, "Request started");

    let response = next.run(request).await;

    let elapsed_ms = start.elapsed().as_millis() as u64;
    let status = response.status();

    if status.is_server_error() {
        error!(%method, %path, %status, elapsed_ms, "Request failed");
    } else if status.is_client_error() {
        info!(%method, %path, %status, elapsed_ms, "Request rejected");
    } else {
        debug!(%method, %path, %status, elapsed_ms, "Request completed");
    }

    response
}
