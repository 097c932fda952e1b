//! OTP Auth - Entry point.

use anyhow::{Context, Result};
use otp_auth::{
    api::{create_router, AppState},
    config::{Config, LogFormat},
    LogDelivery, MemorySessionStore, OtpService, TokenIssuer,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration; a missing signing secret stops us here.
    let config = Config::load().context("Failed to load configuration")?;

    init_logging(&config.log.level, config.log.format);

    info!("Starting OTP Auth service");

    let secret = config
        .token
        .jwt_secret
        .as_ref()
        .context("TOKEN__JWT_SECRET must be set")?;
    let tokens = TokenIssuer::new(secret, config.token_ttl()?)
        .context("Invalid token signing configuration")?;

    // Initialize session storage
    let store = MemorySessionStore::new();
    let reaper = store.spawn_reaper(config.otp.reap_interval);

    if !config.environment.is_production() {
        warn!("Running outside production: OTP codes are returned in responses");
    }

    let otp = OtpService::with_ttl(Arc::new(store), Arc::new(LogDelivery), config.otp_ttl()?);
    let state = AppState::new(otp, tokens, config.environment);
    let app = create_router(state);

    let addr = SocketAddr::new(
        config
            .server
            .listen_addr
            .parse()
            .with_context(|| format!("Invalid listen address: {}", config.server.listen_addr))?,
        config.server.port,
    );

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Auth server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    reaper.abort();
    info!("Shutdown complete");

    Ok(())
}

fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
