//! Configuration for the OTP service.

use anyhow::{bail, Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

/// Service configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Deployment environment
    #[serde(default)]
    pub environment: Environment,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// OTP session configuration
    #[serde(default)]
    pub otp: OtpConfig,

    /// Token signing configuration
    #[serde(default)]
    pub token: TokenConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

/// Deployment environment. Outside production the OTP code is echoed
/// back in the `debug` field of the OTP response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtpConfig {
    /// How long a session stays verifiable
    #[serde(default = "default_otp_ttl", with = "humantime_serde")]
    pub ttl: Duration,

    /// How often expired sessions are swept from memory
    #[serde(default = "default_reap_interval", with = "humantime_serde")]
    pub reap_interval: Duration,
}

#[derive(Debug, Deserialize)]
pub struct TokenConfig {
    /// HMAC signing secret. Required.
    pub jwt_secret: Option<SecretString>,

    /// Token lifetime
    #[serde(default = "default_token_ttl", with = "humantime_serde")]
    pub ttl: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl: default_otp_ttl(),
            reap_interval: default_reap_interval(),
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            ttl: default_token_ttl(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    3000
}

fn default_otp_ttl() -> Duration {
    Duration::from_secs(2 * 60)
}

fn default_reap_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_token_ttl() -> Duration {
    Duration::from_secs(7 * 24 * 60 * 60)
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    // Keep values as strings; serde does the typing.
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the service cannot safely start with.
    pub fn validate(&self) -> Result<()> {
        if self.token.jwt_secret.is_none() {
            bail!("TOKEN__JWT_SECRET must be set");
        }
        if self.otp.ttl.is_zero() {
            bail!("OTP__TTL must be greater than zero");
        }
        if self.otp.reap_interval.is_zero() {
            bail!("OTP__REAP_INTERVAL must be greater than zero");
        }
        Ok(())
    }

    /// OTP session lifetime as a wall-clock offset.
    pub fn otp_ttl(&self) -> Result<chrono::Duration> {
        chrono::Duration::from_std(self.otp.ttl).context("OTP__TTL is out of range")
    }

    /// Token lifetime as a wall-clock offset.
    pub fn token_ttl(&self) -> Result<chrono::Duration> {
        chrono::Duration::from_std(self.token.ttl).context("TOKEN__TTL is out of range")
    }
}
