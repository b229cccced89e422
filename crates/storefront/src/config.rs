//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DUKA_API_BASE_URL` - Base URL of the remote shop API (the PHP backend)
//!
//! ## Optional
//! - `DUKA_HOST` - Bind address (default: 127.0.0.1)
//! - `DUKA_PORT` - Listen port (default: 3000)
//! - `DUKA_BASE_URL` - Public URL for the storefront (default: http://localhost:3000)
//! - `DUKA_PAYBILL_NUMBER` - M-Pesa paybill business number (default: 522533)
//! - `DUKA_PAYBILL_ACCOUNT` - M-Pesa paybill account number (default: 7577359)
//! - `DUKA_PAYMENT_POLL_INTERVAL_MS` - Payment status poll interval (default: 3000)
//! - `DUKA_CHECKOUT_TTL_SECS` - How long an unresolved checkout keeps polling (default: 600)
//! - `DUKA_WHATSAPP_NUMBER` - WhatsApp contact number for the shell button
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Sentry tracing sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

/// Default payment status poll interval; matches the 3 second cadence
/// the backend is designed to be queried at.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;

/// Default lifetime of an unresolved checkout (10 minutes). A visitor
/// who abandons the dialog without closing it stops being polled for
/// after this long.
pub const DEFAULT_CHECKOUT_TTL_SECS: u64 = 600;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Base URL of the remote shop API
    pub api_base_url: String,
    /// Manual payment (paybill) details shown in the checkout dialog
    pub paybill: PaybillConfig,
    /// Interval between payment status polls
    pub poll_interval: Duration,
    /// How long an unresolved checkout may keep polling before it is
    /// abandoned and torn down
    pub checkout_ttl: Duration,
    /// WhatsApp contact number for the floating shell button
    pub whatsapp_number: Option<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry tracing sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Fixed merchant identifiers for the manual-reference payment method.
#[derive(Debug, Clone)]
pub struct PaybillConfig {
    /// Paybill business number
    pub number: String,
    /// Account number the customer must quote
    pub account: String,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("DUKA_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("DUKA_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("DUKA_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("DUKA_PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default("DUKA_BASE_URL", "http://localhost:3000");
        let api_base_url = get_required_env("DUKA_API_BASE_URL")?;

        let paybill = PaybillConfig {
            number: get_env_or_default("DUKA_PAYBILL_NUMBER", "522533"),
            account: get_env_or_default("DUKA_PAYBILL_ACCOUNT", "7577359"),
        };

        let poll_interval = parse_poll_interval(get_optional_env("DUKA_PAYMENT_POLL_INTERVAL_MS"))?;
        let checkout_ttl = parse_checkout_ttl(get_optional_env("DUKA_CHECKOUT_TTL_SECS"))?;

        let sentry_sample_rate = get_env_or_default("SENTRY_SAMPLE_RATE", "1.0")
            .parse::<f32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SENTRY_SAMPLE_RATE".to_string(), e.to_string())
            })?;
        let sentry_traces_sample_rate = get_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")
            .parse::<f32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SENTRY_TRACES_SAMPLE_RATE".to_string(), e.to_string())
            })?;

        Ok(Self {
            host,
            port,
            base_url,
            api_base_url,
            paybill,
            poll_interval,
            checkout_ttl,
            whatsapp_number: get_optional_env("DUKA_WHATSAPP_NUMBER"),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Parse the poll interval override, falling back to the 3000 ms default.
///
/// A zero interval is rejected: it would spin the poller.
fn parse_poll_interval(raw: Option<String>) -> Result<Duration, ConfigError> {
    let Some(raw) = raw else {
        return Ok(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS));
    };
    let millis = raw.parse::<u64>().map_err(|e| {
        ConfigError::InvalidEnvVar("DUKA_PAYMENT_POLL_INTERVAL_MS".to_string(), e.to_string())
    })?;
    if millis == 0 {
        return Err(ConfigError::InvalidEnvVar(
            "DUKA_PAYMENT_POLL_INTERVAL_MS".to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_millis(millis))
}

/// Parse the checkout TTL override, falling back to the 10 minute default.
///
/// A zero TTL is rejected: the poller would never get a tick in.
fn parse_checkout_ttl(raw: Option<String>) -> Result<Duration, ConfigError> {
    let Some(raw) = raw else {
        return Ok(Duration::from_secs(DEFAULT_CHECKOUT_TTL_SECS));
    };
    let secs = raw.parse::<u64>().map_err(|e| {
        ConfigError::InvalidEnvVar("DUKA_CHECKOUT_TTL_SECS".to_string(), e.to_string())
    })?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            "DUKA_CHECKOUT_TTL_SECS".to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            api_base_url: "http://localhost/api".to_string(),
            paybill: PaybillConfig {
                number: "522533".to_string(),
                account: "7577359".to_string(),
            },
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            checkout_ttl: Duration::from_secs(DEFAULT_CHECKOUT_TTL_SECS),
            whatsapp_number: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    #[test]
    fn test_socket_addr() {
        let config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_poll_interval_default() {
        let interval = parse_poll_interval(None).unwrap();
        assert_eq!(interval, Duration::from_millis(3000));
    }

    #[test]
    fn test_poll_interval_override() {
        let interval = parse_poll_interval(Some("250".to_string())).unwrap();
        assert_eq!(interval, Duration::from_millis(250));
    }

    #[test]
    fn test_poll_interval_rejects_zero() {
        assert!(parse_poll_interval(Some("0".to_string())).is_err());
    }

    #[test]
    fn test_poll_interval_rejects_garbage() {
        assert!(parse_poll_interval(Some("soon".to_string())).is_err());
    }

    #[test]
    fn test_checkout_ttl_default_and_override() {
        assert_eq!(
            parse_checkout_ttl(None).unwrap(),
            Duration::from_secs(600)
        );
        assert_eq!(
            parse_checkout_ttl(Some("90".to_string())).unwrap(),
            Duration::from_secs(90)
        );
    }

    #[test]
    fn test_checkout_ttl_rejects_zero() {
        assert!(parse_checkout_ttl(Some("0".to_string())).is_err());
    }
}
