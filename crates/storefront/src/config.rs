//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (`https` enables secure cookies)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_DATABASE_URL` / `DATABASE_URL` - `PostgreSQL` session store; in-memory sessions if unset
//! - `STOREFRONT_CATALOG_PATH` - Catalog JSON file (default: crates/storefront/catalog.json)
//! - `STOREFRONT_CURRENCY` - ISO 4217 currency code (default: AED)
//! - `STOREFRONT_TAX_RATE` - Tax rate as a fraction (default: 0.05)
//! - `STOREFRONT_SHIPPING_FLAT` - Shipping below the free threshold (default: 25)
//! - `STOREFRONT_FREE_SHIPPING_THRESHOLD` - Free shipping from this amount (default: 200, empty disables)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance traces sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use nexus_core::cart::PricingRules;
use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

/// Default location of the catalog file, relative to the workspace root.
pub const DEFAULT_CATALOG_PATH: &str = "crates/storefront/catalog.json";

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
    /// `PostgreSQL` URL for the session store (contains password)
    pub database_url: Option<SecretString>,
    /// Catalog JSON file
    pub catalog_path: PathBuf,
    /// Currency, tax and shipping rules
    pub pricing: PricingRules,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl Default for StorefrontConfig {
    /// Local development settings: loopback on port 3000, in-memory sessions.
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            database_url: None,
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            pricing: PricingRules::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }
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

        let defaults = Self::default();

        let host = parse_env("STOREFRONT_HOST", defaults.host)?;
        let port = parse_env("STOREFRONT_PORT", defaults.port)?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        let database_url = get_database_url("STOREFRONT_DATABASE_URL");
        let catalog_path = get_optional_env("STOREFRONT_CATALOG_PATH")
            .map_or(defaults.catalog_path, PathBuf::from);
        let pricing = pricing_from_env(defaults.pricing)?;

        Ok(Self {
            host,
            port,
            base_url,
            database_url,
            catalog_path,
            pricing,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", defaults.sentry_sample_rate)?,
            sentry_traces_sample_rate: parse_env(
                "SENTRY_TRACES_SAMPLE_RATE",
                defaults.sentry_traces_sample_rate,
            )?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should be marked `Secure`.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

fn pricing_from_env(defaults: PricingRules) -> Result<PricingRules, ConfigError> {
    let currency = parse_env("STOREFRONT_CURRENCY", defaults.currency)?;
    let tax_rate = parse_env("STOREFRONT_TAX_RATE", defaults.tax_rate)?;
    let shipping_flat = parse_env("STOREFRONT_SHIPPING_FLAT", defaults.shipping_flat)?;
    let free_shipping_threshold = match std::env::var("STOREFRONT_FREE_SHIPPING_THRESHOLD") {
        Ok(raw) => parse_threshold(&raw).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_FREE_SHIPPING_THRESHOLD".to_string(), e)
        })?,
        Err(_) => defaults.free_shipping_threshold,
    };

    validate_pricing(&PricingRules {
        currency,
        tax_rate,
        shipping_flat,
        free_shipping_threshold,
    })
}

/// Reject rates and amounts that cannot be right.
fn validate_pricing(rules: &PricingRules) -> Result<PricingRules, ConfigError> {
    if rules.tax_rate < Decimal::ZERO || rules.tax_rate >= Decimal::ONE {
        return Err(ConfigError::InvalidEnvVar(
            "STOREFRONT_TAX_RATE".to_string(),
            format!("must be in [0, 1) (got {})", rules.tax_rate),
        ));
    }
    if rules.shipping_flat < Decimal::ZERO {
        return Err(ConfigError::InvalidEnvVar(
            "STOREFRONT_SHIPPING_FLAT".to_string(),
            "must not be negative".to_string(),
        ));
    }
    Ok(rules.clone())
}

/// Parse the free-shipping threshold. Empty means disabled.
fn parse_threshold(raw: &str) -> Result<Option<Decimal>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let value = Decimal::from_str(raw).map_err(|e| e.to_string())?;
    if value < Decimal::ZERO {
        return Err("must not be negative".to_string());
    }
    Ok(Some(value))
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .filter(|value| !value.is_empty())
        .map(SecretString::from)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nexus_core::CurrencyCode;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::default();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert!(!config.is_secure());
        assert!(config.database_url.is_none());
        assert_eq!(config.pricing.currency, CurrencyCode::AED);
    }

    #[test]
    fn test_is_secure() {
        let config = StorefrontConfig {
            base_url: "https://shop.example".to_string(),
            ..StorefrontConfig::default()
        };
        assert!(config.is_secure());
    }

    #[test]
    fn test_parse_threshold() {
        assert_eq!(parse_threshold("").unwrap(), None);
        assert_eq!(parse_threshold("  ").unwrap(), None);
        assert_eq!(
            parse_threshold("150.50").unwrap(),
            Some(Decimal::new(15_050, 2))
        );
        assert!(parse_threshold("-1").is_err());
        assert!(parse_threshold("lots").is_err());
    }

    #[test]
    fn test_validate_pricing() {
        let ok = PricingRules::default();
        assert!(validate_pricing(&ok).is_ok());

        let bad_tax = PricingRules {
            tax_rate: Decimal::ONE,
            ..PricingRules::default()
        };
        assert!(matches!(
            validate_pricing(&bad_tax),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "STOREFRONT_TAX_RATE"
        ));

        let bad_shipping = PricingRules {
            shipping_flat: Decimal::new(-5, 0),
            ..PricingRules::default()
        };
        assert!(validate_pricing(&bad_shipping).is_err());
    }
}
