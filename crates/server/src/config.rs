//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MEDBASKET_DATABASE_URL` - `PostgreSQL` connection string
//! - `MEDBASKET_BASE_URL` - Public URL for the API
//! - `MEDBASKET_TOKEN_SECRET` - JWT signing secret (min 32 chars, high entropy)
//! - `SMS_API_BASE_URL` / `SMS_SENDER_ID` / `SMS_API_KEY` - OTP delivery provider
//! - `PAYMENT_API_BASE_URL` / `PAYMENT_APP_ID` / `PAYMENT_SECRET_KEY` /
//!   `PAYMENT_WEBHOOK_SECRET` - Hosted-checkout payment gateway
//! - `PLACES_API_BASE_URL` / `PLACES_API_KEY` - Places autocomplete provider
//! - `STORAGE_API_BASE_URL` / `STORAGE_API_KEY` - Image storage provider
//!
//! ## Optional
//! - `MEDBASKET_HOST` - Bind address (default: 127.0.0.1)
//! - `MEDBASKET_PORT` - Listen port (default: 3000)
//! - `MEDBASKET_TOKEN_TTL_MINUTES` - Auth token lifetime (default: 10080, one week)
//! - `PAYMENT_RETURN_URL` - Where the gateway sends the shopper back
//!   (default: `MEDBASKET_BASE_URL`)
//! - `MEDBASKET_CORS_ORIGINS` - Comma-separated browser origins allowed to
//!   call the API with credentials (default: none, same-origin only)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` / `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Medbasket API server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the API
    pub base_url: String,
    /// JWT signing secret for the `token` cookie
    pub token_secret: SecretString,
    /// Auth token lifetime in minutes
    pub token_ttl_minutes: i64,
    /// Browser origins allowed to call the API with the session cookie
    pub cors_origins: Vec<String>,
    /// SMS/OTP provider configuration
    pub sms: SmsConfig,
    /// Payment gateway configuration
    pub payments: PaymentConfig,
    /// Places autocomplete provider configuration
    pub places: PlacesConfig,
    /// Image storage provider configuration
    pub storage: StorageConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g., production, staging)
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 - 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry performance trace sample rate (0.0 - 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// SMS/OTP delivery provider configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct SmsConfig {
    /// Provider API base URL
    pub base_url: String,
    /// Registered sender ID for outbound messages
    pub sender_id: String,
    /// Provider API key (server-side only)
    pub api_key: SecretString,
}

impl std::fmt::Debug for SmsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsConfig")
            .field("base_url", &self.base_url)
            .field("sender_id", &self.sender_id)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Hosted-checkout payment gateway configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct PaymentConfig {
    /// Gateway API base URL
    pub base_url: String,
    /// Gateway application/client ID
    pub app_id: String,
    /// Gateway secret key (server-side only)
    pub secret_key: SecretString,
    /// Shared secret for verifying webhook signatures
    pub webhook_secret: SecretString,
    /// URL the gateway redirects the shopper to after payment
    pub return_url: String,
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("base_url", &self.base_url)
            .field("app_id", &self.app_id)
            .field("secret_key", &"[REDACTED]")
            .field("webhook_secret", &"[REDACTED]")
            .field("return_url", &self.return_url)
            .finish()
    }
}

/// Places autocomplete provider configuration.
#[derive(Clone)]
pub struct PlacesConfig {
    /// Provider API base URL
    pub base_url: String,
    /// Provider API key (server-side only)
    pub api_key: SecretString,
}

impl std::fmt::Debug for PlacesConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlacesConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Image storage provider configuration.
#[derive(Clone)]
pub struct StorageConfig {
    /// Provider API base URL
    pub base_url: String,
    /// Provider API key (server-side only)
    pub api_key: SecretString,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("MEDBASKET_DATABASE_URL")?;
        let host = get_env_or_default("MEDBASKET_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("MEDBASKET_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("MEDBASKET_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("MEDBASKET_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("MEDBASKET_BASE_URL")?;
        let token_secret = get_validated_secret("MEDBASKET_TOKEN_SECRET")?;
        validate_token_secret(&token_secret, "MEDBASKET_TOKEN_SECRET")?;
        let token_ttl_minutes = get_env_or_default("MEDBASKET_TOKEN_TTL_MINUTES", "10080")
            .parse::<i64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("MEDBASKET_TOKEN_TTL_MINUTES".to_string(), e.to_string())
            })?;

        let cors_origins = get_optional_env("MEDBASKET_CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let sms = SmsConfig::from_env()?;
        let payments = PaymentConfig::from_env(&base_url)?;
        let places = PlacesConfig::from_env()?;
        let storage = StorageConfig::from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = parse_rate("SENTRY_SAMPLE_RATE", 1.0)?;
        let sentry_traces_sample_rate = parse_rate("SENTRY_TRACES_SAMPLE_RATE", 0.1)?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            token_secret,
            token_ttl_minutes,
            cors_origins,
            sms,
            payments,
            places,
            storage,
            sentry_dsn,
            sentry_environment,
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

impl SmsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: get_required_env("SMS_API_BASE_URL")?,
            sender_id: get_required_env("SMS_SENDER_ID")?,
            api_key: get_validated_secret("SMS_API_KEY")?,
        })
    }
}

impl PaymentConfig {
    fn from_env(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: get_required_env("PAYMENT_API_BASE_URL")?,
            app_id: get_required_env("PAYMENT_APP_ID")?,
            secret_key: get_validated_secret("PAYMENT_SECRET_KEY")?,
            webhook_secret: get_validated_secret("PAYMENT_WEBHOOK_SECRET")?,
            return_url: get_env_or_default("PAYMENT_RETURN_URL", base_url),
        })
    }
}

impl PlacesConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: get_required_env("PLACES_API_BASE_URL")?,
            api_key: get_validated_secret("PLACES_API_KEY")?,
        })
    }
}

impl StorageConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: get_required_env("STORAGE_API_BASE_URL")?,
            api_key: get_validated_secret("STORAGE_API_KEY")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    // Try primary key first (e.g., MEDBASKET_DATABASE_URL)
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    // Fallback to generic DATABASE_URL (set by managed postgres attach)
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an optional 0.0-1.0 rate from the environment.
fn parse_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => {
            let rate = raw
                .parse::<f32>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::InvalidEnvVar(
                    key.to_string(),
                    format!("must be between 0.0 and 1.0 (got {rate})"),
                ));
            }
            Ok(rate)
        }
    }
}

/// Validate that a token secret meets minimum length requirements.
fn validate_token_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_shannon_entropy_high() {
        // Random-looking string should have high entropy
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_token_secret_too_short() {
        let secret = SecretString::from("short");
        let result = validate_token_secret(&secret, "TEST_TOKEN");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_token_secret_valid_length() {
        let secret = SecretString::from("a".repeat(32));
        let result = validate_token_secret(&secret, "TEST_TOKEN");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_rate_rejects_out_of_range() {
        // Uses default when unset; validated range otherwise is covered by
        // from_env, exercised here via the helper directly.
        assert!((parse_rate("MB_TEST_RATE_UNSET", 0.5).unwrap() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            token_secret: SecretString::from("x".repeat(32)),
            token_ttl_minutes: 10080,
            cors_origins: vec!["http://localhost:5173".to_string()],
            sms: SmsConfig {
                base_url: "https://sms.test".to_string(),
                sender_id: "MEDBKT".to_string(),
                api_key: SecretString::from("k"),
            },
            payments: PaymentConfig {
                base_url: "https://pay.test".to_string(),
                app_id: "app".to_string(),
                secret_key: SecretString::from("s"),
                webhook_secret: SecretString::from("w"),
                return_url: "http://localhost:3000".to_string(),
            },
            places: PlacesConfig {
                base_url: "https://places.test".to_string(),
                api_key: SecretString::from("p"),
            },
            storage: StorageConfig {
                base_url: "https://storage.test".to_string(),
                api_key: SecretString::from("s"),
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_provider_config_debug_redacts_secrets() {
        let config = PaymentConfig {
            base_url: "https://pay.test".to_string(),
            app_id: "app_id_value".to_string(),
            secret_key: SecretString::from("super_secret_key"),
            webhook_secret: SecretString::from("super_webhook_secret"),
            return_url: "http://localhost:3000".to_string(),
        };

        let debug_output = format!("{config:?}");

        // Public fields should be visible
        assert!(debug_output.contains("app_id_value"));
        assert!(debug_output.contains("https://pay.test"));

        // Secret fields should be redacted
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_key"));
        assert!(!debug_output.contains("super_webhook_secret"));
    }
}
