//! Portal configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PORTAL_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `PORTAL_BASE_URL` - Public URL of the portal
//! - `VISION_SERVICE_URL` - Base URL of the face/document service
//! - `ASSISTANT_SERVICE_URL` - Base URL of the branch manager assistant
//!
//! ## Optional
//! - `PORTAL_HOST` - Bind address (default: 127.0.0.1)
//! - `PORTAL_PORT` - Listen port (default: 3000)
//! - `SERVICE_TIMEOUT_SECS` - Timeout for external calls (default: 30)
//! - `LOAN_UPLOAD_ACK_MS` - Delay before a loan document upload is acknowledged (default: 1000)
//! - `CHAT_IDLE_MINUTES` - Idle time before a chat transcript is dropped (default: 60)
//! - `VISION_SERVICE_TOKEN` - Bearer token for the vision service
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

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

/// Portal application configuration.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the portal
    pub base_url: String,
    /// Face and document service
    pub vision: VisionConfig,
    /// Branch manager assistant base URL
    pub assistant_url: Url,
    /// Timeout applied to every external call
    pub service_timeout: Duration,
    /// Delay before a simulated loan upload is acknowledged
    pub loan_upload_ack: Duration,
    /// Idle time after which a chat transcript is evicted
    pub chat_idle: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
}

/// Vision service configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct VisionConfig {
    /// Base URL, always ending in `/`
    pub url: Url,
    /// Optional bearer token
    pub token: Option<SecretString>,
}

impl std::fmt::Debug for VisionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionConfig")
            .field("url", &self.url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl PortalConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the vision token fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("PORTAL_DATABASE_URL")?;
        let host = parse_env("PORTAL_HOST", "127.0.0.1")?;
        let port = parse_env("PORTAL_PORT", "3000")?;

        let base_url = get_required_env("PORTAL_BASE_URL")?;
        Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("PORTAL_BASE_URL".to_string(), e.to_string()))?;

        let vision = VisionConfig {
            url: get_service_url("VISION_SERVICE_URL")?,
            token: get_optional_env("VISION_SERVICE_TOKEN")
                .map(|token| {
                    validate_secret_strength(&token, "VISION_SERVICE_TOKEN")?;
                    Ok::<_, ConfigError>(SecretString::from(token))
                })
                .transpose()?,
        };
        let assistant_url = get_service_url("ASSISTANT_SERVICE_URL")?;

        let service_timeout = Duration::from_secs(parse_env("SERVICE_TIMEOUT_SECS", "30")?);
        let loan_upload_ack = Duration::from_millis(parse_env("LOAN_UPLOAD_ACK_MS", "1000")?);
        let chat_idle = Duration::from_secs(60 * parse_env::<u64>("CHAT_IDLE_MINUTES", "60")?);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            vision,
            assistant_url,
            service_timeout,
            loan_upload_ack,
            chat_idle,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
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
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Read a required service base URL.
fn get_service_url(key: &str) -> Result<Url, ConfigError> {
    parse_service_url(&get_required_env(key)?)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e))
}

/// Parse a base URL so relative endpoint paths join beneath it.
///
/// `http://host/api` and `http://host/api/` both become `http://host/api/`.
pub fn parse_service_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if url.cannot_be_a_base() {
        return Err("must be an absolute http(s) URL".to_string());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
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
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated token."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_config() -> PortalConfig {
        PortalConfig {
            database_url: SecretString::from("postgres://localhost/branchline"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            vision: VisionConfig {
                url: parse_service_url("http://localhost:8000").unwrap(),
                token: Some(SecretString::from("vision_token_value")),
            },
            assistant_url: parse_service_url("http://localhost:8001").unwrap(),
            service_timeout: Duration::from_secs(30),
            loan_upload_ack: Duration::from_millis(1000),
            chat_idle: Duration::from_secs(3600),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("your-token-here", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR").is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_parse_service_url_appends_slash() {
        let url = parse_service_url("http://vision.internal:8000/api").unwrap();
        assert_eq!(url.as_str(), "http://vision.internal:8000/api/");
        assert_eq!(
            url.join("recognise/face").unwrap().as_str(),
            "http://vision.internal:8000/api/recognise/face"
        );
    }

    #[test]
    fn test_parse_service_url_rejects_relative() {
        assert!(parse_service_url("/vision").is_err());
        assert!(parse_service_url("mailto:ops@branchline.in").is_err());
    }

    #[test]
    fn test_socket_addr_and_secure_flag() {
        let mut config = sample_config();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert!(!config.is_secure());

        config.base_url = "https://portal.branchline.in".to_string();
        assert!(config.is_secure());
    }

    #[test]
    fn test_vision_config_debug_redacts_token() {
        let config = sample_config();
        let debug_output = format!("{:?}", config.vision);

        assert!(debug_output.contains("localhost:8000"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("vision_token_value"));
    }
}
