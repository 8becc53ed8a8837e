//! Site configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SITE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `SITE_BASE_URL` - Public URL for the site
//! - `R2_PUBLIC_URL` - Public base URL for gallery image downloads
//! - `STRIPE_SECRET_KEY` - Stripe API secret key
//! - `STRIPE_WEBHOOK_SECRET` - Stripe webhook signing secret
//! - `RESEND_API_KEY` - Resend transactional email API key
//!
//! ## Required when `GALLERY_BACKEND=s3` (the default)
//! - `R2_ENDPOINT` - S3-compatible endpoint URL
//! - `R2_BUCKET` - Bucket name
//! - `R2_ACCESS_KEY_ID` - Access key id
//! - `R2_SECRET_ACCESS_KEY` - Secret access key
//!
//! ## Optional
//! - `SITE_HOST` - Bind address (default: 127.0.0.1)
//! - `SITE_PORT` - Listen port (default: 3000)
//! - `GALLERY_BACKEND` - `s3` or `fixture` (default: s3)
//! - `GALLERY_EXCLUDED_FOLDERS` - Comma-separated folder names hidden from
//!   gallery listings (default: shop,subtropical-andy,newyork,color)
//! - `SHOP_PRODUCT_ID` - Id of the single sellable product
//!   (default: zine-athens-rainforest)
//! - `SHOP_CURRENCY` - ISO currency code for payment intents (default: usd)
//! - `EMAIL_FROM` - From header for order confirmations
//!   (default: Fiftymillimeter <orders@fiftymillimeter.com>)
//! - `CONTENT_DIR` - Blog markdown directory (default: crates/site/content)
//! - `IMAGE_TRUSTED_HOST` - Only host the resize proxy will fetch from
//!   (default: host of `R2_PUBLIC_URL`)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_SECRET_LENGTH: usize = 16;

/// Blocklist of common placeholder patterns (case-insensitive).
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
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

/// Which gallery listing backend to use.
///
/// Decided once at startup; handlers never re-derive it per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryBackendKind {
    /// Live S3-compatible listing against the R2 bucket.
    S3,
    /// Static in-memory dataset for local development.
    Fixture,
}

/// Site application configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the site
    pub base_url: String,
    /// Object-storage / gallery configuration
    pub storage: StorageConfig,
    /// Stripe payment configuration
    pub stripe: StripeConfig,
    /// Transactional email configuration
    pub email: EmailConfig,
    /// Directory holding blog markdown files
    pub content_dir: PathBuf,
    /// Host the image resize proxy is allowed to fetch from
    pub image_trusted_host: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Object-storage configuration for gallery listings.
///
/// Implements `Debug` manually to redact the secret access key.
#[derive(Clone)]
pub struct StorageConfig {
    /// Listing backend selected at startup
    pub backend: GalleryBackendKind,
    /// S3-compatible endpoint URL (R2)
    pub endpoint: String,
    /// Bucket name
    pub bucket: String,
    /// Access key id
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: SecretString,
    /// Public base URL for constructing image download links
    pub public_base_url: String,
    /// Folder names excluded from gallery listings
    pub excluded_folders: Vec<String>,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("backend", &self.backend)
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("public_base_url", &self.public_base_url)
            .field("excluded_folders", &self.excluded_folders)
            .finish()
    }
}

/// Stripe payment configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct StripeConfig {
    /// API secret key (`sk_...`)
    pub secret_key: SecretString,
    /// Webhook signing secret (`whsec_...`)
    pub webhook_secret: SecretString,
    /// Id of the single sellable product
    pub product_id: String,
    /// ISO currency code for payment intents
    pub currency: String,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[REDACTED]")
            .field("webhook_secret", &"[REDACTED]")
            .field("product_id", &self.product_id)
            .field("currency", &self.currency)
            .finish()
    }
}

/// Transactional email configuration.
#[derive(Clone)]
pub struct EmailConfig {
    /// Resend API key
    pub api_key: SecretString,
    /// From header for order confirmations
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("api_key", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl SiteConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail placeholder/length validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("SITE_DATABASE_URL")?;
        let host = get_env_or_default("SITE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SITE_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("SITE_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SITE_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("SITE_BASE_URL")?;

        let storage = StorageConfig::from_env()?;
        let stripe = StripeConfig::from_env()?;
        let email = EmailConfig::from_env()?;

        let content_dir = PathBuf::from(get_env_or_default("CONTENT_DIR", "crates/site/content"));

        let image_trusted_host = match get_optional_env("IMAGE_TRUSTED_HOST") {
            Some(host) => host,
            None => host_of(&storage.public_base_url, "R2_PUBLIC_URL")?,
        };

        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            storage,
            stripe,
            email,
            content_dir,
            image_trusted_host,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl StorageConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let backend = match get_env_or_default("GALLERY_BACKEND", "s3").as_str() {
            "s3" => GalleryBackendKind::S3,
            "fixture" => GalleryBackendKind::Fixture,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "GALLERY_BACKEND".to_string(),
                    format!("expected 's3' or 'fixture', got '{other}'"),
                ));
            }
        };

        // The fixture backend only needs the public URL for link construction.
        let (endpoint, bucket, access_key_id, secret_access_key) =
            if backend == GalleryBackendKind::S3 {
                (
                    get_required_env("R2_ENDPOINT")?,
                    get_required_env("R2_BUCKET")?,
                    get_required_env("R2_ACCESS_KEY_ID")?,
                    get_validated_secret("R2_SECRET_ACCESS_KEY")?,
                )
            } else {
                (
                    String::new(),
                    String::new(),
                    String::new(),
                    SecretString::from(String::new()),
                )
            };

        let excluded_folders = get_env_or_default(
            "GALLERY_EXCLUDED_FOLDERS",
            "shop,subtropical-andy,newyork,color",
        )
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

        Ok(Self {
            backend,
            endpoint,
            bucket,
            access_key_id,
            secret_access_key,
            public_base_url: get_required_env("R2_PUBLIC_URL")?
                .trim_end_matches('/')
                .to_string(),
            excluded_folders,
        })
    }
}

impl StripeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret_key: get_validated_secret("STRIPE_SECRET_KEY")?,
            webhook_secret: get_validated_secret("STRIPE_WEBHOOK_SECRET")?,
            product_id: get_env_or_default("SHOP_PRODUCT_ID", "zine-athens-rainforest"),
            currency: get_env_or_default("SHOP_CURRENCY", "usd"),
        })
    }
}

impl EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: get_validated_secret("RESEND_API_KEY")?,
            from_address: get_env_or_default(
                "EMAIL_FROM",
                "Fiftymillimeter <orders@fiftymillimeter.com>",
            ),
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
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
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

/// Extract the host of a URL-valued variable.
fn host_of(url: &str, var_name: &str) -> Result<String, ConfigError> {
    let parsed = Url::parse(url)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    parsed
        .host_str()
        .map(ToString::to_string)
        .ok_or_else(|| ConfigError::InvalidEnvVar(var_name.to_string(), "missing host".to_string()))
}

/// Validate that a secret is not a placeholder and is plausibly long enough.
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

    if secret.len() < MIN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {MIN_SECRET_LENGTH} characters (got {})",
                secret.len()
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
