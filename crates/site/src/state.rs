//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::SiteConfig;
use crate::gallery::GalleryStore;
use crate::services::email::ResendClient;
use crate::services::stripe::StripeClient;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds the connection pool, the gallery
/// backend selected at startup, and the external API clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    pool: PgPool,
    gallery: GalleryStore,
    stripe: StripeClient,
    mailer: ResendClient,
    http: reqwest::Client,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the shared HTTP client fails to build.
    pub fn new(config: SiteConfig, pool: PgPool) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("fiftymm-site/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let gallery = GalleryStore::from_config(&config.storage);
        let stripe = StripeClient::new(http.clone(), config.stripe.clone());
        let mailer = ResendClient::new(http.clone(), config.email.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                gallery,
                stripe,
                mailer,
                http,
            }),
        })
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the gallery backend.
    #[must_use]
    pub fn gallery(&self) -> &GalleryStore {
        &self.inner.gallery
    }

    /// Get a reference to the Stripe API client.
    #[must_use]
    pub fn stripe(&self) -> &StripeClient {
        &self.inner.stripe
    }

    /// Get a reference to the Resend API client.
    #[must_use]
    pub fn mailer(&self) -> &ResendClient {
        &self.inner.mailer
    }

    /// Get a reference to the shared HTTP client.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }
}
