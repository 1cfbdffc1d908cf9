//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::cache::SearchCache;
use crate::config::ServerConfig;
use crate::services::{AuthService, PaymentClient, PlacesClient, SmsClient, StorageClient};

/// Everything a request handler needs, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
    pool: PgPool,
    auth: Arc<AuthService>,
    sms: Arc<SmsClient>,
    payments: Arc<PaymentClient>,
    places: Arc<PlacesClient>,
    storage: Arc<StorageClient>,
    search_cache: SearchCache,
}

impl AppState {
    /// Build state from config: one shared HTTP client feeds every provider.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be constructed.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        let auth = Arc::new(AuthService::new(&config.token_secret, config.token_ttl_minutes));
        let sms = Arc::new(SmsClient::new(http.clone(), config.sms.clone()));
        let payments = Arc::new(PaymentClient::new(http.clone(), config.payments.clone()));
        let places = Arc::new(PlacesClient::new(http.clone(), config.places.clone()));
        let storage = Arc::new(StorageClient::new(http, config.storage.clone()));

        Ok(Self {
            config: Arc::new(config),
            pool,
            auth,
            sms,
            payments,
            places,
            storage,
            search_cache: SearchCache::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    #[must_use]
    pub fn sms(&self) -> &SmsClient {
        &self.sms
    }

    #[must_use]
    pub fn payments(&self) -> &PaymentClient {
        &self.payments
    }

    #[must_use]
    pub fn places(&self) -> &PlacesClient {
        &self.places
    }

    #[must_use]
    pub fn storage(&self) -> &StorageClient {
        &self.storage
    }

    #[must_use]
    pub const fn search_cache(&self) -> &SearchCache {
        &self.search_cache
    }
}
