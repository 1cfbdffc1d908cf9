//! Places API proxy client.
//!
//! The mobile app's address form needs autocomplete and place details, but
//! the Places API key must stay server-side. These calls forward the query
//! and return the provider's JSON as-is.

use secrecy::ExposeSecret;
use serde_json::Value;

use super::{ProviderError, error_for_status};
use crate::config::PlacesConfig;

/// Client for the Places API.
pub struct PlacesClient {
    http: reqwest::Client,
    config: PlacesConfig,
}

impl PlacesClient {
    #[must_use]
    pub const fn new(http: reqwest::Client, config: PlacesConfig) -> Self {
        Self { http, config }
    }

    /// Autocomplete suggestions for a partial address.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the provider is unreachable or rejects
    /// the request.
    #[tracing::instrument(skip(self))]
    pub async fn autocomplete(&self, query: &str) -> Result<Value, ProviderError> {
        self.fetch("autocomplete", &[("input", query)]).await
    }

    /// Full details for a place picked from autocomplete.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the provider is unreachable or rejects
    /// the request.
    #[tracing::instrument(skip(self))]
    pub async fn details(&self, place_id: &str) -> Result<Value, ProviderError> {
        self.fetch("details", &[("place_id", place_id)]).await
    }

    async fn fetch(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, ProviderError> {
        let response = self
            .http
            .get(format!("{}/{path}", self.config.base_url))
            .query(params)
            .query(&[("key", self.config.api_key.expose_secret())])
            .send()
            .await?;

        error_for_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::UnexpectedResponse(e.to_string()))
    }
}
