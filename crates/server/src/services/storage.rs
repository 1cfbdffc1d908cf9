//! Image storage client.
//!
//! Product and category images are pushed to the storage provider; clients
//! only ever see the returned CDN URL.

use secrecy::ExposeSecret;
use serde::Deserialize;

use super::{ProviderError, error_for_status};
use crate::config::StorageConfig;

#[derive(Deserialize)]
struct UploadResponse {
    key: String,
    url: String,
}

/// A stored image: the provider's key (for deletion) and its public URL.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoredImage {
    pub key: String,
    pub url: String,
}

/// Client for the image storage provider.
pub struct StorageClient {
    http: reqwest::Client,
    config: StorageConfig,
}

impl StorageClient {
    #[must_use]
    pub const fn new(http: reqwest::Client, config: StorageConfig) -> Self {
        Self { http, config }
    }

    /// Upload an image and return its key and public URL.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the provider is unreachable or rejects
    /// the upload.
    #[tracing::instrument(skip(self, bytes), fields(filename, size = bytes.len()))]
    pub async fn upload(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredImage, ProviderError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_owned())
            .mime_str(content_type)
            .map_err(|e| ProviderError::UnexpectedResponse(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/upload", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key.expose_secret()))
            .multipart(form)
            .send()
            .await?;

        let uploaded: UploadResponse = error_for_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::UnexpectedResponse(e.to_string()))?;

        tracing::info!(key = %uploaded.key, "image uploaded");

        Ok(StoredImage {
            key: uploaded.key,
            url: uploaded.url,
        })
    }

    /// Delete a stored image by key.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the provider is unreachable or rejects
    /// the deletion.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, key: &str) -> Result<(), ProviderError> {
        let response = self
            .http
            .delete(format!("{}/objects/{key}", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key.expose_secret()))
            .send()
            .await?;

        error_for_status(response).await?;
        Ok(())
    }
}
