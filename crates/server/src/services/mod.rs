//! Clients for external providers.
//!
//! Each provider (SMS, payment gateway, Places, image storage) gets its own
//! reqwest-backed client, constructed once at startup and shared through
//! application state. Provider credentials stay inside these clients.

use thiserror::Error;

pub mod auth;
pub mod payments;
pub mod places;
pub mod sms;
pub mod storage;

pub use auth::AuthService;
pub use payments::PaymentClient;
pub use places::PlacesClient;
pub use sms::SmsClient;
pub use storage::StorageClient;

/// Errors from talking to an external provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("provider returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The provider's response body didn't have the expected shape.
    #[error("unexpected provider response: {0}")]
    UnexpectedResponse(String),
}

/// Turn a non-success response into [`ProviderError::Status`].
pub(crate) async fn error_for_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status { status, body })
}
