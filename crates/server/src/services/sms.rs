//! SMS provider client.
//!
//! Sends OTP texts through the provider's HTTP API. The API key travels in
//! a header and never appears in logs or responses.

use secrecy::ExposeSecret;
use serde::Serialize;

use medbasket_core::PhoneNumber;

use super::{ProviderError, error_for_status};
use crate::config::SmsConfig;

#[derive(Serialize)]
struct SendRequest<'a> {
    sender_id: &'a str,
    to: String,
    message: String,
}

/// Client for the SMS provider.
pub struct SmsClient {
    http: reqwest::Client,
    config: SmsConfig,
}

impl SmsClient {
    #[must_use]
    pub const fn new(http: reqwest::Client, config: SmsConfig) -> Self {
        Self { http, config }
    }

    /// Text a login OTP to the given number.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the provider is unreachable or rejects
    /// the request.
    #[tracing::instrument(skip(self, code), fields(phone = %phone))]
    pub async fn send_otp(&self, phone: &PhoneNumber, code: &str) -> Result<(), ProviderError> {
        let body = SendRequest {
            sender_id: &self.config.sender_id,
            to: phone.to_string(),
            message: format!("{code} is your Medbasket login code. Valid for 5 minutes."),
        };

        let response = self
            .http
            .post(format!("{}/messages", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key.expose_secret()))
            .json(&body)
            .send()
            .await?;

        error_for_status(response).await?;
        tracing::info!("OTP SMS dispatched");
        Ok(())
    }
}
