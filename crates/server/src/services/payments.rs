//! Payment gateway client.
//!
//! The gateway does hosted checkout: we create a session server-side, the
//! client is redirected to the gateway's page, and settlement arrives on a
//! webhook signed with HMAC-SHA256 over the raw body.

use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use medbasket_core::{CurrencyCode, OrderId, PaymentStatus};

use super::{ProviderError, error_for_status};
use crate::config::PaymentConfig;

type HmacSha256 = Hmac<Sha256>;

#[derive(Serialize)]
struct CreateSessionRequest<'a> {
    app_id: &'a str,
    reference_id: String,
    amount: Decimal,
    currency: CurrencyCode,
    return_url: &'a str,
}

#[derive(Deserialize)]
struct CreateSessionResponse {
    order_id: String,
    payment_link: String,
}

#[derive(Deserialize)]
struct SessionStatusResponse {
    status: PaymentStatus,
}

/// A checkout session created at the gateway.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    /// The gateway's identifier for the session.
    pub provider_order_id: String,
    /// Hosted page to redirect the customer to.
    pub redirect_url: String,
}

/// A settlement notification delivered to the webhook endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub order_id: String,
    pub status: PaymentStatus,
}

/// Client for the payment gateway.
pub struct PaymentClient {
    http: reqwest::Client,
    config: PaymentConfig,
}

impl PaymentClient {
    #[must_use]
    pub const fn new(http: reqwest::Client, config: PaymentConfig) -> Self {
        Self { http, config }
    }

    /// Create a hosted-checkout session for an order.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the gateway is unreachable or answers
    /// with an unexpected shape.
    #[tracing::instrument(skip(self), fields(order_id = %order_id, amount = %amount))]
    pub async fn create_session(
        &self,
        order_id: OrderId,
        amount: Decimal,
        currency: CurrencyCode,
    ) -> Result<CheckoutSession, ProviderError> {
        let body = CreateSessionRequest {
            app_id: &self.config.app_id,
            reference_id: format!("order-{order_id}"),
            amount,
            currency,
            return_url: &self.config.return_url,
        };

        let response = self
            .http
            .post(format!("{}/sessions", self.config.base_url))
            .header("X-Api-Secret", self.config.secret_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let session: CreateSessionResponse = error_for_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::UnexpectedResponse(e.to_string()))?;

        tracing::info!(provider_order_id = %session.order_id, "checkout session created");

        Ok(CheckoutSession {
            provider_order_id: session.order_id,
            redirect_url: session.payment_link,
        })
    }

    /// Fetch the current status of a checkout session.
    ///
    /// Used to reconcile a payment when the client polls before the webhook
    /// has landed.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the gateway is unreachable or answers
    /// with an unexpected shape.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_status(&self, provider_order_id: &str) -> Result<PaymentStatus, ProviderError> {
        let response = self
            .http
            .get(format!(
                "{}/sessions/{provider_order_id}",
                self.config.base_url
            ))
            .header("X-Api-Secret", self.config.secret_key.expose_secret())
            .send()
            .await?;

        let session: SessionStatusResponse = error_for_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::UnexpectedResponse(e.to_string()))?;

        Ok(session.status)
    }

    /// Verify a webhook signature against the raw request body.
    ///
    /// The signature header carries lowercase hex of
    /// `HMAC-SHA256(webhook_secret, body)`. Comparison happens inside the
    /// MAC so it is constant-time.
    #[must_use]
    pub fn verify_webhook(&self, body: &[u8], signature_hex: &str) -> bool {
        verify_signature(&self.config.webhook_secret, body, signature_hex)
    }

    /// Parse a verified webhook body.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::UnexpectedResponse` if the body isn't a
    /// well-formed event.
    pub fn parse_webhook(&self, body: &[u8]) -> Result<WebhookEvent, ProviderError> {
        serde_json::from_slice(body).map_err(|e| ProviderError::UnexpectedResponse(e.to_string()))
    }
}

fn verify_signature(secret: &SecretString, body: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose_secret().as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_valid_signature_accepted() {
        let secret = SecretString::from("webhook-secret");
        let body = br#"{"order_id":"gw_123","status":"PAID"}"#;
        let sig = sign("webhook-secret", body);
        assert!(verify_signature(&secret, body, &sig));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let secret = SecretString::from("webhook-secret");
        let sig = sign("webhook-secret", br#"{"order_id":"gw_123","status":"PAID"}"#);
        assert!(!verify_signature(
            &secret,
            br#"{"order_id":"gw_123","status":"FAILED"}"#,
            &sig
        ));
    }

    #[test]
    fn test_garbage_signature_rejected() {
        let secret = SecretString::from("webhook-secret");
        assert!(!verify_signature(&secret, b"{}", "not-hex"));
    }

    #[test]
    fn test_webhook_event_parses() {
        let event: WebhookEvent =
            serde_json::from_slice(br#"{"order_id":"gw_123","status":"PAID"}"#).unwrap();
        assert_eq!(event.order_id, "gw_123");
        assert_eq!(event.status, PaymentStatus::Paid);
    }
}
