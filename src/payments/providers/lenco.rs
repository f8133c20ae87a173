//! Lenco payment gateway implementation
//!
//! This module provides integration with Lenco's collections API: creating
//! hosted payment links, verifying payments by reference, and authenticating
//! inbound webhook notifications.

use crate::config::LencoConfig;
use crate::error::GatewayError;
use crate::payments::traits::PaymentGateway;
use crate::payments::types::{
    minor_to_major, PaymentLink, PaymentLinkRequest, PaymentStatus, PaymentVerification,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info};

/// Lenco payment gateway client
///
/// A constructed, stateless value meant to be injected into the donation
/// flows; it holds no mutable state beyond the pooled HTTP client.
pub struct LencoProvider {
    config: LencoConfig,
    client: Client,
}

impl LencoProvider {
    /// Create a new Lenco provider instance
    pub fn new(config: LencoConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Make an authenticated request to the Lenco API
    ///
    /// No retries: a failed call is surfaced to the caller, which may replay
    /// it safely with the same reference.
    async fn request<T>(
        &self,
        method: reqwest::Method,
        endpoint: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T, GatewayError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.config.base_url, endpoint);
        let mut request = self
            .client
            .request(method, &url)
            .header("Authorization", format!("Bearer {}", self.config.secret_key))
            .header("x-api-key", self.config.api_key.as_str())
            .header("Content-Type", "application/json");

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let is_json = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.starts_with("application/json"))
                .unwrap_or(false);

            if is_json {
                let response_text = response.text().await.unwrap_or_default();
                if let Ok(err_body) = serde_json::from_str::<LencoErrorBody>(&response_text) {
                    error!("Lenco API error: {}", err_body.message);
                    return Err(GatewayError::api(err_body.message));
                }
            }

            // Non-JSON error pages carry the HTTP status only, never parsed
            error!("Lenco API error: HTTP {}", status);
            return Err(GatewayError::Http {
                status: status.as_u16(),
            });
        }

        let envelope: LencoResponse<T> = response.json().await.map_err(|e| {
            error!("Failed to parse Lenco response: {}", e);
            GatewayError::InvalidResponse
        })?;

        if !envelope.status {
            error!("Lenco API rejected request: {}", envelope.message);
            return Err(GatewayError::api(envelope.message));
        }

        envelope.data.ok_or(GatewayError::InvalidResponse)
    }
}

#[async_trait]
impl PaymentGateway for LencoProvider {
    async fn create_payment_link(
        &self,
        request: PaymentLinkRequest,
    ) -> Result<PaymentLink, GatewayError> {
        info!(
            "Creating Lenco payment link: {} {} {}",
            request.amount, request.currency, request.reference
        );

        let mut payload = serde_json::json!({
            "amount": request.amount,
            "currency": request.currency,
            "reference": request.reference,
            "email": request.email,
            "first_name": request.first_name,
            "last_name": request.last_name,
            "callback_url": request.callback_url,
        });

        if let Some(phone) = request.phone {
            payload["phone"] = serde_json::Value::String(phone);
        }

        if let Some(metadata) = request.metadata {
            payload["metadata"] = metadata;
        }

        let data: LencoInitializeData = self
            .request(reqwest::Method::POST, "/collections/initialize", Some(&payload))
            .await?;

        info!(
            "Lenco payment link created: reference={}",
            data.reference
        );

        Ok(PaymentLink {
            payment_url: data.payment_url,
            reference: data.reference,
            lenco_reference: data.lenco_reference,
        })
    }

    async fn verify_payment(&self, reference: &str) -> Result<PaymentVerification, GatewayError> {
        info!("Verifying Lenco payment: reference={}", reference);

        let data: LencoStatusData = self
            .request(
                reqwest::Method::GET,
                &format!("/collections/status/{}", reference),
                None,
            )
            .await?;

        info!(
            "Lenco payment verified: reference={}, status={}",
            reference, data.status
        );

        let status = PaymentStatus::from_provider(&data.status);

        Ok(PaymentVerification {
            reference: data.reference,
            amount_minor: data.amount,
            amount_major: minor_to_major(data.amount),
            status,
            raw_status: data.status,
            paid_at: data.paid_at,
            failure_reason: data.failure_reason,
        })
    }

    fn validate_webhook_signature(&self, payload: &[u8], signature: &str) -> bool {
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        type HmacSha256 = Hmac<Sha256>;

        let mut mac = HmacSha256::new_from_slice(self.config.webhook_secret.as_bytes())
            .expect("HMAC can take key of any size");

        mac.update(payload);
        let computed_signature = hex::encode(mac.finalize().into_bytes());

        // Lenco sends the signature as a hex string
        let provided_signature = signature.trim();

        // Constant-time comparison to prevent timing attacks
        if computed_signature.len() != provided_signature.len() {
            return false;
        }

        computed_signature
            .as_bytes()
            .iter()
            .zip(provided_signature.as_bytes().iter())
            .fold(0, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

// Lenco API response wrapper
#[derive(Debug, Deserialize)]
struct LencoResponse<T> {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

// Error body returned with non-2xx JSON responses
#[derive(Debug, Deserialize)]
struct LencoErrorBody {
    message: String,
}

// Create-payment-link response data
#[derive(Debug, Deserialize)]
struct LencoInitializeData {
    payment_url: String,
    reference: String,
    #[serde(default)]
    lenco_reference: Option<String>,
}

// Verify-by-reference response data
#[derive(Debug, Deserialize)]
struct LencoStatusData {
    reference: String,
    amount: i64,
    status: String,
    #[serde(default, alias = "paidAt")]
    paid_at: Option<String>,
    #[serde(default, alias = "failureReason")]
    failure_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    fn create_test_provider() -> LencoProvider {
        let config = LencoConfig {
            secret_key: "sk_test_test_key".to_string(),
            api_key: "pk_test_test_key".to_string(),
            webhook_secret: "whsec_test_secret".to_string(),
            base_url: "https://api.lenco.co/access/v2".to_string(),
            timeout_secs: 30,
        };
        LencoProvider::new(config)
    }

    fn sign(payload: &[u8], secret: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_webhook_signature_round_trip() {
        let provider = create_test_provider();
        let payload = br#"{"event":"payment.successful","data":{"reference":"donation_x"}}"#;
        let signature = sign(payload, "whsec_test_secret");
        assert!(provider.validate_webhook_signature(payload, &signature));
    }

    #[test]
    fn test_webhook_signature_rejects_mutated_body() {
        let provider = create_test_provider();
        let payload = b"original payload";
        let signature = sign(payload, "whsec_test_secret");
        assert!(!provider.validate_webhook_signature(b"original payloae", &signature));
    }

    #[test]
    fn test_webhook_signature_rejects_mutated_signature() {
        let provider = create_test_provider();
        let payload = b"original payload";
        let mut signature = sign(payload, "whsec_test_secret");
        // Flip the last hex digit
        let last = signature.pop().unwrap();
        signature.push(if last == '0' { '1' } else { '0' });
        assert!(!provider.validate_webhook_signature(payload, &signature));
    }

    #[test]
    fn test_webhook_signature_rejects_wrong_secret() {
        let provider = create_test_provider();
        let payload = b"payload";
        let signature = sign(payload, "some_other_secret");
        assert!(!provider.validate_webhook_signature(payload, &signature));
    }

    #[test]
    fn test_webhook_signature_rejects_malformed_input() {
        let provider = create_test_provider();
        let payload = b"test payload";
        assert!(!provider.validate_webhook_signature(payload, ""));
        assert!(!provider.validate_webhook_signature(payload, "invalid_signature"));
        assert!(!provider.validate_webhook_signature(payload, "zz".repeat(32).as_str()));
    }
}
