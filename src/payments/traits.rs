//! Payment gateway trait definitions
//!
//! Defines the interface the donation flows program against, so tests can
//! substitute a fake transport for the real Lenco client.

use crate::error::GatewayError;
use crate::payments::types::{PaymentLink, PaymentLinkRequest, PaymentVerification};
use async_trait::async_trait;

/// Trait for payment gateway implementations
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted payment link for a donation attempt
    ///
    /// Issues one authenticated request to the provider and returns the
    /// checkout URL the donor must be redirected to.
    ///
    /// # Arguments
    /// * `request` - Minor-unit amount, currency, donor details, reference
    ///
    /// # Returns
    /// * `PaymentLink` - Checkout URL plus merchant and provider references
    async fn create_payment_link(
        &self,
        request: PaymentLinkRequest,
    ) -> Result<PaymentLink, GatewayError>;

    /// Fetch the authoritative status of a donation attempt by reference
    ///
    /// Safe to call any number of times for the same reference; the provider
    /// owns the settled state.
    async fn verify_payment(&self, reference: &str) -> Result<PaymentVerification, GatewayError>;

    /// Validate a webhook signature
    ///
    /// Verifies that an inbound webhook request genuinely came from the
    /// payment provider. Returns `false` on any malformed input; a `false`
    /// result means the payload must be rejected unparsed with 401.
    fn validate_webhook_signature(&self, payload: &[u8], signature: &str) -> bool;
}
