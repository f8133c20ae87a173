use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::database::donation_repository::{NewDonation, StatusUpdate};
use crate::database::repository::DonationStore;
use crate::error::{AppError, AppResult};
use crate::payments::reference;
use crate::payments::traits::PaymentGateway;
use crate::payments::types::{
    format_major, major_to_minor, PaymentLinkRequest, PaymentStatus, WebhookNotification,
};

/// Donor-supplied fields captured at initiation
#[derive(Debug, Clone)]
pub struct DonationInput {
    pub amount: f64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub donation_frequency: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Result of a successful initiation: the donor is redirected to
/// `payment_url` and the reference correlates all later calls.
#[derive(Debug, Clone, Serialize)]
pub struct InitiatedDonation {
    pub payment_url: String,
    pub reference: String,
    pub lenco_reference: Option<String>,
    pub amount: f64,
    pub formatted_amount: String,
}

/// Normalized verification result for the client-poll path
#[derive(Debug, Clone, Serialize)]
pub struct VerifiedDonation {
    pub reference: String,
    pub amount: f64,
    pub formatted_amount: String,
    pub status: PaymentStatus,
    /// The provider's literal status token, for diagnostics when not success
    pub raw_status: String,
    pub paid_at: Option<String>,
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"))
}

/// Donation flow orchestrator
///
/// Stateless between calls; the gateway and store are injected so tests can
/// substitute fakes. Holds no per-request mutable state.
pub struct DonationService {
    gateway: Arc<dyn PaymentGateway>,
    store: Arc<dyn DonationStore>,
    currency: String,
    callback_url: String,
}

impl DonationService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        store: Arc<dyn DonationStore>,
        currency: String,
        callback_url: String,
    ) -> Self {
        Self {
            gateway,
            store,
            currency,
            callback_url,
        }
    }

    /// Initiate a donation attempt
    ///
    /// Validation short-circuits before any reference is generated, any row
    /// written, or any network call made. A gateway failure marks the stored
    /// attempt failed (best-effort) and is re-raised unchanged; retrying is
    /// the caller's decision.
    pub async fn initiate(&self, input: DonationInput) -> AppResult<InitiatedDonation> {
        validate_input(&input)?;

        let amount_minor = major_to_minor(input.amount).ok_or_else(|| {
            AppError::validation("amount", "amount must convert to a positive whole minor unit")
        })?;

        let donation_reference = reference::generate();

        self.store
            .record_initiated(NewDonation {
                reference: donation_reference.clone(),
                amount_minor,
                currency: self.currency.clone(),
                email: input.email.clone(),
                first_name: input.first_name.clone(),
                last_name: input.last_name.clone(),
                phone: input.phone.clone(),
                frequency: input.donation_frequency.clone(),
                metadata: input.metadata.clone(),
            })
            .await?;

        let request = PaymentLinkRequest {
            amount: amount_minor,
            currency: self.currency.clone(),
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            phone: input.phone,
            reference: donation_reference.clone(),
            callback_url: self.callback_url.clone(),
            metadata: input.metadata,
        };

        let link = match self.gateway.create_payment_link(request).await {
            Ok(link) => link,
            Err(gateway_err) => {
                // Best-effort: leave a failure trace before re-raising
                let update = StatusUpdate {
                    status: PaymentStatus::Failed.as_str().to_string(),
                    failure_reason: Some(gateway_err.to_string()),
                    ..Default::default()
                };
                if let Err(db_err) = self.store.apply_status(&donation_reference, update).await {
                    warn!(
                        "could not mark donation {} failed: {}",
                        donation_reference, db_err
                    );
                }
                return Err(gateway_err.into());
            }
        };

        info!(
            "donation initiated: reference={} amount_minor={}",
            donation_reference, amount_minor
        );

        Ok(InitiatedDonation {
            payment_url: link.payment_url,
            reference: donation_reference,
            lenco_reference: link.lenco_reference,
            amount: input.amount,
            formatted_amount: format_major(input.amount, &self.currency),
        })
    }

    /// Resolve a reference to its authoritative status (client-poll path)
    ///
    /// Idempotent: the provider owns the settled state, so repeated calls
    /// for the same reference yield the same normalized result.
    pub async fn verify(&self, donation_reference: &str) -> AppResult<VerifiedDonation> {
        if donation_reference.trim().is_empty() {
            return Err(AppError::validation("reference", "reference is required"));
        }

        if !reference::is_well_formed(donation_reference) {
            return Err(AppError::validation("reference", "invalid reference format"));
        }

        let verification = self.gateway.verify_payment(donation_reference).await?;

        // Mirror the authoritative status onto the stored attempt
        let update = StatusUpdate {
            status: verification.status.as_str().to_string(),
            paid_at: verification.paid_at.clone(),
            failure_reason: verification.failure_reason.clone(),
            ..Default::default()
        };
        if let Err(db_err) = self.store.apply_status(donation_reference, update).await {
            warn!(
                "could not record status for donation {}: {}",
                donation_reference, db_err
            );
        }

        if !verification.status.is_success() {
            info!(
                "donation {} not settled: provider status '{}'",
                donation_reference, verification.raw_status
            );
        }

        Ok(VerifiedDonation {
            reference: verification.reference,
            amount: verification.amount_major,
            formatted_amount: format_major(verification.amount_major, &self.currency),
            status: verification.status,
            raw_status: verification.raw_status,
            paid_at: verification.paid_at,
        })
    }

    /// Check an inbound webhook signature against the configured secret
    pub fn webhook_signature_valid(&self, payload: &[u8], signature: &str) -> bool {
        self.gateway.validate_webhook_signature(payload, signature)
    }

    /// Process an authenticated, parsed webhook notification
    ///
    /// Infallible from the caller's point of view: internal processing
    /// outcomes are logged and recorded on the audit row, never surfaced to
    /// the provider, whose retry policy must react only to auth and
    /// transport failures.
    pub async fn process_webhook(
        &self,
        notification: WebhookNotification,
        raw_payload: serde_json::Value,
    ) {
        let audit_id = match self
            .store
            .log_webhook_event(&notification.event, &raw_payload)
            .await
        {
            Ok(id) => Some(id),
            Err(db_err) => {
                warn!("could not log webhook event: {}", db_err);
                None
            }
        };

        let outcome = self.handle_event(&notification).await;

        if let Some(id) = audit_id {
            let error_text = outcome.as_ref().err().map(|e| e.to_string());
            if let Err(db_err) = self
                .store
                .finish_webhook_event(&id, error_text.as_deref())
                .await
            {
                warn!("could not record webhook outcome: {}", db_err);
            }
        }

        if let Err(e) = outcome {
            error!("webhook processing failed: {}", e);
        }
    }

    async fn handle_event(&self, notification: &WebhookNotification) -> AppResult<()> {
        match notification.event.as_str() {
            "payment.successful" => {
                let (donation_reference, data) = required_reference(notification)?;
                let update = StatusUpdate {
                    status: PaymentStatus::Success.as_str().to_string(),
                    paid_at: data.paid_at.clone(),
                    ..Default::default()
                };
                match self.store.apply_status(&donation_reference, update).await? {
                    Some(_) => {
                        info!("donation {} settled via webhook", donation_reference);
                    }
                    None => {
                        warn!("webhook for unknown reference: {}", donation_reference);
                    }
                }
                Ok(())
            }
            "payment.failed" => {
                let (donation_reference, data) = required_reference(notification)?;
                let update = StatusUpdate {
                    status: PaymentStatus::Failed.as_str().to_string(),
                    failure_reason: data.failure_reason.clone(),
                    ..Default::default()
                };
                match self.store.apply_status(&donation_reference, update).await? {
                    Some(_) => {
                        info!("donation {} failed via webhook", donation_reference);
                    }
                    None => {
                        warn!("webhook for unknown reference: {}", donation_reference);
                    }
                }
                Ok(())
            }
            other => {
                info!("Unhandled Lenco webhook event: {}", other);
                Ok(())
            }
        }
    }
}

fn required_reference(
    notification: &WebhookNotification,
) -> AppResult<(String, &crate::payments::types::WebhookData)> {
    let data = notification
        .data
        .as_ref()
        .ok_or_else(|| AppError::bad_request("webhook payload has no data section"))?;
    let donation_reference = data
        .reference
        .clone()
        .ok_or_else(|| AppError::bad_request("webhook data has no reference"))?;
    Ok((donation_reference, data))
}

fn validate_input(input: &DonationInput) -> AppResult<()> {
    if !input.amount.is_finite() || input.amount <= 0.0 {
        return Err(AppError::validation(
            "amount",
            "amount must be a number greater than zero",
        ));
    }

    if input.first_name.trim().is_empty() {
        return Err(AppError::validation("firstName", "first name is required"));
    }

    if input.last_name.trim().is_empty() {
        return Err(AppError::validation("lastName", "last name is required"));
    }

    let email = input.email.trim();
    if email.is_empty() {
        return Err(AppError::validation("email", "email is required"));
    }

    if !email_regex().is_match(email) {
        return Err(AppError::validation("email", "email is not a valid address"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::donation_repository::DonationRecord;
    use crate::database::error::DatabaseError;
    use crate::error::GatewayError;
    use crate::payments::types::{PaymentLink, PaymentVerification, WebhookData};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockGateway {
        create_calls: AtomicUsize,
        verify_calls: AtomicUsize,
        last_request: Mutex<Option<PaymentLinkRequest>>,
        fail_create: bool,
        verify_status_token: String,
    }

    impl MockGateway {
        fn new() -> Self {
            Self {
                create_calls: AtomicUsize::new(0),
                verify_calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
                fail_create: false,
                verify_status_token: "success".to_string(),
            }
        }

        fn failing() -> Self {
            Self {
                fail_create: true,
                ..Self::new()
            }
        }

        fn with_verify_status(token: &str) -> Self {
            Self {
                verify_status_token: token.to_string(),
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl PaymentGateway for MockGateway {
        async fn create_payment_link(
            &self,
            request: PaymentLinkRequest,
        ) -> Result<PaymentLink, GatewayError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            let reference = request.reference.clone();
            *self.last_request.lock().unwrap() = Some(request);

            if self.fail_create {
                return Err(GatewayError::api("declined by provider"));
            }

            Ok(PaymentLink {
                payment_url: "https://pay.lenco.co/checkout/abc123".to_string(),
                reference,
                lenco_reference: Some("lnc_456".to_string()),
            })
        }

        async fn verify_payment(
            &self,
            reference: &str,
        ) -> Result<PaymentVerification, GatewayError> {
            self.verify_calls.fetch_add(1, Ordering::SeqCst);
            let status = PaymentStatus::from_provider(&self.verify_status_token);
            Ok(PaymentVerification {
                reference: reference.to_string(),
                amount_minor: 5000,
                amount_major: 50.0,
                status,
                raw_status: self.verify_status_token.clone(),
                paid_at: status
                    .is_success()
                    .then(|| "2026-08-01T12:00:00Z".to_string()),
                failure_reason: None,
            })
        }

        fn validate_webhook_signature(&self, _payload: &[u8], signature: &str) -> bool {
            signature == "valid"
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        records: Mutex<HashMap<String, DonationRecord>>,
        webhook_events: Mutex<Vec<(String, Option<String>)>>,
    }

    impl MemoryStore {
        fn status_of(&self, reference: &str) -> Option<String> {
            self.records
                .lock()
                .unwrap()
                .get(reference)
                .map(|r| r.status.clone())
        }

        fn record_count(&self) -> usize {
            self.records.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl DonationStore for MemoryStore {
        async fn record_initiated(
            &self,
            donation: NewDonation,
        ) -> Result<DonationRecord, DatabaseError> {
            let record = DonationRecord {
                id: uuid::Uuid::new_v4(),
                reference: donation.reference.clone(),
                amount_minor: donation.amount_minor,
                currency: donation.currency,
                email: donation.email,
                first_name: donation.first_name,
                last_name: donation.last_name,
                phone: donation.phone,
                frequency: donation.frequency,
                metadata: donation.metadata,
                status: "pending".to_string(),
                lenco_reference: None,
                paid_at: None,
                failure_reason: None,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            };
            self.records
                .lock()
                .unwrap()
                .insert(donation.reference, record.clone());
            Ok(record)
        }

        async fn apply_status(
            &self,
            reference: &str,
            update: StatusUpdate,
        ) -> Result<Option<DonationRecord>, DatabaseError> {
            let mut records = self.records.lock().unwrap();
            match records.get_mut(reference) {
                Some(record) => {
                    record.status = update.status;
                    if update.paid_at.is_some() {
                        record.paid_at = update.paid_at;
                    }
                    if update.failure_reason.is_some() {
                        record.failure_reason = update.failure_reason;
                    }
                    record.updated_at = chrono::Utc::now();
                    Ok(Some(record.clone()))
                }
                None => Ok(None),
            }
        }

        async fn find_by_reference(
            &self,
            reference: &str,
        ) -> Result<Option<DonationRecord>, DatabaseError> {
            Ok(self.records.lock().unwrap().get(reference).cloned())
        }

        async fn log_webhook_event(
            &self,
            event_type: &str,
            _payload: &serde_json::Value,
        ) -> Result<String, DatabaseError> {
            let id = uuid::Uuid::new_v4().to_string();
            self.webhook_events
                .lock()
                .unwrap()
                .push((event_type.to_string(), None));
            Ok(id)
        }

        async fn finish_webhook_event(
            &self,
            _event_id: &str,
            _error: Option<&str>,
        ) -> Result<(), DatabaseError> {
            Ok(())
        }
    }

    fn service_with(gateway: MockGateway) -> (DonationService, Arc<MockGateway>, Arc<MemoryStore>) {
        let gateway = Arc::new(gateway);
        let store = Arc::new(MemoryStore::default());
        let service = DonationService::new(
            gateway.clone(),
            store.clone(),
            "NGN".to_string(),
            "https://giveflow.org/donate/thank-you".to_string(),
        );
        (service, gateway, store)
    }

    fn valid_input() -> DonationInput {
        DonationInput {
            amount: 50.0,
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            email: "a@b.com".to_string(),
            phone: None,
            donation_frequency: None,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_initiate_converts_to_minor_units_and_passes_url_through() {
        let (service, gateway, _store) = service_with(MockGateway::new());

        let initiated = service.initiate(valid_input()).await.unwrap();

        let request = gateway.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.amount, 5000);
        assert_eq!(request.currency, "NGN");
        assert_eq!(
            initiated.payment_url,
            "https://pay.lenco.co/checkout/abc123"
        );
        assert!(initiated.reference.starts_with("donation_"));
        assert_eq!(initiated.formatted_amount, "₦50.00");
    }

    #[tokio::test]
    async fn test_initiate_rejects_bad_amount_without_side_effects() {
        let (service, gateway, store) = service_with(MockGateway::new());

        for amount in [0.0, -5.0, f64::NAN] {
            let input = DonationInput {
                amount,
                ..valid_input()
            };
            let err = service.initiate(input).await.unwrap_err();
            assert!(matches!(err, AppError::Validation { .. }));
        }

        assert_eq!(gateway.create_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.record_count(), 0);
    }

    #[tokio::test]
    async fn test_initiate_rejects_missing_donor_fields() {
        let (service, gateway, _store) = service_with(MockGateway::new());

        let cases = [
            (
                DonationInput {
                    first_name: " ".to_string(),
                    ..valid_input()
                },
                "firstName",
            ),
            (
                DonationInput {
                    last_name: String::new(),
                    ..valid_input()
                },
                "lastName",
            ),
            (
                DonationInput {
                    email: "not-an-email".to_string(),
                    ..valid_input()
                },
                "email",
            ),
        ];

        for (input, expected_field) in cases {
            match service.initiate(input).await.unwrap_err() {
                AppError::Validation { field, .. } => assert_eq!(field, expected_field),
                other => panic!("expected validation error, got {:?}", other),
            }
        }

        assert_eq!(gateway.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_initiate_marks_record_failed_on_gateway_error() {
        let (service, _gateway, store) = service_with(MockGateway::failing());

        let err = service.initiate(valid_input()).await.unwrap_err();
        assert!(matches!(err, AppError::Gateway(_)));

        let records = store.records.lock().unwrap();
        let record = records.values().next().unwrap();
        assert_eq!(record.status, "failed");
        assert!(record.failure_reason.as_deref().unwrap().contains("declined"));
    }

    #[tokio::test]
    async fn test_verify_success_updates_store() {
        let (service, _gateway, store) = service_with(MockGateway::new());
        let initiated = service.initiate(valid_input()).await.unwrap();

        let verified = service.verify(&initiated.reference).await.unwrap();
        assert_eq!(verified.status, PaymentStatus::Success);
        assert_eq!(verified.amount, 50.0);
        assert_eq!(store.status_of(&initiated.reference).unwrap(), "success");
    }

    #[tokio::test]
    async fn test_verify_non_success_token_is_failure_with_raw_status() {
        let (service, _gateway, _store) =
            service_with(MockGateway::with_verify_status("abandoned"));
        let initiated = service.initiate(valid_input()).await.unwrap();

        let verified = service.verify(&initiated.reference).await.unwrap();
        assert_eq!(verified.status, PaymentStatus::Failed);
        assert_eq!(verified.raw_status, "abandoned");
    }

    #[tokio::test]
    async fn test_verify_is_idempotent_for_settled_reference() {
        let (service, gateway, _store) = service_with(MockGateway::new());
        let initiated = service.initiate(valid_input()).await.unwrap();

        let first = service.verify(&initiated.reference).await.unwrap();
        let second = service.verify(&initiated.reference).await.unwrap();

        assert_eq!(first.status, second.status);
        assert_eq!(first.amount, second.amount);
        assert_eq!(first.reference, second.reference);
        assert_eq!(gateway.verify_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_verify_rejects_empty_and_foreign_references() {
        let (service, gateway, _store) = service_with(MockGateway::new());

        assert!(matches!(
            service.verify("").await.unwrap_err(),
            AppError::Validation { .. }
        ));
        assert!(matches!(
            service.verify("order_123").await.unwrap_err(),
            AppError::Validation { .. }
        ));
        assert_eq!(gateway.verify_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_webhook_success_event_settles_donation_once() {
        let (service, _gateway, store) = service_with(MockGateway::new());
        let initiated = service.initiate(valid_input()).await.unwrap();

        let notification = WebhookNotification {
            event: "payment.successful".to_string(),
            data: Some(WebhookData {
                reference: Some(initiated.reference.clone()),
                amount: Some(5000),
                status: Some("success".to_string()),
                paid_at: Some("2026-08-01T12:00:00Z".to_string()),
                failure_reason: None,
            }),
        };

        service
            .process_webhook(notification, serde_json::json!({}))
            .await;

        assert_eq!(store.status_of(&initiated.reference).unwrap(), "success");
        assert_eq!(store.webhook_events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_webhook_failed_event_records_reason() {
        let (service, _gateway, store) = service_with(MockGateway::new());
        let initiated = service.initiate(valid_input()).await.unwrap();

        let notification = WebhookNotification {
            event: "payment.failed".to_string(),
            data: Some(WebhookData {
                reference: Some(initiated.reference.clone()),
                amount: Some(5000),
                status: Some("failed".to_string()),
                paid_at: None,
                failure_reason: Some("insufficient funds".to_string()),
            }),
        };

        service
            .process_webhook(notification, serde_json::json!({}))
            .await;

        assert_eq!(store.status_of(&initiated.reference).unwrap(), "failed");
        let records = store.records.lock().unwrap();
        let record = records.get(&initiated.reference).unwrap();
        assert_eq!(record.failure_reason.as_deref(), Some("insufficient funds"));
    }

    #[tokio::test]
    async fn test_webhook_unknown_event_is_acknowledged_not_applied() {
        let (service, _gateway, store) = service_with(MockGateway::new());
        let initiated = service.initiate(valid_input()).await.unwrap();

        let notification = WebhookNotification {
            event: "settlement.created".to_string(),
            data: None,
        };

        service
            .process_webhook(notification, serde_json::json!({}))
            .await;

        // Still pending: unrecognized events are logged and acknowledged only
        assert_eq!(store.status_of(&initiated.reference).unwrap(), "pending");
    }
}
