use crate::database::donation_repository::{
    DonationRecord, DonationRepository, NewDonation, StatusUpdate,
};
use crate::database::error::DatabaseError;
use crate::database::webhook_repository::WebhookRepository;
use async_trait::async_trait;
use sqlx::PgPool;

/// Storage seam the donation flows program against
///
/// The flows only ever create a record, apply a status transition, and track
/// webhook deliveries; the gateway's ledger stays authoritative. Tests
/// substitute an in-memory implementation.
#[async_trait]
pub trait DonationStore: Send + Sync {
    /// Persist a pending donation attempt at initiation
    async fn record_initiated(
        &self,
        donation: NewDonation,
    ) -> Result<DonationRecord, DatabaseError>;

    /// Apply a status transition by reference; `None` if the reference is
    /// unknown to this store
    async fn apply_status(
        &self,
        reference: &str,
        update: StatusUpdate,
    ) -> Result<Option<DonationRecord>, DatabaseError>;

    /// Look up a donation attempt by reference
    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<DonationRecord>, DatabaseError>;

    /// Record an authenticated webhook delivery; returns the audit row id
    async fn log_webhook_event(
        &self,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<String, DatabaseError>;

    /// Record the processing outcome of a webhook delivery
    async fn finish_webhook_event(
        &self,
        event_id: &str,
        error: Option<&str>,
    ) -> Result<(), DatabaseError>;
}

/// Postgres-backed donation store
pub struct PgDonationStore {
    donations: DonationRepository,
    webhooks: WebhookRepository,
}

impl PgDonationStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            donations: DonationRepository::new(pool.clone()),
            webhooks: WebhookRepository::new(pool),
        }
    }
}

#[async_trait]
impl DonationStore for PgDonationStore {
    async fn record_initiated(
        &self,
        donation: NewDonation,
    ) -> Result<DonationRecord, DatabaseError> {
        self.donations.insert_pending(&donation).await
    }

    async fn apply_status(
        &self,
        reference: &str,
        update: StatusUpdate,
    ) -> Result<Option<DonationRecord>, DatabaseError> {
        self.donations.update_status(reference, &update).await
    }

    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<DonationRecord>, DatabaseError> {
        self.donations.find_by_reference(reference).await
    }

    async fn log_webhook_event(
        &self,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<String, DatabaseError> {
        let event = self.webhooks.log_event(event_type, payload).await?;
        Ok(event.id)
    }

    async fn finish_webhook_event(
        &self,
        event_id: &str,
        error: Option<&str>,
    ) -> Result<(), DatabaseError> {
        match error {
            None => self.webhooks.mark_processed(event_id).await?,
            Some(message) => self.webhooks.record_failure(event_id, message).await?,
        };
        Ok(())
    }
}
