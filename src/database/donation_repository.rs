use crate::database::error::DatabaseError;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Donation attempt entity
///
/// One row per initiated donation. The gateway owns the authoritative
/// settlement state; this row mirrors the latest status this service has
/// seen through verify or webhook calls.
#[derive(Debug, Clone, FromRow)]
pub struct DonationRecord {
    pub id: Uuid,
    pub reference: String,
    pub amount_minor: i64,
    pub currency: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub frequency: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub status: String,
    pub lenco_reference: Option<String>,
    pub paid_at: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Fields captured at initiation
#[derive(Debug, Clone)]
pub struct NewDonation {
    pub reference: String,
    pub amount_minor: i64,
    pub currency: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub frequency: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Status transition applied by the verify and webhook flows
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    pub status: String,
    pub lenco_reference: Option<String>,
    pub paid_at: Option<String>,
    pub failure_reason: Option<String>,
}

/// Repository for donation attempts
pub struct DonationRepository {
    pool: PgPool,
}

const RETURNING_COLUMNS: &str = "id, reference, amount_minor, currency, email, first_name, last_name, phone, frequency, metadata, status, lenco_reference, paid_at, failure_reason, created_at, updated_at";

impl DonationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a pending donation row for a freshly generated reference
    pub async fn insert_pending(
        &self,
        donation: &NewDonation,
    ) -> Result<DonationRecord, DatabaseError> {
        sqlx::query_as::<_, DonationRecord>(&format!(
            "INSERT INTO donations (reference, amount_minor, currency, email, first_name, last_name, phone, frequency, metadata, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending') \
             RETURNING {}",
            RETURNING_COLUMNS
        ))
        .bind(&donation.reference)
        .bind(donation.amount_minor)
        .bind(&donation.currency)
        .bind(&donation.email)
        .bind(&donation.first_name)
        .bind(&donation.last_name)
        .bind(&donation.phone)
        .bind(&donation.frequency)
        .bind(&donation.metadata)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx(e))
    }

    /// Apply a status transition by reference
    ///
    /// Idempotent: replaying the same transition leaves the row unchanged.
    /// Returns `None` when no row carries the reference.
    pub async fn update_status(
        &self,
        reference: &str,
        update: &StatusUpdate,
    ) -> Result<Option<DonationRecord>, DatabaseError> {
        sqlx::query_as::<_, DonationRecord>(&format!(
            "UPDATE donations \
             SET status = $2, \
                 lenco_reference = COALESCE($3, lenco_reference), \
                 paid_at = COALESCE($4, paid_at), \
                 failure_reason = COALESCE($5, failure_reason), \
                 updated_at = NOW() \
             WHERE reference = $1 \
             RETURNING {}",
            RETURNING_COLUMNS
        ))
        .bind(reference)
        .bind(&update.status)
        .bind(&update.lenco_reference)
        .bind(&update.paid_at)
        .bind(&update.failure_reason)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx(e))
    }

    /// Find a donation attempt by its reference
    pub async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<DonationRecord>, DatabaseError> {
        sqlx::query_as::<_, DonationRecord>(&format!(
            "SELECT {} FROM donations WHERE reference = $1",
            RETURNING_COLUMNS
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx(e))
    }
}
