use crate::database::error::DatabaseError;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Webhook delivery audit row
///
/// One row per authenticated webhook delivery, written after the signature
/// check passes. Processing outcome is recorded here and never affects the
/// HTTP acknowledgment sent to the provider.
#[derive(Debug, Clone, FromRow)]
pub struct WebhookEvent {
    pub id: String,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub processed: bool,
    pub last_error: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub processed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Repository for webhook delivery tracking
pub struct WebhookRepository {
    pool: PgPool,
}

impl WebhookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Log a newly authenticated webhook delivery
    pub async fn log_event(
        &self,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<WebhookEvent, DatabaseError> {
        let event_id = Uuid::new_v4().to_string();

        sqlx::query_as::<_, WebhookEvent>(
            "INSERT INTO webhook_events (id, event_type, payload, processed, created_at) \
             VALUES ($1, $2, $3, false, NOW()) \
             RETURNING id, event_type, payload, processed, last_error, created_at, processed_at",
        )
        .bind(&event_id)
        .bind(event_type)
        .bind(payload)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx(e))
    }

    /// Mark a webhook delivery as processed
    pub async fn mark_processed(&self, event_id: &str) -> Result<WebhookEvent, DatabaseError> {
        sqlx::query_as::<_, WebhookEvent>(
            "UPDATE webhook_events SET processed = true, processed_at = NOW() WHERE id = $1 \
             RETURNING id, event_type, payload, processed, last_error, created_at, processed_at",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx(e))
    }

    /// Record a processing failure without affecting the acknowledgment
    pub async fn record_failure(
        &self,
        event_id: &str,
        error: &str,
    ) -> Result<WebhookEvent, DatabaseError> {
        sqlx::query_as::<_, WebhookEvent>(
            "UPDATE webhook_events SET last_error = $2, processed_at = NOW() WHERE id = $1 \
             RETURNING id, event_type, payload, processed, last_error, created_at, processed_at",
        )
        .bind(event_id)
        .bind(error)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx(e))
    }
}
