use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use tracing::warn;

use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::payments::types::WebhookNotification;

/// Header carrying the provider's HMAC-SHA256 signature of the raw body
pub const SIGNATURE_HEADER: &str = "x-lenco-signature";

/// Lenco webhook endpoint
///
/// The body is taken as raw bytes because the signature covers the exact
/// bytes sent, not a re-serialization. Parsing happens only after the
/// signature check passes; once the body is authenticated and parsed, the
/// provider always gets a 200 acknowledgment regardless of how processing
/// turned out.
pub async fn lenco_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<serde_json::Value>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    if !state.service.webhook_signature_valid(&body, signature) {
        warn!("Invalid Lenco webhook signature received");
        return Err(AppError::Unauthorized);
    }

    let raw_payload: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|_| AppError::bad_request("webhook body is not valid JSON"))?;

    let notification: WebhookNotification = serde_json::from_value(raw_payload.clone())
        .map_err(|_| AppError::bad_request("webhook body has an unexpected shape"))?;

    state.service.process_webhook(notification, raw_payload).await;

    Ok(Json(serde_json::json!({ "received": true })))
}
