use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::api::AppState;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub currency: String,
    pub lenco_configured: bool,
}

pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let version = env!("CARGO_PKG_VERSION").to_string();

    let lenco_configured = !state.config.lenco.secret_key.is_empty()
        && !state.config.lenco.api_key.is_empty()
        && !state.config.lenco.webhook_secret.is_empty();

    let response = HealthResponse {
        status: "healthy".to_string(),
        version,
        environment: state.config.server.environment.clone(),
        currency: state.config.donations.currency.clone(),
        lenco_configured,
    };

    Ok(Json(response))
}
