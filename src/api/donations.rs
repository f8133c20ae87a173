use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::donations::DonationInput;
use crate::error::{AppError, AppResult};
use crate::payments::types::PaymentStatus;

/// Donor-facing initiation request body
///
/// Fields are optional at the wire level so missing values surface as
/// field-level validation errors rather than deserializer rejections.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateDonationRequest {
    pub amount: Option<f64>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub donation_frequency: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateDonationResponse {
    pub success: bool,
    pub payment_url: String,
    pub reference: String,
    pub payment_reference: Option<String>,
    pub amount: f64,
    pub formatted_amount: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyDonationParams {
    pub reference: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyDonationResponse {
    pub success: bool,
    pub reference: String,
    pub amount: f64,
    pub formatted_amount: String,
    pub status: PaymentStatus,
    /// Provider's literal status token, for diagnostics on failure
    pub provider_status: String,
    pub paid_at: Option<String>,
}

pub async fn initiate_donation(
    State(state): State<AppState>,
    Json(body): Json<InitiateDonationRequest>,
) -> AppResult<Json<InitiateDonationResponse>> {
    let amount = body
        .amount
        .ok_or_else(|| AppError::validation("amount", "amount is required"))?;

    let input = DonationInput {
        amount,
        first_name: body.first_name.unwrap_or_default(),
        last_name: body.last_name.unwrap_or_default(),
        email: body.email.unwrap_or_default(),
        phone: body.phone,
        donation_frequency: body.donation_frequency,
        metadata: body.metadata,
    };

    let initiated = state.service.initiate(input).await?;

    Ok(Json(InitiateDonationResponse {
        success: true,
        payment_url: initiated.payment_url,
        reference: initiated.reference,
        payment_reference: initiated.lenco_reference,
        amount: initiated.amount,
        formatted_amount: initiated.formatted_amount,
    }))
}

pub async fn verify_donation(
    State(state): State<AppState>,
    Query(params): Query<VerifyDonationParams>,
) -> AppResult<Json<VerifyDonationResponse>> {
    let reference = params.reference.unwrap_or_default();

    let verified = state.service.verify(&reference).await?;

    Ok(Json(VerifyDonationResponse {
        success: verified.status.is_success(),
        reference: verified.reference,
        amount: verified.amount,
        formatted_amount: verified.formatted_amount,
        status: verified.status,
        provider_status: verified.raw_status,
        paid_at: verified.paid_at,
    }))
}
