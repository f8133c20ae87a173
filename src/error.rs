use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::database::error::DatabaseError;

pub type AppResult<T> = Result<T, AppError>;

/// Errors surfaced by the payment gateway client.
///
/// Non-2xx responses keep the provider's own message when the body is JSON;
/// anything else (HTML error pages, truncated bodies) carries the HTTP status
/// only and is never parsed as structured data.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{message}")]
    Api { message: String },

    #[error("payment provider returned HTTP {status}")]
    Http { status: u16 },

    #[error("invalid response from payment provider")]
    InvalidResponse,

    #[error("payment provider request timed out")]
    Timeout,

    #[error("payment provider request failed: {message}")]
    Network { message: String },
}

impl GatewayError {
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else {
            GatewayError::network(err.to_string())
        }
    }
}

/// Application error taxonomy.
///
/// Validation failures are resolved locally as 400 with a field-level
/// message; gateway failures map to 502 to distinguish a bad upstream from
/// this service's own defects (500); webhook auth failures are a generic 401.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("{message}")]
    BadRequest { message: String },

    #[error("unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("{message}")]
    Internal { message: String },
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            // A 401 must not reveal whether the payload itself was well-formed
            AppError::Unauthorized => "unauthorized".to_string(),
            AppError::Database(_) | AppError::Internal { .. } => {
                error!("internal error: {}", self);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
