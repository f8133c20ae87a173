//! HTTP surface: router, shared state, and handlers

pub mod donations;
pub mod health;
pub mod webhooks;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::donations::DonationService;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub service: Arc<DonationService>,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id());

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/donations/initiate", post(donations::initiate_donation))
        .route("/api/donations/verify", get(donations::verify_donation))
        .route("/api/webhooks/lenco", post(webhooks::lenco_webhook))
        .layer(middleware)
        .with_state(state)
}
