// chat/src/http/mod.rs
// Chat service HTTP surface: the inbound update sink plus the ambient
// health/metrics endpoints (SPEC_FULL.md §6).

pub mod health;
pub mod updates;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/updates", post(updates::receive_update))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/live", get(health::liveness_check))
        .route("/metrics", get(crate::metrics::metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
