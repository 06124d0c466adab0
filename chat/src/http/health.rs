// chat/src/http/health.rs
// Ambient `/health`, `/ready`, `/live` probes, mirroring the tracker
// service's health surface (tracker/src/http/health.rs), itself modeled on
// the teacher's backend/src/api/http/health.rs. The chat service has no
// database of its own; readiness instead reflects whether the tracker's
// admin API is currently reachable.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct ReadyResponse {
    status: &'static str,
    tracker: &'static str,
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "healthy"})))
}

/// GET /ready
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tracker_ok = state.tracker.ping().await;
    let response = ReadyResponse {
        status: if tracker_ok { "ready" } else { "not_ready" },
        tracker: if tracker_ok { "reachable" } else { "unreachable" },
    };

    if tracker_ok {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// GET /live
pub async fn liveness_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "alive"})))
}
