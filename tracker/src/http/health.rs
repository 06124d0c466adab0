// tracker/src/http/health.rs
// Ambient `/health`, `/ready`, `/live` probes (SPEC_FULL.md §6), modeled on
// the teacher's backend/src/api/http/health.rs.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    db: &'static str,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: &'static str,
    migrations: &'static str,
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let db_ok = state.store.ping().await;
    let response = HealthResponse {
        status: if db_ok { "healthy" } else { "unhealthy" },
        db: if db_ok { "ok" } else { "error" },
    };

    if db_ok {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// GET /ready
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let migrations_ok = state.store.migrations_applied().await;
    let response = ReadyResponse {
        status: if migrations_ok { "ready" } else { "not_ready" },
        migrations: if migrations_ok { "applied" } else { "pending" },
    };

    if migrations_ok {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// GET /live
pub async fn liveness_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "alive"})))
}
