// tracker/src/http/mod.rs
// Tracker admin HTTP surface (spec.md §6).

pub mod chats;
pub mod error;
pub mod health;
pub mod links;

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::Router;
use linktracker_common::DomainError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use error::ApiError;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/tg-chat/{id}", post(chats::create_chat).delete(chats::delete_chat))
        .route("/links", get(links::get_links).post(links::add_link).delete(links::remove_link))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/live", get(health::liveness_check))
        .route("/metrics", get(crate::metrics::metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Extracts and validates the `Tg-Chat-Id` header (§6).
pub struct TgChatId(pub i64);

impl<S> FromRequestParts<S> for TgChatId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("Tg-Chat-Id")
            .ok_or_else(|| ApiError(DomainError::Validation("missing Tg-Chat-Id header".into())))?;

        let raw = raw
            .to_str()
            .map_err(|_| ApiError(DomainError::Validation("Tg-Chat-Id is not valid UTF-8".into())))?;

        let id: i64 = raw
            .parse()
            .map_err(|_| ApiError(DomainError::Validation(format!("invalid Tg-Chat-Id: {raw}"))))?;

        Ok(TgChatId(id))
    }
}

pub fn parse_chat_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError(DomainError::Validation(format!("invalid chat id: {raw}"))))
}
