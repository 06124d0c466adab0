// tracker/src/http/chats.rs
// `/tg-chat/{id}` admin endpoints (spec.md §6).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::state::AppState;

use super::error::ApiError;
use super::parse_chat_id;

pub async fn create_chat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let chat_id = parse_chat_id(&id)?;
    state.store.create_chat(chat_id).await?;
    Ok(StatusCode::OK)
}

pub async fn delete_chat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let chat_id = parse_chat_id(&id)?;
    state.store.delete_chat(chat_id).await?;
    Ok(StatusCode::OK)
}
