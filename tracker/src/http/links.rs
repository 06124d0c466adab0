// tracker/src/http/links.rs
// `/links` admin endpoints (spec.md §6).

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use linktracker_common::{DomainError, Link};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

use super::error::ApiError;
use super::TgChatId;

#[derive(Debug, Serialize)]
pub struct ListLinksResponse {
    pub links: Vec<Link>,
    pub size: i64,
}

#[derive(Debug, Deserialize)]
pub struct AddLinkRequest {
    pub link: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub filters: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveLinkRequest {
    pub link: String,
}

pub async fn get_links(
    State(state): State<Arc<AppState>>,
    TgChatId(chat_id): TgChatId,
) -> Result<Json<ListLinksResponse>, ApiError> {
    let links = state.store.get_links_by_chat(chat_id).await?;
    let size = links.len() as i64;
    Ok(Json(ListLinksResponse { links, size }))
}

pub async fn add_link(
    State(state): State<Arc<AppState>>,
    TgChatId(chat_id): TgChatId,
    Json(req): Json<AddLinkRequest>,
) -> Result<Json<Link>, ApiError> {
    if req.link.trim().is_empty() {
        return Err(ApiError(DomainError::Validation("link is required".into())));
    }

    let link = state
        .store
        .add_link(chat_id, &req.link, req.tags, req.filters)
        .await?;
    Ok(Json(link))
}

pub async fn remove_link(
    State(state): State<Arc<AppState>>,
    TgChatId(chat_id): TgChatId,
    Json(req): Json<RemoveLinkRequest>,
) -> Result<Json<Link>, ApiError> {
    if req.link.trim().is_empty() {
        return Err(ApiError(DomainError::Validation("link is required".into())));
    }

    let link = state.store.remove_link(chat_id, &req.link).await?;
    Ok(Json(link))
}
