// common/src/model.rs
// Core entities from spec.md §3.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered chat. Identity is the chat's own numeric id (§3: "a chat
/// exists exactly once").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// A tracked link, owned by exactly one chat.
///
/// `(chat_id, url)` is unique; `last_updated` is the high-water mark used
/// for diffing new provider activity and only ever advances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: i64,
    pub chat_id: i64,
    pub url: String,
    pub tags: Vec<String>,
    pub filters: Vec<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Transient update emitted by the scanner, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkUpdate {
    pub id: i64,
    pub url: String,
    pub description: String,
    #[serde(rename = "tgChatIds")]
    pub tg_chat_ids: Vec<i64>,
}

impl LinkUpdate {
    /// §3 invariant: `chat ids` is non-empty; `id` and `url` are required.
    pub fn is_valid(&self) -> bool {
        !self.tg_chat_ids.is_empty() && self.id != 0 && !self.url.is_empty()
    }
}

/// Step in the multi-turn `/track` conversation (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackStep {
    AwaitingLink,
    AwaitingTags,
    AwaitingFilters,
}

/// Per-chat-user transient state driving the `/track` flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserSession {
    pub chat_id: i64,
    pub step: Option<TrackStep>,
    pub partial_link: Option<String>,
    pub partial_tags: Vec<String>,
    pub partial_filters: Vec<String>,
}

impl UserSession {
    pub fn new(chat_id: i64) -> Self {
        Self {
            chat_id,
            step: Some(TrackStep::AwaitingLink),
            partial_link: None,
            partial_tags: Vec::new(),
            partial_filters: Vec::new(),
        }
    }
}

/// Per-chat cached list of link snapshots (read-through cache, §4.6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CachedLinkList {
    pub links: Vec<Link>,
}

/// A single new item observed from a provider (a PR, issue, answer or
/// comment), used to build the human-readable `LinkUpdate.description`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderItem {
    pub title: String,
    pub author: String,
    pub updated_at: DateTime<Utc>,
    pub body: String,
}

/// Snapshot returned by a provider client for one poll of one link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderSnapshot {
    pub items: Vec<ProviderItem>,
}

impl ProviderSnapshot {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The maximum `updated_at` among items, i.e. the new high-water mark.
    pub fn max_updated_at(&self) -> Option<DateTime<Utc>> {
        self.items.iter().map(|i| i.updated_at).max()
    }

    /// Human-readable description enumerating each new item (§4.3 step 4).
    pub fn render_description(&self) -> String {
        self.items
            .iter()
            .map(|item| {
                format!(
                    "- {} by {} at {}\n{}",
                    item.title,
                    item.author,
                    item.updated_at.to_rfc3339(),
                    item.body
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
