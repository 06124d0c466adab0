// chat/src/cache.rs
// Read-through per-chat link cache (spec.md §4.6). A miss reads through to
// the tracker; `invalidate` re-reads and overwrites rather than evicting, so
// the next reader never blocks behind a cold fetch.

use std::sync::Arc;
use std::time::Duration;

use linktracker_common::{CachedLinkList, DomainError};
use moka::future::Cache;
use tracing::debug;

use crate::tracker_client::TrackerClient;

pub struct LinkCache {
    entries: Cache<i64, CachedLinkList>,
    tracker: Arc<TrackerClient>,
}

impl LinkCache {
    pub fn new(tracker: Arc<TrackerClient>, ttl: Duration, max_capacity: u64) -> Self {
        let entries = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(max_capacity)
            .build();
        Self { entries, tracker }
    }

    /// Reads the cached link list for `chat_id`, fetching through to the
    /// tracker on a miss.
    pub async fn get_links(&self, chat_id: i64) -> Result<CachedLinkList, DomainError> {
        if let Some(cached) = self.entries.get(&chat_id).await {
            metrics::counter!("chat_cache_hits_total").increment(1);
            return Ok(cached);
        }

        metrics::counter!("chat_cache_misses_total").increment(1);
        debug!(chat_id, "cache miss, reading through to tracker");
        self.refresh(chat_id).await
    }

    /// Overwrites the cache entry for `chat_id` with a fresh read from the
    /// tracker. Called after every successful add/remove (spec.md §4.6:
    /// "invalidate by fetching the fresh list and overwriting the cache").
    pub async fn refresh(&self, chat_id: i64) -> Result<CachedLinkList, DomainError> {
        let links = self.tracker.get_links(chat_id).await?;
        let snapshot = CachedLinkList { links };
        self.entries.insert(chat_id, snapshot.clone()).await;
        Ok(snapshot)
    }
}
