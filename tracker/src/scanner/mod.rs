// tracker/src/scanner/mod.rs
// Periodic scanner (spec.md §4.3). Paginates through the entire link table
// every tick, classifies each link by host, polls the matching provider
// client, diffs against the high-water mark, persists, and emits.

use std::sync::Arc;
use std::time::Duration;

use linktracker_common::{Link, LinkUpdate};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::clients::ProviderClient;
use crate::store::Store;
use crate::transport::Sender;

/// Which upstream a link's host maps to, or `Unsupported` if neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Classification {
    CodeForge,
    QuestionAnswer,
    Unsupported,
}

fn classify(url: &str) -> Classification {
    if url.contains("://github.com/") {
        Classification::CodeForge
    } else if url.contains("://stackoverflow.com/") {
        Classification::QuestionAnswer
    } else {
        Classification::Unsupported
    }
}

pub struct Scanner {
    store: Arc<dyn Store>,
    github: Arc<dyn ProviderClient>,
    stackoverflow: Arc<dyn ProviderClient>,
    sender: Arc<dyn Sender>,
    page_size: i64,
}

impl Scanner {
    pub fn new(
        store: Arc<dyn Store>,
        github: Arc<dyn ProviderClient>,
        stackoverflow: Arc<dyn ProviderClient>,
        sender: Arc<dyn Sender>,
        page_size: i64,
    ) -> Self {
        Self {
            store,
            github,
            stackoverflow,
            sender,
            page_size,
        }
    }

    /// Runs the scan loop on a `tokio::time::interval`, honouring
    /// `cancel` between ticks and within a tick between links.
    pub async fn run(self: Arc<Self>, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("scanner shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    self.tick(&cancel).await;
                }
            }
        }
    }

    #[instrument(skip(self, cancel))]
    async fn tick(&self, cancel: &CancellationToken) {
        let started = std::time::Instant::now();
        let mut offset = 0i64;
        let mut processed = 0u64;

        loop {
            if cancel.is_cancelled() {
                info!("scan tick cancelled mid-page");
                return;
            }

            let links = match self.store.get_links(self.page_size, offset).await {
                Ok(links) => links,
                Err(e) => {
                    error!(error = %e, "failed to page through links");
                    return;
                }
            };

            if links.is_empty() {
                break;
            }

            for link in links {
                if cancel.is_cancelled() {
                    info!("scan tick cancelled mid-link");
                    return;
                }
                if let Err(e) = self.process_link(link).await {
                    error!(error = %e, "error processing link, continuing scan");
                }
                processed += 1;
            }

            offset += self.page_size;
        }

        metrics::histogram!("tracker_scan_tick_duration_seconds").record(started.elapsed().as_secs_f64());
        metrics::counter!("tracker_scan_links_processed_total").increment(processed);
        info!(processed, elapsed_ms = started.elapsed().as_millis() as u64, "scan tick complete");
    }

    /// Implements the per-link state machine from spec.md §4.3.
    async fn process_link(&self, link: Link) -> anyhow::Result<()> {
        match classify(&link.url) {
            Classification::Unsupported => {
                warn!(url = %link.url, "unsupported link, removing");
                self.store.remove_link(link.chat_id, &link.url).await?;
                metrics::counter!("tracker_scan_links_removed_total").increment(1);

                let update = LinkUpdate {
                    id: link.id,
                    url: link.url.clone(),
                    description: "This link is no longer supported and has been removed.".to_string(),
                    tg_chat_ids: vec![link.chat_id],
                };
                self.sender.send(&update, true).await?;
                Ok(())
            }
            kind => {
                let high_water = link.last_updated.unwrap_or_else(|| {
                    chrono::DateTime::from_timestamp(0, 0).expect("epoch is valid")
                });

                let client: &Arc<dyn ProviderClient> = match kind {
                    Classification::CodeForge => &self.github,
                    Classification::QuestionAnswer => &self.stackoverflow,
                    Classification::Unsupported => unreachable!(),
                };

                let snapshot = client.get_updates(&link.url, high_water).await?;
                if snapshot.is_empty() {
                    return Ok(());
                }

                let new_mark = snapshot.max_updated_at().expect("non-empty snapshot has a max");
                let mut updated_link = link.clone();
                updated_link.last_updated = Some(new_mark);

                // §9: cancellation must not persist without also emitting.
                // There is no cancellation point between here and the send
                // below, so the two always happen together or neither does
                // (an error from either simply aborts this link for the
                // tick without retrying).
                self.store.update_link(&updated_link).await?;

                let update = LinkUpdate {
                    id: link.id,
                    url: link.url.clone(),
                    description: snapshot.render_description(),
                    tg_chat_ids: vec![link.chat_id],
                };
                self.sender.send(&update, false).await?;
                metrics::counter!("tracker_scan_links_updated_total").increment(1);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use linktracker_common::{DomainError, ProviderSnapshot};
    use parking_lot::Mutex;
    use std::collections::HashMap;

    struct FakeStore {
        links: Mutex<HashMap<i64, Link>>,
    }

    #[async_trait]
    impl Store for FakeStore {
        async fn create_chat(&self, _id: i64) -> Result<(), DomainError> {
            Ok(())
        }
        async fn delete_chat(&self, _id: i64) -> Result<(), DomainError> {
            Ok(())
        }
        async fn get_links(&self, limit: i64, offset: i64) -> Result<Vec<Link>, DomainError> {
            let mut links: Vec<Link> = self.links.lock().values().cloned().collect();
            links.sort_by_key(|l| l.id);
            Ok(links.into_iter().skip(offset as usize).take(limit as usize).collect())
        }
        async fn get_links_by_chat(&self, chat_id: i64) -> Result<Vec<Link>, DomainError> {
            Ok(self.links.lock().values().filter(|l| l.chat_id == chat_id).cloned().collect())
        }
        async fn add_link(
            &self,
            _chat_id: i64,
            _url: &str,
            _tags: Vec<String>,
            _filters: Vec<String>,
        ) -> Result<Link, DomainError> {
            unimplemented!()
        }
        async fn remove_link(&self, chat_id: i64, url: &str) -> Result<Link, DomainError> {
            let mut links = self.links.lock();
            let id = links
                .iter()
                .find(|(_, l)| l.chat_id == chat_id && l.url == url)
                .map(|(id, _)| *id)
                .ok_or_else(|| DomainError::NotExists("link".into()))?;
            Ok(links.remove(&id).unwrap())
        }
        async fn update_link(&self, link: &Link) -> Result<(), DomainError> {
            self.links.lock().insert(link.id, link.clone());
            Ok(())
        }
        async fn count_links_matching(&self, _substring: &str) -> Result<i64, DomainError> {
            Ok(self.links.lock().len() as i64)
        }
        async fn ping(&self) -> bool {
            true
        }
        async fn migrations_applied(&self) -> bool {
            true
        }
    }

    struct FakeProvider {
        snapshot: ProviderSnapshot,
    }

    #[async_trait]
    impl ProviderClient for FakeProvider {
        async fn get_updates(
            &self,
            _url: &str,
            _high_water: chrono::DateTime<chrono::Utc>,
        ) -> Result<ProviderSnapshot, DomainError> {
            Ok(self.snapshot.clone())
        }
    }

    struct FakeSender {
        sent: Mutex<Vec<(LinkUpdate, bool)>>,
    }

    #[async_trait]
    impl crate::transport::Sender for FakeSender {
        async fn send(&self, update: &LinkUpdate, is_failed: bool) -> anyhow::Result<()> {
            self.sent.lock().push((update.clone(), is_failed));
            Ok(())
        }
    }

    fn link(id: i64, chat_id: i64, url: &str) -> Link {
        Link {
            id,
            chat_id,
            url: url.to_string(),
            tags: vec![],
            filters: vec![],
            last_updated: None,
        }
    }

    #[tokio::test]
    async fn unsupported_link_is_removed_and_emits_failure() {
        let mut links = HashMap::new();
        links.insert(1, link(1, 7, "https://example.com/x"));
        let store = Arc::new(FakeStore { links: Mutex::new(links) });
        let sender = Arc::new(FakeSender { sent: Mutex::new(vec![]) });

        let scanner = Scanner::new(
            store.clone(),
            Arc::new(FakeProvider { snapshot: ProviderSnapshot::default() }),
            Arc::new(FakeProvider { snapshot: ProviderSnapshot::default() }),
            sender.clone(),
            100,
        );

        scanner.process_link(link(1, 7, "https://example.com/x")).await.unwrap();

        assert!(store.get_links_by_chat(7).await.unwrap().is_empty());
        let sent = sender.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.tg_chat_ids, vec![7]);
        assert!(sent[0].1, "failure flag should be set");
    }

    #[tokio::test]
    async fn empty_snapshot_does_not_emit() {
        let links = HashMap::new();
        let store = Arc::new(FakeStore { links: Mutex::new(links) });
        let sender = Arc::new(FakeSender { sent: Mutex::new(vec![]) });

        let scanner = Scanner::new(
            store,
            Arc::new(FakeProvider { snapshot: ProviderSnapshot::default() }),
            Arc::new(FakeProvider { snapshot: ProviderSnapshot::default() }),
            sender.clone(),
            100,
        );

        scanner
            .process_link(link(2, 1, "https://github.com/foo/bar"))
            .await
            .unwrap();

        assert!(sender.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn delta_advances_high_water_and_emits_once() {
        use linktracker_common::ProviderItem;

        let mut links = HashMap::new();
        links.insert(3, link(3, 1, "https://github.com/foo/bar"));
        let store = Arc::new(FakeStore { links: Mutex::new(links) });
        let sender = Arc::new(FakeSender { sent: Mutex::new(vec![]) });

        let new_mark = chrono::Utc::now();
        let snapshot = ProviderSnapshot {
            items: vec![ProviderItem {
                title: "new pr".into(),
                author: "alice".into(),
                updated_at: new_mark,
                body: "body".into(),
            }],
        };

        let scanner = Scanner::new(
            store.clone(),
            Arc::new(FakeProvider { snapshot }),
            Arc::new(FakeProvider { snapshot: ProviderSnapshot::default() }),
            sender.clone(),
            100,
        );

        scanner
            .process_link(link(3, 1, "https://github.com/foo/bar"))
            .await
            .unwrap();

        let updated = store.get_links_by_chat(1).await.unwrap();
        assert_eq!(updated[0].last_updated.unwrap(), new_mark);
        assert_eq!(sender.sent.lock().len(), 1);
    }
}
