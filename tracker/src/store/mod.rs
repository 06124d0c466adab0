// tracker/src/store/mod.rs
// Persistent store contract (spec.md §4.2). Schema-agnostic: the repo ships
// one SQLite-backed implementation, treating the spec's "two equivalent
// persistence layers" as a single contract (DESIGN.md records this choice).

mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;
use linktracker_common::{DomainError, Link};

#[async_trait]
pub trait Store: Send + Sync {
    async fn create_chat(&self, id: i64) -> Result<(), DomainError>;
    async fn delete_chat(&self, id: i64) -> Result<(), DomainError>;

    /// Ordered, stable pagination across the entire link table.
    async fn get_links(&self, limit: i64, offset: i64) -> Result<Vec<Link>, DomainError>;

    async fn get_links_by_chat(&self, chat_id: i64) -> Result<Vec<Link>, DomainError>;

    async fn add_link(
        &self,
        chat_id: i64,
        url: &str,
        tags: Vec<String>,
        filters: Vec<String>,
    ) -> Result<Link, DomainError>;

    async fn remove_link(&self, chat_id: i64, url: &str) -> Result<Link, DomainError>;

    async fn update_link(&self, link: &Link) -> Result<(), DomainError>;

    async fn count_links_matching(&self, substring: &str) -> Result<i64, DomainError>;

    /// Connectivity probe for `/health`.
    async fn ping(&self) -> bool;

    /// Readiness probe: have migrations been applied.
    async fn migrations_applied(&self) -> bool;
}
