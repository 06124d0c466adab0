// tracker/src/store/sqlite.rs
// SQLite implementation of the `Store` contract, grounded on the teacher's
// `sqlx::SqlitePool` usage in backend/src/cache/mod.rs and state.rs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use linktracker_common::{DomainError, Link};
use sqlx::{Row, SqlitePool};

use super::Store;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), DomainError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DomainError::Other(e.into()))
    }

    fn row_to_link(row: &sqlx::sqlite::SqliteRow) -> Result<Link, DomainError> {
        let tags_json: String = row.get("tags");
        let filters_json: String = row.get("filters");
        let last_updated: Option<String> = row.get("lastUpdated");

        Ok(Link {
            id: row.get("id"),
            chat_id: row.get("chatId"),
            url: row.get("link"),
            tags: serde_json::from_str(&tags_json).unwrap_or_default(),
            filters: serde_json::from_str(&filters_json).unwrap_or_default(),
            last_updated: last_updated
                .map(|s| DateTime::parse_from_rfc3339(&s).map(|d| d.with_timezone(&Utc)))
                .transpose()
                .map_err(|e| DomainError::Other(anyhow::anyhow!("bad lastUpdated: {e}")))?,
        })
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn create_chat(&self, id: i64) -> Result<(), DomainError> {
        let result = sqlx::query("INSERT INTO chats (id) VALUES (?)")
            .bind(id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(DomainError::AlreadyExists(format!("chat {id}")))
            }
            Err(e) => Err(DomainError::Other(e.into())),
        }
    }

    async fn delete_chat(&self, id: i64) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM chats WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Other(e.into()))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotExists(format!("chat {id}")));
        }
        Ok(())
    }

    async fn get_links(&self, limit: i64, offset: i64) -> Result<Vec<Link>, DomainError> {
        let rows = sqlx::query("SELECT * FROM links ORDER BY id LIMIT ? OFFSET ?")
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::Other(e.into()))?;

        rows.iter().map(Self::row_to_link).collect()
    }

    async fn get_links_by_chat(&self, chat_id: i64) -> Result<Vec<Link>, DomainError> {
        let rows = sqlx::query("SELECT * FROM links WHERE chatId = ? ORDER BY id")
            .bind(chat_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::Other(e.into()))?;

        rows.iter().map(Self::row_to_link).collect()
    }

    async fn add_link(
        &self,
        chat_id: i64,
        url: &str,
        tags: Vec<String>,
        filters: Vec<String>,
    ) -> Result<Link, DomainError> {
        let now = Utc::now();
        let tags_json = serde_json::to_string(&tags).unwrap();
        let filters_json = serde_json::to_string(&filters).unwrap();

        let result = sqlx::query(
            r#"
            INSERT INTO links (link, tags, filters, lastUpdated, chatId)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(url)
        .bind(&tags_json)
        .bind(&filters_json)
        .bind(now.to_rfc3339())
        .bind(chat_id)
        .execute(&self.pool)
        .await;

        let id = match result {
            Ok(r) => r.last_insert_rowid(),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(DomainError::AlreadyExists(format!("link {url} for chat {chat_id}")));
            }
            Err(e) => return Err(DomainError::Other(e.into())),
        };

        Ok(Link {
            id,
            chat_id,
            url: url.to_string(),
            tags,
            filters,
            last_updated: Some(now),
        })
    }

    async fn remove_link(&self, chat_id: i64, url: &str) -> Result<Link, DomainError> {
        let row = sqlx::query("SELECT * FROM links WHERE chatId = ? AND link = ?")
            .bind(chat_id)
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::Other(e.into()))?;

        let Some(row) = row else {
            return Err(DomainError::NotExists(format!("link {url} for chat {chat_id}")));
        };
        let link = Self::row_to_link(&row)?;

        sqlx::query("DELETE FROM links WHERE id = ?")
            .bind(link.id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Other(e.into()))?;

        Ok(link)
    }

    async fn update_link(&self, link: &Link) -> Result<(), DomainError> {
        let last_updated = link.last_updated.map(|d| d.to_rfc3339());
        let result = sqlx::query("UPDATE links SET lastUpdated = ? WHERE id = ?")
            .bind(last_updated)
            .bind(link.id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Other(e.into()))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotExists(format!("link {}", link.id)));
        }
        Ok(())
    }

    async fn count_links_matching(&self, substring: &str) -> Result<i64, DomainError> {
        let pattern = format!("%{substring}%");
        let row = sqlx::query("SELECT COUNT(*) as count FROM links WHERE link LIKE ?")
            .bind(pattern)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::Other(e.into()))?;

        Ok(row.get("count"))
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    async fn migrations_applied(&self) -> bool {
        sqlx::query("SELECT 1 FROM links LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .is_ok()
    }
}
