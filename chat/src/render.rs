// chat/src/render.rs
// Chat-platform adapter contract. The concrete messaging platform is an
// external collaborator (spec.md §1); this crate only needs to be able to
// push one text message per chat id. Ships a logging adapter suitable for
// tests and for running the service without a real bot token configured.

use async_trait::async_trait;
use tracing::info;

#[async_trait]
pub trait ChatAdapter: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> anyhow::Result<()>;
}

pub struct LoggingAdapter;

#[async_trait]
impl ChatAdapter for LoggingAdapter {
    async fn send_text(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
        info!(chat_id, %text, "rendered message to chat");
        Ok(())
    }
}
