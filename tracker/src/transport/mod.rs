// tracker/src/transport/mod.rs
// Outbound delivery (spec.md §4.4): two transports implementing the same
// `Send(update, isFailed)` capability, composed by a `FallbackSender`.

pub mod bus;
pub mod fallback;
pub mod http;

pub use bus::BusSender;
pub use fallback::FallbackSender;
pub use http::HttpSender;

use async_trait::async_trait;
use linktracker_common::LinkUpdate;

#[async_trait]
pub trait Sender: Send + Sync {
    /// Delivers `update`. `is_failed` marks a failure notice (an
    /// unsupported-link removal) rather than ordinary new activity — per
    /// spec.md §9's resolved Open Question, this is a legitimate update
    /// that still goes out over the primary topic/transport, not the DLQ.
    async fn send(&self, update: &LinkUpdate, is_failed: bool) -> anyhow::Result<()>;
}
