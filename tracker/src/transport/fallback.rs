// tracker/src/transport/fallback.rs
// Composes a primary and (optional) fallback transport. `send` tries the
// primary first; on any error it tries the fallback; only if both fail does
// it return an aggregated error (spec.md §4.4, §8 "at-least-once" law).

use async_trait::async_trait;
use linktracker_common::LinkUpdate;
use tracing::warn;

use super::Sender;

pub struct FallbackSender {
    primary: Box<dyn Sender>,
    fallback: Option<Box<dyn Sender>>,
}

impl FallbackSender {
    pub fn new(primary: Box<dyn Sender>, fallback: Option<Box<dyn Sender>>) -> Self {
        if fallback.is_none() {
            warn!("fallback transport unavailable at startup; running primary-only");
        }
        Self { primary, fallback }
    }
}

#[async_trait]
impl Sender for FallbackSender {
    async fn send(&self, update: &LinkUpdate, is_failed: bool) -> anyhow::Result<()> {
        metrics::counter!("tracker_transport_primary_attempts_total").increment(1);
        match self.primary.send(update, is_failed).await {
            Ok(()) => return Ok(()),
            Err(primary_err) => {
                let Some(fallback) = &self.fallback else {
                    return Err(primary_err);
                };

                metrics::counter!("tracker_transport_fallback_attempts_total").increment(1);
                match fallback.send(update, is_failed).await {
                    Ok(()) => Ok(()),
                    Err(fallback_err) => Err(anyhow::anyhow!(
                        "both transports failed: primary={primary_err}, fallback={fallback_err}"
                    )),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSender {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl Sender for CountingSender {
        async fn send(&self, _update: &LinkUpdate, _is_failed: bool) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(anyhow::anyhow!("boom"))
            } else {
                Ok(())
            }
        }
    }

    fn sample_update() -> LinkUpdate {
        LinkUpdate {
            id: 1,
            url: "https://github.com/foo/bar".into(),
            description: "desc".into(),
            tg_chat_ids: vec![1],
        }
    }

    #[tokio::test]
    async fn primary_failure_falls_back_and_succeeds() {
        let primary_calls = Arc::new(AtomicUsize::new(0));
        let fallback_calls = Arc::new(AtomicUsize::new(0));

        let sender = FallbackSender::new(
            Box::new(CountingSender { calls: primary_calls.clone(), fail: true }),
            Some(Box::new(CountingSender { calls: fallback_calls.clone(), fail: false })),
        );

        sender.send(&sample_update(), false).await.unwrap();
        assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn both_failing_returns_aggregated_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sender = FallbackSender::new(
            Box::new(CountingSender { calls: calls.clone(), fail: true }),
            Some(Box::new(CountingSender { calls: calls.clone(), fail: true })),
        );

        let err = sender.send(&sample_update(), false).await.unwrap_err();
        assert!(err.to_string().contains("both transports failed"));
    }

    #[tokio::test]
    async fn missing_fallback_runs_primary_only() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sender = FallbackSender::new(
            Box::new(CountingSender { calls: calls.clone(), fail: false }),
            None,
        );

        sender.send(&sample_update(), false).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
