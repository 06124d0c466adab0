// tracker/src/transport/bus.rs
// Asynchronous message bus transport (spec.md §4.4). Enqueues updates on the
// primary topic; an internal error-drain task continuously re-routes
// production failures and serialisation failures to the dead-letter topic
// with a structured `{error, raw}` envelope.
//
// §9 Open Question resolved: `is_failed` is NOT a DLQ trigger here — failure
// notices are legitimate updates and go to the primary topic like any other.
// The DLQ is reserved for payloads that could not be marshalled or produced.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use linktracker_common::LinkUpdate;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;

use super::Sender;

/// Envelope carried on the DLQ topic for undeliverable payloads.
#[derive(Debug, Serialize)]
struct DlqEnvelope {
    error: String,
    raw: String,
}

/// Bounded retry count for the DLQ path itself, so a DLQ that is also
/// unreachable does not loop forever re-posting through the same producer
/// (spec.md §9 DESIGN NOTES).
const MAX_DLQ_ATTEMPTS: u32 = 3;

pub struct BusSender {
    producer: Arc<FutureProducer>,
    update_topic: String,
    drain_tx: mpsc::UnboundedSender<DlqEnvelope>,
}

impl BusSender {
    pub fn new(brokers: &str, update_topic: String, dlq_topic: String) -> anyhow::Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;
        let producer = Arc::new(producer);

        let (drain_tx, drain_rx) = mpsc::unbounded_channel::<DlqEnvelope>();
        tokio::spawn(Self::run_drain(producer.clone(), dlq_topic, drain_rx));

        Ok(Self {
            producer,
            update_topic,
            drain_tx,
        })
    }

    /// Owns the DLQ re-routing for the lifetime of the producer. Stops once
    /// every `BusSender` clone referencing `drain_tx` is dropped, closing
    /// the channel.
    async fn run_drain(
        producer: Arc<FutureProducer>,
        dlq_topic: String,
        mut drain_rx: mpsc::UnboundedReceiver<DlqEnvelope>,
    ) {
        while let Some(envelope) = drain_rx.recv().await {
            let payload = serde_json::to_string(&envelope).unwrap_or_else(|_| envelope.raw.clone());

            for attempt in 0..MAX_DLQ_ATTEMPTS {
                let record: FutureRecord<str, str> =
                    FutureRecord::to(&dlq_topic).payload(&payload).key("dlq");

                match producer.send(record, Duration::from_secs(5)).await {
                    Ok(_) => break,
                    Err((e, _owned)) => {
                        warn!(attempt, error = %e, "failed to deliver to dead-letter topic");
                        if attempt + 1 == MAX_DLQ_ATTEMPTS {
                            metrics::counter!("tracker_dlq_delivery_failures_total").increment(1);
                        }
                    }
                }
            }
        }
    }
}

#[async_trait]
impl Sender for BusSender {
    async fn send(&self, update: &LinkUpdate, _is_failed: bool) -> anyhow::Result<()> {
        let payload = match serde_json::to_string(update) {
            Ok(p) => p,
            Err(e) => {
                let _ = self.drain_tx.send(DlqEnvelope {
                    error: e.to_string(),
                    raw: format!("{update:?}"),
                });
                return Err(anyhow::anyhow!("serialization failed, routed to DLQ: {e}"));
            }
        };

        let key = update.id.to_string();
        let record: FutureRecord<str, str> =
            FutureRecord::to(&self.update_topic).payload(&payload).key(&key);

        match self.producer.send(record, Duration::from_secs(5)).await {
            Ok(_) => Ok(()),
            Err((e, _owned)) => {
                let _ = self.drain_tx.send(DlqEnvelope {
                    error: e.to_string(),
                    raw: payload,
                });
                Err(anyhow::anyhow!("bus send failed, routed to DLQ: {e}"))
            }
        }
    }
}
