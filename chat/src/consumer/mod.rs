// chat/src/consumer/mod.rs
// Update consumer (spec.md §4.5). Two routines run concurrently, sharing a
// consumer group id, against the primary topic and the DLQ topic. Each
// deserialises the message, invokes a handler, and acknowledges.
// Deserialisation failures are acknowledged (and dropped) with a sentinel
// label; handler failures are left unacknowledged so the bus may redeliver.

use std::sync::Arc;

use futures::StreamExt;
use linktracker_common::LinkUpdate;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::Message;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::render::ChatAdapter;

/// Mirrors the `{error, raw}` envelope the bus transport posts to the DLQ
/// (tracker/src/transport/bus.rs). If the payload doesn't parse as this
/// shape it's treated as a bare `LinkUpdate` instead.
#[derive(Debug, Deserialize)]
struct DlqEnvelope {
    error: String,
    raw: String,
}

pub fn build_consumer(brokers: &str, group_id: &str, topic: &str) -> anyhow::Result<StreamConsumer> {
    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", brokers)
        .set("group.id", group_id)
        .set("enable.auto.commit", "true")
        .set("enable.auto.offset.store", "false")
        .set("auto.offset.reset", "earliest")
        .create()?;
    consumer.subscribe(&[topic])?;
    Ok(consumer)
}

/// Runs the primary-topic consumer loop until `cancel` fires.
pub async fn run_primary(consumer: StreamConsumer, adapter: Arc<dyn ChatAdapter>, cancel: CancellationToken) {
    let mut stream = consumer.stream();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("primary consumer shutting down");
                return;
            }
            message = stream.next() => {
                let Some(message) = message else { return };
                match message {
                    Ok(msg) => handle_primary(&consumer, &msg, adapter.as_ref()).await,
                    Err(e) => error!(error = %e, "kafka stream error on primary topic"),
                }
            }
        }
    }
}

/// Runs the DLQ-topic consumer loop until `cancel` fires.
pub async fn run_dlq(consumer: StreamConsumer, adapter: Arc<dyn ChatAdapter>, cancel: CancellationToken) {
    let mut stream = consumer.stream();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("dlq consumer shutting down");
                return;
            }
            message = stream.next() => {
                let Some(message) = message else { return };
                match message {
                    Ok(msg) => handle_dlq(&consumer, &msg, adapter.as_ref()).await,
                    Err(e) => error!(error = %e, "kafka stream error on dlq topic"),
                }
            }
        }
    }
}

async fn handle_primary(
    consumer: &StreamConsumer,
    message: &rdkafka::message::BorrowedMessage<'_>,
    adapter: &dyn ChatAdapter,
) {
    let Some(payload) = message.payload() else {
        warn!("empty payload on primary topic, acking and dropping");
        ack(consumer, message);
        return;
    };

    match serde_json::from_slice::<LinkUpdate>(payload) {
        Ok(update) => {
            if render_update(adapter, &update).await {
                ack(consumer, message);
            }
            // else: left unacknowledged for redelivery.
        }
        Err(e) => {
            warn!(error = %e, "malformed LinkUpdate on primary topic, acking and dropping");
            metrics::counter!("chat_consumer_deserialize_failures_total").increment(1);
            ack(consumer, message);
        }
    }
}

async fn handle_dlq(
    consumer: &StreamConsumer,
    message: &rdkafka::message::BorrowedMessage<'_>,
    adapter: &dyn ChatAdapter,
) {
    let Some(payload) = message.payload() else {
        ack(consumer, message);
        return;
    };

    if let Ok(envelope) = serde_json::from_slice::<DlqEnvelope>(payload) {
        warn!(error = %envelope.error, "dead-lettered update");
        metrics::counter!("chat_dlq_messages_total").increment(1);
        match serde_json::from_str::<LinkUpdate>(&envelope.raw) {
            Ok(update) => {
                if render_failure_notice(adapter, &update, &envelope.error).await {
                    ack(consumer, message);
                }
                // else: left unacknowledged for redelivery.
            }
            Err(e) => {
                warn!(error = %e, "dlq envelope's raw payload is not a LinkUpdate, acking and dropping");
                ack(consumer, message);
            }
        }
        return;
    }

    // Not our envelope shape; acknowledge and drop rather than loop forever.
    warn!("unrecognised dlq payload, acking and dropping");
    ack(consumer, message);
}

/// Renders a normal update, one text per `chatId`. Returns `true` if every
/// chat was notified successfully.
async fn render_update(adapter: &dyn ChatAdapter, update: &LinkUpdate) -> bool {
    let mut all_ok = true;
    for chat_id in &update.tg_chat_ids {
        if let Err(e) = adapter.send_text(*chat_id, &update.description).await {
            error!(chat_id, error = %e, "failed to render update, leaving message unacknowledged");
            all_ok = false;
        }
    }
    all_ok
}

async fn render_failure_notice(adapter: &dyn ChatAdapter, update: &LinkUpdate, error: &str) -> bool {
    let text = format!("{}\n(delivery failure: {error})", update.description);
    let mut all_ok = true;
    for chat_id in &update.tg_chat_ids {
        if adapter.send_text(*chat_id, &text).await.is_err() {
            all_ok = false;
        }
    }
    all_ok
}

fn ack(consumer: &StreamConsumer, message: &rdkafka::message::BorrowedMessage<'_>) {
    if let Err(e) = consumer.store_offset_from_message(message) {
        warn!(error = %e, "failed to store offset");
    }
}
