// tracker/src/metrics.rs
// Prometheus metrics for the tracker service, grounded on the teacher's
// backend/src/metrics/mod.rs.

use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::store::Store;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global Prometheus recorder. Call once at startup.
pub fn init_metrics() {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    PROMETHEUS_HANDLE
        .set(handle)
        .expect("Prometheus handle already initialized");

    info!("Prometheus metrics initialized");
}

/// GET /metrics
pub async fn metrics_handler() -> impl IntoResponse {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics not initialized".to_string()),
    }
}

/// Samples `CountLinksMatching(pattern)` on `interval`, publishing it as the
/// `tracker_links_matching_count` gauge (SPEC_FULL.md §2). Runs until
/// `cancel` fires.
pub async fn run_link_count_sampler(
    store: Arc<dyn Store>,
    pattern: String,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("link count sampler shutting down");
                return;
            }
            _ = ticker.tick() => {
                match store.count_links_matching(&pattern).await {
                    Ok(count) => {
                        metrics::gauge!("tracker_links_matching_count", "pattern" => pattern.clone())
                            .set(count as f64);
                    }
                    Err(e) => warn!(error = %e, pattern = %pattern, "failed to sample link count"),
                }
            }
        }
    }
}
