use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat::cache::LinkCache;
use chat::config::Config;
use chat::consumer::{build_consumer, run_dlq, run_primary};
use chat::http;
use chat::metrics;
use chat::render::{ChatAdapter, LoggingAdapter};
use chat::session::SessionStore;
use chat::state::AppState;
use chat::tracker_client::TrackerClient;

#[derive(Parser, Debug)]
#[command(name = "chat", about = "LinkTracker chat service")]
struct Cli {
    #[arg(long, env = "CONFIG_PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    metrics::init_metrics();

    let tracker = Arc::new(TrackerClient::new(config.tracker_url.clone(), config.tracker_timeout()));
    let cache = Arc::new(LinkCache::new(tracker.clone(), config.cache_ttl(), config.cache_max_capacity));
    let sessions = Arc::new(SessionStore::new());
    let adapter: Arc<dyn ChatAdapter> = Arc::new(LoggingAdapter);

    let cancel = CancellationToken::new();

    let primary_consumer =
        build_consumer(&config.bus_brokers, &config.bus_consumer_group, &config.bus_update_topic)?;
    let dlq_consumer =
        build_consumer(&config.bus_brokers, &config.bus_consumer_group, &config.bus_dlq_topic)?;

    let primary_adapter = adapter.clone();
    let primary_cancel = cancel.clone();
    tokio::spawn(async move {
        run_primary(primary_consumer, primary_adapter, primary_cancel).await;
    });

    let dlq_adapter = adapter.clone();
    let dlq_cancel = cancel.clone();
    tokio::spawn(async move {
        run_dlq(dlq_consumer, dlq_adapter, dlq_cancel).await;
    });

    let state = Arc::new(AppState { tracker, cache, sessions, adapter });
    let app = http::router(state);

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, "chat service listening");

    let shutdown_cancel = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
            shutdown_cancel.cancel();
        })
        .await?;

    Ok(())
}
