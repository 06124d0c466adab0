// tracker/src/main.rs
// Tracker service entrypoint: loads config, wires the store, provider
// clients, outbound transports and scanner, then serves the admin HTTP
// surface, in the idiom of the teacher's `mira-chat/src/server.rs::run`.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tracker::clients::{CircuitBreaker, GithubClient, RetryPolicy, StackOverflowClient};
use tracker::config::Config;
use tracker::http;
use tracker::metrics;
use tracker::scanner::Scanner;
use tracker::state::AppState;
use tracker::store::{SqliteStore, Store};
use tracker::transport::{BusSender, FallbackSender, HttpSender, Sender};

#[derive(Parser, Debug)]
#[command(name = "tracker", about = "LinkTracker tracker service")]
struct Cli {
    /// Path to an optional TOML config file, overridden by env vars.
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

    let connect_options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().connect_with(connect_options).await?;

    let store: Arc<dyn Store> = {
        let store = SqliteStore::new(pool);
        store.migrate().await?;
        Arc::new(store)
    };

    let breaker_for = || {
        CircuitBreaker::new(
            config.breaker_window,
            config.breaker_failure_threshold,
            Duration::from_secs(config.breaker_open_timeout_secs),
        )
    };
    let retry = RetryPolicy::new(
        config.provider_retry_attempts,
        Duration::from_millis(config.provider_backoff_base_ms),
    );

    let github: Arc<dyn tracker::clients::ProviderClient> = Arc::new(GithubClient::new(
        config.provider_timeout(),
        breaker_for(),
        retry,
    ));
    let stackoverflow: Arc<dyn tracker::clients::ProviderClient> = Arc::new(StackOverflowClient::new(
        config.provider_timeout(),
        breaker_for(),
        retry,
    ));

    let build_http_sender = || -> Box<dyn Sender> {
        Box::new(HttpSender::new(
            config.provider_timeout(),
            breaker_for(),
            retry,
            format!("{}/updates", config.chat_service_url),
        ))
    };
    let build_bus_sender = || -> Option<Box<dyn Sender>> {
        match BusSender::new(&config.bus_brokers, config.bus_update_topic.clone(), config.bus_dlq_topic.clone()) {
            Ok(sender) => Some(Box::new(sender) as Box<dyn Sender>),
            Err(e) => {
                tracing::warn!(error = %e, "message bus unavailable at startup");
                None
            }
        }
    };

    // spec.md §4.4: transports are "labelled primary and fallback per
    // configuration", mirroring the original's TransportType switch.
    let sender: Arc<dyn Sender> = match config.transport_type.as_str() {
        "bus" => {
            let bus_sender = build_bus_sender()
                .ok_or_else(|| anyhow::anyhow!("transport_type=bus but the message bus is unavailable"))?;
            Arc::new(FallbackSender::new(bus_sender, Some(build_http_sender())))
        }
        "http" => Arc::new(FallbackSender::new(build_http_sender(), build_bus_sender())),
        other => return Err(anyhow::anyhow!("unsupported transport_type: {other}")),
    };

    let cancel = CancellationToken::new();
    let scanner = Arc::new(Scanner::new(
        store.clone(),
        github,
        stackoverflow,
        sender,
        config.scan_page_size,
    ));
    let scanner_cancel = cancel.clone();
    let scan_interval = config.scan_interval();
    tokio::spawn(async move {
        scanner.run(scan_interval, scanner_cancel).await;
    });

    let sampler_cancel = cancel.clone();
    let sampler_store = store.clone();
    let sample_pattern = config.metrics_sample_pattern.clone();
    let sample_interval = config.metrics_sample_interval();
    tokio::spawn(async move {
        metrics::run_link_count_sampler(sampler_store, sample_pattern, sample_interval, sampler_cancel).await;
    });

    let state = Arc::new(AppState { store });
    let app = http::router(state);

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, "tracker listening");

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
