// tracker/src/config/mod.rs
// Central configuration for the tracker service.

mod helpers;

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Server + database + polling + transport configuration.
///
/// Loaded from an optional TOML file (`--config`/`CONFIG_PATH`) with
/// environment variables taking precedence over file values, matching
/// spec.md §6's CLI contract. Secret tokens (`BOT_TOKEN`, provider tokens)
/// are read from the environment only and are never part of the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,

    /// Scan tick period, in seconds (spec.md §4.3: "every minute").
    pub scan_interval_secs: u64,
    /// Page size for `GetLinks(limit, offset)` pagination.
    pub scan_page_size: i64,

    pub provider_timeout_secs: u64,
    pub provider_retry_attempts: u32,
    pub provider_backoff_base_ms: u64,
    pub breaker_window: u32,
    pub breaker_failure_threshold: u32,
    pub breaker_open_timeout_secs: u64,

    pub chat_service_url: String,
    pub bus_brokers: String,
    pub bus_update_topic: String,
    pub bus_dlq_topic: String,
    /// Which transport is primary, the other being fallback (spec.md §4.4:
    /// "labelled primary and fallback per configuration"). `"http"` or
    /// `"bus"`.
    #[serde(default = "default_transport_type")]
    pub transport_type: String,

    /// Substring pattern the link-count gauge samples on an interval
    /// (SPEC_FULL.md §2). Empty matches every link.
    #[serde(default)]
    pub metrics_sample_pattern: String,
    pub metrics_sample_interval_secs: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_transport_type() -> String {
    "http".to_string()
}

impl Config {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn metrics_sample_interval(&self) -> Duration {
        Duration::from_secs(self.metrics_sample_interval_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Load from an optional TOML file, then apply environment overrides.
    pub fn load(config_path: Option<&Path>) -> Self {
        dotenvy::dotenv().ok();

        let mut file_values: toml::Value = config_path
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or(toml::Value::Table(Default::default()));

        let get_str = |key: &str, default: &str| -> String {
            file_values
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| default.to_string())
        };
        let get_u64 = |key: &str, default: u64| -> u64 {
            file_values
                .get(key)
                .and_then(|v| v.as_integer())
                .map(|v| v as u64)
                .unwrap_or(default)
        };

        // Drop the file table now that defaults have been folded in; env
        // vars below always win regardless of what the file contained.
        let _ = file_values.take();

        Self {
            host: helpers::env_or("TRACKER_HOST", &get_str("host", "0.0.0.0")),
            port: helpers::env_parsed("TRACKER_PORT", 8080),
            database_url: helpers::env_or(
                "DATABASE_URL",
                &get_str("database_url", "sqlite://tracker.db"),
            ),
            scan_interval_secs: helpers::env_parsed(
                "SCAN_INTERVAL_SECS",
                get_u64("scan_interval_secs", 60),
            ),
            scan_page_size: helpers::env_parsed("SCAN_PAGE_SIZE", 100),
            provider_timeout_secs: helpers::env_parsed("PROVIDER_TIMEOUT_SECS", 10),
            provider_retry_attempts: helpers::env_parsed("PROVIDER_RETRY_ATTEMPTS", 3),
            provider_backoff_base_ms: helpers::env_parsed("PROVIDER_BACKOFF_BASE_MS", 200),
            breaker_window: helpers::env_parsed("BREAKER_WINDOW", 20),
            breaker_failure_threshold: helpers::env_parsed("BREAKER_FAILURE_THRESHOLD", 10),
            breaker_open_timeout_secs: helpers::env_parsed("BREAKER_OPEN_TIMEOUT_SECS", 30),
            chat_service_url: helpers::env_or(
                "CHAT_SERVICE_URL",
                &get_str("chat_service_url", "http://localhost:8081"),
            ),
            bus_brokers: helpers::env_or("BUS_BROKERS", &get_str("bus_brokers", "localhost:9092")),
            bus_update_topic: helpers::env_or(
                "BUS_UPDATE_TOPIC",
                &get_str("bus_update_topic", "link-updates"),
            ),
            bus_dlq_topic: helpers::env_or("BUS_DLQ_TOPIC", &get_str("bus_dlq_topic", "link-updates-dlq")),
            transport_type: helpers::env_or(
                "TRANSPORT_TYPE",
                &get_str("transport_type", "http"),
            ),
            metrics_sample_pattern: helpers::env_or(
                "METRICS_SAMPLE_PATTERN",
                &get_str("metrics_sample_pattern", ""),
            ),
            metrics_sample_interval_secs: helpers::env_parsed(
                "METRICS_SAMPLE_INTERVAL_SECS",
                get_u64("metrics_sample_interval_secs", 60),
            ),
            log_level: helpers::env_or("RUST_LOG", &get_str("log_level", "info")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file_or_env() {
        let config = Config::load(None);
        assert_eq!(config.port, 8080);
        assert_eq!(config.scan_interval_secs, 60);
    }
}
