// chat/src/config/mod.rs
// Central configuration for the chat service, mirroring tracker::config.

mod helpers;

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,

    pub tracker_url: String,
    pub tracker_timeout_secs: u64,

    pub bus_brokers: String,
    pub bus_update_topic: String,
    pub bus_dlq_topic: String,
    pub bus_consumer_group: String,

    pub cache_ttl_secs: u64,
    pub cache_max_capacity: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn tracker_timeout(&self) -> Duration {
        Duration::from_secs(self.tracker_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn load(config_path: Option<&Path>) -> Self {
        dotenvy::dotenv().ok();

        let file_values: toml::Value = config_path
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

        Self {
            host: helpers::env_or("CHAT_HOST", &get_str("host", "0.0.0.0")),
            port: helpers::env_parsed("CHAT_PORT", 8081),
            tracker_url: helpers::env_or(
                "TRACKER_URL",
                &get_str("tracker_url", "http://localhost:8080"),
            ),
            tracker_timeout_secs: helpers::env_parsed("TRACKER_TIMEOUT_SECS", 10),
            bus_brokers: helpers::env_or("BUS_BROKERS", &get_str("bus_brokers", "localhost:9092")),
            bus_update_topic: helpers::env_or(
                "BUS_UPDATE_TOPIC",
                &get_str("bus_update_topic", "link-updates"),
            ),
            bus_dlq_topic: helpers::env_or("BUS_DLQ_TOPIC", &get_str("bus_dlq_topic", "link-updates-dlq")),
            bus_consumer_group: helpers::env_or(
                "BUS_CONSUMER_GROUP",
                &get_str("bus_consumer_group", "chat-service"),
            ),
            cache_ttl_secs: helpers::env_parsed("CACHE_TTL_SECS", 300),
            cache_max_capacity: helpers::env_parsed("CACHE_MAX_CAPACITY", 10_000),
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
        assert_eq!(config.port, 8081);
        assert_eq!(config.bus_consumer_group, "chat-service");
    }
}
