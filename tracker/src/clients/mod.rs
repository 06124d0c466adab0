// tracker/src/clients/mod.rs
// Provider clients (spec.md §4.1): one per resource kind, each exposing
// `get_updates(link) -> ProviderSnapshot`. Grounded on the teacher's
// `reqwest`-based provider client shape (backend/src/llm/provider/openai/mod.rs).

pub mod breaker;
pub mod github;
pub mod stackoverflow;

pub use breaker::CircuitBreaker;
pub use github::GithubClient;
pub use stackoverflow::StackOverflowClient;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use linktracker_common::{DomainError, ProviderSnapshot};
use reqwest::StatusCode;
use tracing::warn;

#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Parses the link, polls the upstream provider, and returns items with
    /// `updated_at` strictly greater than `high_water`. Does not mutate the
    /// link itself — the caller (the scanner) advances `last_updated`.
    async fn get_updates(
        &self,
        url: &str,
        high_water: DateTime<Utc>,
    ) -> Result<ProviderSnapshot, DomainError>;
}

/// Shared retry configuration for provider HTTP calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff_base: Duration) -> Self {
        Self { attempts, backoff_base }
    }
}

/// Issues `request`, retrying transient failures (5xx, 429) with exponential
/// back-off up to `policy.attempts`, all attempts framed by `breaker`.
/// Non-2xx responses other than 429 are permanent and not retried.
pub async fn send_with_retry(
    client: &reqwest::Client,
    request: reqwest::RequestBuilder,
    breaker: &CircuitBreaker,
    policy: RetryPolicy,
) -> Result<reqwest::Response, DomainError> {
    let mut last_err = DomainError::Permanent("no attempts made".to_string());

    for attempt in 0..policy.attempts.max(1) {
        if !breaker.allow() {
            return Err(DomainError::CircuitOpen);
        }

        let Some(req) = request.try_clone() else {
            return Err(DomainError::Other(anyhow::anyhow!(
                "request body is not clonable for retry"
            )));
        };

        let result = client.execute(req.build().map_err(|e| DomainError::Other(e.into()))?).await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                breaker.record_success();
                return Ok(resp);
            }
            Ok(resp) => {
                let status = resp.status();
                if is_transient(status) {
                    breaker.record_failure();
                    last_err = DomainError::Transient(format!("upstream returned {status}"));
                    warn!(attempt, %status, "transient provider failure, retrying");
                    backoff(policy, attempt).await;
                    continue;
                }
                breaker.record_success();
                return Err(DomainError::Permanent(format!("upstream returned {status}")));
            }
            Err(e) if e.is_timeout() || e.is_connect() => {
                breaker.record_failure();
                last_err = DomainError::Transient(e.to_string());
                backoff(policy, attempt).await;
            }
            Err(e) => {
                breaker.record_success();
                return Err(DomainError::Permanent(e.to_string()));
            }
        }
    }

    Err(last_err)
}

fn is_transient(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

async fn backoff(policy: RetryPolicy, attempt: u32) {
    let delay = policy.backoff_base * 2u32.saturating_pow(attempt);
    tokio::time::sleep(delay).await;
}

/// Parses `owner/repo` out of a canonicalised code-forge URL
/// (`scheme://host/owner/repo`).
pub fn parse_owner_repo(url: &str) -> Result<(String, String), DomainError> {
    let parsed = url::Url::parse(url).map_err(|e| DomainError::Permanent(e.to_string()))?;
    let segments: Vec<&str> = parsed
        .path()
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    match segments.as_slice() {
        [owner, repo] => Ok((owner.to_string(), repo.to_string())),
        _ => Err(DomainError::Permanent(format!("malformed repo url: {url}"))),
    }
}

/// Parses the numeric question id out of a canonicalised Q&A URL
/// (`scheme://host/questions/<id>`).
pub fn parse_question_id(url: &str) -> Result<u64, DomainError> {
    let parsed = url::Url::parse(url).map_err(|e| DomainError::Permanent(e.to_string()))?;
    let segments: Vec<&str> = parsed
        .path()
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    match segments.as_slice() {
        ["questions", id] => id.parse().map_err(|_| DomainError::Permanent(format!("bad question id: {url}"))),
        _ => Err(DomainError::Permanent(format!("malformed question url: {url}"))),
    }
}
