// tracker/src/clients/github.rs
// Code-forge provider client. Issues two independent GETs (pulls + issues)
// and returns only items newer than the incoming high-water mark.
//
// DESIGN NOTE (spec.md §9): the original source adds a fixed 3-hour offset
// to `updated_at` before comparison, almost certainly mixing UTC and local
// clocks. That offset is deliberately NOT reproduced here; all comparisons
// below are plain UTC.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use linktracker_common::{DomainError, ProviderItem, ProviderSnapshot};
use reqwest::Client;
use serde::Deserialize;

use super::{parse_owner_repo, send_with_retry, CircuitBreaker, ProviderClient, RetryPolicy};

pub struct GithubClient {
    client: Client,
    breaker: CircuitBreaker,
    retry: RetryPolicy,
    base_url: String,
}

impl GithubClient {
    pub fn new(timeout: Duration, breaker: CircuitBreaker, retry: RetryPolicy) -> Self {
        Self::with_base_url(timeout, breaker, retry, "https://api.github.com".to_string())
    }

    pub fn with_base_url(
        timeout: Duration,
        breaker: CircuitBreaker,
        retry: RetryPolicy,
        base_url: String,
    ) -> Self {
        Self {
            client: Client::builder().timeout(timeout).build().expect("reqwest client"),
            breaker,
            retry,
            base_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GhUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GhPullOrIssue {
    title: String,
    user: GhUser,
    updated_at: DateTime<Utc>,
    body: Option<String>,
}

#[async_trait]
impl ProviderClient for GithubClient {
    async fn get_updates(
        &self,
        url: &str,
        high_water: DateTime<Utc>,
    ) -> Result<ProviderSnapshot, DomainError> {
        let (owner, repo) = parse_owner_repo(url)?;

        let pulls_req = self
            .client
            .get(format!("{}/repos/{owner}/{repo}/pulls", self.base_url))
            .query(&[("state", "all"), ("sort", "updated"), ("direction", "desc")]);
        let issues_req = self
            .client
            .get(format!("{}/repos/{owner}/{repo}/issues", self.base_url))
            .query(&[("state", "all"), ("sort", "updated"), ("direction", "desc")]);

        let pulls_resp = send_with_retry(&self.client, pulls_req, &self.breaker, self.retry).await?;
        let pulls: Vec<GhPullOrIssue> = pulls_resp
            .json()
            .await
            .map_err(|e| DomainError::Permanent(e.to_string()))?;

        let issues_resp = send_with_retry(&self.client, issues_req, &self.breaker, self.retry).await?;
        let issues: Vec<GhPullOrIssue> = issues_resp
            .json()
            .await
            .map_err(|e| DomainError::Permanent(e.to_string()))?;

        let items = pulls
            .into_iter()
            .chain(issues)
            .filter(|item| item.updated_at > high_water)
            .map(|item| ProviderItem {
                title: item.title,
                author: item.user.login,
                updated_at: item.updated_at,
                body: item.body.unwrap_or_default(),
            })
            .collect();

        Ok(ProviderSnapshot { items })
    }
}
