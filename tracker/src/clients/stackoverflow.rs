// tracker/src/clients/stackoverflow.rs
// Q&A provider client. Issues two independent GETs (answers + comments) for
// a question id and returns only items newer than the high-water mark.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use linktracker_common::{DomainError, ProviderItem, ProviderSnapshot};
use reqwest::Client;
use serde::Deserialize;

use super::{parse_question_id, send_with_retry, CircuitBreaker, ProviderClient, RetryPolicy};

pub struct StackOverflowClient {
    client: Client,
    breaker: CircuitBreaker,
    retry: RetryPolicy,
    base_url: String,
}

impl StackOverflowClient {
    pub fn new(timeout: Duration, breaker: CircuitBreaker, retry: RetryPolicy) -> Self {
        Self::with_base_url(
            timeout,
            breaker,
            retry,
            "https://api.stackexchange.com/2.3".to_string(),
        )
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
struct SoOwner {
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct SoItem {
    owner: SoOwner,
    /// epoch seconds, per the StackExchange API.
    last_activity_date: i64,
    body: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SoEnvelope {
    items: Vec<SoItem>,
}

#[async_trait]
impl ProviderClient for StackOverflowClient {
    async fn get_updates(
        &self,
        url: &str,
        high_water: DateTime<Utc>,
    ) -> Result<ProviderSnapshot, DomainError> {
        let question_id = parse_question_id(url)?;

        let answers_req = self
            .client
            .get(format!("{}/questions/{question_id}/answers", self.base_url))
            .query(&[("site", "stackoverflow"), ("filter", "withbody")]);
        let comments_req = self
            .client
            .get(format!("{}/questions/{question_id}/comments", self.base_url))
            .query(&[("site", "stackoverflow"), ("filter", "withbody")]);

        let answers_resp = send_with_retry(&self.client, answers_req, &self.breaker, self.retry).await?;
        let answers: SoEnvelope = answers_resp
            .json()
            .await
            .map_err(|e| DomainError::Permanent(e.to_string()))?;

        let comments_resp = send_with_retry(&self.client, comments_req, &self.breaker, self.retry).await?;
        let comments: SoEnvelope = comments_resp
            .json()
            .await
            .map_err(|e| DomainError::Permanent(e.to_string()))?;

        let items = answers
            .items
            .into_iter()
            .chain(comments.items)
            .filter_map(|item| {
                let updated_at = Utc.timestamp_opt(item.last_activity_date, 0).single()?;
                Some((item, updated_at))
            })
            .filter(|(_, updated_at)| *updated_at > high_water)
            .map(|(item, updated_at)| ProviderItem {
                title: item.title.unwrap_or_else(|| format!("question {question_id}")),
                author: item.owner.display_name,
                updated_at,
                body: item.body.unwrap_or_default(),
            })
            .collect();

        Ok(ProviderSnapshot { items })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn filters_items_by_high_water_mark() {
        let server = MockServer::start().await;

        let new_ts = Utc::now().timestamp();
        let old_ts = (Utc::now() - chrono::Duration::days(30)).timestamp();

        Mock::given(method("GET"))
            .and(path("/questions/12345/answers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{"owner": {"display_name": "alice"}, "last_activity_date": new_ts, "body": "an answer", "title": "re: question"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/questions/12345/comments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{"owner": {"display_name": "bob"}, "last_activity_date": old_ts, "body": "old comment"}]
            })))
            .mount(&server)
            .await;

        let breaker = CircuitBreaker::new(20, 10, Duration::from_secs(30));
        let retry = RetryPolicy::new(3, Duration::from_millis(1));
        let client = StackOverflowClient::with_base_url(Duration::from_secs(5), breaker, retry, server.uri());

        let high_water = Utc::now() - chrono::Duration::days(1);
        let snapshot = client
            .get_updates("https://stackoverflow.com/questions/12345", high_water)
            .await
            .unwrap();

        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].author, "alice");
    }
}
