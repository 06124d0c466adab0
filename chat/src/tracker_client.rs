// chat/src/tracker_client.rs
// Thin HTTP client for the tracker's admin surface (spec.md §6), grounded on
// the teacher's `reqwest`-based provider client shape
// (backend/src/llm/provider/openai/mod.rs).

use std::time::Duration;

use linktracker_common::{DomainError, Link};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

pub struct TrackerClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct AddLinkBody<'a> {
    link: &'a str,
    tags: &'a [String],
    filters: &'a [String],
}

#[derive(Debug, Serialize)]
struct RemoveLinkBody<'a> {
    link: &'a str,
}

#[derive(Debug, Deserialize)]
struct ListLinksResponse {
    links: Vec<Link>,
    #[allow(dead_code)]
    size: i64,
}

impl TrackerClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            client: Client::builder().timeout(timeout).build().expect("reqwest client"),
            base_url,
        }
    }

    pub async fn create_chat(&self, chat_id: i64) -> Result<(), DomainError> {
        let resp = self
            .client
            .post(format!("{}/tg-chat/{chat_id}", self.base_url))
            .send()
            .await
            .map_err(|e| DomainError::Transient(e.to_string()))?;
        Self::expect_ok(resp, chat_id).await
    }

    pub async fn delete_chat(&self, chat_id: i64) -> Result<(), DomainError> {
        let resp = self
            .client
            .delete(format!("{}/tg-chat/{chat_id}", self.base_url))
            .send()
            .await
            .map_err(|e| DomainError::Transient(e.to_string()))?;
        Self::expect_ok(resp, chat_id).await
    }

    /// Connectivity probe for `/ready` — hits the tracker's own `/health`.
    pub async fn ping(&self) -> bool {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map(|resp| resp.status().is_success())
            .unwrap_or(false)
    }

    pub async fn get_links(&self, chat_id: i64) -> Result<Vec<Link>, DomainError> {
        let resp = self
            .client
            .get(format!("{}/links", self.base_url))
            .header("Tg-Chat-Id", chat_id.to_string())
            .send()
            .await
            .map_err(|e| DomainError::Transient(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(DomainError::Permanent(format!(
                "tracker returned {} for GetLinks({chat_id})",
                resp.status()
            )));
        }

        let body: ListLinksResponse = resp
            .json()
            .await
            .map_err(|e| DomainError::Permanent(e.to_string()))?;
        Ok(body.links)
    }

    pub async fn add_link(
        &self,
        chat_id: i64,
        link: &str,
        tags: Vec<String>,
        filters: Vec<String>,
    ) -> Result<Link, DomainError> {
        let resp = self
            .client
            .post(format!("{}/links", self.base_url))
            .header("Tg-Chat-Id", chat_id.to_string())
            .json(&AddLinkBody { link, tags: &tags, filters: &filters })
            .send()
            .await
            .map_err(|e| DomainError::Transient(e.to_string()))?;

        match resp.status() {
            StatusCode::OK => resp.json().await.map_err(|e| DomainError::Permanent(e.to_string())),
            StatusCode::CONFLICT => Err(DomainError::AlreadyExists(link.to_string())),
            StatusCode::BAD_REQUEST => Err(DomainError::Validation(link.to_string())),
            status => Err(DomainError::Permanent(format!("tracker returned {status}"))),
        }
    }

    pub async fn remove_link(&self, chat_id: i64, link: &str) -> Result<Link, DomainError> {
        let resp = self
            .client
            .delete(format!("{}/links", self.base_url))
            .header("Tg-Chat-Id", chat_id.to_string())
            .json(&RemoveLinkBody { link })
            .send()
            .await
            .map_err(|e| DomainError::Transient(e.to_string()))?;

        match resp.status() {
            StatusCode::OK => resp.json().await.map_err(|e| DomainError::Permanent(e.to_string())),
            StatusCode::NOT_FOUND => Err(DomainError::NotExists(link.to_string())),
            StatusCode::BAD_REQUEST => Err(DomainError::Validation(link.to_string())),
            status => Err(DomainError::Permanent(format!("tracker returned {status}"))),
        }
    }

    async fn expect_ok(resp: reqwest::Response, chat_id: i64) -> Result<(), DomainError> {
        match resp.status() {
            StatusCode::OK => Ok(()),
            StatusCode::CONFLICT => Err(DomainError::AlreadyExists(format!("chat {chat_id}"))),
            StatusCode::NOT_FOUND => Err(DomainError::NotExists(format!("chat {chat_id}"))),
            StatusCode::BAD_REQUEST => Err(DomainError::Validation(format!("chat {chat_id}"))),
            status => Err(DomainError::Permanent(format!("tracker returned {status}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn get_links_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/links"))
            .and(header("Tg-Chat-Id", "42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "links": [{"id": 1, "chat_id": 42, "url": "https://github.com/foo/bar", "tags": [], "filters": [], "last_updated": null}],
                "size": 1
            })))
            .mount(&server)
            .await;

        let client = TrackerClient::new(server.uri(), Duration::from_secs(5));
        let links = client.get_links(42).await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://github.com/foo/bar");
    }

    #[tokio::test]
    async fn create_chat_conflict_maps_to_already_exists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tg-chat/42"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        let client = TrackerClient::new(server.uri(), Duration::from_secs(5));
        let err = client.create_chat(42).await.unwrap_err();
        assert!(matches!(err, DomainError::AlreadyExists(_)));
    }
}
