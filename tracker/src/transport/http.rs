// tracker/src/transport/http.rs
// Synchronous HTTP transport: POSTs the update to the chat service's
// `/updates` sink, retrying transient responses inside a circuit breaker.

use std::time::Duration;

use async_trait::async_trait;
use linktracker_common::LinkUpdate;
use reqwest::Client;

use crate::clients::{send_with_retry, CircuitBreaker, RetryPolicy};

use super::Sender;

pub struct HttpSender {
    client: Client,
    breaker: CircuitBreaker,
    retry: RetryPolicy,
    sink_url: String,
}

impl HttpSender {
    pub fn new(
        timeout: Duration,
        breaker: CircuitBreaker,
        retry: RetryPolicy,
        sink_url: String,
    ) -> Self {
        Self {
            client: Client::builder().timeout(timeout).build().expect("reqwest client"),
            breaker,
            retry,
            sink_url,
        }
    }
}

#[async_trait]
impl Sender for HttpSender {
    async fn send(&self, update: &LinkUpdate, _is_failed: bool) -> anyhow::Result<()> {
        let request = self.client.post(&self.sink_url).json(update);
        send_with_retry(&self.client, request, &self.breaker, self.retry).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_update_to_sink() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/updates"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let breaker = CircuitBreaker::new(20, 10, Duration::from_secs(30));
        let retry = RetryPolicy::new(3, Duration::from_millis(1));
        let sender = HttpSender::new(
            Duration::from_secs(5),
            breaker,
            retry,
            format!("{}/updates", server.uri()),
        );

        let update = LinkUpdate {
            id: 1,
            url: "https://github.com/foo/bar".into(),
            description: "desc".into(),
            tg_chat_ids: vec![1],
        };

        sender.send(&update, false).await.unwrap();
    }

    #[tokio::test]
    async fn returns_err_when_all_responses_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/updates"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let breaker = CircuitBreaker::new(20, 10, Duration::from_secs(30));
        let retry = RetryPolicy::new(3, Duration::from_millis(1));
        let sender = HttpSender::new(
            Duration::from_secs(5),
            breaker,
            retry,
            format!("{}/updates", server.uri()),
        );

        let update = LinkUpdate {
            id: 1,
            url: "https://github.com/foo/bar".into(),
            description: "desc".into(),
            tg_chat_ids: vec![1],
        };

        assert!(sender.send(&update, false).await.is_err());
    }
}
