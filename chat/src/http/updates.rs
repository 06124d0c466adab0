// chat/src/http/updates.rs
// `POST /updates` — inbound sink for the HTTP fallback transport (spec.md
// §6): `{id, url, description, tgChatIds[]}`, `id`/`url`/`tgChatIds` required.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use linktracker_common::LinkUpdate;
use tracing::error;

use crate::state::AppState;

pub async fn receive_update(
    State(state): State<Arc<AppState>>,
    Json(update): Json<LinkUpdate>,
) -> StatusCode {
    if !update.is_valid() {
        return StatusCode::BAD_REQUEST;
    }

    let mut all_ok = true;
    for chat_id in &update.tg_chat_ids {
        if let Err(e) = state.adapter.send_text(*chat_id, &update.description).await {
            error!(chat_id, error = %e, "failed to render HTTP-delivered update");
            all_ok = false;
        }
    }

    if all_ok {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LinkCache;
    use crate::render::ChatAdapter;
    use crate::session::SessionStore;
    use crate::tracker_client::TrackerClient;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct RecordingAdapter {
        sent: Mutex<Vec<(i64, String)>>,
    }

    #[async_trait]
    impl ChatAdapter for RecordingAdapter {
        async fn send_text(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push((chat_id, text.to_string()));
            Ok(())
        }
    }

    fn test_state(adapter: Arc<dyn ChatAdapter>) -> Arc<AppState> {
        let tracker = Arc::new(TrackerClient::new("http://localhost:1".into(), Duration::from_secs(1)));
        Arc::new(AppState {
            cache: Arc::new(LinkCache::new(tracker.clone(), Duration::from_secs(60), 100)),
            tracker,
            sessions: Arc::new(SessionStore::new()),
            adapter,
        })
    }

    #[tokio::test]
    async fn rejects_update_missing_chat_ids() {
        let adapter = Arc::new(RecordingAdapter { sent: Mutex::new(vec![]) });
        let state = test_state(adapter);

        let update = LinkUpdate {
            id: 1,
            url: "https://github.com/foo/bar".into(),
            description: "desc".into(),
            tg_chat_ids: vec![],
        };

        let status = receive_update(State(state), Json(update)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn renders_one_text_per_chat() {
        let adapter = Arc::new(RecordingAdapter { sent: Mutex::new(vec![]) });
        let state = test_state(adapter.clone());

        let update = LinkUpdate {
            id: 1,
            url: "https://github.com/foo/bar".into(),
            description: "new activity".into(),
            tg_chat_ids: vec![1, 2],
        };

        let status = receive_update(State(state), Json(update)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(adapter.sent.lock().unwrap().len(), 2);
    }
}
