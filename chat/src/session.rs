// chat/src/session.rs
// Per-chat-user session state driving the multi-turn `/track` flow
// (spec.md §4.7). Keyed by chat-user id in a `DashMap`; the chat adapter
// guarantees single-threaded delivery per user so no per-key locking beyond
// `DashMap`'s own shard locks is required (spec.md §5).

use dashmap::DashMap;
use linktracker_common::{TrackStep, UserSession};

pub struct SessionStore {
    sessions: DashMap<i64, UserSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self { sessions: DashMap::new() }
    }

    pub fn start_track(&self, user_id: i64, chat_id: i64) {
        self.sessions.insert(user_id, UserSession::new(chat_id));
    }

    pub fn get(&self, user_id: i64) -> Option<UserSession> {
        self.sessions.get(&user_id).map(|s| s.clone())
    }

    pub fn clear(&self, user_id: i64) {
        self.sessions.remove(&user_id);
    }

    /// Advances `user_id`'s session to the next step with `text` folded in,
    /// returning the completed request once all three steps are filled.
    pub fn advance(&self, user_id: i64, text: &str) -> AdvanceOutcome {
        let Some(mut entry) = self.sessions.get_mut(&user_id) else {
            return AdvanceOutcome::NoSession;
        };

        match entry.step {
            Some(TrackStep::AwaitingLink) => {
                entry.partial_link = Some(text.trim().to_string());
                entry.step = Some(TrackStep::AwaitingTags);
                AdvanceOutcome::Continue
            }
            Some(TrackStep::AwaitingTags) => {
                entry.partial_tags = split_tags(text);
                entry.step = Some(TrackStep::AwaitingFilters);
                AdvanceOutcome::Continue
            }
            Some(TrackStep::AwaitingFilters) => {
                if !is_skip(text) {
                    entry.partial_filters = split_tags(text);
                }
                let session = entry.clone();
                AdvanceOutcome::Complete(session)
            }
            None => AdvanceOutcome::NoSession,
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

pub enum AdvanceOutcome {
    NoSession,
    Continue,
    Complete(UserSession),
}

fn split_tags(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// The original front-end accepts a literal "skip" token (in Russian,
/// "пропустить") to leave the filters step empty.
fn is_skip(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.eq_ignore_ascii_case("skip") || trimmed == "пропустить"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_flow_completes_on_third_message() {
        let store = SessionStore::new();
        store.start_track(1, 42);

        assert!(matches!(store.advance(1, "https://github.com/foo/bar"), AdvanceOutcome::Continue));
        assert!(matches!(store.advance(1, "pure fp"), AdvanceOutcome::Continue));

        match store.advance(1, "пропустить") {
            AdvanceOutcome::Complete(session) => {
                assert_eq!(session.partial_link.as_deref(), Some("https://github.com/foo/bar"));
                assert_eq!(session.partial_tags, vec!["pure".to_string(), "fp".to_string()]);
                assert!(session.partial_filters.is_empty());
            }
            _ => panic!("expected completion"),
        }
    }

    #[test]
    fn advance_without_session_is_noop() {
        let store = SessionStore::new();
        assert!(matches!(store.advance(1, "anything"), AdvanceOutcome::NoSession));
    }
}
