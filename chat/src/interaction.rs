// chat/src/interaction.rs
// Chat interaction: command dispatch and the multi-turn `/track` flow
// (spec.md §4.7). A small command grammar parsed the way the teacher's
// REPL parses commands (mira-chat/src/repl/commands.rs): a leading `/`
// dispatches to a known verb or replies "unknown command".

use std::sync::Arc;

use linktracker_common::canonicalize;
use tracing::warn;

use crate::cache::LinkCache;
use crate::session::{AdvanceOutcome, SessionStore};
use crate::tracker_client::TrackerClient;

pub struct Interaction {
    tracker: Arc<TrackerClient>,
    cache: Arc<LinkCache>,
    sessions: Arc<SessionStore>,
}

impl Interaction {
    pub fn new(tracker: Arc<TrackerClient>, cache: Arc<LinkCache>, sessions: Arc<SessionStore>) -> Self {
        Self { tracker, cache, sessions }
    }

    /// Handles one inbound message from `user_id` in `chat_id`, returning
    /// the reply text.
    pub async fn handle_message(&self, chat_id: i64, user_id: i64, text: &str) -> String {
        let has_session = self.sessions.get(user_id).is_some();

        if has_session && text.starts_with('/') {
            // §8 "session confinement": a `/`-prefixed message while a
            // session exists leaves the session unchanged.
            return "Unknown command.".to_string();
        }

        if has_session {
            return self.advance_track(chat_id, user_id, text).await;
        }

        let mut parts = text.splitn(2, ' ');
        let command = parts.next().unwrap_or("");
        let arg = parts.next().unwrap_or("").trim();

        match command {
            "/start" => self.cmd_start(chat_id).await,
            "/track" => {
                self.sessions.start_track(user_id, chat_id);
                "Send the link you want to track.".to_string()
            }
            "/untrack" => self.cmd_untrack(chat_id, arg).await,
            "/list" => self.cmd_list(chat_id).await,
            "/help" => HELP_TEXT.to_string(),
            _ => "Unknown command. Send /help for the list of commands.".to_string(),
        }
    }

    async fn cmd_start(&self, chat_id: i64) -> String {
        match self.tracker.create_chat(chat_id).await {
            Ok(()) => "Registered. Use /track to start tracking a link.".to_string(),
            Err(e) => {
                warn!(chat_id, error = %e, "failed to register chat");
                format!("Could not register this chat: {e}")
            }
        }
    }

    async fn cmd_untrack(&self, chat_id: i64, arg: &str) -> String {
        if arg.is_empty() {
            return "Usage: /untrack <link>".to_string();
        }
        let canonical = match canonicalize(arg) {
            Ok((url, _)) => url,
            Err(e) => return format!("Not a recognised link: {e}"),
        };

        match self.tracker.remove_link(chat_id, &canonical).await {
            Ok(_) => {
                if let Err(e) = self.cache.refresh(chat_id).await {
                    warn!(chat_id, error = %e, "cache refresh failed after untrack");
                }
                format!("Stopped tracking {canonical}")
            }
            Err(e) => format!("Could not untrack {canonical}: {e}"),
        }
    }

    async fn cmd_list(&self, chat_id: i64) -> String {
        match self.cache.get_links(chat_id).await {
            Ok(list) if list.links.is_empty() => "Not tracking any links yet.".to_string(),
            Ok(list) => list
                .links
                .iter()
                .map(|l| format!("- {}", l.url))
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => format!("Could not fetch your links: {e}"),
        }
    }

    async fn advance_track(&self, chat_id: i64, user_id: i64, text: &str) -> String {
        match self.sessions.advance(user_id, text) {
            AdvanceOutcome::NoSession => "Unknown command. Send /help for the list of commands.".to_string(),
            AdvanceOutcome::Continue => next_prompt_for(self.sessions.get(user_id)),
            AdvanceOutcome::Complete(session) => {
                let Some(link) = session.partial_link.clone() else {
                    self.sessions.clear(user_id);
                    return "Something went wrong, please /track again.".to_string();
                };

                let canonical = match canonicalize(&link) {
                    Ok((url, _)) => url,
                    Err(e) => {
                        // Leave the session in place so the user can retry the link.
                        return format!("Not a recognised link: {e}. Send the link again.");
                    }
                };

                match self
                    .tracker
                    .add_link(chat_id, &canonical, session.partial_tags.clone(), session.partial_filters.clone())
                    .await
                {
                    Ok(_) => {
                        self.sessions.clear(user_id);
                        if let Err(e) = self.cache.refresh(chat_id).await {
                            warn!(chat_id, error = %e, "cache refresh failed after track");
                        }
                        format!("Now tracking {canonical}")
                    }
                    Err(e) => format!("Could not add {canonical}: {e}. Send the link again to retry."),
                }
            }
        }
    }
}

fn next_prompt_for(session: Option<linktracker_common::UserSession>) -> String {
    use linktracker_common::TrackStep;
    match session.and_then(|s| s.step) {
        Some(TrackStep::AwaitingTags) => "Send space-separated tags (or \"skip\").".to_string(),
        Some(TrackStep::AwaitingFilters) => {
            "Send space-separated filters, or \"skip\"/\"пропустить\" to leave them empty.".to_string()
        }
        _ => "Go on.".to_string(),
    }
}

const HELP_TEXT: &str = "Commands:\n\
    /start - register this chat\n\
    /track - start tracking a new link\n\
    /untrack <link> - stop tracking a link\n\
    /list - list tracked links\n\
    /help - show this help";
