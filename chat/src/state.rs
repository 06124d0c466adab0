// chat/src/state.rs
// Application state shared across HTTP handlers, matching the teacher's
// `Arc<AppState>` pattern (backend/src/state.rs).

use std::sync::Arc;

use crate::cache::LinkCache;
use crate::render::ChatAdapter;
use crate::session::SessionStore;
use crate::tracker_client::TrackerClient;

#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<TrackerClient>,
    pub cache: Arc<LinkCache>,
    pub sessions: Arc<SessionStore>,
    pub adapter: Arc<dyn ChatAdapter>,
}
