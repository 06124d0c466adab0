// tracker/src/state.rs
// Application state shared across handlers, matching the teacher's
// `Arc<AppState>` pattern (backend/src/state.rs).

use std::sync::Arc;

use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}
