use std::sync::Arc;

use crate::websocket::CommandDispatcher;

/// Application state shared between connections
pub struct AppState {
    pub dispatcher: Arc<CommandDispatcher>,
}

impl AppState {
    pub fn new(dispatcher: Arc<CommandDispatcher>) -> Self {
        AppState { dispatcher }
    }
}
