use std::{path::PathBuf, sync::Arc};

use docchat_chat::DocumentChat;

use crate::session::SessionStore;

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<DocumentChat>,
    pub sessions: Arc<SessionStore>,
    pub upload_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(chat: DocumentChat, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            chat: Arc::new(chat),
            sessions: Arc::new(SessionStore::new()),
            upload_dir: Arc::new(upload_dir.into()),
        }
    }

    /// Bound the number of sessions remembered at once.
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.sessions = Arc::new(SessionStore::with_capacity(max_sessions));
        self
    }
}
